//! Persistence collaborators for goldrec-qe
//!
//! The engine only sees three traits:
//! - [`RecipeRepository`] keyed recipe documents
//! - [`FeedbackStore`] append-only batch quality records
//! - [`UserDirectory`] identity and role lookups
//!
//! Each has an in-memory implementation (tests, `--in-memory`) and a SQLite
//! implementation sharing one pool.

pub mod feedback;
pub mod memory;
pub mod recipes;
pub mod retry;
pub mod users;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use goldrec_common::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::models::{QualityFeedbackRecord, Recipe, User};

pub use feedback::SqliteFeedbackStore;
pub use memory::{InMemoryFeedbackStore, InMemoryRecipeRepository, InMemoryUserDirectory};
pub use recipes::SqliteRecipeRepository;
pub use users::SqliteUserDirectory;

/// Keyed access to recipe documents
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<Option<Recipe>>;

    /// Insert or fully replace the recipe document
    async fn save(&self, recipe: &Recipe) -> Result<()>;

    /// Every recipe, in registration order
    async fn list_all(&self) -> Result<Vec<Recipe>>;
}

/// Append-only feedback history
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Rejects records with an empty recipe id
    async fn append(&self, record: &QualityFeedbackRecord) -> Result<()>;

    /// All records for a recipe, oldest append first
    async fn query_by_recipe(&self, recipe_id: &str) -> Result<Vec<QualityFeedbackRecord>>;
}

/// Identity and role provider
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>>;

    async fn upsert_user(&self, user: &User) -> Result<()>;
}

/// The three collaborators the engine is built from
#[derive(Clone)]
pub struct Stores {
    pub recipes: Arc<dyn RecipeRepository>,
    pub feedback: Arc<dyn FeedbackStore>,
    pub users: Arc<dyn UserDirectory>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            recipes: Arc::new(InMemoryRecipeRepository::new()),
            feedback: Arc::new(InMemoryFeedbackStore::new()),
            users: Arc::new(InMemoryUserDirectory::new()),
        }
    }

    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            recipes: Arc::new(SqliteRecipeRepository::new(pool.clone())),
            feedback: Arc::new(SqliteFeedbackStore::new(pool.clone())),
            users: Arc::new(SqliteUserDirectory::new(pool)),
        }
    }
}

/// Open (creating if needed) the service database and its tables
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Private in-memory database
///
/// Single connection: every new `sqlite::memory:` connection is a separate
/// empty database.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_tables(&pool).await?;
    Ok(pool)
}

/// Create goldrec-qe tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    // Derived state lives in `document`; the other columns serve listings
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recipes (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            is_golden INTEGER NOT NULL DEFAULT 0,
            golden_score REAL,
            document TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // seq preserves append order independent of test dates
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quality_feedback (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            recipe_id TEXT NOT NULL,
            record TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_quality_feedback_recipe ON quality_feedback (recipe_id, seq)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            role TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (recipes, quality_feedback, users)");

    Ok(())
}
