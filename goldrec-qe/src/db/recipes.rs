//! SQLite recipe repository
//!
//! The full recipe is stored as a JSON document; name, golden flag and score
//! are mirrored into columns for listing queries.

use async_trait::async_trait;
use goldrec_common::Result;
use sqlx::{Row, SqlitePool};

use super::retry::{retry_on_lock, MAX_LOCK_WAIT_MS};
use super::RecipeRepository;
use crate::models::Recipe;

pub struct SqliteRecipeRepository {
    pool: SqlitePool,
}

impl SqliteRecipeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn decode(document: &str) -> Result<Recipe> {
    Ok(serde_json::from_str(document)?)
}

#[async_trait]
impl RecipeRepository for SqliteRecipeRepository {
    async fn get_by_id(&self, id: &str) -> Result<Option<Recipe>> {
        let row = sqlx::query("SELECT document FROM recipes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let document: String = row.get("document");
                Ok(Some(decode(&document)?))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, recipe: &Recipe) -> Result<()> {
        // Encode before touching the pool
        let document = serde_json::to_string(recipe)?;
        let created_at = recipe.created_at.to_rfc3339();
        let updated_at = recipe.updated_at.to_rfc3339();

        retry_on_lock("save_recipe", MAX_LOCK_WAIT_MS, || async {
            sqlx::query(
                r#"
                INSERT INTO recipes (id, name, is_golden, golden_score, document, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    is_golden = excluded.is_golden,
                    golden_score = excluded.golden_score,
                    document = excluded.document,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&recipe.id)
            .bind(&recipe.name)
            .bind(recipe.is_golden)
            .bind(recipe.golden_score)
            .bind(&document)
            .bind(&created_at)
            .bind(&updated_at)
            .execute(&self.pool)
            .await?;
            Ok::<_, goldrec_common::Error>(())
        })
        .await
    }

    async fn list_all(&self) -> Result<Vec<Recipe>> {
        // rowid survives ON CONFLICT updates, so this is registration order
        let rows = sqlx::query("SELECT document FROM recipes ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let document: String = row.get("document");
                decode(&document)
            })
            .collect()
    }
}
