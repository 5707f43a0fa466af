//! SQLite feedback store

use async_trait::async_trait;
use goldrec_common::Result;
use sqlx::{Row, SqlitePool};

use super::retry::{retry_on_lock, MAX_LOCK_WAIT_MS};
use super::FeedbackStore;
use crate::models::QualityFeedbackRecord;

pub struct SqliteFeedbackStore {
    pool: SqlitePool,
}

impl SqliteFeedbackStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedbackStore for SqliteFeedbackStore {
    async fn append(&self, record: &QualityFeedbackRecord) -> Result<()> {
        record.validate()?;

        let id = record.id.to_string();
        let document = serde_json::to_string(record)?;
        let created_at = record.created_at.to_rfc3339();

        retry_on_lock("append_feedback", MAX_LOCK_WAIT_MS, || async {
            sqlx::query(
                "INSERT INTO quality_feedback (id, recipe_id, record, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(&record.recipe_id)
            .bind(&document)
            .bind(&created_at)
            .execute(&self.pool)
            .await?;
            Ok::<_, goldrec_common::Error>(())
        })
        .await
    }

    async fn query_by_recipe(&self, recipe_id: &str) -> Result<Vec<QualityFeedbackRecord>> {
        let rows = sqlx::query("SELECT record FROM quality_feedback WHERE recipe_id = ? ORDER BY seq")
            .bind(recipe_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<QualityFeedbackRecord> {
                let document: String = row.get("record");
                Ok(serde_json::from_str(&document)?)
            })
            .collect()
    }
}
