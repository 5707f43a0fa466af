//! SQLite user directory

use async_trait::async_trait;
use goldrec_common::Result;
use sqlx::{Row, SqlitePool};

use super::UserDirectory;
use crate::models::{Role, User};

pub struct SqliteUserDirectory {
    pool: SqlitePool,
}

impl SqliteUserDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for SqliteUserDirectory {
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, role FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| {
            let role: String = row.get("role");
            User::new(row.get::<String, _>("id"), Role::parse(&role))
        }))
    }

    async fn upsert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, role) VALUES (?, ?) ON CONFLICT(id) DO UPDATE SET role = excluded.role",
        )
        .bind(&user.id)
        .bind(user.role.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
