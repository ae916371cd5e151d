use {anyhow::Result, sqlx::SqlitePool};

use crate::models::DenylistEntry;

/// SQLite-backed denylist store.
#[derive(Clone)]
pub struct DenylistStore {
    pool: SqlitePool,
}

impl DenylistStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, number: &str) -> Result<Option<DenylistEntry>> {
        let row = sqlx::query_as::<_, DenylistEntry>("SELECT * FROM denylist WHERE number = ?")
            .bind(number)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Add a number to the denylist. Idempotent: re-adding an existing
    /// number is a no-op, so the entry is created exactly once.
    pub async fn add(&self, number: &str, now: i64) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO denylist (number, active, created_at) VALUES (?, 1, ?)
               ON CONFLICT(number) DO NOTHING"#,
        )
        .bind(number)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<DenylistEntry>> {
        let rows = sqlx::query_as::<_, DenylistEntry>("SELECT * FROM denylist ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn remove(&self, number: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM denylist WHERE number = ?")
            .bind(number)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
