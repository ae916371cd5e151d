use {anyhow::Result, sqlx::SqlitePool};

use crate::models::AttemptCounter;

/// SQLite-backed attempt counters for unrecognized numbers.
#[derive(Clone)]
pub struct AttemptStore {
    pool: SqlitePool,
}

impl AttemptStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Increment the counter for a number, creating it at 1.
    /// Returns the count after the increment.
    pub async fn bump(&self, number: &str, now: i64) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO attempts (number, count, first_attempt_at, updated_at)
               VALUES (?1, 1, ?2, ?2)
               ON CONFLICT(number) DO UPDATE SET
                 count = count + 1,
                 updated_at = excluded.updated_at
               RETURNING count"#,
        )
        .bind(number)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn get(&self, number: &str) -> Result<Option<AttemptCounter>> {
        let row = sqlx::query_as::<_, AttemptCounter>("SELECT * FROM attempts WHERE number = ?")
            .bind(number)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> AttemptStore {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::init(&pool).await.unwrap();
        AttemptStore::new(pool)
    }

    #[tokio::test]
    async fn bump_creates_then_increments() {
        let store = store().await;
        assert_eq!(store.bump("111", 100).await.unwrap(), 1);
        assert_eq!(store.bump("111", 200).await.unwrap(), 2);
        assert_eq!(store.bump("111", 300).await.unwrap(), 3);

        let counter = store.get("111").await.unwrap().unwrap();
        assert_eq!(counter.count, 3);
        assert_eq!(counter.first_attempt_at, 100);
        assert_eq!(counter.updated_at, 300);
    }

    #[tokio::test]
    async fn counters_are_per_number() {
        let store = store().await;
        store.bump("111", 0).await.unwrap();
        store.bump("111", 0).await.unwrap();
        assert_eq!(store.bump("222", 0).await.unwrap(), 1);
    }
}
