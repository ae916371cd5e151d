use {anyhow::Result, sqlx::SqlitePool};

use crate::models::AuditRecord;

/// Internal row type for sqlx mapping.
#[derive(sqlx::FromRow)]
struct AuditRow {
    id: i64,
    contact_number: Option<String>,
    action: String,
    at: i64,
    details: String,
}

impl From<AuditRow> for AuditRecord {
    fn from(r: AuditRow) -> Self {
        Self {
            id: r.id,
            contact_number: r.contact_number,
            action: r.action,
            at: r.at,
            details: serde_json::from_str(&r.details).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// Append-only audit log.
#[derive(Clone)]
pub struct AuditStore {
    pool: SqlitePool,
}

impl AuditStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn append(
        &self,
        contact_number: Option<&str>,
        action: &str,
        details: serde_json::Value,
        now: i64,
    ) -> Result<()> {
        sqlx::query("INSERT INTO audit_log (contact_number, action, at, details) VALUES (?, ?, ?, ?)")
            .bind(contact_number)
            .bind(action)
            .bind(now)
            .bind(details.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Most recent records, descending by id. The audit-browsing flow reads
    /// a fixed window (1500) and projects from it in memory.
    pub async fn recent(&self, limit: i64) -> Result<Vec<AuditRecord>> {
        let rows = sqlx::query_as::<_, AuditRow>("SELECT * FROM audit_log ORDER BY id DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
