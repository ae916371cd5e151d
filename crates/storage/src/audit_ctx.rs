use {anyhow::Result, sqlx::SqlitePool};

use crate::models::AuditContext;

/// Internal row type for sqlx mapping (`offset` is reserved in SQL, the
/// column is named `page_offset`).
#[derive(sqlx::FromRow)]
struct AuditContextRow {
    admin_number: String,
    filter_number: Option<String>,
    page_offset: i64,
    awaiting_filter: bool,
    last_interaction: i64,
}

impl From<AuditContextRow> for AuditContext {
    fn from(r: AuditContextRow) -> Self {
        Self {
            admin_number: r.admin_number,
            filter_number: r.filter_number,
            offset: r.page_offset,
            awaiting_filter: r.awaiting_filter,
            last_interaction: r.last_interaction,
        }
    }
}

/// Per-admin audit-browsing contexts.
#[derive(Clone)]
pub struct AuditContextStore {
    pool: SqlitePool,
}

impl AuditContextStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, admin_number: &str) -> Result<Option<AuditContext>> {
        let row = sqlx::query_as::<_, AuditContextRow>(
            "SELECT * FROM audit_contexts WHERE admin_number = ?",
        )
        .bind(admin_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    pub async fn upsert(&self, ctx: &AuditContext) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO audit_contexts
                 (admin_number, filter_number, page_offset, awaiting_filter, last_interaction)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(admin_number) DO UPDATE SET
                 filter_number = excluded.filter_number,
                 page_offset = excluded.page_offset,
                 awaiting_filter = excluded.awaiting_filter,
                 last_interaction = excluded.last_interaction"#,
        )
        .bind(&ctx.admin_number)
        .bind(&ctx.filter_number)
        .bind(ctx.offset)
        .bind(ctx.awaiting_filter)
        .bind(ctx.last_interaction)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, admin_number: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM audit_contexts WHERE admin_number = ?")
            .bind(admin_number)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every context whose last interaction is older than the cutoff.
    /// A deleted context is indistinguishable from one that never existed.
    pub async fn expire_older_than(&self, cutoff: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM audit_contexts WHERE last_interaction < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
