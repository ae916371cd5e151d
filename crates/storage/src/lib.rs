//! SQLite persistence for portero.
//!
//! One store per entity (contacts, denylist, attempts, audit log, audit
//! contexts), each a thin wrapper over a shared [`sqlx::SqlitePool`].

pub mod attempts;
pub mod audit;
pub mod audit_ctx;
pub mod contacts;
pub mod denylist;
pub mod models;

pub use {
    attempts::AttemptStore,
    audit::AuditStore,
    audit_ctx::AuditContextStore,
    contacts::ContactStore,
    denylist::DenylistStore,
    models::{AttemptCounter, AuditContext, AuditRecord, Contact, DenylistEntry, Role},
};

/// Run database migrations. Call once at application startup.
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Initialize the schema directly, without the migration table.
///
/// Retained for tests that use in-memory databases.
#[doc(hidden)]
pub async fn init(pool: &sqlx::SqlitePool) -> anyhow::Result<()> {
    sqlx::raw_sql(include_str!("../migrations/0001_init.sql"))
        .execute(pool)
        .await?;
    Ok(())
}
