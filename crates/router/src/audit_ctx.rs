//! Audit-context lifecycle: sliding 5-minute TTL over persisted per-admin
//! browsing state. Expiry happens opportunistically, not on a timer.

use {
    anyhow::Result,
    portero_storage::{AuditContext, AuditContextStore},
};

/// Sliding expiry for audit-browsing contexts (unix ms).
pub const AUDIT_CONTEXT_TTL_MS: i64 = 5 * 60 * 1000;

/// Sweep every context whose last interaction predates the TTL window.
pub async fn expire_stale(store: &AuditContextStore, now: i64) -> Result<u64> {
    store.expire_older_than(now - AUDIT_CONTEXT_TTL_MS).await
}

/// Fetch the admin's context, treating a stale one as absent (and deleting
/// it). An expired context is indistinguishable from one that never existed.
pub async fn get_fresh(
    store: &AuditContextStore,
    admin_number: &str,
    now: i64,
) -> Result<Option<AuditContext>> {
    match store.get(admin_number).await? {
        Some(ctx) if now - ctx.last_interaction > AUDIT_CONTEXT_TTL_MS => {
            store.delete(admin_number).await?;
            Ok(None)
        },
        other => Ok(other),
    }
}

/// Fetch or create the admin's context, refreshing `last_interaction`.
pub async fn get_or_create(
    store: &AuditContextStore,
    admin_number: &str,
    now: i64,
) -> Result<AuditContext> {
    let mut ctx = match get_fresh(store, admin_number, now).await? {
        Some(ctx) => ctx,
        None => AuditContext::new(admin_number, now),
    };
    ctx.last_interaction = now;
    store.upsert(&ctx).await?;
    Ok(ctx)
}

/// Persist a mutated context, sliding the TTL window forward.
pub async fn save(store: &AuditContextStore, ctx: &mut AuditContext, now: i64) -> Result<()> {
    ctx.last_interaction = now;
    store.upsert(ctx).await
}
