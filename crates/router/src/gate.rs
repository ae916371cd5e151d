//! Access gate: denylist check and attempt accounting.
//!
//! Every drop here is silent so an unrecognized sender cannot probe for the
//! bot's existence. Only an explicit admin removal clears a denylist entry.

use {
    anyhow::Result,
    portero_storage::{AttemptStore, AuditStore, Contact, ContactStore, DenylistStore},
    serde_json::json,
    tracing::{info, warn},
};

/// Inbound messages from an unrecognized number before it is denylisted.
pub const ATTEMPT_THRESHOLD: i64 = 10;

/// Gate an inbound sender. Returns the contact when the message should be
/// processed; `None` means silent drop.
///
/// Denylisted numbers are dropped with no side effects at all. Unrecognized
/// numbers bump their attempt counter and, on reaching the threshold, gain a
/// denylist entry (audited as `denylist_add`); below the threshold the
/// attempt itself is audited as `unregistered_attempt`.
pub async fn check_and_account(
    contacts: &ContactStore,
    denylist: &DenylistStore,
    attempts: &AttemptStore,
    audit: &AuditStore,
    number: &str,
    now: i64,
) -> Result<Option<Contact>> {
    if denylist.get(number).await?.is_some() {
        return Ok(None);
    }
    if let Some(contact) = contacts.get(number).await? {
        return Ok(Some(contact));
    }

    let count = attempts.bump(number, now).await?;
    if count >= ATTEMPT_THRESHOLD {
        denylist.add(number, now).await?;
        audit
            .append(
                None,
                "denylist_add",
                json!({ "number": number, "attempts": count }),
                now,
            )
            .await?;
        warn!(number, attempts = count, "number denylisted");
    } else {
        audit
            .append(
                None,
                "unregistered_attempt",
                json!({ "number": number, "attempt": count }),
                now,
            )
            .await?;
        info!(number, attempt = count, "unregistered attempt");
    }
    Ok(None)
}
