use serde::{Deserialize, Serialize};

/// Contact role. Stored as TEXT ('admin' | 'normal').
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Normal,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Normal => "normal",
        }
    }

    /// Strict parse; `None` for anything but the two known roles.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "normal" => Some(Self::Normal),
            _ => None,
        }
    }
}

/// A phone-number-identified party known to the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: i64,
    /// Normalized digit string. Unique across contacts.
    pub number: String,
    pub name: String,
    pub role: Role,
    pub active: bool,
    pub registered_at: i64,
}

impl Contact {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Permanent block record for a phone number.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DenylistEntry {
    pub id: i64,
    pub number: String,
    pub active: bool,
    pub created_at: i64,
}

/// Strike count for a number with no contact.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttemptCounter {
    pub id: i64,
    pub number: String,
    pub count: i64,
    pub first_attempt_at: i64,
    pub updated_at: i64,
}

/// Per-admin audit-browsing state (filter + pagination), with a sliding
/// 5-minute expiry enforced by the router.
#[derive(Debug, Clone)]
pub struct AuditContext {
    pub admin_number: String,
    pub filter_number: Option<String>,
    pub offset: i64,
    pub awaiting_filter: bool,
    pub last_interaction: i64,
}

impl AuditContext {
    #[must_use]
    pub fn new(admin_number: impl Into<String>, now: i64) -> Self {
        Self {
            admin_number: admin_number.into(),
            filter_number: None,
            offset: 0,
            awaiting_filter: false,
            last_interaction: now,
        }
    }
}

/// Append-only log entry for an action taken by or on behalf of a contact.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub id: i64,
    /// NULL for anonymous/system events.
    pub contact_number: Option<String>,
    pub action: String,
    pub at: i64,
    pub details: serde_json::Value,
}

impl AuditRecord {
    /// The message body carried in the details payload, if any.
    #[must_use]
    pub fn body(&self) -> &str {
        self.details
            .get("body")
            .and_then(|v| v.as_str())
            .unwrap_or("")
    }
}
