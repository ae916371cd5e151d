//! Transport seam for the messaging client.
//!
//! The production client (WhatsApp Web session) lives outside this process;
//! the router only depends on the [`Transport`] trait. Inbound events arrive
//! one at a time as [`InboundMessage`] values.

pub mod error;

pub use error::{Error, Result};

use async_trait::async_trait;

/// Chat-id suffix the WhatsApp transport uses for direct contacts.
pub const RECIPIENT_SUFFIX: &str = "@c.us";

/// A single inbound text event.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Raw transport sender id (e.g. `5215512345678@c.us`).
    pub from: String,
    pub body: String,
}

impl InboundMessage {
    #[must_use]
    pub fn new(from: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            body: body.into(),
        }
    }

    /// The sender's normalized phone number (suffix stripped).
    #[must_use]
    pub fn sender_number(&self) -> &str {
        self.from.strip_suffix(RECIPIENT_SUFFIX).unwrap_or(&self.from)
    }
}

/// An outbound attachment (image, video, or exported file).
#[derive(Debug, Clone)]
pub struct OutboundMedia {
    pub mime: String,
    pub filename: String,
    pub data: Vec<u8>,
    pub caption: Option<String>,
    /// Send as a document attachment instead of inline media.
    pub as_document: bool,
}

impl OutboundMedia {
    #[must_use]
    pub fn new(mime: impl Into<String>, filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            filename: filename.into(),
            data,
            caption: None,
            as_document: false,
        }
    }

    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    #[must_use]
    pub fn as_document(mut self) -> Self {
        self.as_document = true;
        self
    }
}

/// Outbound side of the messaging client.
///
/// Implementations are not required to be internally serialized; callers
/// hold the process-wide session lock around every send.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, recipient: &str, body: &str) -> Result<()>;

    async fn send_media(&self, recipient: &str, media: OutboundMedia) -> Result<()>;

    /// Best-effort lookup of the canonical recipient id for a raw number.
    /// `Ok(None)` means the transport could not resolve it; callers fall
    /// back to [`fallback_recipient`].
    async fn resolve_recipient(&self, raw: &str) -> Result<Option<String>>;
}

/// Deterministic recipient construction used when resolution fails:
/// keep the digits and append the chat-id suffix. `None` when the raw
/// input carries no digits at all.
#[must_use]
pub fn fallback_recipient(raw: &str) -> Option<String> {
    if raw.ends_with(RECIPIENT_SUFFIX) {
        return Some(raw.to_string());
    }
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    Some(format!("{digits}{RECIPIENT_SUFFIX}"))
}
