//! Door actuator client.
//!
//! The door service exposes `POST /open-door/{kind}`. Success is determined
//! by the response body carrying a kind-specific marker substring; every
//! failure mode (timeout, transport error, unexpected body) is folded into a
//! user-visible message rather than an error value.

use std::time::Duration;

use {async_trait::async_trait, tracing::warn};

/// Which gate to actuate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorKind {
    Visits,
    Pedestrian,
}

impl DoorKind {
    /// URL path segment for the door service.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Visits => "visits",
            Self::Pedestrian => "pedestrian",
        }
    }

    /// Marker the service embeds in a successful response message.
    #[must_use]
    pub fn marker(self) -> &'static str {
        match self {
            Self::Visits => "AccessType.VISITS",
            Self::Pedestrian => "AccessType.PEDESTRIAN",
        }
    }
}

/// Outcome of an open request. `message` is user-visible Spanish text.
#[derive(Debug, Clone)]
pub struct DoorOpenResult {
    pub ok: bool,
    pub message: String,
}

#[async_trait]
pub trait DoorActuator: Send + Sync {
    async fn open(&self, kind: DoorKind) -> DoorOpenResult;
}

/// HTTP implementation with the door service's fixed 60-second timeout.
pub struct HttpDoorActuator {
    client: reqwest::Client,
    base_url: String,
}

const OPEN_TIMEOUT: Duration = Duration::from_secs(60);

impl HttpDoorActuator {
    /// `base_url` without a trailing slash.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(OPEN_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl DoorActuator for HttpDoorActuator {
    async fn open(&self, kind: DoorKind) -> DoorOpenResult {
        let url = format!("{}/open-door/{}", self.base_url, kind.path());
        let response = self
            .client
            .post(&url)
            .header("accept", "application/json")
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                warn!(door = kind.path(), "door open request timed out");
                return DoorOpenResult {
                    ok: false,
                    message: "⏱️ Tiempo de espera agotado al solicitar apertura.".into(),
                };
            },
            Err(e) => {
                warn!(door = kind.path(), error = %e, "door open request failed");
                return DoorOpenResult {
                    ok: false,
                    message: format!("❌ Error solicitando apertura: {e}"),
                };
            },
        };

        let body: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);
        let message = body.get("message").and_then(|m| m.as_str());
        DoorOpenResult {
            ok: message.is_some_and(|m| m.contains(kind.marker())),
            message: message.unwrap_or("Respuesta sin mensaje").to_string(),
        }
    }
}
