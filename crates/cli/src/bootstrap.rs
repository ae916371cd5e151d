//! Startup bootstrap: admin seeding and the startup notification round.

use {
    anyhow::Result,
    portero_channels::{Transport, fallback_recipient},
    portero_common::{SessionLock, now_ms},
    portero_config::PorteroConfig,
    portero_storage::{AuditStore, ContactStore, Role},
    serde_json::json,
    sqlx::SqlitePool,
    time::{OffsetDateTime, format_description::well_known::Rfc3339},
    tracing::{info, warn},
};

/// Every configured notify number becomes an admin contact: created if
/// absent, promoted if present with a lesser role, recorded either way.
pub async fn ensure_startup_admins(pool: &SqlitePool, numbers: &[String]) -> Result<()> {
    let contacts = ContactStore::new(pool.clone());
    let audit = AuditStore::new(pool.clone());

    for raw in numbers {
        let number = raw.trim();
        if number.is_empty() {
            continue;
        }
        let now = now_ms();
        match contacts.get(number).await? {
            None => {
                contacts.create(number, number, Role::Admin, now).await?;
                audit
                    .append(Some(number), "startup_admin_create", json!({ "number": number }), now)
                    .await?;
                info!(number, "startup admin created");
            },
            Some(mut contact) if !contact.is_admin() => {
                contact.role = Role::Admin;
                contacts.update(&contact).await?;
                audit
                    .append(Some(number), "startup_admin_update", json!({ "number": number }), now)
                    .await?;
                info!(number, "contact promoted to startup admin");
            },
            Some(_) => {
                audit
                    .append(Some(number), "startup_admin_exists", json!({ "number": number }), now)
                    .await?;
            },
        }
    }
    Ok(())
}

/// Send the startup banner to every configured number. Failures are audited
/// and logged; they never abort startup.
pub async fn startup_notify(
    pool: &SqlitePool,
    transport: &dyn Transport,
    config: &PorteroConfig,
    lock: &SessionLock,
) {
    if config.startup_notify_numbers.is_empty() {
        return;
    }
    let audit = AuditStore::new(pool.clone());
    let banner = startup_banner(&config.bot_name, &config.environment);

    for raw in &config.startup_notify_numbers {
        let resolved = match transport.resolve_recipient(raw).await {
            Ok(Some(id)) => Some(id),
            Ok(None) | Err(_) => fallback_recipient(raw),
        };
        let Some(recipient) = resolved else {
            warn!(raw, "invalid startup notify number");
            append_quietly(
                &audit,
                "startup_notify_invalid_number",
                json!({ "raw_number": raw }),
            )
            .await;
            continue;
        };

        let sent = {
            let _session = lock.acquire().await;
            transport.send_text(&recipient, &banner).await
        };
        match sent {
            Ok(()) => {
                append_quietly(&audit, "startup_notify_ok", json!({ "recipient": recipient })).await;
            },
            Err(e) => {
                warn!(raw, error = %e, "startup notification failed");
                append_quietly(
                    &audit,
                    "startup_notify_error",
                    json!({ "raw_number": raw, "error": e.to_string() }),
                )
                .await;
            },
        }
    }
}

fn startup_banner(bot_name: &str, environment: &str) -> String {
    let now = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    format!(
        "🤖 {bot_name} iniciado\n\
         \n\
         ✅ Sistema operativo correctamente\n\
         📅 {now}\n\
         🌐 Ambiente: {environment}\n\
         \n\
         ¡Listo para recibir mensajes! 🚀"
    )
}

async fn append_quietly(audit: &AuditStore, action: &str, details: serde_json::Value) {
    if let Err(e) = audit.append(None, action, details, now_ms()).await {
        warn!(action, error = %e, "failed to audit startup event");
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use {
        async_trait::async_trait,
        portero_channels::{OutboundMedia, Transport},
    };

    use super::*;

    async fn pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        portero_storage::init(&pool).await.unwrap();
        pool
    }

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send_text(&self, recipient: &str, body: &str) -> portero_channels::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((recipient.to_string(), body.to_string()));
            Ok(())
        }

        async fn send_media(
            &self,
            _recipient: &str,
            _media: OutboundMedia,
        ) -> portero_channels::Result<()> {
            Ok(())
        }

        async fn resolve_recipient(&self, _raw: &str) -> portero_channels::Result<Option<String>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn startup_admins_created_promoted_or_recorded() {
        let pool = pool().await;
        let contacts = ContactStore::new(pool.clone());
        contacts.create("111222333", "Vecino", Role::Normal, 0).await.unwrap();
        contacts.create("444555666", "Jefe", Role::Admin, 0).await.unwrap();

        let numbers = vec![
            "999888777".to_string(),
            "111222333".to_string(),
            "444555666".to_string(),
        ];
        ensure_startup_admins(&pool, &numbers).await.unwrap();

        assert!(contacts.get("999888777").await.unwrap().unwrap().is_admin());
        assert!(contacts.get("111222333").await.unwrap().unwrap().is_admin());

        let actions: Vec<String> = AuditStore::new(pool.clone())
            .recent(10)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.action)
            .collect();
        assert!(actions.contains(&"startup_admin_create".to_string()));
        assert!(actions.contains(&"startup_admin_update".to_string()));
        assert!(actions.contains(&"startup_admin_exists".to_string()));
    }

    #[tokio::test]
    async fn startup_admins_are_idempotent() {
        let pool = pool().await;
        let numbers = vec!["999888777".to_string()];
        ensure_startup_admins(&pool, &numbers).await.unwrap();
        ensure_startup_admins(&pool, &numbers).await.unwrap();

        let contacts = ContactStore::new(pool.clone()).list().await.unwrap();
        assert_eq!(contacts.len(), 1);
    }

    #[tokio::test]
    async fn notify_uses_fallback_recipient_and_audits() {
        let pool = pool().await;
        let transport = RecordingTransport::default();
        let config = PorteroConfig {
            bot_name: "portero".into(),
            environment: "test".into(),
            startup_notify_numbers: vec!["+52 155 1234 5678".into(), "no-digits".into()],
            ..PorteroConfig::default()
        };

        startup_notify(&pool, &transport, &config, &SessionLock::default()).await;

        let sent = transport.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "5215512345678@c.us");
        assert!(sent[0].1.contains("🤖 portero iniciado"));
        assert!(sent[0].1.contains("Ambiente: test"));

        let actions: Vec<String> = AuditStore::new(pool.clone())
            .recent(10)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.action)
            .collect();
        assert!(actions.contains(&"startup_notify_ok".to_string()));
        assert!(actions.contains(&"startup_notify_invalid_number".to_string()));
    }
}
