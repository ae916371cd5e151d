//! The session engine: wires the gate, the flow registry, and the flow
//! handlers together around one inbound message at a time.

use std::{sync::Arc, time::Instant};

use {
    anyhow::Result,
    portero_camera::Capture,
    portero_channels::{InboundMessage, OutboundMedia, Transport},
    portero_common::{SessionLock, now_ms},
    portero_doors::DoorActuator,
    portero_storage::{AttemptStore, AuditContextStore, AuditStore, ContactStore, DenylistStore},
    serde_json::json,
    sqlx::SqlitePool,
    tracing::{debug, warn},
};

use crate::{
    audit_ctx, gate,
    registry::FlowRegistry,
    route::{self, Route},
};

/// Per-process conversation router. One instance handles every contact;
/// per-contact state lives in the stores and the [`FlowRegistry`].
pub struct Router {
    pub(crate) contacts: ContactStore,
    pub(crate) denylist: DenylistStore,
    pub(crate) attempts: AttemptStore,
    pub(crate) audit: AuditStore,
    pub(crate) audit_ctxs: AuditContextStore,
    pub(crate) flows: FlowRegistry,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) doors: Arc<dyn DoorActuator>,
    pub(crate) camera: Arc<dyn Capture>,
    pub(crate) lock: SessionLock,
    pub(crate) started_at: Instant,
}

impl Router {
    pub fn new(
        pool: SqlitePool,
        transport: Arc<dyn Transport>,
        doors: Arc<dyn DoorActuator>,
        camera: Arc<dyn Capture>,
        lock: SessionLock,
    ) -> Self {
        Self {
            contacts: ContactStore::new(pool.clone()),
            denylist: DenylistStore::new(pool.clone()),
            attempts: AttemptStore::new(pool.clone()),
            audit: AuditStore::new(pool.clone()),
            audit_ctxs: AuditContextStore::new(pool),
            flows: FlowRegistry::new(),
            transport,
            doors,
            camera,
            lock,
            started_at: Instant::now(),
        }
    }

    /// Process one inbound message to completion. Zero or more replies.
    ///
    /// Errors returned here are for the run loop to log; user-facing
    /// failures become Spanish replies inside the flow handlers.
    pub async fn handle(&self, msg: &InboundMessage) -> Result<()> {
        let body = msg.body.trim();
        let number = msg.sender_number().to_string();
        let now = now_ms();

        let Some(contact) = gate::check_and_account(
            &self.contacts,
            &self.denylist,
            &self.attempts,
            &self.audit,
            &number,
            now,
        )
        .await?
        else {
            return Ok(());
        };

        self.audit_in(&number, body, now).await;

        audit_ctx::expire_stale(&self.audit_ctxs, now).await?;
        let ctx = audit_ctx::get_fresh(&self.audit_ctxs, &number, now).await?;
        let flows = self.flows.get(&number);
        let route = route::resolve(body, &flows, ctx.as_ref(), contact.is_admin());
        debug!(number, ?route, "inbound message resolved");

        match route {
            Route::Ping => self.reply(&msg.from, &number, "🏓 pong").await,
            Route::Reset => self.handle_reset(msg, &number).await,
            Route::AuditFilterInput => {
                // `resolve` only returns this variant with a live context.
                match ctx {
                    Some(ctx) => self.audit_filter_input(msg, &contact, ctx, body, now).await,
                    None => Ok(()),
                }
            },
            Route::BlacklistRemovalInput => {
                self.blacklist_removal_input(msg, &contact, body, now).await
            },
            Route::CreateWizard => self.create_wizard(msg, &contact, body, now).await,
            Route::UpdateWizard => self.update_wizard(msg, &contact, body, now).await,
            Route::DeleteWizard => self.delete_wizard(msg, &contact, body, now).await,
            Route::BlacklistMenu => self.blacklist_menu_option(msg, &contact, body).await,
            Route::AuditMenu(choice) => match ctx {
                Some(ctx) => self.audit_menu_option(msg, &contact, ctx, choice, now).await,
                None => Ok(()),
            },
            Route::UserCommand => self.user_command(msg, &contact, body, now).await,
            Route::BlacklistCommand => self.blacklist_command(msg, &contact, body, now).await,
            Route::MenuTrigger => self.show_main_menu(msg, &contact).await,
            Route::MainMenu(option) => self.main_menu_option(msg, &contact, option, now).await,
            Route::UserMenu => self.user_menu_option(msg, &contact, body, now).await,
            Route::Silent => Ok(()),
        }
    }

    /// Clear every flow slot and the audit context, then confirm.
    async fn handle_reset(&self, msg: &InboundMessage, number: &str) -> Result<()> {
        self.audit_ctxs.delete(number).await?;
        self.flows.clear(number);
        self.reply(
            &msg.from,
            number,
            "🔄 Contextos reiniciados. Escribe \"menu\" para ver opciones.",
        )
        .await
    }

    /// Send a text reply under the session lock and audit it as `msg_out`.
    pub(crate) async fn reply(&self, recipient: &str, number: &str, text: &str) -> Result<()> {
        {
            let _session = self.lock.acquire().await;
            self.transport.send_text(recipient, text).await?;
        }
        self.audit_out(number, text).await;
        Ok(())
    }

    /// Send a media reply under the session lock; `note` is the body logged
    /// in the `msg_out` record.
    pub(crate) async fn reply_media(
        &self,
        recipient: &str,
        number: &str,
        media: OutboundMedia,
        note: &str,
    ) -> Result<()> {
        {
            let _session = self.lock.acquire().await;
            self.transport.send_media(recipient, media).await?;
        }
        self.audit_out(number, note).await;
        Ok(())
    }

    /// Abort an admin flow after role revocation: drop every slot and deny.
    pub(crate) async fn deny_unauthorized(&self, msg: &InboundMessage, number: &str) -> Result<()> {
        self.flows.clear(number);
        self.reply(&msg.from, number, "⛔ No autorizado.").await
    }

    async fn audit_in(&self, number: &str, body: &str, now: i64) {
        if let Err(e) = self
            .audit
            .append(Some(number), "msg_in", json!({ "body": body }), now)
            .await
        {
            warn!(number, error = %e, "failed to audit inbound message");
        }
    }

    // Best-effort: an audit failure never blocks a reply that already went
    // out.
    async fn audit_out(&self, number: &str, body: &str) {
        if let Err(e) = self
            .audit
            .append(Some(number), "msg_out", json!({ "body": body }), now_ms())
            .await
        {
            warn!(number, error = %e, "failed to audit outbound message");
        }
    }
}
