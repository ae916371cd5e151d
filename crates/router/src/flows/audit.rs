//! Audit-browsing flow: windowed message history, filter, pagination, and
//! CSV export, driven by the persisted per-admin audit context.

use {
    anyhow::Result,
    portero_channels::{InboundMessage, OutboundMedia},
    portero_storage::{AuditContext, AuditRecord, Contact},
    time::{OffsetDateTime, format_description::well_known::Rfc3339},
};

use crate::{audit_ctx, menus, route::digits_between, router::Router};

/// Most recent records considered when browsing.
const WINDOW: i64 = 1500;
/// Page size for option 8.
const PAGE_SIZE: usize = 100;

impl Router {
    /// Awaiting-filter state: any input is consumed here.
    pub(crate) async fn audit_filter_input(
        &self,
        msg: &InboundMessage,
        contact: &Contact,
        mut ctx: AuditContext,
        body: &str,
        now: i64,
    ) -> Result<()> {
        let number = &contact.number;
        if !contact.is_admin() {
            self.audit_ctxs.delete(number).await?;
            return self.deny_unauthorized(msg, number).await;
        }
        if digits_between(body, 8, 15) {
            ctx.filter_number = Some(body.to_string());
            ctx.awaiting_filter = false;
            ctx.offset = 0;
            audit_ctx::save(&self.audit_ctxs, &mut ctx, now).await?;
            self.reply(&msg.from, number, "✅ Filtro aplicado.").await?;
            return self.reply(&msg.from, number, &menus::audit_menu(Some(&ctx))).await;
        }
        if body == "0" {
            ctx.awaiting_filter = false;
            audit_ctx::save(&self.audit_ctxs, &mut ctx, now).await?;
            self.reply(&msg.from, number, "Filtro cancelado.").await?;
            return self.reply(&msg.from, number, &menus::audit_menu(Some(&ctx))).await;
        }
        self.reply(
            &msg.from,
            number,
            "Ingresa un número válido (8-15 dígitos) o 0 para cancelar.",
        )
        .await
    }

    pub(crate) async fn audit_menu_option(
        &self,
        msg: &InboundMessage,
        contact: &Contact,
        mut ctx: AuditContext,
        choice: u8,
        now: i64,
    ) -> Result<()> {
        let number = &contact.number;
        if !contact.is_admin() {
            self.audit_ctxs.delete(number).await?;
            return self.deny_unauthorized(msg, number).await;
        }

        let window = message_window(
            self.audit.recent(WINDOW).await?,
            ctx.filter_number.as_deref(),
        );

        match choice {
            1..=3 => {
                let take = match choice {
                    1 => 10,
                    2 => 100,
                    _ => 200,
                };
                let listing = render_lines(window.iter().take(take));
                let text = if listing.is_empty() { "Sin mensajes".to_string() } else { listing };
                audit_ctx::save(&self.audit_ctxs, &mut ctx, now).await?;
                self.reply(&msg.from, number, &text).await?;
            },
            4 => {
                let csv = export_csv(&window);
                let media = OutboundMedia::new("text/csv", "mensajes.csv", csv.into_bytes());
                audit_ctx::save(&self.audit_ctxs, &mut ctx, now).await?;
                self.reply_media(&msg.from, number, media, "[CSV mensajes enviado]")
                    .await?;
            },
            5 => {
                self.audit_ctxs.delete(number).await?;
                self.flows.update(number, |f| f.audit_menu = false);
                return self.reply(&msg.from, number, &menus::main_menu(contact.is_admin())).await;
            },
            6 => {
                ctx.awaiting_filter = true;
                audit_ctx::save(&self.audit_ctxs, &mut ctx, now).await?;
                self.reply(
                    &msg.from,
                    number,
                    "Ingresa el número a filtrar (solo dígitos) o 0 para cancelar.",
                )
                .await?;
            },
            7 => {
                ctx.filter_number = None;
                ctx.offset = 0;
                audit_ctx::save(&self.audit_ctxs, &mut ctx, now).await?;
                self.reply(&msg.from, number, "Filtro limpiado.").await?;
            },
            8 => {
                #[allow(clippy::cast_sign_loss)]
                let next = ctx.offset.max(0) as usize + PAGE_SIZE;
                let page: Vec<_> = window.iter().skip(next).take(PAGE_SIZE).collect();
                if page.is_empty() {
                    // Offset stays put; the window simply has no next page.
                    audit_ctx::save(&self.audit_ctxs, &mut ctx, now).await?;
                    self.reply(&msg.from, number, "No hay más páginas.").await?;
                } else {
                    #[allow(clippy::cast_possible_wrap)]
                    {
                        ctx.offset = next as i64;
                    }
                    audit_ctx::save(&self.audit_ctxs, &mut ctx, now).await?;
                    let listing = render_lines(page.into_iter());
                    self.reply(&msg.from, number, &listing).await?;
                }
            },
            9 => {
                ctx.offset = 0;
                audit_ctx::save(&self.audit_ctxs, &mut ctx, now).await?;
                self.reply(&msg.from, number, "Paginación reiniciada.").await?;
            },
            _ => {
                self.reply(&msg.from, number, "Opción inválida.").await?;
            },
        }
        // Every branch but "back to main menu" re-shows the audit menu.
        self.reply(&msg.from, number, &menus::audit_menu(Some(&ctx))).await
    }
}

/// Restrict a descending-id window to message records, optionally to one
/// counterparty number.
fn message_window(records: Vec<AuditRecord>, filter: Option<&str>) -> Vec<AuditRecord> {
    records
        .into_iter()
        .filter(|r| r.action == "msg_in" || r.action == "msg_out")
        .filter(|r| match filter {
            Some(n) => r.contact_number.as_deref() == Some(n),
            None => true,
        })
        .collect()
}

/// `{id} >> body` for inbound, `{id} << body` for outbound.
fn render_lines<'a>(records: impl Iterator<Item = &'a AuditRecord>) -> String {
    records
        .map(|r| {
            let arrow = if r.action == "msg_in" { ">>" } else { "<<" };
            format!("{} {} {}", r.id, arrow, r.body())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// CSV export: `id,tipo,numero,fecha,body`, body double-quoted with internal
/// quotes doubled, dates in RFC 3339.
fn export_csv(records: &[AuditRecord]) -> String {
    let mut lines = vec!["id,tipo,numero,fecha,body".to_string()];
    for r in records {
        let body = r.body().replace('"', "\"\"");
        lines.push(format!(
            "{},{},{},{},\"{}\"",
            r.id,
            r.action,
            r.contact_number.as_deref().unwrap_or(""),
            rfc3339(r.at),
            body,
        ));
    }
    lines.join("\n")
}

fn rfc3339(at_ms: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(at_ms) * 1_000_000)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_default()
}
