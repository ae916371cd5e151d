//! Console development transport.
//!
//! Inbound: stdin lines in `<numero>: <texto>` form. Outbound: stdout. The
//! production WhatsApp client lives outside this process behind the same
//! [`Transport`] trait.

use {
    async_trait::async_trait,
    portero_channels::{
        InboundMessage, OutboundMedia, RECIPIENT_SUFFIX, Transport, fallback_recipient,
    },
    portero_router::Router,
    tokio::io::{AsyncBufReadExt, BufReader},
    tracing::{error, info, warn},
};

pub struct ConsoleTransport;

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send_text(&self, recipient: &str, body: &str) -> portero_channels::Result<()> {
        println!("-> {recipient}: {body}");
        Ok(())
    }

    async fn send_media(
        &self,
        recipient: &str,
        media: OutboundMedia,
    ) -> portero_channels::Result<()> {
        println!(
            "-> {recipient}: [{} {} ({} bytes)]",
            media.mime,
            media.filename,
            media.data.len()
        );
        Ok(())
    }

    async fn resolve_recipient(&self, raw: &str) -> portero_channels::Result<Option<String>> {
        Ok(fallback_recipient(raw))
    }
}

/// Feed stdin lines to the router until EOF.
pub async fn run_loop(router: &Router) -> anyhow::Result<()> {
    info!("console transport ready; input format: <numero>: <texto>");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(msg) = parse_line(&line) else {
            if !line.trim().is_empty() {
                warn!(line, "unrecognized input, expected <numero>: <texto>");
            }
            continue;
        };
        if let Err(e) = router.handle(&msg).await {
            error!(from = msg.from, error = ?e, "message handling failed");
        }
    }
    Ok(())
}

fn parse_line(line: &str) -> Option<InboundMessage> {
    let (number, body) = line.split_once(':')?;
    let number = number.trim();
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(InboundMessage::new(
        format!("{number}{RECIPIENT_SUFFIX}"),
        body.trim(),
    ))
}
