//! Main numeric menu: doors, snapshots, status, and the admin submenus.

use {
    anyhow::Result,
    portero_camera::CameraKind,
    portero_channels::{InboundMessage, OutboundMedia},
    portero_doors::DoorKind,
    portero_storage::Contact,
    tracing::warn,
};

use crate::{audit_ctx, menus, router::Router};

impl Router {
    /// `menu` trigger: clear every slot and the audit context, show the menu.
    pub(crate) async fn show_main_menu(&self, msg: &InboundMessage, contact: &Contact) -> Result<()> {
        self.audit_ctxs.delete(&contact.number).await?;
        self.flows.clear(&contact.number);
        self.reply(&msg.from, &contact.number, &menus::main_menu(contact.is_admin()))
            .await
    }

    pub(crate) async fn main_menu_option(
        &self,
        msg: &InboundMessage,
        contact: &Contact,
        option: u8,
        now: i64,
    ) -> Result<()> {
        let number = &contact.number;
        if option >= 6 && !contact.is_admin() {
            return self.reply(&msg.from, number, "⛔ No autorizado.").await;
        }
        match option {
            1 => {
                self.open_door(
                    msg,
                    number,
                    DoorKind::Visits,
                    "🚗 Solicitando apertura de portón de visitas...",
                    "✅ Apertura de visitas procesada.",
                )
                .await
            },
            2 => {
                self.open_door(
                    msg,
                    number,
                    DoorKind::Pedestrian,
                    "🚶 Solicitando apertura de portón peatonal...",
                    "✅ Apertura peatonal procesada.",
                )
                .await
            },
            3 => {
                self.send_snapshot(
                    msg,
                    number,
                    CameraKind::Visits,
                    "🖼️ Capturando imagen del portón de visitas...",
                    "visitas.jpg",
                    "Portón visitas",
                )
                .await
            },
            4 => {
                self.send_snapshot(
                    msg,
                    number,
                    CameraKind::Pedestrian,
                    "🖼️ Capturando imagen del portón peatonal...",
                    "peatonal.jpg",
                    "Portón peatonal",
                )
                .await
            },
            5 => self.reply(&msg.from, number, &self.system_status()).await,
            6 => {
                self.flows.update(number, |f| {
                    f.user_menu = true;
                    // A leftover search prompt from a previous session would
                    // swallow the next option.
                    f.search = false;
                });
                self.reply(&msg.from, number, menus::user_menu()).await
            },
            7 => {
                let ctx = audit_ctx::get_or_create(&self.audit_ctxs, number, now).await?;
                self.flows.update(number, |f| f.audit_menu = true);
                self.reply(&msg.from, number, &menus::audit_menu(Some(&ctx))).await
            },
            8 => {
                self.flows.update(number, |f| f.blacklist_menu = true);
                self.reply(&msg.from, number, menus::blacklist_menu()).await
            },
            9 => {
                self.send_snapshot(
                    msg,
                    number,
                    CameraKind::FrontDoor,
                    "🖼️ Capturando imagen de cámara frontal...",
                    "front-door.jpg",
                    "Cámara frontal",
                )
                .await
            },
            10 => self.front_door_clip(msg, number).await,
            _ => Ok(()),
        }
    }

    async fn open_door(
        &self,
        msg: &InboundMessage,
        number: &str,
        kind: DoorKind,
        progress: &str,
        success: &str,
    ) -> Result<()> {
        self.reply(&msg.from, number, progress).await?;
        let result = self.doors.open(kind).await;
        let text = if result.ok { success } else { result.message.as_str() };
        self.reply(&msg.from, number, text).await
    }

    async fn send_snapshot(
        &self,
        msg: &InboundMessage,
        number: &str,
        kind: CameraKind,
        progress: &str,
        filename: &str,
        caption: &str,
    ) -> Result<()> {
        self.reply(&msg.from, number, progress).await?;
        let snap = self.camera.snapshot(kind).await;
        match snap.data {
            Some(data) if snap.ok => {
                let media = OutboundMedia::new("image/jpeg", filename, data).with_caption(caption);
                self.reply_media(&msg.from, number, media, &format!("[{filename} enviado]"))
                    .await
            },
            _ => self.reply(&msg.from, number, &snap.message).await,
        }
    }

    /// Option 10: 30-second front-door clip sent as a document, with one
    /// shorter retry if the transport rejects the first upload.
    async fn front_door_clip(&self, msg: &InboundMessage, number: &str) -> Result<()> {
        self.reply(
            &msg.from,
            number,
            "🎥 Grabando clip de 30s de la cámara frontal, espera...",
        )
        .await?;

        let clip = self.camera.clip(CameraKind::FrontDoor, 30).await;
        let Some(data) = clip.data.filter(|_| clip.ok) else {
            return self.reply(&msg.from, number, &clip.message).await;
        };
        let media = OutboundMedia::new("video/mp4", "front-door-30s.mp4", data)
            .with_caption("Cámara frontal (30s)")
            .as_document();
        let Err(e) = self
            .reply_media(&msg.from, number, media, "[front-door-30s.mp4 enviado]")
            .await
        else {
            return Ok(());
        };

        warn!(error = %e, "clip send failed, retrying with a shorter capture");
        self.reply(
            &msg.from,
            number,
            "❌ Falló el envío del video. Intentaré con menor calidad.",
        )
        .await?;
        let retry = self.camera.clip(CameraKind::FrontDoor, 20).await;
        match retry.data.filter(|_| retry.ok) {
            Some(data) => {
                let media = OutboundMedia::new("video/mp4", "front-door.mp4", data)
                    .with_caption("Cámara frontal")
                    .as_document();
                self.reply_media(&msg.from, number, media, "[front-door.mp4 enviado]")
                    .await
            },
            None => self.reply(&msg.from, number, &retry.message).await,
        }
    }

    fn system_status(&self) -> String {
        let uptime = self.started_at.elapsed().as_secs();
        let rss_mb = current_rss_mb().unwrap_or(0.0);
        format!("📊 *Estatus del sistema*\n🕒 Uptime: {uptime}s\n🧠 Memoria RSS: {rss_mb:.1} MB")
    }
}

fn current_rss_mb() -> Option<f64> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut sys = sysinfo::System::new();
    sys.refresh_processes_specifics(
        sysinfo::ProcessesToUpdate::Some(&[pid]),
        false,
        sysinfo::ProcessRefreshKind::nothing().with_memory(),
    );
    let bytes = sys.process(pid)?.memory();
    #[allow(clippy::cast_precision_loss)]
    Some(bytes as f64 / 1024.0 / 1024.0)
}
