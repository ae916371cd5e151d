//! End-to-end flow tests: inbound messages through `Router::handle` with a
//! recording transport and stubbed door/camera collaborators.

#![allow(clippy::unwrap_used)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use {
    async_trait::async_trait,
    portero_camera::{CameraKind, Capture, CaptureResult},
    portero_channels::{Error as TransportError, InboundMessage, OutboundMedia, Transport},
    portero_common::SessionLock,
    portero_doors::{DoorActuator, DoorKind, DoorOpenResult},
    portero_router::Router,
    portero_storage::{AuditContextStore, AuditStore, ContactStore, DenylistStore, Role},
    sqlx::SqlitePool,
};

#[derive(Default)]
struct RecordingTransport {
    texts: Mutex<Vec<String>>,
    media: Mutex<Vec<OutboundMedia>>,
    media_failures: AtomicUsize,
}

impl RecordingTransport {
    fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }

    fn media(&self) -> Vec<OutboundMedia> {
        self.media.lock().unwrap().clone()
    }

    fn last_text(&self) -> String {
        self.texts().last().cloned().unwrap_or_default()
    }

    fn contains(&self, needle: &str) -> bool {
        self.texts().iter().any(|t| t.contains(needle))
    }

    /// Make the next `n` media sends fail.
    fn fail_media_sends(&self, n: usize) {
        self.media_failures.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, _recipient: &str, body: &str) -> portero_channels::Result<()> {
        self.texts.lock().unwrap().push(body.to_string());
        Ok(())
    }

    async fn send_media(
        &self,
        _recipient: &str,
        media: OutboundMedia,
    ) -> portero_channels::Result<()> {
        if self.media_failures.load(Ordering::SeqCst) > 0 {
            self.media_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(TransportError::unavailable("upload rejected"));
        }
        self.media.lock().unwrap().push(media);
        Ok(())
    }

    async fn resolve_recipient(&self, _raw: &str) -> portero_channels::Result<Option<String>> {
        Ok(None)
    }
}

struct StubDoors;

#[async_trait]
impl DoorActuator for StubDoors {
    async fn open(&self, kind: DoorKind) -> DoorOpenResult {
        DoorOpenResult {
            ok: true,
            message: format!("Opened {}", kind.marker()),
        }
    }
}

#[derive(Default)]
struct StubCamera {
    clip_requests: Mutex<Vec<u32>>,
}

#[async_trait]
impl Capture for StubCamera {
    async fn snapshot(&self, _kind: CameraKind) -> CaptureResult {
        CaptureResult {
            ok: true,
            data: Some(vec![0xFF, 0xD8, 0xFF]),
            message: "OK".into(),
        }
    }

    async fn clip(&self, _kind: CameraKind, seconds: u32) -> CaptureResult {
        self.clip_requests.lock().unwrap().push(seconds);
        CaptureResult {
            ok: true,
            data: Some(vec![0; 16]),
            message: "OK".into(),
        }
    }
}

struct Harness {
    router: Router,
    transport: Arc<RecordingTransport>,
    camera: Arc<StubCamera>,
    pool: SqlitePool,
}

impl Harness {
    async fn seed_contact(&self, number: &str, name: &str, role: Role) {
        ContactStore::new(self.pool.clone())
            .create(number, name, role, 0)
            .await
            .unwrap();
    }

    async fn send(&self, number: &str, body: &str) {
        let msg = InboundMessage::new(format!("{number}@c.us"), body);
        self.router.handle(&msg).await.unwrap();
    }
}

async fn harness() -> Harness {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    portero_storage::init(&pool).await.unwrap();
    let transport = Arc::new(RecordingTransport::default());
    let camera = Arc::new(StubCamera::default());
    let router = Router::new(
        pool.clone(),
        transport.clone(),
        Arc::new(StubDoors),
        camera.clone(),
        SessionLock::default(),
    );
    Harness {
        router,
        transport,
        camera,
        pool,
    }
}

const ADMIN: &str = "5215500000001";
const NORMAL: &str = "5215500000002";

async fn admin_harness() -> Harness {
    let h = harness().await;
    h.seed_contact(ADMIN, "Admin", Role::Admin).await;
    h
}

#[tokio::test]
async fn ping_replies_pong_and_audits_both_directions() {
    let h = admin_harness().await;
    h.send(ADMIN, "!ping").await;
    assert_eq!(h.transport.texts(), vec!["🏓 pong"]);

    let recent = AuditStore::new(h.pool.clone()).recent(10).await.unwrap();
    let actions: Vec<&str> = recent.iter().map(|r| r.action.as_str()).collect();
    assert!(actions.contains(&"msg_in"));
    assert!(actions.contains(&"msg_out"));
}

#[tokio::test]
async fn menu_matches_role() {
    let h = admin_harness().await;
    h.seed_contact(NORMAL, "Vecino", Role::Normal).await;

    h.send(ADMIN, "menu").await;
    assert!(h.transport.last_text().contains("🔟"));

    h.send(NORMAL, "Menú").await;
    let menu = h.transport.last_text();
    assert!(menu.contains("Estatus del sistema"));
    assert!(!menu.contains("Gestión de usuarios"));
}

#[tokio::test]
async fn denylisted_number_gets_no_reply() {
    let h = admin_harness().await;
    DenylistStore::new(h.pool.clone()).add(ADMIN, 0).await.unwrap();
    h.send(ADMIN, "menu").await;
    h.send(ADMIN, "!ping").await;
    assert!(h.transport.texts().is_empty());
}

#[tokio::test]
async fn tenth_unregistered_message_denylists_silently() {
    let h = harness().await;
    let stranger = "5215599999999";
    for _ in 0..10 {
        h.send(stranger, "hola").await;
    }
    assert!(h.transport.texts().is_empty());
    assert!(
        DenylistStore::new(h.pool.clone())
            .get(stranger)
            .await
            .unwrap()
            .is_some()
    );

    let adds = AuditStore::new(h.pool.clone())
        .recent(100)
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.action == "denylist_add")
        .count();
    assert_eq!(adds, 1);
}

#[tokio::test]
async fn blacklist_submenu_removal_round_trip() {
    let h = admin_harness().await;
    let blocked = "5215588888888";
    DenylistStore::new(h.pool.clone()).add(blocked, 0).await.unwrap();

    h.send(ADMIN, "menu").await;
    h.send(ADMIN, "8").await;
    assert!(h.transport.last_text().contains("Menú Blacklist"));

    h.send(ADMIN, "2").await;
    assert!(h.transport.last_text().contains("Envía el número a remover"));

    h.send(ADMIN, blocked).await;
    assert!(h.transport.contains("✅ Número removido (si existía)"));
    // Submenu re-shown after the removal.
    assert!(h.transport.last_text().contains("Menú Blacklist"));

    assert!(
        DenylistStore::new(h.pool.clone())
            .get(blocked)
            .await
            .unwrap()
            .is_none()
    );
    let removed = AuditStore::new(h.pool.clone())
        .recent(100)
        .await
        .unwrap()
        .into_iter()
        .any(|r| r.action == "denylist_remove");
    assert!(removed);
}

#[tokio::test]
async fn usuario_alta_creates_admin_with_audit() {
    let h = admin_harness().await;
    h.send(ADMIN, "!usuario alta 5215512345678 Carlos admin").await;
    assert_eq!(h.transport.last_text(), "✅ Usuario creado");

    let created = ContactStore::new(h.pool.clone())
        .get("5215512345678")
        .await
        .unwrap()
        .unwrap();
    assert!(created.is_admin());
    assert_eq!(created.name, "Carlos");

    let audited = AuditStore::new(h.pool.clone())
        .recent(100)
        .await
        .unwrap()
        .into_iter()
        .any(|r| r.action == "user_create_manual");
    assert!(audited);
}

#[tokio::test]
async fn create_wizard_rejects_duplicates_and_short_names() {
    let h = admin_harness().await;
    h.seed_contact("5215511111111", "Existente", Role::Normal).await;

    h.send(ADMIN, "menu").await;
    h.send(ADMIN, "6").await;
    h.send(ADMIN, "1").await;
    assert!(h.transport.last_text().contains("Ingresa el número de teléfono"));

    // Duplicate number repeats the step.
    h.send(ADMIN, "5215511111111").await;
    assert_eq!(h.transport.last_text(), "Ese número ya existe, ingresa otro.");

    h.send(ADMIN, "5215522222222").await;
    assert_eq!(h.transport.last_text(), "📛 Ingresa el nombre de usuario:");

    // Short name repeats the step.
    h.send(ADMIN, "A").await;
    assert_eq!(h.transport.last_text(), "Nombre muy corto.");

    h.send(ADMIN, "Ana").await;
    assert_eq!(h.transport.last_text(), "👮 ¿Será usuario administrador? (si/no)");

    h.send(ADMIN, "quizás").await;
    assert_eq!(h.transport.last_text(), "Responde si o no.");

    h.send(ADMIN, "si").await;
    assert!(h.transport.contains("✅ Usuario creado."));

    let created = ContactStore::new(h.pool.clone())
        .get("5215522222222")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created.name, "Ana");
    assert!(created.is_admin());
}

#[tokio::test]
async fn update_wizard_toggles_active_in_one_step() {
    let h = admin_harness().await;
    h.seed_contact("5215533333333", "Vecino", Role::Normal).await;

    h.send(ADMIN, "menu").await;
    h.send(ADMIN, "6").await;
    h.send(ADMIN, "3").await;
    h.send(ADMIN, "5215533333333").await;
    assert!(h.transport.last_text().contains("¿Qué deseas modificar?"));

    h.send(ADMIN, "3").await;
    assert!(h.transport.contains("Estado activo ahora: false"));

    let updated = ContactStore::new(h.pool.clone())
        .get("5215533333333")
        .await
        .unwrap()
        .unwrap();
    assert!(!updated.active);
}

#[tokio::test]
async fn audit_filter_resets_offset_and_next_page_is_noop_when_empty() {
    let h = admin_harness().await;

    h.send(ADMIN, "menu").await;
    h.send(ADMIN, "7").await;
    assert!(h.transport.last_text().contains("Menú Auditoría"));

    h.send(ADMIN, "6").await;
    assert!(h.transport.contains("Ingresa el número a filtrar"));

    h.send(ADMIN, "5215599999999").await;
    assert!(h.transport.contains("✅ Filtro aplicado."));

    let ctxs = AuditContextStore::new(h.pool.clone());
    let ctx = ctxs.get(ADMIN).await.unwrap().unwrap();
    assert_eq!(ctx.filter_number.as_deref(), Some("5215599999999"));
    assert_eq!(ctx.offset, 0);
    assert!(!ctx.awaiting_filter);

    // Nothing matches the filter, so the next page does not move the offset.
    h.send(ADMIN, "8").await;
    assert!(h.transport.contains("No hay más páginas."));
    assert_eq!(ctxs.get(ADMIN).await.unwrap().unwrap().offset, 0);
}

#[tokio::test]
async fn audit_csv_export_sends_attachment() {
    let h = admin_harness().await;
    h.send(ADMIN, "menu").await;
    h.send(ADMIN, "7").await;
    h.send(ADMIN, "4").await;

    let media = h.transport.media();
    assert_eq!(media.len(), 1);
    assert_eq!(media[0].filename, "mensajes.csv");
    assert_eq!(media[0].mime, "text/csv");
    let csv = String::from_utf8(media[0].data.clone()).unwrap();
    assert!(csv.starts_with("id,tipo,numero,fecha,body"));
}

#[tokio::test]
async fn reset_clears_active_flows() {
    let h = admin_harness().await;
    h.send(ADMIN, "menu").await;
    h.send(ADMIN, "6").await;
    assert!(h.transport.last_text().contains("Gestión Usuarios"));

    h.send(ADMIN, "reset").await;
    assert!(h.transport.last_text().contains("Contextos reiniciados"));

    // With every slot cleared, a digit hits the main menu again.
    h.send(ADMIN, "5").await;
    assert!(h.transport.last_text().contains("Estatus del sistema"));
}

#[tokio::test]
async fn role_revocation_aborts_flow_with_denial() {
    let h = admin_harness().await;
    h.send(ADMIN, "menu").await;
    h.send(ADMIN, "6").await;

    let contacts = ContactStore::new(h.pool.clone());
    let mut contact = contacts.get(ADMIN).await.unwrap().unwrap();
    contact.role = Role::Normal;
    contacts.update(&contact).await.unwrap();

    h.send(ADMIN, "2").await;
    assert_eq!(h.transport.last_text(), "⛔ No autorizado.");

    // Flow slots were dropped; the main menu works for the demoted contact.
    h.send(ADMIN, "5").await;
    assert!(h.transport.last_text().contains("Estatus del sistema"));
}

#[tokio::test]
async fn admin_submenu_denied_for_normal_contact() {
    let h = harness().await;
    h.seed_contact(NORMAL, "Vecino", Role::Normal).await;
    h.send(NORMAL, "menu").await;
    h.send(NORMAL, "6").await;
    assert_eq!(h.transport.last_text(), "⛔ No autorizado.");
}

#[tokio::test]
async fn slash_commands_are_silent_for_normal_contact() {
    let h = harness().await;
    h.seed_contact(NORMAL, "Vecino", Role::Normal).await;
    h.send(NORMAL, "!usuario listar").await;
    h.send(NORMAL, "!blacklist listar").await;
    assert!(h.transport.texts().is_empty());
}

#[tokio::test]
async fn snapshot_option_sends_jpeg_with_caption() {
    let h = harness().await;
    h.seed_contact(NORMAL, "Vecino", Role::Normal).await;
    h.send(NORMAL, "3").await;

    assert!(h.transport.contains("Capturando imagen del portón de visitas"));
    let media = h.transport.media();
    assert_eq!(media.len(), 1);
    assert_eq!(media[0].filename, "visitas.jpg");
    assert_eq!(media[0].mime, "image/jpeg");
    assert_eq!(media[0].caption.as_deref(), Some("Portón visitas"));
    assert!(!media[0].as_document);
}

#[tokio::test]
async fn door_option_reports_processed_opening() {
    let h = harness().await;
    h.seed_contact(NORMAL, "Vecino", Role::Normal).await;
    h.send(NORMAL, "1").await;
    assert!(h.transport.contains("Solicitando apertura de portón de visitas"));
    assert_eq!(h.transport.last_text(), "✅ Apertura de visitas procesada.");
}

#[tokio::test]
async fn clip_send_failure_retries_with_shorter_capture() {
    let h = admin_harness().await;
    h.transport.fail_media_sends(1);
    h.send(ADMIN, "10").await;

    assert_eq!(*h.camera.clip_requests.lock().unwrap(), vec![30, 20]);
    assert!(h.transport.contains("Falló el envío del video"));

    let media = h.transport.media();
    assert_eq!(media.len(), 1);
    assert_eq!(media[0].filename, "front-door.mp4");
    assert!(media[0].as_document);
    assert_eq!(media[0].caption.as_deref(), Some("Cámara frontal"));
}

#[tokio::test]
async fn search_exits_back_to_management_menu() {
    let h = admin_harness().await;
    h.seed_contact("5215544444444", "María López", Role::Normal).await;

    h.send(ADMIN, "menu").await;
    h.send(ADMIN, "6").await;
    h.send(ADMIN, "5").await;
    assert!(h.transport.last_text().contains("Ingresa texto / número a buscar"));

    h.send(ADMIN, "María").await;
    assert!(h.transport.contains("5215544444444 | María López | normal | activo"));
    assert!(h.transport.last_text().contains("Gestión Usuarios"));

    // The prompt was consumed; a digit now selects a menu option.
    h.send(ADMIN, "2").await;
    assert!(h.transport.contains("Admin | admin | activo"));
}
