mod bootstrap;
mod console;

use std::sync::Arc;

use {
    anyhow::Context,
    clap::Parser,
    portero_camera::{CameraUrls, FfmpegCapture},
    portero_channels::Transport,
    portero_common::SessionLock,
    portero_router::Router,
    sqlx::SqlitePool,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "portero", about = "Portero — text-message gate control bot")]
struct Cli {
    /// Path to portero.toml (default: discover in ./ then ~/.config/portero/).
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// SQLite database path (overrides the config value).
    #[arg(long, env = "PORTERO_DB")]
    db: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_ansi(true),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let mut config = match &cli.config {
        Some(path) => portero_config::load_config(path)?,
        None => portero_config::discover_and_load()?,
    };
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    let missing = config.missing_required();
    if !missing.is_empty() {
        anyhow::bail!("missing required config values: {}", missing.join(", "));
    }

    let pool = SqlitePool::connect(&format!("sqlite://{}?mode=rwc", config.db_path))
        .await
        .with_context(|| format!("failed to open database at {}", config.db_path))?;
    portero_storage::run_migrations(&pool).await?;

    bootstrap::ensure_startup_admins(&pool, &config.startup_notify_numbers).await?;

    let lock = SessionLock::default();
    let transport: Arc<dyn Transport> = Arc::new(console::ConsoleTransport);
    let doors = Arc::new(portero_doors::HttpDoorActuator::new(config.door_api_base()));
    let camera = Arc::new(FfmpegCapture::new(
        CameraUrls {
            visits: config.cameras.visits_rtsp.clone(),
            pedestrian: config.cameras.pedestrian_rtsp.clone(),
            front_door: config.cameras.front_door_rtsp.clone(),
        },
        lock.clone(),
    ));

    bootstrap::startup_notify(&pool, transport.as_ref(), &config, &lock).await;

    let router = Router::new(pool, transport, doors, camera, lock);
    info!(bot = %config.bot_name, env = %config.environment, "portero ready");
    console::run_loop(&router).await
}
