//! aquahud daemon entry point.
//!
//! Wires together the HID session, the adb media catalog and the config
//! store, pushes the stored display configuration, then hands the session to
//! the keepalive supervisor and blocks until Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ AdbShell / MediaCatalog  -- device storage over adb
//!  └─ ConfigStore::load()      -- merged config, persisted back
//!  └─ DeviceSession::connect() -- exclusive HID handle
//!  └─ DeviceController::apply()
//!  └─ KeepaliveSupervisor      -- background heartbeat thread
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use aquahud_host::{
    AdbShell, ConfigStore, DeviceConfig, DeviceController, DeviceIdentity, DeviceSession,
    KeepaliveSupervisor, MediaCatalog, MediaRoots, SessionOptions, SupervisorSettings,
};

const CONFIG_FILE: &str = "config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("aquahud starting");

    // ── Device storage over adb ───────────────────────────────────────────────
    let shell = AdbShell::new();
    if !shell.is_available() {
        warn!("adb not found on PATH; media management will be unavailable");
    }
    let catalog = MediaCatalog::new(Arc::new(shell), MediaRoots::default());
    if !catalog.is_app_running() {
        warn!("display app not reported running; proceeding anyway");
    }

    // ── Configuration ─────────────────────────────────────────────────────────
    let store = ConfigStore::new(CONFIG_FILE);
    let defaults = DeviceConfig::defaults(&catalog.list_media().preset);
    let config = store.load(defaults)?;
    info!(
        "configuration loaded: media={:?} brightness={} keepalive={}s",
        config.media, config.brightness, config.keepalive_interval
    );

    // ── HID session ───────────────────────────────────────────────────────────
    let options = SessionOptions {
        keepalive_interval: Duration::from_secs(config.keepalive_interval),
        ..SessionOptions::default()
    };
    let session = Arc::new(DeviceSession::connect(DeviceIdentity::default(), options)?);
    info!("display connected");

    let settings = SupervisorSettings {
        interval: Duration::from_secs(config.keepalive_interval),
        send_system_data: config.send_system_data,
    };

    let controller =
        DeviceController::with_config(Arc::clone(&session), catalog, store, config);
    if let Err(e) = controller.apply() {
        error!("failed to push initial display config: {e}");
    }

    // ── Keepalive supervisor ──────────────────────────────────────────────────
    let supervisor = KeepaliveSupervisor::spawn(session, settings, None);

    info!("aquahud ready.  Press Ctrl-C to exit.");
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    if !supervisor.is_alive() {
        warn!("keepalive supervisor had already stopped; the display may have disconnected");
    }
    supervisor.stop();
    supervisor.join();

    info!("aquahud stopped");
    Ok(())
}
