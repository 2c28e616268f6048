//! End-to-end controller scenarios over fake transport and shell layers.
//!
//! These tests exercise the full path from a controller call down to the
//! bytes written on the (fake) HID wire and the commands issued on the (fake)
//! adb shell, without touching real hardware.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aquahud_core::{DisplayConfig, Packet};
use aquahud_host::infrastructure::hid::mock::FakeTransport;
use aquahud_host::{
    CatalogError, ConfigStore, DeviceConfig, DeviceController, DeviceSession, MediaCatalog,
    MediaRoots, SessionOptions, ShellError, ShellOutput, ShellRunner,
};

// ── Fake adb shell ────────────────────────────────────────────────────────────

/// Script-driven shell: records every command and answers `find` invocations
/// from fixed listings, everything else with a canned success.
struct FakeShell {
    user_listing: String,
    preset_listing: String,
    commands: Mutex<Vec<Vec<String>>>,
    /// Responses for non-find commands, consumed in order; empty means
    /// unconditional success.
    scripted: Mutex<VecDeque<Result<ShellOutput, ShellError>>>,
}

impl FakeShell {
    fn new(user: &[&str], preset: &[&str]) -> Self {
        let join = |names: &[&str], root: &str| {
            names
                .iter()
                .map(|n| format!("{root}/{n}\n"))
                .collect::<String>()
        };
        Self {
            user_listing: join(user, "/sdcard/pcMedia"),
            preset_listing: join(preset, "/sdcard/pcMediaPreset"),
            commands: Mutex::new(Vec::new()),
            scripted: Mutex::new(VecDeque::new()),
        }
    }

    fn script(&self, response: Result<ShellOutput, ShellError>) {
        self.scripted.lock().unwrap().push_back(response);
    }

    fn commands(&self) -> Vec<Vec<String>> {
        self.commands.lock().unwrap().clone()
    }

    fn ok_output(stdout: &str) -> ShellOutput {
        ShellOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            status: 0,
        }
    }
}

impl ShellRunner for FakeShell {
    fn run(&self, args: &[String], _timeout: Duration) -> Result<ShellOutput, ShellError> {
        self.commands.lock().unwrap().push(args.to_vec());

        if args.len() == 2 && args[0] == "shell" && args[1].starts_with("find ") {
            let listing = if args[1].contains("pcMediaPreset") {
                &self.preset_listing
            } else {
                &self.user_listing
            };
            return Ok(Self::ok_output(listing));
        }

        self.scripted
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Self::ok_output("")))
    }
}

// ── Harness ───────────────────────────────────────────────────────────────────

fn fast_session(fake: FakeTransport) -> Arc<DeviceSession<FakeTransport>> {
    let options = SessionOptions {
        read_timeout: Duration::from_millis(1),
        settle_delay: Duration::ZERO,
        keepalive_interval: Duration::ZERO,
        read_buffer: 1024,
    };
    Arc::new(DeviceSession::with_transport(fake, options))
}

fn temp_config(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "aquahud_it_{name}_{}.json",
        std::process::id()
    ))
}

fn controller(
    fake: FakeTransport,
    shell: Arc<FakeShell>,
    path: &Path,
) -> DeviceController<FakeTransport> {
    DeviceController::new(
        fast_session(fake),
        MediaCatalog::new(shell, MediaRoots::default()),
        ConfigStore::new(path),
    )
    .expect("controller")
}

fn decoded_config(write: &[u8]) -> DisplayConfig {
    let packet = Packet::decode(&write[1..]).expect("decode frame");
    serde_json::from_slice(packet.body()).expect("config body")
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[test]
fn test_fresh_start_selects_first_preset_and_persists_config() {
    let path = temp_config("fresh_start");
    let shell = Arc::new(FakeShell::new(&[], &["intro.mp4", "second.mp4"]));
    let fake = FakeTransport::new();

    let controller = controller(fake.clone(), shell, &path);
    controller.apply().expect("apply");

    assert_eq!(controller.config().media, "intro.mp4");
    let wire = decoded_config(&fake.recorded_writes()[0]);
    assert_eq!(wire.water_block_screen.id.media, vec!["intro.mp4"]);
    assert_eq!(wire.water_block_screen.brightness, 200);

    let stored: DeviceConfig =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("config file")).expect("json");
    assert_eq!(stored.media, "intro.mp4");

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_stored_config_survives_restart() {
    let path = temp_config("restart");
    let fake = FakeTransport::new();

    {
        let shell = Arc::new(FakeShell::new(&[], &["intro.mp4"]));
        let mut first = controller(fake.clone(), shell, &path);
        first.set_brightness(25).expect("set brightness");
        first.set_media("mine.mp4").expect("set media");
    }

    let shell = Arc::new(FakeShell::new(&[], &["intro.mp4"]));
    let second = controller(fake, shell, &path);
    assert_eq!(second.config().brightness, 25);
    assert_eq!(second.config().media, "mine.mp4");

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_download_resolves_preset_root_when_absent_from_user_root() {
    let path = temp_config("download_preset");
    let shell = Arc::new(FakeShell::new(&["a.mp4"], &["b.mp4"]));
    let controller = controller(FakeTransport::new(), Arc::clone(&shell), &path);

    controller
        .download_media("b.mp4", Path::new("/tmp/out.mp4"))
        .expect("download");

    let pulls: Vec<_> = shell
        .commands()
        .into_iter()
        .filter(|c| c[0] == "pull")
        .collect();
    assert_eq!(pulls.len(), 1);
    assert_eq!(pulls[0][1], "/sdcard/pcMediaPreset/b.mp4");

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_download_prefers_user_root_for_duplicated_name() {
    let path = temp_config("download_user");
    let shell = Arc::new(FakeShell::new(&["dup.mp4"], &["dup.mp4"]));
    let controller = controller(FakeTransport::new(), Arc::clone(&shell), &path);

    controller
        .download_media("dup.mp4", Path::new("/tmp/out.mp4"))
        .expect("download");

    let pulls: Vec<_> = shell
        .commands()
        .into_iter()
        .filter(|c| c[0] == "pull")
        .collect();
    assert_eq!(pulls[0][1], "/sdcard/pcMedia/dup.mp4");

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_delete_preset_media_is_rejected_as_read_only() {
    let path = temp_config("delete_preset");
    let shell = Arc::new(FakeShell::new(&[], &["factory.mp4"]));
    let mut controller = controller(FakeTransport::new(), Arc::clone(&shell), &path);

    let result = controller.delete_media("factory.mp4");
    assert!(matches!(
        result,
        Err(aquahud_host::ControllerError::Catalog(CatalogError::ReadOnly(_)))
    ));
    assert!(
        !shell.commands().iter().any(|c| c[0] == "shell" && c[1].starts_with("rm ")),
        "no rm must be issued for preset media"
    );

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_delete_unknown_media_is_not_found() {
    let path = temp_config("delete_unknown");
    let shell = Arc::new(FakeShell::new(&["a.mp4"], &["b.mp4"]));
    let mut controller = controller(FakeTransport::new(), shell, &path);

    let result = controller.delete_media("ghost.mp4");
    assert!(matches!(
        result,
        Err(aquahud_host::ControllerError::Catalog(CatalogError::NotFound(_)))
    ));

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_delete_active_media_clears_selection_on_the_wire() {
    let path = temp_config("delete_active");
    let shell = Arc::new(FakeShell::new(&["active.mp4"], &[]));
    let fake = FakeTransport::new();
    let mut controller = controller(fake.clone(), shell, &path);
    controller.set_media("active.mp4").expect("set media");

    controller.delete_media("active.mp4").expect("delete");

    assert_eq!(controller.config().media, "");
    let writes = fake.recorded_writes();
    let last = decoded_config(writes.last().expect("a re-apply frame"));
    assert!(last.water_block_screen.id.media.is_empty());

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_upload_with_default_name_pushes_timestamped_file() {
    let path = temp_config("upload");
    let local = std::env::temp_dir().join(format!("aquahud_it_clip_{}.mp4", std::process::id()));
    std::fs::write(&local, b"fake video").expect("write local file");

    let shell = Arc::new(FakeShell::new(&[], &[]));
    let controller = controller(FakeTransport::new(), Arc::clone(&shell), &path);

    let name = controller.upload_media(&local, None).expect("upload");

    assert!(name.ends_with(".mp4"));
    assert_eq!(name.len(), "2024-01-01_00-00-00-000.mp4".len());
    let pushes: Vec<_> = shell
        .commands()
        .into_iter()
        .filter(|c| c[0] == "push")
        .collect();
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0][2], format!("/sdcard/pcMedia/{name}"));

    std::fs::remove_file(&local).ok();
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_upload_transfer_failure_is_surfaced() {
    let path = temp_config("upload_fail");
    let local = std::env::temp_dir().join(format!("aquahud_it_fail_{}.mp4", std::process::id()));
    std::fs::write(&local, b"fake video").expect("write local file");

    let shell = Arc::new(FakeShell::new(&[], &[]));
    shell.script(Ok(ShellOutput {
        stdout: String::new(),
        stderr: "device offline".to_string(),
        status: 1,
    }));
    let controller = controller(FakeTransport::new(), shell, &path);

    let result = controller.upload_media(&local, Some("x.mp4"));
    assert!(matches!(
        result,
        Err(aquahud_host::ControllerError::Catalog(CatalogError::Transfer(_)))
    ));

    std::fs::remove_file(&local).ok();
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_media_listing_orders_user_files_before_presets() {
    let path = temp_config("listing_order");
    let shell = Arc::new(FakeShell::new(&["u1.mp4", "u2.mp4"], &["p1.mp4"]));
    let controller = controller(FakeTransport::new(), shell, &path);

    assert_eq!(
        controller.get_media_files(),
        vec!["u1.mp4".to_string(), "u2.mp4".to_string(), "p1.mp4".to_string()]
    );

    std::fs::remove_file(&path).ok();
}
