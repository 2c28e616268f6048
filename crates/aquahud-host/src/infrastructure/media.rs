//! Media catalog over the remote shell channel.
//!
//! The display stores its media on Android-side storage under two fixed
//! roots: a writable user directory and a read-only preset directory shipped
//! with the firmware.  The catalog wraps the four operations the device
//! supports (`find`, `push`, `pull`, `rm`) and keeps all output parsing here.
//!
//! There is no local cache: every operation re-enumerates the device.  A file
//! pushed a moment ago may not reappear in the next listing if the device is
//! slow to index it; that eventual consistency is accepted.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use super::shell::{ShellError, ShellRunner};

/// Android package of the device-side media app; used for the startup
/// liveness probe.
const DEVICE_APP_PACKAGE: &str = "com.baiyi.homeui.hshomeui";

const LIST_TIMEOUT: Duration = Duration::from_secs(30);
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(120);
const DELETE_TIMEOUT: Duration = Duration::from_secs(10);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// The two storage roots on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRoots {
    /// Writable directory holding user uploads.
    pub user: String,
    /// Read-only directory holding factory preset media.
    pub preset: String,
}

impl Default for MediaRoots {
    fn default() -> Self {
        Self {
            user: "/sdcard/pcMedia".to_string(),
            preset: "/sdcard/pcMediaPreset".to_string(),
        }
    }
}

/// Result of one catalog enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaListing {
    /// Basenames under the writable root.
    pub user: Vec<String>,
    /// Basenames under the preset root.
    pub preset: Vec<String>,
}

/// Error type for media operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The local file to upload does not exist.
    #[error("local file not found: {0}")]
    LocalFileMissing(PathBuf),

    /// The named file is absent from both storage roots.
    #[error("media file not found on device: {0}")]
    NotFound(String),

    /// The named file only exists under the read-only preset root.
    #[error("preset media is read-only: {0}")]
    ReadOnly(String),

    /// A push/pull transfer failed or timed out.
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// The shell channel itself failed.
    #[error(transparent)]
    Shell(#[from] ShellError),
}

/// Catalog of the media files stored on the device.
pub struct MediaCatalog {
    shell: Arc<dyn ShellRunner>,
    roots: MediaRoots,
}

impl MediaCatalog {
    pub fn new(shell: Arc<dyn ShellRunner>, roots: MediaRoots) -> Self {
        Self { shell, roots }
    }

    /// Checks whether the device-side media app is running.
    pub fn is_app_running(&self) -> bool {
        let args = vec![
            "shell".to_string(),
            format!("pidof {DEVICE_APP_PACKAGE}"),
        ];
        match self.shell.run(&args, PROBE_TIMEOUT) {
            Ok(output) => output.success() && !output.stdout.trim().is_empty(),
            Err(e) => {
                warn!("device app probe failed: {e}");
                false
            }
        }
    }

    /// Enumerates `*.mp4` files under both roots.
    ///
    /// A timed-out or failing `find` yields an empty list for that root, not
    /// an error; the cause is logged.
    pub fn list_media(&self) -> MediaListing {
        MediaListing {
            user: self.list_root(&self.roots.user),
            preset: self.list_root(&self.roots.preset),
        }
    }

    /// Pushes a local file to the writable root.
    ///
    /// When `remote_name` is absent a unique name is synthesized from the
    /// current local time with millisecond precision
    /// (`YYYY-MM-DD_HH-MM-SS-mmm.mp4`).  Returns the remote filename.
    ///
    /// # Errors
    ///
    /// [`CatalogError::LocalFileMissing`] when `local` does not exist,
    /// [`CatalogError::Transfer`] when the push fails or times out.
    pub fn upload(&self, local: &Path, remote_name: Option<&str>) -> Result<String, CatalogError> {
        if !local.exists() {
            return Err(CatalogError::LocalFileMissing(local.to_path_buf()));
        }

        let remote_name = match remote_name {
            Some(name) => name.to_string(),
            None => timestamp_name(),
        };
        let remote_path = format!("{}/{remote_name}", self.roots.user);

        let args = vec![
            "push".to_string(),
            local.display().to_string(),
            remote_path.clone(),
        ];
        match self.shell.run(&args, TRANSFER_TIMEOUT) {
            Ok(output) if output.success() => {
                debug!("uploaded {} as {remote_name}", local.display());
                Ok(remote_name)
            }
            Ok(output) => Err(CatalogError::Transfer(format!(
                "push to {remote_path} exited with status {}: {}",
                output.status,
                output.stderr.trim()
            ))),
            Err(ShellError::Timeout { timeout }) => Err(CatalogError::Transfer(format!(
                "push to {remote_path} timed out after {timeout:?}"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Pulls `name` to `dest`, resolving against a fresh listing with the
    /// writable root preferred and the preset root as fallback.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] when the name is absent from both roots,
    /// [`CatalogError::Transfer`] when the pull fails or times out.
    pub fn download(&self, name: &str, dest: &Path) -> Result<(), CatalogError> {
        let listing = self.list_media();
        let remote_path = if listing.user.iter().any(|f| f == name) {
            format!("{}/{name}", self.roots.user)
        } else if listing.preset.iter().any(|f| f == name) {
            format!("{}/{name}", self.roots.preset)
        } else {
            return Err(CatalogError::NotFound(name.to_string()));
        };

        let args = vec![
            "pull".to_string(),
            remote_path.clone(),
            dest.display().to_string(),
        ];
        match self.shell.run(&args, TRANSFER_TIMEOUT) {
            Ok(output) if output.success() => Ok(()),
            Ok(output) => Err(CatalogError::Transfer(format!(
                "pull of {remote_path} exited with status {}: {}",
                output.status,
                output.stderr.trim()
            ))),
            Err(ShellError::Timeout { timeout }) => Err(CatalogError::Transfer(format!(
                "pull of {remote_path} timed out after {timeout:?}"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes `name` from the writable root.
    ///
    /// Preset media is firmware content and can never be deleted.
    ///
    /// # Errors
    ///
    /// [`CatalogError::ReadOnly`] when the name only exists under the preset
    /// root, [`CatalogError::NotFound`] when it exists under neither,
    /// [`CatalogError::Transfer`] when the remove command fails.
    pub fn delete(&self, name: &str) -> Result<(), CatalogError> {
        let listing = self.list_media();
        if !listing.user.iter().any(|f| f == name) {
            if listing.preset.iter().any(|f| f == name) {
                return Err(CatalogError::ReadOnly(name.to_string()));
            }
            return Err(CatalogError::NotFound(name.to_string()));
        }

        let remote_path = format!("{}/{name}", self.roots.user);
        let args = vec!["shell".to_string(), format!("rm {remote_path}")];
        let output = self.shell.run(&args, DELETE_TIMEOUT)?;
        if output.success() {
            Ok(())
        } else {
            Err(CatalogError::Transfer(format!(
                "rm {remote_path} exited with status {}: {}",
                output.status,
                output.stderr.trim()
            )))
        }
    }

    fn list_root(&self, root: &str) -> Vec<String> {
        let args = vec![
            "shell".to_string(),
            format!("find {root} -type f -name '*.mp4' 2>/dev/null"),
        ];
        let output = match self.shell.run(&args, LIST_TIMEOUT) {
            Ok(output) => output,
            Err(e) => {
                warn!("media listing of {root} failed: {e}");
                return Vec::new();
            }
        };
        if !output.success() {
            warn!(
                "media listing of {root} exited with status {}: {}",
                output.status,
                output.stderr.trim()
            );
            return Vec::new();
        }

        output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(basename)
            .collect()
    }
}

/// Basename of a device path (`/sdcard/pcMedia/a.mp4` → `a.mp4`).
fn basename(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

/// Timestamped upload filename with millisecond precision.
fn timestamp_name() -> String {
    chrono::Local::now()
        .format("%Y-%m-%d_%H-%M-%S-%3f.mp4")
        .to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::shell::{MockShellRunner, ShellOutput};

    fn ok_output(stdout: &str) -> ShellOutput {
        ShellOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            status: 0,
        }
    }

    fn failed_output(status: i32, stderr: &str) -> ShellOutput {
        ShellOutput {
            stdout: String::new(),
            stderr: stderr.to_string(),
            status,
        }
    }

    fn catalog_with(mock: MockShellRunner) -> MediaCatalog {
        MediaCatalog::new(Arc::new(mock), MediaRoots::default())
    }

    /// Expects the two `find` invocations of one `list_media()` call and
    /// replies with the given raw listings.
    fn expect_listing(mock: &mut MockShellRunner, user: &'static str, preset: &'static str) {
        mock.expect_run()
            .withf(|args, _| args.len() == 2 && args[1].starts_with("find /sdcard/pcMedia "))
            .times(1)
            .returning(move |_, _| Ok(ok_output(user)));
        mock.expect_run()
            .withf(|args, _| args.len() == 2 && args[1].starts_with("find /sdcard/pcMediaPreset "))
            .times(1)
            .returning(move |_, _| Ok(ok_output(preset)));
    }

    #[test]
    fn test_list_media_strips_paths_to_basenames() {
        let mut mock = MockShellRunner::new();
        expect_listing(
            &mut mock,
            "/sdcard/pcMedia/a.mp4\n/sdcard/pcMedia/sub/b.mp4\n",
            "/sdcard/pcMediaPreset/preset.mp4\n",
        );

        let listing = catalog_with(mock).list_media();

        assert_eq!(listing.user, vec!["a.mp4", "b.mp4"]);
        assert_eq!(listing.preset, vec!["preset.mp4"]);
    }

    #[test]
    fn test_list_media_returns_empty_lists_on_shell_timeout() {
        let mut mock = MockShellRunner::new();
        mock.expect_run().times(2).returning(|_, timeout| {
            Err(ShellError::Timeout { timeout })
        });

        let listing = catalog_with(mock).list_media();
        assert_eq!(listing, MediaListing::default());
    }

    #[test]
    fn test_list_media_returns_empty_lists_on_nonzero_exit() {
        let mut mock = MockShellRunner::new();
        mock.expect_run()
            .times(2)
            .returning(|_, _| Ok(failed_output(1, "device offline")));

        let listing = catalog_with(mock).list_media();
        assert_eq!(listing, MediaListing::default());
    }

    #[test]
    fn test_upload_fails_fast_when_local_file_missing() {
        let mock = MockShellRunner::new(); // no expectations: shell must not run
        let result = catalog_with(mock).upload(Path::new("/no/such/file.mp4"), None);
        assert!(matches!(result, Err(CatalogError::LocalFileMissing(_))));
    }

    #[test]
    fn test_upload_uses_explicit_remote_name() {
        let local = std::env::temp_dir().join("aquahud_upload_test.mp4");
        std::fs::write(&local, b"fake video").expect("write temp file");

        let mut mock = MockShellRunner::new();
        mock.expect_run()
            .withf(|args, _| {
                args[0] == "push" && args[2] == "/sdcard/pcMedia/named.mp4"
            })
            .times(1)
            .returning(|_, _| Ok(ok_output("1 file pushed")));

        let name = catalog_with(mock)
            .upload(&local, Some("named.mp4"))
            .expect("upload");
        assert_eq!(name, "named.mp4");

        std::fs::remove_file(&local).ok();
    }

    #[test]
    fn test_upload_synthesizes_timestamped_name() {
        let local = std::env::temp_dir().join("aquahud_upload_autoname.mp4");
        std::fs::write(&local, b"fake video").expect("write temp file");

        let mut mock = MockShellRunner::new();
        mock.expect_run()
            .withf(|args, _| args[0] == "push")
            .times(1)
            .returning(|_, _| Ok(ok_output("1 file pushed")));

        let name = catalog_with(mock).upload(&local, None).expect("upload");

        // YYYY-MM-DD_HH-MM-SS-mmm.mp4
        assert_eq!(name.len(), "2024-01-01_00-00-00-000.mp4".len());
        assert!(name.ends_with(".mp4"));
        let digits: Vec<char> = name.chars().collect();
        for at in [4, 7, 10, 13, 16, 19] {
            assert!(
                matches!(digits[at], '-' | '_'),
                "separator expected at {at} in {name}"
            );
        }

        std::fs::remove_file(&local).ok();
    }

    #[test]
    fn test_upload_maps_nonzero_exit_to_transfer_error() {
        let local = std::env::temp_dir().join("aquahud_upload_fail.mp4");
        std::fs::write(&local, b"fake video").expect("write temp file");

        let mut mock = MockShellRunner::new();
        mock.expect_run()
            .times(1)
            .returning(|_, _| Ok(failed_output(1, "no space left")));

        let result = catalog_with(mock).upload(&local, Some("x.mp4"));
        assert!(matches!(result, Err(CatalogError::Transfer(_))));

        std::fs::remove_file(&local).ok();
    }

    #[test]
    fn test_download_prefers_user_root() {
        let mut mock = MockShellRunner::new();
        expect_listing(
            &mut mock,
            "/sdcard/pcMedia/both.mp4\n",
            "/sdcard/pcMediaPreset/both.mp4\n",
        );
        mock.expect_run()
            .withf(|args, _| args[0] == "pull" && args[1] == "/sdcard/pcMedia/both.mp4")
            .times(1)
            .returning(|_, _| Ok(ok_output("1 file pulled")));

        catalog_with(mock)
            .download("both.mp4", Path::new("/tmp/out.mp4"))
            .expect("download");
    }

    #[test]
    fn test_download_falls_back_to_preset_root() {
        let mut mock = MockShellRunner::new();
        expect_listing(&mut mock, "/sdcard/pcMedia/a.mp4\n", "/sdcard/pcMediaPreset/b.mp4\n");
        mock.expect_run()
            .withf(|args, _| args[0] == "pull" && args[1] == "/sdcard/pcMediaPreset/b.mp4")
            .times(1)
            .returning(|_, _| Ok(ok_output("1 file pulled")));

        catalog_with(mock)
            .download("b.mp4", Path::new("/tmp/out.mp4"))
            .expect("download");
    }

    #[test]
    fn test_download_unknown_file_is_not_found() {
        let mut mock = MockShellRunner::new();
        expect_listing(&mut mock, "", "");

        let result = catalog_with(mock).download("ghost.mp4", Path::new("/tmp/out.mp4"));
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_delete_removes_user_file() {
        let mut mock = MockShellRunner::new();
        expect_listing(&mut mock, "/sdcard/pcMedia/mine.mp4\n", "");
        mock.expect_run()
            .withf(|args, _| args[0] == "shell" && args[1] == "rm /sdcard/pcMedia/mine.mp4")
            .times(1)
            .returning(|_, _| Ok(ok_output("")));

        catalog_with(mock).delete("mine.mp4").expect("delete");
    }

    #[test]
    fn test_delete_preset_file_is_read_only() {
        let mut mock = MockShellRunner::new();
        expect_listing(&mut mock, "", "/sdcard/pcMediaPreset/factory.mp4\n");

        let result = catalog_with(mock).delete("factory.mp4");
        assert!(matches!(result, Err(CatalogError::ReadOnly(_))));
    }

    #[test]
    fn test_delete_unknown_file_is_not_found() {
        let mut mock = MockShellRunner::new();
        expect_listing(&mut mock, "", "");

        let result = catalog_with(mock).delete("ghost.mp4");
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_is_app_running_requires_nonempty_pidof_output() {
        let mut mock = MockShellRunner::new();
        mock.expect_run()
            .withf(|args, _| args[0] == "shell" && args[1].starts_with("pidof "))
            .times(1)
            .returning(|_, _| Ok(ok_output("1234\n")));
        assert!(catalog_with(mock).is_app_running());

        let mut mock = MockShellRunner::new();
        mock.expect_run()
            .times(1)
            .returning(|_, _| Ok(ok_output("")));
        assert!(!catalog_with(mock).is_app_running());
    }
}
