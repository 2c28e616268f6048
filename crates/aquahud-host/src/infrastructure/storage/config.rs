//! Persistent device configuration.
//!
//! The configuration lives in a single JSON file next to the daemon.  Loading
//! is lenient: a missing or malformed file falls back to defaults, and a
//! partial file only overrides the fields it names.  The merged result is
//! written back immediately so the file on disk is always complete.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Media file used when the device exposes no presets at all.
pub const FALLBACK_MEDIA: &str = "RYUO_IV_HW_Info_01.mp4";

const DEFAULT_BRIGHTNESS: u8 = 200;
const DEFAULT_KEEPALIVE_INTERVAL: u64 = 1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot write config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

/// Effective device configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub brightness: u8,
    pub media: String,
    pub keepalive_interval: u64,
    pub send_system_data: bool,
}

impl DeviceConfig {
    /// Defaults for a device whose preset media is `preset_files`.
    ///
    /// The first preset becomes the default media; a device with no presets
    /// falls back to [`FALLBACK_MEDIA`].
    pub fn defaults(preset_files: &[String]) -> Self {
        let media = preset_files
            .first()
            .cloned()
            .unwrap_or_else(|| FALLBACK_MEDIA.to_string());
        Self {
            brightness: DEFAULT_BRIGHTNESS,
            media,
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            send_system_data: true,
        }
    }
}

/// On-disk shape: every field optional so a partial file merges over the
/// defaults instead of failing deserialization.
#[derive(Debug, Default, Deserialize)]
struct SavedConfig {
    brightness: Option<u8>,
    media: Option<String>,
    keepalive_interval: Option<u64>,
    send_system_data: Option<bool>,
}

/// JSON-file backed configuration store.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored configuration merged over `defaults` and persists the
    /// merged result.
    ///
    /// A missing file starts from the defaults; a malformed one is logged and
    /// replaced.  The keepalive interval is clamped to at least one second.
    pub fn load(&self, defaults: DeviceConfig) -> Result<DeviceConfig, ConfigError> {
        let saved = match fs::read_to_string(&self.path) {
            Ok(text) => match serde_json::from_str::<SavedConfig>(&text) {
                Ok(saved) => saved,
                Err(e) => {
                    warn!("ignoring malformed config file {}: {e}", self.path.display());
                    SavedConfig::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("no config file at {}, using defaults", self.path.display());
                SavedConfig::default()
            }
            Err(e) => {
                warn!("cannot read config file {}: {e}", self.path.display());
                SavedConfig::default()
            }
        };

        let config = DeviceConfig {
            brightness: saved.brightness.unwrap_or(defaults.brightness),
            media: saved.media.unwrap_or(defaults.media),
            keepalive_interval: saved
                .keepalive_interval
                .unwrap_or(defaults.keepalive_interval)
                .max(1),
            send_system_data: saved.send_system_data.unwrap_or(defaults.send_system_data),
        };

        self.save(&config)?;
        Ok(config)
    }

    /// Writes `config` to the backing file as pretty-printed JSON.
    pub fn save(&self, config: &DeviceConfig) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, text).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
