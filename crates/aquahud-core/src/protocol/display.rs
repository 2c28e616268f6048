//! Typed model of the `POST config` JSON body.
//!
//! The display expects a fixed-shape configuration object selecting the
//! played media, the brightness, and the system-info panels.  Field names on
//! the wire are camelCase; the body is serialized compactly (no whitespace).

use serde::{Deserialize, Serialize};

/// Top-level `POST config` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    /// Temperature unit shown on the system-info panels.
    pub temperature: String,
    pub water_block_screen: WaterBlockScreen,
    pub spec: HardwareSpec,
}

/// Screen enable/brightness block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WaterBlockScreen {
    pub enable: bool,
    pub display_in_sleep: bool,
    /// Backlight brightness, 0–255.
    pub brightness: u8,
    pub id: ScreenProfile,
}

/// The active screen profile: mode, media selection, and panel layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScreenProfile {
    pub id: String,
    pub screen_mode: String,
    pub play_mode: String,
    /// Basenames of the media files to play, in order.
    pub media: Vec<String>,
    pub settings: ProfileSettings,
    /// Names of the system-info panels shown alongside the media.
    pub sysinfo_display: Vec<String>,
    pub time_zone: String,
}

/// Cosmetic settings for the profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSettings {
    pub title_color: String,
    pub content_color: String,
    pub filter: MediaFilter,
    pub badges: Vec<String>,
}

/// Optional color filter laid over the media.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaFilter {
    /// Filter name; `null` disables the filter.
    pub value: Option<String>,
    pub opacity: u8,
}

/// Host hardware description strings shown on the spec panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HardwareSpec {
    pub cpu: String,
    pub gpu: String,
}

impl DisplayConfig {
    /// Builds the configuration payload the device expects for the given
    /// media selection and brightness, with the standard panel layout.
    pub fn new(media: &[String], brightness: u8) -> Self {
        Self {
            temperature: "Celsius".to_string(),
            water_block_screen: WaterBlockScreen {
                enable: true,
                display_in_sleep: true,
                brightness,
                id: ScreenProfile {
                    id: "Customization".to_string(),
                    screen_mode: "Full Screen".to_string(),
                    play_mode: "Single".to_string(),
                    media: media.to_vec(),
                    settings: ProfileSettings {
                        title_color: "#E5252B".to_string(),
                        content_color: "#FFFFFF".to_string(),
                        filter: MediaFilter {
                            value: None,
                            opacity: 100,
                        },
                        badges: Vec::new(),
                    },
                    sysinfo_display: vec![
                        "CPU Temperature".to_string(),
                        "GPU Temperature".to_string(),
                        "CPU Usage".to_string(),
                        "Date&Time".to_string(),
                        "GPU Usage".to_string(),
                        "Motherboard Temperature".to_string(),
                    ],
                    time_zone: "Europe/Rome".to_string(),
                },
            },
            spec: HardwareSpec {
                cpu: "Custom PC".to_string(),
                gpu: "Custom GPU".to_string(),
            },
        }
    }
}
