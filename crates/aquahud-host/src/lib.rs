//! aquahud-host library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.

pub mod application;
pub mod infrastructure;

pub use application::controller::{ControllerError, DeviceController};
pub use application::keepalive::{KeepaliveSupervisor, StatusSource, SupervisorSettings};
pub use infrastructure::hid::session::{DeviceSession, KeepaliveReply, SessionOptions};
pub use infrastructure::hid::{DeviceIdentity, HidTransport, TransportError};
pub use infrastructure::media::{CatalogError, MediaCatalog, MediaListing, MediaRoots};
pub use infrastructure::shell::adb::AdbShell;
pub use infrastructure::shell::{ShellError, ShellOutput, ShellRunner};
pub use infrastructure::storage::config::{ConfigStore, DeviceConfig};
