//! HID transport infrastructure.
//!
//! The display enumerates as a vendor-defined USB HID device.  All protocol
//! traffic rides on HID interrupt reports: outbound frames are prefixed with
//! report ID `0x00`, inbound reads return fixed-size reports padded with
//! zeros after the trailing frame marker.
//!
//! # Testability
//!
//! The [`HidTransport`] trait is the narrow seam between the session logic
//! and the OS handle.  Production code uses [`hidapi_transport::HidApiTransport`];
//! tests use [`mock::FakeTransport`] to script exchanges without hardware.

use thiserror::Error;

pub mod hidapi_transport;
pub mod mock;
pub mod session;

/// USB identity of the display endpoint.
///
/// Passed explicitly at construction so tests and unusual hardware revisions
/// can substitute their own IDs; not a compile-time global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            vendor_id: 0x1C75,
            product_id: 0x1C76,
        }
    }
}

/// Error type for HID transport operations.
///
/// All variants are fatal to the session; read timeouts are **not** errors
/// and are reported as zero-length reads instead.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No attached device matched the requested identity.
    #[error("no HID device found with VID={vendor_id:04X} PID={product_id:04X}")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    /// The HID backend could not be initialised or the handle not opened.
    #[error("failed to open HID device: {0}")]
    Open(String),

    /// A write to the interrupt endpoint failed.
    #[error("HID write failed: {0}")]
    Write(String),

    /// A read from the interrupt endpoint failed (other than timing out).
    #[error("HID read failed: {0}")]
    Read(String),
}

/// Byte-level transport to the display endpoint.
///
/// Implementations block up to the stated timeout on reads and for the
/// duration of the transfer on writes.  A timed-out read returns `Ok(0)`.
pub trait HidTransport: Send {
    /// Writes one report (report ID included) and returns the byte count.
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Reads one report into `buf`, blocking up to `timeout`.
    ///
    /// Returns the number of bytes read; `0` means the timeout expired with
    /// no data, which callers must treat as "no data", not as a failure.
    fn read(&mut self, buf: &mut [u8], timeout: std::time::Duration)
        -> Result<usize, TransportError>;
}
