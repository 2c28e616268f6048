//! Production [`HidTransport`] implementation over the `hidapi` library.

use std::time::Duration;

use hidapi::{HidApi, HidDevice};
use tracing::debug;

use super::{DeviceIdentity, HidTransport, TransportError};

/// Exclusive handle to the display's HID endpoint.
///
/// Owned by the [`super::session::DeviceSession`] for the whole process
/// lifetime; there is no reconnect path — a failed open or a dead handle is
/// surfaced to the caller.
pub struct HidApiTransport {
    device: HidDevice,
}

impl HidApiTransport {
    /// Enumerates the HID backend and opens the endpoint matching `identity`.
    ///
    /// # Errors
    ///
    /// [`TransportError::Open`] when the backend cannot be initialised,
    /// [`TransportError::DeviceNotFound`] when no attached device matches.
    pub fn open(identity: DeviceIdentity) -> Result<Self, TransportError> {
        let api = HidApi::new().map_err(|e| TransportError::Open(e.to_string()))?;
        let device = api
            .open(identity.vendor_id, identity.product_id)
            .map_err(|_| TransportError::DeviceNotFound {
                vendor_id: identity.vendor_id,
                product_id: identity.product_id,
            })?;
        debug!(
            vendor_id = format_args!("{:04X}", identity.vendor_id),
            product_id = format_args!("{:04X}", identity.product_id),
            "opened HID device"
        );
        Ok(Self { device })
    }
}

impl HidTransport for HidApiTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        self.device
            .write(data)
            .map_err(|e| TransportError::Write(e.to_string()))
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, TransportError> {
        // hidapi reports a timeout as a successful zero-byte read, which is
        // exactly the contract the trait requires.
        self.device
            .read_timeout(buf, timeout.as_millis() as i32)
            .map_err(|e| TransportError::Read(e.to_string()))
    }
}
