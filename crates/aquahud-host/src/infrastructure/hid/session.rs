//! Synchronous request/response session over the HID transport.
//!
//! The session owns the only handle to the display for the whole process
//! lifetime.  Both the foreground controller and the background keepalive
//! supervisor call through the same instance, so the transport sits behind a
//! `Mutex`: frames are never interleaved on the wire.
//!
//! The device does not pair every request with a response.  Configuration
//! pushes are answered after a short settle delay; keepalives may be answered
//! late, answered with an asynchronous state push, or not answered at all.
//! [`DeviceSession::send_keepalive`] therefore returns a tagged
//! [`KeepaliveReply`] instead of a plain packet.

use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use aquahud_core::{DisplayConfig, Packet, PacketError, SequenceCounter};

use super::hidapi_transport::HidApiTransport;
use super::{DeviceIdentity, HidTransport, TransportError};

/// Tunable timings and buffer size for a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Per-attempt blocking read timeout.
    pub read_timeout: Duration,
    /// Delay between a request write and the single response read.
    pub settle_delay: Duration,
    /// Sleep between the keepalive write and its read attempts; mirrors the
    /// supervisor's configured interval.
    pub keepalive_interval: Duration,
    /// Size of the read buffer, at least one full HID report.
    pub read_buffer: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(1),
            settle_delay: Duration::from_millis(100),
            keepalive_interval: Duration::from_secs(1),
            read_buffer: 1024,
        }
    }
}

/// Error type for session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Packet(#[from] PacketError),

    /// A request body could not be serialized.
    #[error("failed to serialize request body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome of one keepalive exchange.
///
/// Unparseable response bytes are an opaque payload, not an error: the device
/// occasionally pushes frames the host does not model, and dropping them
/// would hide data from the caller.  Silence is likewise not a failure — the
/// device may push state asynchronously later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeepaliveReply {
    /// The response parsed as a protocol packet.
    Packet(Packet),
    /// Bytes arrived but did not parse; returned verbatim.
    Raw(Vec<u8>),
    /// Both read attempts timed out.
    NoResponse,
}

/// The live session with the display.
///
/// Generic over [`HidTransport`] so every exchange can be tested against
/// [`super::mock::FakeTransport`].
pub struct DeviceSession<T: HidTransport> {
    transport: Mutex<T>,
    sequence: SequenceCounter,
    options: SessionOptions,
}

impl DeviceSession<HidApiTransport> {
    /// Opens the HID endpoint matching `identity` and wraps it in a session.
    ///
    /// # Errors
    ///
    /// Propagates [`TransportError::DeviceNotFound`] / [`TransportError::Open`]
    /// from the transport.
    pub fn connect(
        identity: DeviceIdentity,
        options: SessionOptions,
    ) -> Result<Self, TransportError> {
        let transport = HidApiTransport::open(identity)?;
        Ok(Self::with_transport(transport, options))
    }
}

impl<T: HidTransport> DeviceSession<T> {
    /// Wraps an already-open transport; the seam used by tests.
    pub fn with_transport(transport: T, options: SessionOptions) -> Self {
        Self {
            transport: Mutex::new(transport),
            sequence: SequenceCounter::new(),
            options,
        }
    }

    /// The sequence number the next outbound packet will carry.
    pub fn sequence(&self) -> u64 {
        self.sequence.current()
    }

    /// Writes one packet to the device.
    ///
    /// The sequence counter advances only when the transport write succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Write`] on transport failure.
    pub fn write(&self, packet: &Packet) -> Result<usize, TransportError> {
        let report = packet.report_bytes();
        let mut transport = self.transport.lock().expect("transport lock poisoned");
        let written = transport.write(&report)?;
        self.sequence.next();
        Ok(written)
    }

    /// Reads one report, blocking up to `timeout`.
    ///
    /// Returns an empty buffer when the timeout expires with no data; callers
    /// must treat empty as "no data", not as an error.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Read`] on transport failure.
    pub fn read(&self, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; self.options.read_buffer];
        let mut transport = self.transport.lock().expect("transport lock poisoned");
        let n = transport.read(&mut buf, timeout)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Writes `packet`, waits the settle delay, and performs one read.
    ///
    /// Propagates whatever the read returns, including an empty buffer.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on write or read failure.
    pub fn send_and_receive(&self, packet: &Packet) -> Result<Vec<u8>, TransportError> {
        self.write(packet)?;
        std::thread::sleep(self.options.settle_delay);
        self.read(self.options.read_timeout)
    }

    /// Performs one keepalive exchange: `POST conn` with an empty body, a
    /// sleep of the keepalive interval, then up to two read attempts.
    ///
    /// # Errors
    ///
    /// Only transport failures are errors; see [`KeepaliveReply`] for the
    /// non-error outcomes.
    pub fn send_keepalive(&self) -> Result<KeepaliveReply, SessionError> {
        let packet = Packet::encode("POST conn", b"", self.sequence.current())?;
        self.write(&packet)?;

        std::thread::sleep(self.options.keepalive_interval);

        for attempt in 0..2 {
            let response = self.read(self.options.read_timeout)?;
            if response.is_empty() {
                if attempt == 0 {
                    debug!("no keepalive response on first attempt, retrying");
                }
                continue;
            }
            return Ok(match Packet::decode(&response) {
                Ok(parsed) => KeepaliveReply::Packet(parsed),
                Err(e) => {
                    warn!("keepalive response failed to parse ({e}); returning raw bytes");
                    KeepaliveReply::Raw(response)
                }
            });
        }

        debug!("no keepalive response; the device may push state asynchronously");
        Ok(KeepaliveReply::NoResponse)
    }

    /// Pushes a host statistics sample as a `STATE all` packet.
    ///
    /// Returns `Ok(false)` without touching the transport when the collector
    /// supplied no data.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] on encode or transport failure.
    pub fn send_system_state(
        &self,
        status: Option<&serde_json::Value>,
    ) -> Result<bool, SessionError> {
        let Some(status) = status else {
            return Ok(false);
        };
        let body = serde_json::to_vec(status)?;
        let packet = Packet::encode("STATE all", &body, self.sequence.current())?;
        self.write(&packet)?;
        Ok(true)
    }

    /// Pushes a display configuration (`POST config`) selecting `media` at
    /// `brightness`, and returns the device's (possibly empty) response.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] on encode or transport failure.
    pub fn update_display(
        &self,
        media: &[String],
        brightness: u8,
    ) -> Result<Vec<u8>, SessionError> {
        let body = serde_json::to_vec(&DisplayConfig::new(media, brightness))?;
        let packet = Packet::encode("POST config", &body, self.sequence.current())?;
        Ok(self.send_and_receive(&packet)?)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
