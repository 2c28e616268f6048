//! # aquahud-core
//!
//! Shared protocol library for aquahud, a host-side driver for AIO
//! water-block displays that enumerate as a USB HID device.
//!
//! The display speaks a small framed binary protocol over HID interrupt
//! transfers.  Each exchange carries an ASCII pseudo-HTTP header followed by
//! a JSON body, wrapped in a length/checksum frame with marker-byte escaping.
//!
//! This crate defines:
//!
//! - **`protocol::packet`** – The packet codec: framing, byte escaping, the
//!   additive checksum, and the pseudo-HTTP header.  Pure functions over byte
//!   slices; no I/O and no OS dependencies.
//!
//! - **`protocol::sequence`** – The thread-safe sequence counter embedded in
//!   every outbound header so device-side logs can be correlated with host
//!   requests.
//!
//! - **`protocol::display`** – Typed serde models of the `POST config` JSON
//!   body that selects the played media and sets screen brightness.
//!
//! The host application crate (`aquahud-host`) layers the HID session, the
//! keepalive supervisor, and media management on top of this crate.

pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `aquahud_core::Packet` instead of `aquahud_core::protocol::packet::Packet`.
pub use protocol::display::DisplayConfig;
pub use protocol::packet::{Packet, PacketError};
pub use protocol::sequence::SequenceCounter;
