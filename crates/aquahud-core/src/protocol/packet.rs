//! Packet codec for the water-block display protocol.
//!
//! Wire format:
//! ```text
//! [report_id:1]  0x5A  escaped( [length:2 BE] [payload:N] [checksum:1] )  0x5A
//! ```
//!
//! - `length` counts the length field itself plus the payload (`N + 2`).
//! - `checksum` is the additive sum mod 256 of `length || payload`.
//! - The body between the two `MAGIC` markers is byte-escaped so that a
//!   marker can never appear inside a frame: `0x5A` becomes `5B 01` and
//!   `0x5B` becomes `5B 02`.
//!
//! The payload itself is an ASCII pseudo-HTTP header block terminated by a
//! blank line (`\r\n\r\n`), followed by a UTF-8 JSON body:
//!
//! ```text
//! POST config 1\r\n
//! SeqNumber=17\r\n
//! Date=1735689600000\r\n
//! ContentType=json\r\n
//! ContentLength=42\r\n
//! \r\n
//! {"temperature":"Celsius", ... }
//! ```
//!
//! Encoding is deterministic apart from the `Date` field; [`Packet::encode_at`]
//! takes an explicit timestamp so tests can build byte-exact frames.

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

/// Frame marker byte present at both ends of every packet.
pub const MAGIC: u8 = 0x5A;
/// Escape introducer byte inside the frame body.
pub const ESCAPE: u8 = 0x5B;
/// HID report ID prepended to outbound frames.
pub const REPORT_ID: u8 = 0x00;

const ESCAPED_MAGIC: u8 = 0x01;
const ESCAPED_ESCAPE: u8 = 0x02;

/// Separator between the pseudo-HTTP header block and the JSON body.
const HEADER_SEPARATOR: &[u8] = b"\r\n\r\n";

/// Errors that can occur while encoding or decoding a packet.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    /// The payload does not fit in the 16-bit length field.
    #[error("payload too large: {size} bytes exceeds the 16-bit length field")]
    PayloadTooLarge { size: usize },

    /// The frame is missing a marker or the body is structurally invalid.
    #[error("invalid framing: {0}")]
    Framing(&'static str),

    /// An escape introducer was followed by an unrecognized code.
    #[error("unrecognized escape code: 0x{0:02X}")]
    Escape(u8),

    /// The trailing checksum byte does not match the recomputed sum.
    #[error("checksum mismatch: computed 0x{computed:02X}, received 0x{received:02X}")]
    ChecksumMismatch { computed: u8, received: u8 },
}

/// A decoded or freshly built protocol packet.
///
/// Immutable once constructed, either from an outbound method + JSON pair
/// ([`Packet::encode`]) or from raw transport bytes ([`Packet::decode`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    length: u16,
    payload: Vec<u8>,
}

impl Packet {
    /// Builds an outbound packet for `method` (e.g. `"POST conn"`) carrying
    /// `body` as the JSON payload, stamped with the current system time.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::PayloadTooLarge`] when header + body overflow
    /// the 16-bit length field.
    pub fn encode(method: &str, body: &[u8], sequence: u64) -> Result<Self, PacketError> {
        let epoch_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self::encode_at(method, body, sequence, epoch_millis)
    }

    /// Like [`Packet::encode`] but with an explicit `Date` timestamp, so the
    /// resulting bytes are fully deterministic.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::PayloadTooLarge`] when header + body overflow
    /// the 16-bit length field.
    pub fn encode_at(
        method: &str,
        body: &[u8],
        sequence: u64,
        epoch_millis: u64,
    ) -> Result<Self, PacketError> {
        let header = format!(
            "{method} 1\r\nSeqNumber={sequence}\r\nDate={epoch_millis}\r\nContentType=json\r\nContentLength={}\r\n\r\n",
            body.len()
        );

        let mut payload = Vec::with_capacity(header.len() + body.len());
        payload.extend_from_slice(header.as_bytes());
        payload.extend_from_slice(body);

        // `length` covers itself (2 bytes) plus the payload.
        let length = payload
            .len()
            .checked_add(2)
            .filter(|&n| n <= u16::MAX as usize)
            .ok_or(PacketError::PayloadTooLarge {
                size: payload.len(),
            })? as u16;

        Ok(Self { length, payload })
    }

    /// Parses a packet from raw bytes read off the transport.
    ///
    /// HID reads return fixed-size reports, so a frame is usually followed by
    /// zero padding; everything after the last `MAGIC` occurrence is trimmed
    /// before validation.
    ///
    /// # Errors
    ///
    /// - [`PacketError::Framing`] – missing/misplaced markers, or a declared
    ///   length that extends past the decoded body.
    /// - [`PacketError::Escape`] – an escape introducer followed by an
    ///   unknown code.
    /// - [`PacketError::ChecksumMismatch`] – the trailing checksum byte does
    ///   not match the additive sum of `length || payload`.
    pub fn decode(raw: &[u8]) -> Result<Self, PacketError> {
        // Trailing padding/noise defense: keep only up to the last marker.
        let raw = match raw.iter().rposition(|&b| b == MAGIC) {
            Some(last) => &raw[..=last],
            None => raw,
        };

        if raw.len() < 2 {
            return Err(PacketError::Framing("frame shorter than two marker bytes"));
        }
        if raw[0] != MAGIC || raw[raw.len() - 1] != MAGIC {
            return Err(PacketError::Framing("missing leading or trailing marker"));
        }

        let unescaped = unescape(&raw[1..raw.len() - 1])?;
        if unescaped.len() < 3 {
            return Err(PacketError::Framing("body shorter than length + checksum"));
        }

        let (body, checksum_byte) = unescaped.split_at(unescaped.len() - 1);
        let received = checksum_byte[0];
        let computed = checksum(body);
        if computed != received {
            return Err(PacketError::ChecksumMismatch { computed, received });
        }

        let length = u16::from_be_bytes([body[0], body[1]]);
        let end = length as usize;
        if end < 2 || end > body.len() {
            return Err(PacketError::Framing("declared length exceeds frame body"));
        }

        // Bytes between `end` and the checksum are tolerated and dropped;
        // the declared length is authoritative for the payload extent.
        Ok(Self {
            length,
            payload: body[2..end].to_vec(),
        })
    }

    /// The declared length field (payload size + 2).
    pub fn length(&self) -> u16 {
        self.length
    }

    /// The full payload: pseudo-HTTP header block plus JSON body.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The pseudo-HTTP header block, up to (excluding) the blank line.
    ///
    /// When the payload carries no separator the whole payload is treated as
    /// header text.
    pub fn header(&self) -> &[u8] {
        match find_separator(&self.payload) {
            Some(at) => &self.payload[..at],
            None => &self.payload,
        }
    }

    /// The JSON body following the blank line; empty when the payload has no
    /// separator.
    pub fn body(&self) -> &[u8] {
        match find_separator(&self.payload) {
            Some(at) => &self.payload[at + HEADER_SEPARATOR.len()..],
            None => &[],
        }
    }

    /// The marker-framed, escaped wire bytes (without the HID report ID).
    pub fn framed_bytes(&self) -> Vec<u8> {
        let mut unframed = Vec::with_capacity(self.payload.len() + 3);
        unframed.extend_from_slice(&self.length.to_be_bytes());
        unframed.extend_from_slice(&self.payload);
        unframed.push(checksum(&unframed));

        let escaped = escape(&unframed);
        let mut framed = Vec::with_capacity(escaped.len() + 2);
        framed.push(MAGIC);
        framed.extend_from_slice(&escaped);
        framed.push(MAGIC);
        framed
    }

    /// The wire bytes prefixed with the HID report ID, ready for a HID write.
    pub fn report_bytes(&self) -> Vec<u8> {
        let framed = self.framed_bytes();
        let mut report = Vec::with_capacity(framed.len() + 1);
        report.push(REPORT_ID);
        report.extend_from_slice(&framed);
        report
    }
}

/// Additive checksum mod 256 over `data`.
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

/// Substitutes marker and escape bytes with two-byte escape sequences.
///
/// The inverse of [`unescape`]: `unescape(&escape(x)) == x` for any `x`.
pub fn escape(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for &b in data {
        match b {
            MAGIC => out.extend_from_slice(&[ESCAPE, ESCAPED_MAGIC]),
            ESCAPE => out.extend_from_slice(&[ESCAPE, ESCAPED_ESCAPE]),
            other => out.push(other),
        }
    }
    out
}

/// Reverses [`escape`].
///
/// # Errors
///
/// Returns [`PacketError::Escape`] when an escape introducer is followed by
/// an unknown code, and [`PacketError::Framing`] when the data ends in the
/// middle of an escape sequence.
pub fn unescape(data: &[u8]) -> Result<Vec<u8>, PacketError> {
    let mut out = Vec::with_capacity(data.len());
    let mut iter = data.iter();
    while let Some(&b) = iter.next() {
        if b != ESCAPE {
            out.push(b);
            continue;
        }
        match iter.next() {
            Some(&ESCAPED_MAGIC) => out.push(MAGIC),
            Some(&ESCAPED_ESCAPE) => out.push(ESCAPE),
            Some(&code) => return Err(PacketError::Escape(code)),
            None => return Err(PacketError::Framing("truncated escape sequence")),
        }
    }
    Ok(out)
}

fn find_separator(payload: &[u8]) -> Option<usize> {
    payload
        .windows(HEADER_SEPARATOR.len())
        .position(|w| w == HEADER_SEPARATOR)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
