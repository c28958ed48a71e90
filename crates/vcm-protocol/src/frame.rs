//! Frame layout, payload classification and the byte codec.
//!
//! Every datagram exchanged between the VCM and the IHU is one frame:
//!
//! ```text
//! offset 0..6   header     7 bytes, family constant derived from the category
//! offset 7      length     3 (subheader) + 1 (sequence) + len(data)
//! offset 8..10  subheader  category (2 bytes) + operation (1 byte)
//! offset 11     sequence   echoed between a request and its response/ack
//! offset 12..   data       variable payload
//! ```
//!
//! The header is not free-form: captures show it is always
//! `00 | c0 | c0 & 0x0f | c1 | 00 00 00` for category bytes `c0 c1`
//! (`a40d` → `00a4040d000000`, `aa01` → `00aa0a01000000`). Decoding rejects
//! any other header.

use std::fmt;

use crate::error::{FrameDefect, ProtocolError, ProtocolResult};

pub const HEADER_LEN: usize = 7;
pub const SUBHEADER_LEN: usize = 3;

/// Header + length + subheader + sequence; the smallest decodable frame.
pub const MIN_FRAME_LEN: usize = HEADER_LEN + 1 + SUBHEADER_LEN + 1;

/// Bytes counted by the length field on top of the payload.
const LENGTH_OVERHEAD: usize = SUBHEADER_LEN + 1;

/// Largest payload whose length still fits the one-byte length field.
pub const MAX_DATA_LEN: usize = u8::MAX as usize - LENGTH_OVERHEAD;

/// Operation kind carried in the third subheader byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Request,
    Command,
    Broadcast,
    Other(u8),
}

impl Operation {
    pub const fn from_u8(val: u8) -> Self {
        match val {
            0x00 => Self::Request,
            0x02 => Self::Command,
            0x05 => Self::Broadcast,
            other => Self::Other(other),
        }
    }

    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Request => 0x00,
            Self::Command => 0x02,
            Self::Broadcast => 0x05,
            Self::Other(val) => val,
        }
    }
}

/// Three-byte message identifier: two category bytes plus the operation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subheader([u8; SUBHEADER_LEN]);

impl Subheader {
    pub const fn new(category: [u8; 2], operation: Operation) -> Self {
        let [c0, c1] = category;
        Self([c0, c1, operation.to_u8()])
    }

    pub const fn from_bytes(bytes: [u8; SUBHEADER_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> [u8; SUBHEADER_LEN] {
        self.0
    }

    pub const fn category(&self) -> [u8; 2] {
        let [c0, c1, _] = self.0;
        [c0, c1]
    }

    pub const fn operation(&self) -> Operation {
        let [_, _, op] = self.0;
        Operation::from_u8(op)
    }

    /// The protocol-family header every frame of this category carries.
    pub const fn family_header(&self) -> [u8; HEADER_LEN] {
        let [c0, c1, _] = self.0;
        [0x00, c0, c0 & 0x0f, c1, 0x00, 0x00, 0x00]
    }
}

impl fmt::Display for Subheader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Subheader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subheader({self})")
    }
}

/// Payload class, derived from the leading data bytes.
///
/// The IHU software pattern-matches on these prefixes, so they are part of
/// the wire contract rather than a convention of this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// `02 00 ..`
    Request,
    /// `02 02 ..`
    Command,
    /// `02 04 ..`
    Response,
    /// `02 05 ..`
    Broadcast,
    /// Exactly `02 70 00 00`.
    Acknowledgment,
    /// `02 e0 ..`
    Connecting,
    Unknown,
}

impl PayloadKind {
    pub fn classify(data: &[u8]) -> Self {
        match data {
            [0x02, 0x70, 0x00, 0x00] => Self::Acknowledgment,
            [0x02, 0x00, ..] => Self::Request,
            [0x02, 0x02, ..] => Self::Command,
            [0x02, 0x04, ..] => Self::Response,
            [0x02, 0x05, ..] => Self::Broadcast,
            [0x02, 0xe0, ..] => Self::Connecting,
            _ => Self::Unknown,
        }
    }

    /// Requests and commands both ask the receiver to act.
    pub const fn is_request_like(self) -> bool {
        matches!(self, Self::Request | Self::Command)
    }
}

/// One protocol message. Immutable once built; the length byte is never
/// stored and is recomputed on every encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    header: [u8; HEADER_LEN],
    subheader: Subheader,
    sequence: u8,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(subheader: Subheader, sequence: u8, data: impl Into<Vec<u8>>) -> Self {
        Self {
            header: subheader.family_header(),
            subheader,
            sequence,
            data: data.into(),
        }
    }

    /// Status broadcast; broadcasts always carry sequence `00`.
    pub fn broadcast(subheader: Subheader, data: impl Into<Vec<u8>>) -> Self {
        Self::new(subheader, 0x00, data)
    }

    /// A frame echoing this frame's header, subheader and sequence.
    pub fn reply(&self, data: impl Into<Vec<u8>>) -> Self {
        Self {
            header: self.header,
            subheader: self.subheader,
            sequence: self.sequence,
            data: data.into(),
        }
    }

    pub fn header(&self) -> [u8; HEADER_LEN] {
        self.header
    }

    pub fn subheader(&self) -> Subheader {
        self.subheader
    }

    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Value of the length field: subheader + sequence + payload.
    pub fn length(&self) -> usize {
        LENGTH_OVERHEAD.saturating_add(self.data.len())
    }

    pub fn payload_kind(&self) -> PayloadKind {
        PayloadKind::classify(&self.data)
    }

    pub fn is_acknowledgment(&self) -> bool {
        crate::ack::is_acknowledgment(self)
    }

    /// Serialize to wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::PayloadTooLarge`] when the payload exceeds
    /// [`MAX_DATA_LEN`].
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        let Ok(length) = u8::try_from(self.length()) else {
            return Err(ProtocolError::PayloadTooLarge {
                len: self.data.len(),
                max: MAX_DATA_LEN,
            });
        };

        let mut out = Vec::with_capacity(MIN_FRAME_LEN.saturating_add(self.data.len()));
        out.extend_from_slice(&self.header);
        out.push(length);
        out.extend_from_slice(&self.subheader.as_bytes());
        out.push(self.sequence);
        out.extend_from_slice(&self.data);
        Ok(out)
    }

    /// Parse wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedFrame`] when the buffer is shorter
    /// than [`MIN_FRAME_LEN`], the header is not the family header of the
    /// subheader, or the length byte disagrees with the bytes received.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        let truncated = || {
            ProtocolError::from(FrameDefect::Truncated {
                minimum: MIN_FRAME_LEN,
                actual: bytes.len(),
            })
        };

        let (header, rest) = bytes
            .split_first_chunk::<HEADER_LEN>()
            .ok_or_else(truncated)?;
        let (&declared, rest) = rest.split_first().ok_or_else(truncated)?;
        let (subheader, rest) = rest
            .split_first_chunk::<SUBHEADER_LEN>()
            .ok_or_else(truncated)?;
        let (&sequence, data) = rest.split_first().ok_or_else(truncated)?;

        let subheader = Subheader::from_bytes(*subheader);
        let expected = subheader.family_header();
        if *header != expected {
            return Err(FrameDefect::HeaderMismatch {
                expected: hex::encode(expected),
                actual: hex::encode(header),
            }
            .into());
        }

        let carried = LENGTH_OVERHEAD.saturating_add(data.len());
        if usize::from(declared) != carried {
            return Err(FrameDefect::LengthMismatch {
                declared: usize::from(declared),
                actual: carried,
            }
            .into());
        }

        Ok(Self {
            header: *header,
            subheader,
            sequence,
            data: data.to_vec(),
        })
    }
}

/// Renders the full wire image as lowercase hex.
impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let length = u8::try_from(self.length()).unwrap_or(u8::MAX);
        write!(
            f,
            "{}{length:02x}{}{:02x}{}",
            hex::encode(self.header),
            self.subheader,
            self.sequence,
            hex::encode(&self.data)
        )
    }
}

/// See [`Frame::decode`].
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedFrame`] for any malformed buffer.
pub fn decode(bytes: &[u8]) -> ProtocolResult<Frame> {
    Frame::decode(bytes)
}

/// See [`Frame::encode`].
///
/// # Errors
///
/// Returns [`ProtocolError::PayloadTooLarge`] for oversized payloads.
pub fn encode(frame: &Frame) -> ProtocolResult<Vec<u8>> {
    frame.encode()
}
