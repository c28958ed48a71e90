//! VCM protocol error types.

use thiserror::Error;

/// Why a received datagram could not be decoded as a frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameDefect {
    #[error("truncated buffer: {actual} bytes, need at least {minimum}")]
    Truncated { minimum: usize, actual: usize },

    #[error("header mismatch: expected {expected}, got {actual}")]
    HeaderMismatch { expected: String, actual: String },

    #[error("length mismatch: header declares {declared}, payload carries {actual}")]
    LengthMismatch { declared: usize, actual: usize },
}

/// Why a WiFi credential could not be extracted from a credential frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialDefect {
    #[error("payload does not start with the command prefix")]
    MissingPrefix,

    #[error("payload ends before the credential length byte")]
    MissingLength,

    #[error("declared length {declared} exceeds the {available} remaining bytes")]
    Overrun { declared: usize, available: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Malformed frame: {0}")]
    MalformedFrame(#[from] FrameDefect),

    #[error("Malformed credential: {0}")]
    MalformedCredential(#[from] CredentialDefect),

    #[error("Payload too large: {len} bytes, at most {max} fit the length byte")]
    PayloadTooLarge { len: usize, max: usize },
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
