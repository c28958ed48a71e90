//! VCM/IHU UDP protocol: frame codec, acknowledgment discipline and the
//! captured message catalog.
//!
//! This crate is intentionally I/O-free. It provides pure functions and types
//! that can be tested and fuzzed without sockets; the state machine and
//! transport live in `vcm-engine`.

#![deny(static_mut_refs)]

pub mod ack;
pub mod credential;
pub mod error;
pub mod frame;
pub mod ids;
pub mod liveness;

pub use ack::{ACK_DATA, build_acknowledgment, is_acknowledgment};
pub use credential::{WifiCredential, extract_credential};
pub use error::{CredentialDefect, FrameDefect, ProtocolError, ProtocolResult};
pub use frame::{
    Frame, HEADER_LEN, MAX_DATA_LEN, MIN_FRAME_LEN, Operation, PayloadKind, SUBHEADER_LEN,
    Subheader, decode, encode,
};
pub use ids::{FIRST_VCM_SEQUENCE, payloads, status_flags, subheaders};
pub use liveness::{LIVENESS_PREFIX, is_liveness_announcement};
