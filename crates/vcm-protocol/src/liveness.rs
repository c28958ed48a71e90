//! Recognition of "device exists" announcements.
//!
//! A separate announcer broadcasts `ff ff ff 01 ...` datagrams on the same
//! port. They are not protocol frames and must be dropped quietly instead of
//! being reported as malformed.

pub const LIVENESS_PREFIX: [u8; 4] = [0xff, 0xff, 0xff, 0x01];

pub fn is_liveness_announcement(bytes: &[u8]) -> bool {
    bytes.starts_with(&LIVENESS_PREFIX)
}
