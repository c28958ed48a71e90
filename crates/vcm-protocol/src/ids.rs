//! Subheader catalog, status flags and payload constants.
//!
//! All values come from packet captures of a real VCM during a WiFi-enable
//! handshake. The IHU pattern-matches on them byte for byte, so they are
//! reproduced exactly; nothing here is derived or negotiable.

use crate::frame::{Operation, Subheader};

/// First sequence number the VCM uses for requests it initiates. Captures
/// show `0x50`, `0x51`, `0x52`, ...; the IHU does not appear to depend on
/// the exact value.
pub const FIRST_VCM_SEQUENCE: u8 = 0x50;

/// Known subheaders.
pub mod subheaders {
    use super::{Operation, Subheader};

    // ── Handshake ───────────────────────────────────────────────────────────
    pub const PING_STATUS_0D: Subheader = Subheader::new([0xa4, 0x0d], Operation::Request);
    pub const PING_STATUS_0F: Subheader = Subheader::new([0xa3, 0x0f], Operation::Request);

    // ── Setup ───────────────────────────────────────────────────────────────
    /// Setup trigger from the IHU; the VCM's completion echoes it.
    pub const SETUP_TRIGGER: Subheader = Subheader::new([0xa4, 0x00], Operation::Command);
    pub const SETUP_REQUEST_11: Subheader = Subheader::new([0xa3, 0x11], Operation::Command);
    pub const SETUP_REQUEST_10: Subheader = Subheader::new([0xa3, 0x10], Operation::Command);
    /// Setup sub-request 3, also reused as the connection-complete command.
    pub const SETUP_COMPLETION: Subheader = Subheader::new([0xa3, 0x08], Operation::Command);
    pub const SETUP_STATUS_0A: Subheader = Subheader::new([0xa3, 0x0a], Operation::Broadcast);
    pub const SETUP_STATUS_00: Subheader = Subheader::new([0xa4, 0x00], Operation::Broadcast);

    // ── WiFi ────────────────────────────────────────────────────────────────
    pub const SSID_BROADCAST: Subheader = Subheader::new([0xa4, 0x0d], Operation::Broadcast);
    pub const WIFI_CREDENTIAL: Subheader = Subheader::new([0xa4, 0x08], Operation::Command);
    pub const WIFI_STATUS: Subheader = Subheader::new([0xa4, 0x08], Operation::Broadcast);
    pub const WIFI_FINAL_STATUS: Subheader = Subheader::new([0xa4, 0x02], Operation::Broadcast);

    // ── Connection info ─────────────────────────────────────────────────────
    pub const CONNECTION_INFO_AA01: Subheader = Subheader::new([0xaa, 0x01], Operation::Broadcast);
    pub const CONNECTION_INFO_AA07: Subheader = Subheader::new([0xaa, 0x07], Operation::Broadcast);
    pub const CONNECTION_INFO_AB01: Subheader = Subheader::new([0xab, 0x01], Operation::Broadcast);

    /// Either of the two ping-status subheaders the IHU polls with.
    pub fn is_ping(subheader: Subheader) -> bool {
        subheader == PING_STATUS_0D || subheader == PING_STATUS_0F
    }
}

/// Status flag byte embedded in broadcasts, commands and responses.
pub mod status_flags {
    pub const NOT_CONNECTED: u8 = 0x00;
    pub const SETUP_MODE: u8 = 0x20;
    pub const CONNECTED: u8 = 0x40;
    pub const IN_PROGRESS: u8 = 0x80;
}

/// Payload constants.
pub mod payloads {
    use super::status_flags::{CONNECTED, IN_PROGRESS, NOT_CONNECTED, SETUP_MODE};

    pub const fn command(flag: u8) -> [u8; 5] {
        [0x02, 0x02, 0x00, 0x00, flag]
    }

    pub const fn response(flag: u8) -> [u8; 5] {
        [0x02, 0x04, 0x00, 0x00, flag]
    }

    pub const fn status_broadcast(flag: u8) -> [u8; 5] {
        [0x02, 0x05, 0x00, 0x00, flag]
    }

    pub const REQUEST: [u8; 4] = [0x02, 0x00, 0x00, 0x00];

    // ── Handshake ───────────────────────────────────────────────────────────
    pub const PING_0D_STATUS: [u8; 6] = [0x02, 0x04, 0x00, 0x00, 0x00, 0x00];
    pub const PING_0F_STATUS: [u8; 5] = response(NOT_CONNECTED);

    // ── Setup ───────────────────────────────────────────────────────────────
    pub const SETUP_START: [u8; 5] = command(SETUP_MODE);
    pub const SETUP_SUB_REQUEST: [u8; 5] = command(NOT_CONNECTED);
    pub const SETUP_IN_PROGRESS: [u8; 5] = command(IN_PROGRESS);
    pub const SETUP_COMPLETE: [u8; 5] = response(SETUP_MODE);
    pub const STATUS_NOT_CONNECTED: [u8; 5] = status_broadcast(NOT_CONNECTED);
    pub const STATUS_SETUP_MODE: [u8; 5] = status_broadcast(SETUP_MODE);
    pub const STATUS_CONNECTED: [u8; 5] = status_broadcast(CONNECTED);
    pub const STATUS_IN_PROGRESS: [u8; 5] = status_broadcast(IN_PROGRESS);

    // ── SSID broadcasts ─────────────────────────────────────────────────────
    pub const SSID_SCANNING: [u8; 14] = [
        0x02, 0x05, 0x00, 0x00, NOT_CONNECTED, 0x83, 0x3a, 0x32, 0xb9, 0xba, 0x30, 0xb9, 0xba,
        0xa0,
    ];
    pub const SSID_CONNECTED: [u8; 14] = [
        0x02, 0x05, 0x00, 0x00, CONNECTED, 0xa3, 0x3a, 0x32, 0xb9, 0xba, 0x30, 0xb9, 0xb8, 0xb0,
    ];

    // ── Connecting ──────────────────────────────────────────────────────────
    pub const WIFI_CONNECTING: [u8; 5] = [0x02, 0xe0, 0x00, 0x00, 0x48];
    pub const CREDENTIAL_ACCEPTED: [u8; 12] = [
        0x02, 0x04, 0x00, 0x00, 0x0c, 0xe8, 0xca, 0xe6, 0xe8, 0xc2, 0xe6, 0x80,
    ];
    pub const WIFI_STATUS_REPORT: [u8; 12] = [
        0x02, 0x05, 0x00, 0x00, 0x0c, 0xe8, 0xca, 0xe6, 0xe8, 0xc2, 0xe6, 0x80,
    ];
    pub const WIFI_FINAL_STATUS: [u8; 5] = [0x02, 0x05, 0x00, 0x00, 0x1a];
}
