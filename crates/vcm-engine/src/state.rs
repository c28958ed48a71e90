//! Session states and their total order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// VCM operational state.
///
/// Declaration order is the protocol's progression order; the derived `Ord`
/// is what the forward-only guard compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VcmState {
    /// Waiting for the IHU's first pings.
    Idle,
    /// Both ping categories seen; waiting for the setup trigger.
    Handshake,
    /// Running the setup burst.
    Setup,
    /// Broadcasting scan results; waiting for a credential.
    WifiScanning,
    /// Running the connecting burst.
    WifiConnecting,
    /// Connected; terminal for this simulator.
    WifiConnected,
}

impl VcmState {
    pub const fn rank(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Handshake => 1,
            Self::Setup => 2,
            Self::WifiScanning => 3,
            Self::WifiConnecting => 4,
            Self::WifiConnected => 5,
        }
    }

    /// States in which the broadcast scheduler runs.
    pub const fn is_broadcast_eligible(self) -> bool {
        matches!(self, Self::WifiScanning | Self::WifiConnected)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Handshake => "HANDSHAKE",
            Self::Setup => "SETUP",
            Self::WifiScanning => "WIFI_SCANNING",
            Self::WifiConnecting => "WIFI_CONNECTING",
            Self::WifiConnected => "WIFI_CONNECTED",
        }
    }
}

impl fmt::Display for VcmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
