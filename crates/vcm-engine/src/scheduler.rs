//! Periodic SSID broadcasts tied to session state.
//!
//! The scheduler holds no task of its own. The session polls
//! [`BroadcastScheduler::next_broadcast`] from its event loop; the future
//! stays pending while the session is outside a broadcast-eligible state, so
//! stopping the timer is just clearing the due instant.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;
use vcm_protocol::{Frame, payloads, subheaders};

use crate::state::VcmState;

pub const DEFAULT_BROADCAST_PERIOD: Duration = Duration::from_secs(5);

/// Which SSID broadcast the current state calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastKind {
    Scanning,
    Connected,
}

impl BroadcastKind {
    pub const fn for_state(state: VcmState) -> Option<Self> {
        match state {
            VcmState::WifiScanning => Some(Self::Scanning),
            VcmState::WifiConnected => Some(Self::Connected),
            _ => None,
        }
    }

    pub fn frame(self) -> Frame {
        let data = match self {
            Self::Scanning => payloads::SSID_SCANNING,
            Self::Connected => payloads::SSID_CONNECTED,
        };
        Frame::broadcast(subheaders::SSID_BROADCAST, data)
    }
}

#[derive(Debug)]
pub struct BroadcastScheduler {
    period: Duration,
    kind: Option<BroadcastKind>,
    next_due: Option<Instant>,
}

impl Default for BroadcastScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_BROADCAST_PERIOD)
    }
}

impl BroadcastScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            kind: None,
            next_due: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn kind(&self) -> Option<BroadcastKind> {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    /// Start, stop or retarget the timer for `state`.
    ///
    /// Entering an eligible state from an ineligible one starts the timer with
    /// an immediate first tick. Moving between eligible states keeps the
    /// running cadence and only switches the payload.
    pub fn sync(&mut self, state: VcmState) {
        match (self.kind, BroadcastKind::for_state(state)) {
            (None, None) => {}
            (Some(_), None) => self.stop(),
            (None, Some(kind)) => {
                let period_ms = self.period.as_millis();
                debug!(kind = ?kind, period_ms, "broadcast timer started");
                self.kind = Some(kind);
                self.next_due = Some(Instant::now());
            }
            (Some(current), Some(kind)) if current != kind => {
                debug!(from = ?current, to = ?kind, "broadcast payload switched");
                self.kind = Some(kind);
            }
            (Some(_), Some(_)) => {}
        }
    }

    pub fn stop(&mut self) {
        if self.kind.take().is_some() {
            debug!("broadcast timer stopped");
        }
        self.next_due = None;
    }

    /// Resolve at the next tick with the frame to send. Pending forever while
    /// stopped. Cancel-safe: dropping the future before it resolves leaves the
    /// schedule untouched.
    pub async fn next_broadcast(&mut self) -> Frame {
        let (Some(kind), Some(due)) = (self.kind, self.next_due) else {
            return std::future::pending().await;
        };
        tokio::time::sleep_until(due).await;
        self.next_due = due.checked_add(self.period);
        kind.frame()
    }
}
