//! One simulated VCM bound to one IHU peer.
//!
//! [`Session`] is synchronous: it turns a datagram into the frames to send,
//! applying the acknowledgment discipline before the state engine sees
//! anything. [`run_session`] is the per-peer event loop that serialises
//! inbound datagrams, await deadlines and broadcast ticks, publishing a
//! [`SessionStatus`] after every step.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use vcm_protocol::{Frame, build_acknowledgment, decode, is_liveness_announcement};

use crate::burst::AwaitedResponse;
use crate::config::SessionConfig;
use crate::engine::StateEngine;
use crate::error::EngineResult;
use crate::scheduler::BroadcastScheduler;
use crate::state::VcmState;

const MAX_LOGGED_BYTES: usize = 32;

/// One encoded datagram on its way to a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub peer: SocketAddr,
    pub bytes: Vec<u8>,
}

impl Outbound {
    /// Encode `frame` for `peer`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Protocol`] when the frame cannot be
    /// represented on the wire.
    pub fn encode(peer: SocketAddr, frame: &Frame) -> EngineResult<Self> {
        Ok(Self { peer, bytes: frame.encode()? })
    }
}

/// Point-in-time summary of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    pub peer: SocketAddr,
    pub state: VcmState,
    /// The response a suspended burst is waiting for.
    pub awaiting: Option<AwaitedResponse>,
    pub broadcasting: bool,
}

#[derive(Debug)]
pub struct Session {
    peer: SocketAddr,
    engine: StateEngine,
    scheduler: BroadcastScheduler,
    response_timeout: Duration,
    deadline: Option<(AwaitedResponse, Instant)>,
}

impl Session {
    pub fn new(peer: SocketAddr, config: &SessionConfig) -> Self {
        Self {
            peer,
            engine: StateEngine::new(config.first_sequence),
            scheduler: BroadcastScheduler::new(config.broadcast_interval()),
            response_timeout: config.response_timeout(),
            deadline: None,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn state(&self) -> VcmState {
        self.engine.state()
    }

    pub fn engine(&self) -> &StateEngine {
        &self.engine
    }

    pub fn scheduler(&self) -> &BroadcastScheduler {
        &self.scheduler
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            peer: self.peer,
            state: self.engine.state(),
            awaiting: self.engine.awaiting(),
            broadcasting: self.scheduler.is_active(),
        }
    }

    /// When the suspended burst gives up waiting, if one is suspended.
    pub fn await_deadline(&self) -> Option<Instant> {
        self.deadline.map(|(_, at)| at)
    }

    /// Process one inbound datagram and return the frames to send, in order.
    ///
    /// Acknowledgments are dropped. Every other decodable frame is
    /// acknowledged first, then handed to the engine.
    pub fn on_frame_received(&mut self, bytes: &[u8]) -> Vec<Frame> {
        if is_liveness_announcement(bytes) {
            debug!(len = bytes.len(), "dropping liveness announcement");
            return Vec::new();
        }

        let frame = match decode(bytes) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, bytes = %hex_preview(bytes), "discarding malformed datagram");
                return Vec::new();
            }
        };

        if frame.is_acknowledgment() {
            debug!(frame = %frame, "acknowledgment received");
            return Vec::new();
        }

        debug!(frame = %frame, "frame received");
        let mut out = vec![build_acknowledgment(&frame)];
        out.extend(self.engine.handle(&frame).frames);
        self.after_engine_step();
        out
    }

    /// The await deadline passed without a matching response.
    pub fn on_await_timeout(&mut self) -> Vec<Frame> {
        let out = self.engine.on_await_timeout();
        self.after_engine_step();
        out
    }

    /// Wait for the scheduler's next tick.
    pub async fn next_broadcast(&mut self) -> Frame {
        self.scheduler.next_broadcast().await
    }

    /// Stop the timer and abandon any suspended burst.
    pub fn shutdown(&mut self) {
        self.scheduler.stop();
        self.engine.abandon_burst();
        self.deadline = None;
    }

    fn after_engine_step(&mut self) {
        self.scheduler.sync(self.engine.state());

        let awaiting = self.engine.awaiting();
        if awaiting != self.deadline.map(|(awaited, _)| awaited) {
            self.deadline = awaiting.and_then(|awaited| {
                Instant::now()
                    .checked_add(self.response_timeout)
                    .map(|at| (awaited, at))
            });
        }
    }
}

fn hex_preview(bytes: &[u8]) -> String {
    match bytes.get(..MAX_LOGGED_BYTES) {
        Some(head) if bytes.len() > MAX_LOGGED_BYTES => format!("{}..", hex::encode(head)),
        _ => hex::encode(bytes),
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Encode and queue `frames`. Returns `false` once the outbound queue is gone.
async fn emit(outbound: &mpsc::Sender<Outbound>, peer: SocketAddr, frames: Vec<Frame>) -> bool {
    for frame in frames {
        let datagram = match Outbound::encode(peer, &frame) {
            Ok(datagram) => datagram,
            Err(e) => {
                warn!(error = %e, subheader = %frame.subheader(), "dropping unencodable frame");
                continue;
            }
        };
        debug!(frame = %frame, "frame sent");
        if outbound.send(datagram).await.is_err() {
            debug!("outbound queue closed");
            return false;
        }
    }
    true
}

// ── Event loop ─────────────────────────────────────────────────────────

/// Drive `session` until shutdown is signalled or its inbound queue closes.
///
/// Inbound datagrams take priority over timer events, so a response that
/// arrives together with its deadline still resumes the burst.
pub async fn run_session(
    mut session: Session,
    mut inbound: mpsc::Receiver<Vec<u8>>,
    outbound: mpsc::Sender<Outbound>,
    status: watch::Sender<SessionStatus>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let peer = session.peer();
    info!(peer = %peer, "session started");
    status.send_replace(session.status());

    loop {
        let frames = tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            datagram = inbound.recv() => match datagram {
                Some(bytes) => session.on_frame_received(&bytes),
                None => break,
            },
            () = deadline_elapsed(session.await_deadline()) => session.on_await_timeout(),
            frame = session.next_broadcast() => vec![frame],
        };

        status.send_replace(session.status());
        if !emit(&outbound, peer, frames).await {
            break;
        }
    }

    session.shutdown();
    status.send_replace(session.status());
    info!(peer = %peer, state = %session.state(), "session stopped");
}
