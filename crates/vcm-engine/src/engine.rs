//! Protocol state engine.
//!
//! The engine is I/O-free and clock-free. It consumes decoded substantive
//! frames (acknowledgments never reach it) and returns the frames to send, in
//! the order they must go out. Waiting for an IHU response is modelled as a
//! suspended [`Burst`]; the session owns the deadline and calls
//! [`StateEngine::on_await_timeout`] when it expires.

use tracing::{debug, info, warn};
use vcm_protocol::{
    FIRST_VCM_SEQUENCE, Frame, Subheader, WifiCredential, extract_credential, payloads,
    subheaders,
};

use crate::burst::{AwaitedResponse, Burst, BurstStep};
use crate::state::VcmState;

/// How the engine classified one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The frame was the response a suspended burst was waiting for.
    Resumed,
    /// Status ping, answered in any state.
    Ping,
    /// Response to a request the simulator sent without waiting.
    LateReply,
    SetupTriggered,
    CredentialReceived,
    /// Not expected in the current state. Acknowledged by the session, then
    /// ignored.
    Unhandled,
}

/// Outcome of [`StateEngine::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub dispatch: Dispatch,
    pub frames: Vec<Frame>,
}

impl Reaction {
    fn new(dispatch: Dispatch, frames: Vec<Frame>) -> Self {
        Self { dispatch, frames }
    }
}

// ── Handshake tracking ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
struct PingTracker {
    status_0d: bool,
    status_0f: bool,
}

impl PingTracker {
    fn observe(&mut self, subheader: Subheader) {
        if subheader == subheaders::PING_STATUS_0D {
            self.status_0d = true;
        } else if subheader == subheaders::PING_STATUS_0F {
            self.status_0f = true;
        }
    }

    fn complete(&self) -> bool {
        self.status_0d && self.status_0f
    }
}

// ── Engine ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct StateEngine {
    state: VcmState,
    history: Vec<VcmState>,
    pings: PingTracker,
    credential: Option<WifiCredential>,
    next_sequence: u8,
    burst: Burst,
    awaiting: Option<AwaitedResponse>,
    unawaited: Option<AwaitedResponse>,
}

impl Default for StateEngine {
    fn default() -> Self {
        Self::new(FIRST_VCM_SEQUENCE)
    }
}

impl StateEngine {
    /// Create an engine in `IDLE` whose first VCM-originated request uses
    /// `first_sequence`.
    pub fn new(first_sequence: u8) -> Self {
        Self {
            state: VcmState::Idle,
            history: vec![VcmState::Idle],
            pings: PingTracker::default(),
            credential: None,
            next_sequence: first_sequence,
            burst: Burst::new(),
            awaiting: None,
            unawaited: None,
        }
    }

    pub fn state(&self) -> VcmState {
        self.state
    }

    /// Every state entered so far, starting with `IDLE`.
    pub fn history(&self) -> &[VcmState] {
        &self.history
    }

    pub fn credential(&self) -> Option<&WifiCredential> {
        self.credential.as_ref()
    }

    pub fn awaiting(&self) -> Option<AwaitedResponse> {
        self.awaiting
    }

    /// True while a burst has steps left, suspended or not.
    pub fn burst_in_progress(&self) -> bool {
        self.awaiting.is_some() || !self.burst.is_empty()
    }

    /// React to one decoded, non-acknowledgment frame.
    pub fn handle(&mut self, frame: &Frame) -> Reaction {
        if self.awaiting.is_some_and(|awaited| awaited.matches(frame)) {
            debug!(frame = %frame, "awaited response arrived");
            self.awaiting = None;
            return Reaction::new(Dispatch::Resumed, self.drive());
        }

        if self.unawaited.is_some_and(|sent| sent.matches(frame)) {
            debug!(frame = %frame, "late reply to unawaited request");
            self.unawaited = None;
            return Reaction::new(Dispatch::LateReply, Vec::new());
        }

        let subheader = frame.subheader();
        let kind = frame.payload_kind();

        if subheaders::is_ping(subheader) && kind.is_request_like() {
            return Reaction::new(Dispatch::Ping, self.on_ping(frame));
        }

        match self.state {
            VcmState::Handshake
                if subheader == subheaders::SETUP_TRIGGER
                    && frame.data() == payloads::SETUP_START.as_slice() =>
            {
                Reaction::new(Dispatch::SetupTriggered, self.start_setup(frame))
            }
            VcmState::WifiScanning
                if subheader == subheaders::WIFI_CREDENTIAL && kind.is_request_like() =>
            {
                Reaction::new(Dispatch::CredentialReceived, self.start_connect(frame))
            }
            state => {
                warn!(
                    state = %state,
                    subheader = %subheader,
                    sequence = format_args!("{:02x}", frame.sequence()),
                    kind = ?kind,
                    "unhandled frame"
                );
                Reaction::new(Dispatch::Unhandled, Vec::new())
            }
        }
    }

    /// The IHU never answered the suspended request. Log it and carry on with
    /// the rest of the burst.
    pub fn on_await_timeout(&mut self) -> Vec<Frame> {
        match self.awaiting.take() {
            Some(awaited) => {
                warn!(
                    awaiting = %awaited,
                    state = %self.state,
                    "no response before deadline, continuing burst"
                );
                self.drive()
            }
            None => Vec::new(),
        }
    }

    /// Drop whatever is left of the current burst. Returns the number of
    /// steps discarded.
    pub fn abandon_burst(&mut self) -> usize {
        let dropped = self.burst.len();
        if self.awaiting.take().is_some() || dropped > 0 {
            debug!(dropped, state = %self.state, "burst abandoned");
        }
        self.burst = Burst::new();
        dropped
    }

    // ── Handlers ───────────────────────────────────────────────────────

    fn on_ping(&mut self, ping: &Frame) -> Vec<Frame> {
        let status = if ping.subheader() == subheaders::PING_STATUS_0D {
            payloads::PING_0D_STATUS.as_slice()
        } else {
            payloads::PING_0F_STATUS.as_slice()
        };
        let response = ping.reply(status);

        if self.state == VcmState::Idle {
            self.pings.observe(ping.subheader());
            if self.pings.complete() {
                self.transition(VcmState::Handshake);
            }
        }

        vec![response]
    }

    fn start_setup(&mut self, trigger: &Frame) -> Vec<Frame> {
        info!(sequence = format_args!("{:02x}", trigger.sequence()), "setup triggered");
        let burst = Burst::new()
            .enter(VcmState::Setup)
            .request(self.vcm_request(subheaders::SETUP_REQUEST_11, payloads::SETUP_SUB_REQUEST))
            .request(self.vcm_request(subheaders::SETUP_REQUEST_10, payloads::SETUP_SUB_REQUEST))
            .request(self.vcm_request(subheaders::SETUP_COMPLETION, payloads::SETUP_SUB_REQUEST))
            .emit(Frame::broadcast(
                subheaders::SETUP_STATUS_0A,
                payloads::STATUS_NOT_CONNECTED,
            ))
            .emit(Frame::broadcast(
                subheaders::SETUP_STATUS_00,
                payloads::STATUS_SETUP_MODE,
            ))
            .notify(self.vcm_request(subheaders::SETUP_COMPLETION, payloads::SETUP_IN_PROGRESS))
            .emit(trigger.reply(payloads::SETUP_COMPLETE))
            .enter(VcmState::WifiScanning);
        self.run(burst)
    }

    fn start_connect(&mut self, credential_frame: &Frame) -> Vec<Frame> {
        let accepted = match extract_credential(credential_frame.data()) {
            Ok(credential) => {
                info!(len = credential.len(), "WiFi credential received");
                self.credential = Some(credential);
                Some(credential_frame.reply(payloads::CREDENTIAL_ACCEPTED))
            }
            Err(e) => {
                warn!(error = %e, "credential frame malformed, connecting without it");
                None
            }
        };

        let burst = Burst::new()
            .enter(VcmState::WifiConnecting)
            .emit(credential_frame.reply(payloads::WIFI_CONNECTING))
            .emit(Frame::broadcast(
                subheaders::SETUP_STATUS_0A,
                payloads::STATUS_IN_PROGRESS,
            ))
            .emit_all(accepted)
            .emit(Frame::broadcast(
                subheaders::CONNECTION_INFO_AA01,
                payloads::STATUS_CONNECTED,
            ))
            .emit(Frame::broadcast(
                subheaders::CONNECTION_INFO_AA07,
                payloads::STATUS_CONNECTED,
            ))
            .emit(Frame::broadcast(
                subheaders::CONNECTION_INFO_AB01,
                payloads::STATUS_NOT_CONNECTED,
            ))
            .emit(Frame::broadcast(
                subheaders::WIFI_STATUS,
                payloads::WIFI_STATUS_REPORT,
            ))
            .request(self.vcm_request(subheaders::SETUP_COMPLETION, payloads::SETUP_IN_PROGRESS))
            .emit(Frame::broadcast(
                subheaders::WIFI_FINAL_STATUS,
                payloads::WIFI_FINAL_STATUS,
            ))
            .enter(VcmState::WifiConnected);
        self.run(burst)
    }

    // ── Burst execution ────────────────────────────────────────────────

    fn run(&mut self, burst: Burst) -> Vec<Frame> {
        if self.burst_in_progress() {
            warn!(state = %self.state, "new burst replaces an unfinished one");
            self.awaiting = None;
        }
        self.burst = burst;
        self.drive()
    }

    /// Drain steps until the burst finishes or suspends on a barrier.
    fn drive(&mut self) -> Vec<Frame> {
        let mut out = Vec::new();
        while let Some(step) = self.burst.pop() {
            match step {
                BurstStep::Emit(frame) => out.push(frame),
                BurstStep::Notify(request) => {
                    self.unawaited = Some(AwaitedResponse::for_request(&request));
                    out.push(request);
                }
                BurstStep::Enter(state) => self.transition(state),
                BurstStep::AwaitResponse(awaited) => {
                    debug!(awaiting = %awaited, "burst suspended");
                    self.awaiting = Some(awaited);
                    break;
                }
            }
        }
        out
    }

    fn transition(&mut self, next: VcmState) {
        if next == self.state {
            return;
        }
        if next < self.state {
            warn!(from = %self.state, to = %next, "refusing backward transition");
            return;
        }
        info!(from = %self.state, to = %next, "state transition");
        self.state = next;
        self.history.push(next);
    }

    fn vcm_request(&mut self, subheader: Subheader, data: [u8; 5]) -> Frame {
        let sequence = self.next_sequence;
        self.next_sequence = sequence.wrapping_add(1);
        Frame::new(subheader, sequence, data)
    }
}
