//! Ordered multi-frame bursts with response barriers.
//!
//! A burst is plain data: a queue of steps the engine drains until it hits an
//! [`BurstStep::AwaitResponse`] barrier. Keeping it as data lets the transition
//! table be inspected and tested without any I/O or timers.

use std::collections::VecDeque;
use std::fmt;

use vcm_protocol::{Frame, PayloadKind, Subheader};

use crate::state::VcmState;

/// The IHU response that releases a suspended burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AwaitedResponse {
    pub subheader: Subheader,
    pub sequence: u8,
}

impl AwaitedResponse {
    pub fn for_request(request: &Frame) -> Self {
        Self {
            subheader: request.subheader(),
            sequence: request.sequence(),
        }
    }

    /// Same subheader, same sequence, and a response payload. Anything else
    /// (stale sequences, duplicates, out-of-order replies) does not match.
    pub fn matches(&self, frame: &Frame) -> bool {
        frame.subheader() == self.subheader
            && frame.sequence() == self.sequence
            && frame.payload_kind() == PayloadKind::Response
    }
}

impl fmt::Display for AwaitedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:02x}", self.subheader, self.sequence)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BurstStep {
    Emit(Frame),
    /// A request whose response is not waited for.
    Notify(Frame),
    AwaitResponse(AwaitedResponse),
    Enter(VcmState),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Burst {
    steps: VecDeque<BurstStep>,
}

impl Burst {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(mut self, state: VcmState) -> Self {
        self.steps.push_back(BurstStep::Enter(state));
        self
    }

    pub fn emit(mut self, frame: Frame) -> Self {
        self.steps.push_back(BurstStep::Emit(frame));
        self
    }

    pub fn emit_all(mut self, frames: impl IntoIterator<Item = Frame>) -> Self {
        self.steps.extend(frames.into_iter().map(BurstStep::Emit));
        self
    }

    /// Emit `request`, then hold the rest of the burst until its response.
    pub fn request(mut self, request: Frame) -> Self {
        let awaited = AwaitedResponse::for_request(&request);
        self.steps.push_back(BurstStep::Emit(request));
        self.steps.push_back(BurstStep::AwaitResponse(awaited));
        self
    }

    /// Emit `request` and carry on; its response may turn up later.
    pub fn notify(mut self, request: Frame) -> Self {
        self.steps.push_back(BurstStep::Notify(request));
        self
    }

    pub fn steps(&self) -> impl Iterator<Item = &BurstStep> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub(crate) fn pop(&mut self) -> Option<BurstStep> {
        self.steps.pop_front()
    }
}
