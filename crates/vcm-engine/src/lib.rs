//! VCM protocol simulator core.
//!
//! Drives one simulated vehicle connectivity module per IHU peer: the state
//! engine and its message bursts, the periodic SSID broadcasts, and the UDP
//! transport that routes datagrams to per-peer sessions.

#![deny(static_mut_refs)]

pub mod burst;
pub mod config;
pub mod engine;
pub mod error;
pub mod router;
pub mod scheduler;
pub mod server;
pub mod session;
pub mod state;

pub use burst::{AwaitedResponse, Burst, BurstStep};
pub use config::{DEFAULT_BIND_ADDRESS, SessionConfig, SimulatorConfig};
pub use engine::{Dispatch, Reaction, StateEngine};
pub use error::{EngineError, EngineResult};
pub use router::SessionRouter;
pub use scheduler::{BroadcastKind, BroadcastScheduler, DEFAULT_BROADCAST_PERIOD};
pub use server::{MAX_DATAGRAM_SIZE, STATUS_REPORT_PERIOD, UdpServer};
pub use session::{Outbound, Session, SessionStatus, run_session};
pub use state::VcmState;
