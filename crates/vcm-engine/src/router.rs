//! Peer-to-session routing.
//!
//! The router is the boundary between a transport and the protocol core: it
//! receives `(peer, bytes)` pairs, spawns one session task per new peer, and
//! hands every session the same outbound queue. Each session publishes its
//! [`SessionStatus`] on a watch channel the router keeps for snapshots.

use std::collections::HashMap;
use std::net::SocketAddr;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::config::SessionConfig;
use crate::session::{Outbound, Session, SessionStatus, run_session};

struct SessionHandle {
    inbound: mpsc::Sender<Vec<u8>>,
    status: watch::Receiver<SessionStatus>,
    task: JoinHandle<()>,
}

pub struct SessionRouter {
    config: SessionConfig,
    outbound: mpsc::Sender<Outbound>,
    shutdown: broadcast::Sender<()>,
    sessions: HashMap<SocketAddr, SessionHandle>,
}

impl SessionRouter {
    pub fn new(config: SessionConfig, outbound: mpsc::Sender<Outbound>) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            config,
            outbound,
            shutdown,
            sessions: HashMap::new(),
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn has_session(&self, peer: &SocketAddr) -> bool {
        self.sessions.contains_key(peer)
    }

    /// Latest status of every session, ordered by peer address.
    pub fn status(&self) -> Vec<SessionStatus> {
        let mut snapshot: Vec<SessionStatus> =
            self.sessions.values().map(|handle| *handle.status.borrow()).collect();
        snapshot.sort_by_key(|status| status.peer);
        snapshot
    }

    /// Route one datagram from `peer`, creating its session on first contact.
    ///
    /// Never waits: if the session's queue is full the datagram is dropped,
    /// as the network would have.
    pub fn on_frame_received(&mut self, peer: SocketAddr, bytes: &[u8]) {
        let handle = self
            .sessions
            .entry(peer)
            .or_insert_with(|| spawn_session(peer, &self.config, &self.outbound, &self.shutdown));

        match handle.inbound.try_send(bytes.to_vec()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(peer = %peer, "session queue full, dropping datagram");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(peer = %peer, "session has stopped, forgetting peer");
                self.sessions.remove(&peer);
            }
        }
    }

    /// Signal every session to stop and wait for their tasks to finish.
    pub async fn shutdown(mut self) {
        info!(sessions = self.sessions.len(), "stopping sessions");
        if self.shutdown.send(()).is_err() {
            debug!("no session tasks listening for shutdown");
        }

        for (peer, handle) in self.sessions.drain() {
            drop(handle.inbound);
            if let Err(e) = handle.task.await {
                warn!(peer = %peer, error = %e, "session task failed");
            }
        }
    }
}

fn spawn_session(
    peer: SocketAddr,
    config: &SessionConfig,
    outbound: &mpsc::Sender<Outbound>,
    shutdown: &broadcast::Sender<()>,
) -> SessionHandle {
    let (inbound, inbound_rx) = mpsc::channel(config.inbound_queue_depth);
    let session = Session::new(peer, config);
    let (status_tx, status) = watch::channel(session.status());
    let task = tokio::spawn(
        run_session(session, inbound_rx, outbound.clone(), status_tx, shutdown.subscribe())
            .instrument(info_span!("session", peer = %peer)),
    );
    SessionHandle {
        inbound,
        status,
        task,
    }
}
