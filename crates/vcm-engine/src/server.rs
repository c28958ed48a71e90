//! UDP transport for the simulator.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::{SessionConfig, SimulatorConfig};
use crate::error::EngineResult;
use crate::router::SessionRouter;
use crate::session::Outbound;

/// Largest datagram the simulator will read.
pub const MAX_DATAGRAM_SIZE: usize = 2048;

const OUTBOUND_QUEUE_DEPTH: usize = 256;

/// How often each session's status is logged at debug level.
pub const STATUS_REPORT_PERIOD: Duration = Duration::from_secs(1);

pub struct UdpServer {
    socket: Arc<UdpSocket>,
    session_config: SessionConfig,
}

impl UdpServer {
    /// Bind the configured address.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::InvalidConfig`] for invalid session
    /// settings and [`crate::EngineError::Io`] if the socket cannot be bound.
    pub async fn bind(config: &SimulatorConfig) -> EngineResult<Self> {
        config.validate()?;
        let socket = UdpSocket::bind(config.bind_address).await?;
        info!(addr = %socket.local_addr()?, "VCM simulator listening");
        Ok(Self {
            socket: Arc::new(socket),
            session_config: config.session.clone(),
        })
    }

    /// # Errors
    ///
    /// Returns [`crate::EngineError::Io`] if the socket has no local address.
    pub fn local_addr(&self) -> EngineResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Serve until `shutdown` resolves, then stop every session and flush the
    /// outbound queue.
    ///
    /// # Errors
    ///
    /// Currently infallible once bound; receive and send failures are logged
    /// and the loop keeps serving.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> EngineResult<()> {
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Outbound>(OUTBOUND_QUEUE_DEPTH);
        let mut router = SessionRouter::new(self.session_config.clone(), outbound_tx);

        let writer_socket = Arc::clone(&self.socket);
        let writer = tokio::spawn(async move {
            while let Some(Outbound { peer, bytes }) = outbound_rx.recv().await {
                if let Err(e) = writer_socket.send_to(&bytes, peer).await {
                    error!(peer = %peer, error = %e, "UDP send failed");
                }
            }
            debug!("outbound writer finished");
        });

        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        tokio::pin!(shutdown);
        let mut status_report = tokio::time::interval(STATUS_REPORT_PERIOD);
        status_report.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, peer)) => match buf.get(..len) {
                        Some(datagram) => router.on_frame_received(peer, datagram),
                        None => warn!(peer = %peer, len, "datagram larger than receive buffer"),
                    },
                    // Some platforms report ICMP unreachable from an earlier send
                    // as a receive error; the socket is still usable.
                    Err(e) => error!(error = %e, "UDP receive failed"),
                },
                _ = status_report.tick() => log_status(&router),
            }
        }

        router.shutdown().await;
        if let Err(e) = writer.await {
            warn!(error = %e, "outbound writer task failed");
        }
        info!("VCM simulator stopped");
        Ok(())
    }
}

fn log_status(router: &SessionRouter) {
    for status in router.status() {
        debug!(
            peer = %status.peer,
            state = %status.state,
            awaiting = ?status.awaiting.map(|awaited| awaited.to_string()),
            broadcasting = status.broadcasting,
            "session status"
        );
    }
}
