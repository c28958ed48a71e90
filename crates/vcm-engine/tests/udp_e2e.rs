//! Loopback UDP exchange against a running [`UdpServer`].

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tracing_test::traced_test;
use vcm_engine::{STATUS_REPORT_PERIOD, SessionConfig, SimulatorConfig, UdpServer};
use vcm_protocol::{Frame, PayloadKind, build_acknowledgment, decode, payloads, subheaders};

type TestResult = Result<(), Box<dyn std::error::Error>>;

async fn recv_frame(socket: &UdpSocket) -> Result<Frame, Box<dyn std::error::Error>> {
    let mut buf = [0u8; 512];
    let len = tokio::time::timeout(Duration::from_secs(5), socket.recv(&mut buf)).await??;
    Ok(decode(buf.get(..len).ok_or("datagram overran buffer")?)?)
}

async fn send_frame(socket: &UdpSocket, frame: &Frame) -> TestResult {
    socket.send(&frame.encode()?).await?;
    Ok(())
}

#[tokio::test]
async fn test_handshake_and_setup_over_loopback() -> TestResult {
    let config = SimulatorConfig {
        bind_address: SocketAddr::from(([127, 0, 0, 1], 0)),
        session: SessionConfig::default(),
    };
    let server = UdpServer::bind(&config).await?;
    let server_addr = server.local_addr()?;
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server_task = tokio::spawn(server.run(async { stop_rx.await.unwrap_or_default() }));

    let ihu = UdpSocket::bind("127.0.0.1:0").await?;
    ihu.connect(server_addr).await?;

    // Liveness chatter is ignored without a reply.
    ihu.send(&[0xff, 0xff, 0xff, 0x01, 0x00, 0x00, 0x00, 0x00]).await?;

    let pings = [(subheaders::PING_STATUS_0D, 0x11), (subheaders::PING_STATUS_0F, 0x12)];
    for (subheader, sequence) in pings {
        let ping = Frame::new(subheader, sequence, payloads::REQUEST);
        send_frame(&ihu, &ping).await?;
        assert_eq!(recv_frame(&ihu).await?, build_acknowledgment(&ping));
        let status = recv_frame(&ihu).await?;
        assert_eq!(status.subheader(), subheader);
        assert_eq!(status.sequence(), sequence);
        assert_eq!(status.payload_kind(), PayloadKind::Response);
    }

    let trigger = Frame::new(subheaders::SETUP_TRIGGER, 0x13, payloads::SETUP_START);
    send_frame(&ihu, &trigger).await?;
    assert_eq!(recv_frame(&ihu).await?, build_acknowledgment(&trigger));
    let request = recv_frame(&ihu).await?;
    assert_eq!(request.subheader(), subheaders::SETUP_REQUEST_11);
    assert_eq!(request.sequence(), 0x50);

    // Acknowledging the simulator's request does not count as the response.
    send_frame(&ihu, &build_acknowledgment(&request)).await?;
    let response = request.reply(payloads::response(0x00));
    send_frame(&ihu, &response).await?;
    assert_eq!(recv_frame(&ihu).await?, build_acknowledgment(&response));
    assert_eq!(recv_frame(&ihu).await?.subheader(), subheaders::SETUP_REQUEST_10);

    stop_tx.send(()).map_err(|()| "server already stopped")?;
    server_task.await??;
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn test_session_status_reported_periodically() -> TestResult {
    let config = SimulatorConfig {
        bind_address: SocketAddr::from(([127, 0, 0, 1], 0)),
        session: SessionConfig::default(),
    };
    let server = UdpServer::bind(&config).await?;
    let server_addr = server.local_addr()?;
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let ihu = async {
        let ihu = UdpSocket::bind("127.0.0.1:0").await?;
        ihu.connect(server_addr).await?;
        let ping = Frame::new(subheaders::PING_STATUS_0D, 0x21, payloads::REQUEST);
        send_frame(&ihu, &ping).await?;
        assert_eq!(recv_frame(&ihu).await?, build_acknowledgment(&ping));
        recv_frame(&ihu).await?;

        tokio::time::sleep(STATUS_REPORT_PERIOD.saturating_mul(2)).await;
        stop_tx.send(()).map_err(|()| "server already stopped")?;
        Ok::<_, Box<dyn std::error::Error>>(())
    };

    // Run the server on this task so its reports land in this test's span.
    let (served, exchanged) =
        tokio::join!(server.run(async { stop_rx.await.unwrap_or_default() }), ihu);
    served?;
    exchanged?;

    assert!(logs_contain("session status"));
    assert!(logs_contain("state=IDLE"));
    assert!(logs_contain("broadcasting=false"));
    Ok(())
}

#[tokio::test]
async fn test_bind_rejects_invalid_config() {
    let mut config = SimulatorConfig {
        bind_address: SocketAddr::from(([127, 0, 0, 1], 0)),
        session: SessionConfig::default(),
    };
    config.session.inbound_queue_depth = 0;
    assert!(UdpServer::bind(&config).await.is_err());
}
