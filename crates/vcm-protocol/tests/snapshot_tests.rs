//! Byte-exact snapshots of catalog frames as they appear on the wire.

use insta::assert_snapshot;
use vcm_protocol::{Frame, build_acknowledgment, payloads, subheaders};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn wire(frame: &Frame) -> Result<String, Box<dyn std::error::Error>> {
    Ok(hex::encode(frame.encode()?))
}

#[test]
fn test_snapshot_scanning_broadcast() -> TestResult {
    let frame = Frame::broadcast(subheaders::SSID_BROADCAST, payloads::SSID_SCANNING);
    assert_snapshot!(wire(&frame)?, @"00a4040d00000012a40d05000205000000833a32b9ba30b9baa0");
    Ok(())
}

#[test]
fn test_snapshot_connected_broadcast() -> TestResult {
    let frame = Frame::broadcast(subheaders::SSID_BROADCAST, payloads::SSID_CONNECTED);
    assert_snapshot!(wire(&frame)?, @"00a4040d00000012a40d05000205000040a33a32b9ba30b9b8b0");
    Ok(())
}

#[test]
fn test_snapshot_ping_responses() -> TestResult {
    let ping_0d = Frame::new(subheaders::PING_STATUS_0D, 0x28, payloads::REQUEST);
    let ping_0f = Frame::new(subheaders::PING_STATUS_0F, 0x29, payloads::REQUEST);
    let status_0d = wire(&ping_0d.reply(payloads::PING_0D_STATUS))?;
    let status_0f = wire(&ping_0f.reply(payloads::PING_0F_STATUS))?;
    assert_snapshot!(status_0d, @"00a4040d0000000aa40d0028020400000000");
    assert_snapshot!(status_0f, @"00a3030f00000009a30f00290204000000");
    Ok(())
}

#[test]
fn test_snapshot_acknowledgment() -> TestResult {
    let trigger = Frame::new(subheaders::SETUP_TRIGGER, 0x32, payloads::SETUP_START);
    assert_snapshot!(wire(&trigger)?, @"00a4040000000009a40002320202000020");
    assert_snapshot!(wire(&build_acknowledgment(&trigger))?, @"00a4040000000008a400023202700000");
    Ok(())
}

#[test]
fn test_snapshot_connection_info() -> TestResult {
    let frame = Frame::broadcast(subheaders::CONNECTION_INFO_AA01, payloads::STATUS_CONNECTED);
    assert_snapshot!(wire(&frame)?, @"00aa0a0100000009aa0105000205000040");
    let frame = Frame::broadcast(subheaders::WIFI_FINAL_STATUS, payloads::WIFI_FINAL_STATUS);
    assert_snapshot!(wire(&frame)?, @"00a4040200000009a4020500020500001a");
    Ok(())
}
