//! Acknowledgment discipline.
//!
//! Every substantive frame is answered by exactly one acknowledgment echoing
//! its header, subheader and sequence. Acknowledgments themselves are never
//! answered; checking [`is_acknowledgment`] before any other processing is
//! the only thing standing between two peers and an endless ack ping-pong.

use crate::frame::Frame;

/// Reserved payload marking a frame as an acknowledgment.
pub const ACK_DATA: [u8; 4] = [0x02, 0x70, 0x00, 0x00];

pub fn is_acknowledgment(frame: &Frame) -> bool {
    frame.data() == ACK_DATA
}

/// Acknowledgment for `frame`: same header, subheader and sequence, data
/// replaced by [`ACK_DATA`].
pub fn build_acknowledgment(frame: &Frame) -> Frame {
    frame.reply(ACK_DATA)
}
