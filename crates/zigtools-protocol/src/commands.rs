//! Commands that can be sent to the radio.
//!
//! Encoding is pure: the caller decides when to write the bytes.

use crate::channel::*;
use crate::constants::*;
use crate::error::*;
use crate::types::*;

/// Commands that can be sent to the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start delivering received frames to the host.
    StartStream,

    /// Tune to another channel.
    ChangeChannel(Channel),

    /// Transmit a raw frame.
    SendFrame(Frame),
}

impl Command {
    /// Build a validated channel-change command.
    pub fn change_channel(channel: u8) -> ProtocolResult<Self> {
        Ok(Command::ChangeChannel(Channel::new(channel)?))
    }

    /// Build a validated transmit command.
    pub fn send_frame(frame: Frame) -> ProtocolResult<Self> {
        if frame.is_empty() {
            return Err(ProtocolError::EmptyFrame);
        }
        Ok(Command::SendFrame(frame))
    }

    /// Get the command code byte.
    pub fn code(&self) -> u8 {
        match self {
            Command::StartStream => CMD_START_STREAM,
            Command::ChangeChannel(_) => CMD_CHANGE_CHANNEL,
            Command::SendFrame(_) => CMD_SEND_FRAME,
        }
    }

    /// Encode the command to bytes.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Command::StartStream => vec![CMD_START_STREAM],
            Command::ChangeChannel(channel) => vec![CMD_CHANGE_CHANNEL, channel.get()],
            Command::SendFrame(frame) => {
                let mut buf = Vec::with_capacity(1 + frame.payload.len());
                buf.push(CMD_SEND_FRAME);
                buf.extend_from_slice(&frame.payload);
                buf
            }
        }
    }
}

/// Encode a channel change. Fails without producing bytes outside 11-26.
pub fn encode_channel_change(channel: u8) -> ProtocolResult<Vec<u8>> {
    Ok(Command::change_channel(channel)?.encode())
}

/// Encode a raw frame transmission, including the frame's length byte.
pub fn encode_send_raw_frame(frame: &Frame) -> ProtocolResult<Vec<u8>> {
    Ok(Command::send_frame(frame.clone())?.encode())
}

/// Encode the start-streaming request.
pub fn encode_start_streaming() -> Vec<u8> {
    Command::StartStream.encode()
}
