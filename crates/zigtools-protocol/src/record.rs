//! Radio → host record classification and decoding.
//!
//! The serial stream has no sync pattern. A record is a marker byte, a size
//! byte, and a body whose length is determined by the marker:
//!
//! ```text
//! +--------+------+----------------------+
//! | marker | size | body[0..body_len]    |
//! +--------+------+----------------------+
//! ```

use crate::constants::*;
use crate::error::*;
use crate::types::*;

/// The marker byte that introduces a radio → host record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// Received frame.
    NewFrame,
    /// Transmission acknowledgement.
    DataSent,
    /// Channel change acknowledgement.
    ChannelChanged,
    /// System / handshake status.
    SystemResponse,
    /// Anything else. The stream is desynchronized.
    Unknown(u8),
}

impl Marker {
    /// Classify a marker byte.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            RESP_NEW_FRAME => Marker::NewFrame,
            RESP_DATA_SENT => Marker::DataSent,
            RESP_CHANNEL_CHANGED => Marker::ChannelChanged,
            RESP_SYSTEM => Marker::SystemResponse,
            other => Marker::Unknown(other),
        }
    }

    /// The wire byte for this marker.
    pub fn as_byte(self) -> u8 {
        match self {
            Marker::NewFrame => RESP_NEW_FRAME,
            Marker::DataSent => RESP_DATA_SENT,
            Marker::ChannelChanged => RESP_CHANNEL_CHANGED,
            Marker::SystemResponse => RESP_SYSTEM,
            Marker::Unknown(byte) => byte,
        }
    }

    /// Number of body bytes that follow the marker and size byte.
    ///
    /// Returns `None` for an unknown marker since its body length cannot be
    /// known.
    pub fn body_len(self, size: u8) -> Option<usize> {
        match self {
            Marker::NewFrame => Some(size as usize),
            Marker::DataSent | Marker::ChannelChanged | Marker::SystemResponse => Some(1),
            Marker::Unknown(_) => None,
        }
    }

    /// The command code for acknowledgement markers.
    pub fn command_code(self) -> Option<CommandCode> {
        match self {
            Marker::DataSent => Some(CommandCode::DataSent),
            Marker::ChannelChanged => Some(CommandCode::ChannelChanged),
            Marker::SystemResponse => Some(CommandCode::SystemResponse),
            Marker::NewFrame | Marker::Unknown(_) => None,
        }
    }
}

impl From<u8> for Marker {
    fn from(byte: u8) -> Self {
        Marker::from_byte(byte)
    }
}

impl From<CommandCode> for Marker {
    fn from(code: CommandCode) -> Self {
        match code {
            CommandCode::DataSent => Marker::DataSent,
            CommandCode::ChannelChanged => Marker::ChannelChanged,
            CommandCode::SystemResponse => Marker::SystemResponse,
        }
    }
}

impl RadioEvent {
    /// Decode a complete record.
    ///
    /// `body` must hold exactly `marker.body_len(size)` bytes.
    pub fn decode(marker: Marker, size: u8, body: &[u8]) -> ProtocolResult<Self> {
        match marker {
            Marker::NewFrame => Ok(RadioEvent::Frame(Frame::from_radio(size, body)?)),
            Marker::Unknown(byte) => Err(ProtocolError::UnknownMarker(byte)),
            _ => {
                let command = marker
                    .command_code()
                    .ok_or(ProtocolError::UnknownMarker(marker.as_byte()))?;
                match body {
                    [status] => Ok(RadioEvent::Command(RadioResponse {
                        command,
                        status: *status,
                    })),
                    _ => Err(ProtocolError::BodyLength {
                        expected: 1,
                        actual: body.len(),
                    }),
                }
            }
        }
    }

    /// Decode a record from a contiguous slice holding marker, size and body.
    ///
    /// Returns the event and the number of bytes consumed, or `Ok(None)` if
    /// the slice does not yet hold a complete record.
    pub fn decode_from_slice(data: &[u8]) -> ProtocolResult<Option<(Self, usize)>> {
        let [marker, size, rest @ ..] = data else {
            return Ok(None);
        };
        let marker = Marker::from_byte(*marker);
        let body_len = marker
            .body_len(*size)
            .ok_or(ProtocolError::UnknownMarker(marker.as_byte()))?;
        if rest.len() < body_len {
            return Ok(None);
        }
        let event = RadioEvent::decode(marker, *size, &rest[..body_len])?;
        Ok(Some((event, RECORD_HEADER_LEN + body_len)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_classification() {
        assert_eq!(Marker::from_byte(0xB0), Marker::NewFrame);
        assert_eq!(Marker::from_byte(0xB1), Marker::DataSent);
        assert_eq!(Marker::from_byte(0xB2), Marker::ChannelChanged);
        assert_eq!(Marker::from_byte(0xBF), Marker::SystemResponse);
        assert_eq!(Marker::from_byte(0xFF), Marker::Unknown(0xFF));
        assert_eq!(Marker::Unknown(0x12).as_byte(), 0x12);
    }

    #[test]
    fn test_body_len() {
        assert_eq!(Marker::NewFrame.body_len(17), Some(17));
        assert_eq!(Marker::DataSent.body_len(17), Some(1));
        assert_eq!(Marker::SystemResponse.body_len(0), Some(1));
        assert_eq!(Marker::Unknown(0xFF).body_len(3), None);
    }

    #[test]
    fn test_decode_new_frame_record() {
        let data = [0xB0, 0x03, 0x41, 0x42, 0x20];
        let (event, consumed) = RadioEvent::decode_from_slice(&data).unwrap().unwrap();
        assert_eq!(consumed, 5);
        assert_eq!(
            event,
            RadioEvent::Frame(Frame {
                payload: vec![0x03, 0x41, 0x42],
                rssi: Some(0x20),
            })
        );
    }

    #[test]
    fn test_decode_command_record() {
        let data = [0xB2, 0x01, 0x00, 0xB0];
        let (event, consumed) = RadioEvent::decode_from_slice(&data).unwrap().unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(
            event,
            RadioEvent::Command(RadioResponse {
                command: CommandCode::ChannelChanged,
                status: 0,
            })
        );
    }

    #[test]
    fn test_decode_partial_record() {
        assert_eq!(RadioEvent::decode_from_slice(&[0xB0]).unwrap(), None);
        assert_eq!(RadioEvent::decode_from_slice(&[0xB0, 0x03, 0x41]).unwrap(), None);
        assert_eq!(RadioEvent::decode_from_slice(&[0xB1, 0x00]).unwrap(), None);
    }

    #[test]
    fn test_decode_unknown_marker() {
        let err = RadioEvent::decode_from_slice(&[0xFF, 0x00, 0x00]).unwrap_err();
        assert_eq!(err, ProtocolError::UnknownMarker(0xFF));
    }

    #[test]
    fn test_decode_frame_length_invariant() {
        // Payload length always equals the size byte, whatever it is.
        for size in 1u8..=127 {
            let body: Vec<u8> = (0..size).collect();
            let event = RadioEvent::decode(Marker::NewFrame, size, &body).unwrap();
            let RadioEvent::Frame(frame) = event else {
                panic!("expected frame event");
            };
            assert_eq!(frame.payload.len(), size as usize);
            assert_eq!(frame.rssi, Some(size - 1));
        }
    }
}
