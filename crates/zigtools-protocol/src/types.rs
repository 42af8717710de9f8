//! Common types used in the radio protocol.

use crate::constants::*;
use crate::error::*;

/// A captured or outgoing radio frame.
///
/// `payload[0]` is the length field `L` exactly as the radio reported it,
/// followed by `L - 1` bytes of 802.15.4 frame content. Capture files and the
/// transmit command both depend on that leading byte, so it is kept in place
/// rather than stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Length byte followed by the frame content.
    pub payload: Vec<u8>,
    /// Raw signal strength. Only set for frames received from the radio.
    pub rssi: Option<u8>,
}

impl Frame {
    /// Build a frame for transmission. No RSSI is attached.
    pub fn for_transmit(payload: Vec<u8>) -> Self {
        Frame { payload, rssi: None }
    }

    /// Rebuild a received frame from its size byte and record body.
    ///
    /// `body` must be exactly `size` bytes: `size - 1` bytes of content and a
    /// trailing RSSI byte.
    pub fn from_radio(size: u8, body: &[u8]) -> ProtocolResult<Self> {
        let expected = size as usize;
        if body.len() != expected {
            return Err(ProtocolError::BodyLength {
                expected,
                actual: body.len(),
            });
        }
        let Some((&rssi, content)) = body.split_last() else {
            return Err(ProtocolError::EmptyFrame);
        };

        let mut payload = Vec::with_capacity(expected);
        payload.push(size);
        payload.extend_from_slice(content);

        Ok(Frame {
            payload,
            rssi: Some(rssi),
        })
    }

    /// The length field carried in the first payload byte.
    pub fn length_field(&self) -> Option<u8> {
        self.payload.first().copied()
    }

    /// The frame content without its leading length byte.
    pub fn content(&self) -> &[u8] {
        self.payload.get(1..).unwrap_or(&[])
    }

    /// Whether the frame has no payload at all.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// RSSI scaled to a rounded percentage of the radio's full-scale reading.
    pub fn rssi_percent(&self) -> Option<f64> {
        self.rssi
            .map(|raw| (f64::from(raw) / RSSI_FULL_SCALE * 100.0).round())
    }
}

/// The command a [`RadioResponse`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCode {
    /// Frame transmission finished.
    DataSent,
    /// Channel change finished.
    ChannelChanged,
    /// System / handshake status.
    SystemResponse,
}

impl CommandCode {
    /// The marker byte that introduces this response on the wire.
    pub fn as_byte(self) -> u8 {
        match self {
            CommandCode::DataSent => RESP_DATA_SENT,
            CommandCode::ChannelChanged => RESP_CHANNEL_CHANGED,
            CommandCode::SystemResponse => RESP_SYSTEM,
        }
    }
}

impl std::fmt::Display for CommandCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandCode::DataSent => write!(f, "data sent"),
            CommandCode::ChannelChanged => write!(f, "channel changed"),
            CommandCode::SystemResponse => write!(f, "system"),
        }
    }
}

/// Acknowledgement or status event reported by the radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioResponse {
    /// Which command (or system event) this is about.
    pub command: CommandCode,
    /// Status byte; zero means success.
    pub status: u8,
}

impl RadioResponse {
    /// Whether the radio reported success.
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// A decoded radio → host record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioEvent {
    /// A frame received off the air.
    Frame(Frame),
    /// A command acknowledgement or system status.
    Command(RadioResponse),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_from_radio() {
        let frame = Frame::from_radio(3, &[0x41, 0x42, 0x20]).unwrap();
        assert_eq!(frame.payload, vec![0x03, 0x41, 0x42]);
        assert_eq!(frame.rssi, Some(0x20));
        assert_eq!(frame.length_field(), Some(3));
        assert_eq!(frame.content(), &[0x41, 0x42]);
    }

    #[test]
    fn test_frame_from_radio_length_mismatch() {
        let err = Frame::from_radio(4, &[0x41, 0x42, 0x20]).unwrap_err();
        assert_eq!(err, ProtocolError::BodyLength { expected: 4, actual: 3 });
    }

    #[test]
    fn test_frame_from_radio_zero_size() {
        assert_eq!(Frame::from_radio(0, &[]), Err(ProtocolError::EmptyFrame));
    }

    #[test]
    fn test_transmit_frame_has_no_rssi() {
        let frame = Frame::for_transmit(vec![0x02, 0xAA]);
        assert_eq!(frame.rssi, None);
        assert_eq!(frame.rssi_percent(), None);
    }

    #[test]
    fn test_rssi_percent() {
        let mut frame = Frame::for_transmit(vec![0x01]);
        frame.rssi = Some(84);
        assert_eq!(frame.rssi_percent(), Some(100.0));
        frame.rssi = Some(42);
        assert_eq!(frame.rssi_percent(), Some(50.0));
        frame.rssi = Some(0);
        assert_eq!(frame.rssi_percent(), Some(0.0));
    }

    #[test]
    fn test_empty_frame_accessors() {
        let frame = Frame::for_transmit(Vec::new());
        assert!(frame.is_empty());
        assert_eq!(frame.length_field(), None);
        assert!(frame.content().is_empty());
    }

    #[test]
    fn test_radio_response_status() {
        let ok = RadioResponse {
            command: CommandCode::DataSent,
            status: 0,
        };
        assert!(ok.is_ok());
        let failed = RadioResponse {
            command: CommandCode::ChannelChanged,
            status: 3,
        };
        assert!(!failed.is_ok());
    }
}
