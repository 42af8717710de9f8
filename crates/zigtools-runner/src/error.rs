//! Error types for radio sessions.

use std::time::Duration;

use thiserror::Error;
use zigtools_pcap::CaptureError;
use zigtools_protocol::ProtocolError;

/// Errors that can occur while talking to the radio.
#[derive(Debug, Error)]
pub enum RadioError {
    /// The serial link could not be opened or used.
    #[error("transport error: {0}")]
    Transport(String),

    /// I/O error on the serial link.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A session is already running on this radio.
    #[error("radio session already initialized")]
    AlreadyInitialized,

    /// The operation needs an active session.
    #[error("radio session not initialized")]
    NotInitialized,

    /// The radio never reported ready during the handshake.
    #[error("device did not report ready within {0:?}")]
    DeviceNotResponding(Duration),

    /// The listener saw a marker it does not understand and stopped.
    #[error("protocol desynchronized at marker 0x{0:02X}")]
    ProtocolDesync(u8),

    /// Command validation or record decoding failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Capture file error.
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serialport::Error> for RadioError {
    fn from(e: serialport::Error) -> Self {
        RadioError::Transport(e.to_string())
    }
}

/// Result type alias for radio operations.
pub type RadioResult<T> = Result<T, RadioError>;
