//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when encoding commands or decoding radio records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Channel outside the 2.4 GHz band (11-26).
    #[error("invalid channel {0}: must be between 11 and 26")]
    InvalidChannel(u8),

    /// A frame with no payload cannot be transmitted or stored.
    #[error("frame payload is empty")]
    EmptyFrame,

    /// The radio sent a marker byte this protocol does not define.
    ///
    /// There is no resynchronization marker, so the stream cannot be trusted
    /// after this.
    #[error("unknown record marker: 0x{0:02X}")]
    UnknownMarker(u8),

    /// A record body did not have the length its header announced.
    #[error("record body length mismatch: expected {expected} bytes, got {actual}")]
    BodyLength {
        /// Length announced by the size byte.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
