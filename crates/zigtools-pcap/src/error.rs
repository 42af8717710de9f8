//! Error types for capture files.

use thiserror::Error;

/// Errors that can occur when reading or writing capture files.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// I/O error on the underlying file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not start with the little-endian pcap magic.
    #[error("not a little-endian pcap file (magic 0x{0:08X})")]
    BadMagic(u32),

    /// The file is shorter than a global header.
    #[error("capture file header is truncated")]
    TruncatedHeader,

    /// The file holds something other than 802.15.4 frames.
    #[error("unsupported link type {0} (expected 195, IEEE 802.15.4)")]
    UnsupportedLinkType(u32),

    /// The requested record does not exist.
    #[error("no frame at index {0}")]
    IndexNotFound(usize),

    /// A frame with no payload has no length byte to store.
    #[error("cannot store an empty frame")]
    EmptyFrame,

    /// The capture time does not fit the 32-bit seconds field.
    #[error("timestamp {0} is outside the pcap seconds range")]
    TimestampOutOfRange(i64),
}

/// Result type alias for capture file operations.
pub type CaptureResult<T> = Result<T, CaptureError>;
