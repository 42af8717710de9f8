//! Protocol constants
//!
//! Marker bytes, channel limits and link defaults used by the radio firmware.

// ============================================================================
// Command Codes (host → radio)
// ============================================================================

/// Ask the radio to start delivering received frames.
pub const CMD_START_STREAM: u8 = 0xA0;
/// Transmit a raw frame. Followed by the frame's length byte and content.
pub const CMD_SEND_FRAME: u8 = 0xA1;
/// Tune the radio. Followed by one channel byte.
pub const CMD_CHANGE_CHANNEL: u8 = 0xA2;

// ============================================================================
// Record Markers (radio → host)
// ============================================================================

/// A frame was received off the air.
pub const RESP_NEW_FRAME: u8 = 0xB0;
/// Acknowledges a `CMD_SEND_FRAME`.
pub const RESP_DATA_SENT: u8 = 0xB1;
/// Acknowledges a `CMD_CHANGE_CHANNEL`.
pub const RESP_CHANNEL_CHANGED: u8 = 0xB2;
/// System status. A zero status after reset means the radio is ready.
pub const RESP_SYSTEM: u8 = 0xBF;

/// Status byte reported by the radio on success.
pub const STATUS_OK: u8 = 0x00;

/// Length of the marker + size prefix shared by every radio → host record.
pub const RECORD_HEADER_LEN: usize = 2;

// ============================================================================
// Channels
// ============================================================================

/// Lowest 2.4 GHz 802.15.4 channel.
pub const MIN_CHANNEL: u8 = 11;
/// Highest 2.4 GHz 802.15.4 channel.
pub const MAX_CHANNEL: u8 = 26;
/// Channel used when the caller does not pick one.
pub const DEFAULT_CHANNEL: u8 = MIN_CHANNEL;

// ============================================================================
// Link
// ============================================================================

/// Serial speed the radio firmware boots with.
pub const DEFAULT_BAUD_RATE: u32 = 57_600;

/// Raw RSSI value that maps to 100%.
pub const RSSI_FULL_SCALE: f64 = 84.0;
