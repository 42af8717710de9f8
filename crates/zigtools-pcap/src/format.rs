//! Binary layout of the global header and per-record header.

use bytes::{Buf, BufMut};
use chrono::{DateTime, Utc};
use zigtools_protocol::Frame;

use crate::error::*;

/// Little-endian microsecond pcap magic (`D4 C3 B2 A1` on disk).
pub const PCAP_MAGIC: u32 = 0xA1B2_C3D4;
/// File format major version.
pub const PCAP_VERSION_MAJOR: u16 = 2;
/// File format minor version.
pub const PCAP_VERSION_MINOR: u16 = 4;
/// Largest record the file declares it may hold.
pub const PCAP_SNAPLEN: u32 = 0xFFFF;
/// `LINKTYPE_IEEE802_15_4_WITHFCS`.
pub const LINKTYPE_IEEE802_15_4: u32 = 195;

/// Size of the global header in bytes.
pub const GLOBAL_HEADER_LEN: usize = 24;
/// Size of each record header in bytes.
pub const RECORD_HEADER_LEN: usize = 16;

/// The 24-byte header at the start of every capture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalHeader {
    /// Byte-order / resolution magic.
    pub magic: u32,
    /// Major format version.
    pub version_major: u16,
    /// Minor format version.
    pub version_minor: u16,
    /// GMT offset in seconds. Always written as 0.
    pub thiszone: i32,
    /// Timestamp accuracy. Always written as 0.
    pub sigfigs: u32,
    /// Maximum stored record length.
    pub snaplen: u32,
    /// Data link type of every record.
    pub link_type: u32,
}

impl Default for GlobalHeader {
    fn default() -> Self {
        GlobalHeader {
            magic: PCAP_MAGIC,
            version_major: PCAP_VERSION_MAJOR,
            version_minor: PCAP_VERSION_MINOR,
            thiszone: 0,
            sigfigs: 0,
            snaplen: PCAP_SNAPLEN,
            link_type: LINKTYPE_IEEE802_15_4,
        }
    }
}

impl GlobalHeader {
    /// Encode to the on-disk representation.
    pub fn encode(&self) -> [u8; GLOBAL_HEADER_LEN] {
        let mut out = [0u8; GLOBAL_HEADER_LEN];
        let mut buf = &mut out[..];
        buf.put_u32_le(self.magic);
        buf.put_u16_le(self.version_major);
        buf.put_u16_le(self.version_minor);
        buf.put_i32_le(self.thiszone);
        buf.put_u32_le(self.sigfigs);
        buf.put_u32_le(self.snaplen);
        buf.put_u32_le(self.link_type);
        out
    }

    /// Decode and check the magic. The link type is left to the caller.
    pub fn decode(data: &[u8]) -> CaptureResult<Self> {
        if data.len() < GLOBAL_HEADER_LEN {
            return Err(CaptureError::TruncatedHeader);
        }
        let mut buf = &data[..GLOBAL_HEADER_LEN];
        let magic = buf.get_u32_le();
        if magic != PCAP_MAGIC {
            return Err(CaptureError::BadMagic(magic));
        }
        Ok(GlobalHeader {
            magic,
            version_major: buf.get_u16_le(),
            version_minor: buf.get_u16_le(),
            thiszone: buf.get_i32_le(),
            sigfigs: buf.get_u32_le(),
            snaplen: buf.get_u32_le(),
            link_type: buf.get_u32_le(),
        })
    }
}

/// The 16-byte header in front of every stored frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Capture time, whole seconds since the Unix epoch.
    pub ts_sec: u32,
    /// Capture time, microseconds within the second.
    pub ts_usec: u32,
    /// Number of data bytes that follow this header.
    pub captured_len: u32,
    /// Frame length byte as reported by the radio.
    ///
    /// Always `captured_len + 1`: the length byte is counted here but is not
    /// part of the stored data. Existing readers depend on this.
    pub original_len: u32,
}

impl RecordHeader {
    /// Build the header for a frame captured at `timestamp`.
    ///
    /// Both lengths are taken from the payload itself; the value of
    /// `payload[0]` is ignored. For frames read from the radio the two agree.
    /// Times outside the 32-bit seconds range are rejected.
    pub fn for_frame(frame: &Frame, timestamp: DateTime<Utc>) -> CaptureResult<Self> {
        if frame.is_empty() {
            return Err(CaptureError::EmptyFrame);
        }
        let ts_sec = u32::try_from(timestamp.timestamp())
            .map_err(|_| CaptureError::TimestampOutOfRange(timestamp.timestamp()))?;
        let captured_len = (frame.payload.len() - 1) as u32;
        Ok(RecordHeader {
            ts_sec,
            ts_usec: timestamp.timestamp_subsec_micros(),
            captured_len,
            original_len: captured_len + 1,
        })
    }

    /// Capture time as a UTC timestamp.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::from(self.ts_sec), self.ts_usec.saturating_mul(1_000))
    }

    /// Encode to the on-disk representation.
    pub fn encode(&self) -> [u8; RECORD_HEADER_LEN] {
        let mut out = [0u8; RECORD_HEADER_LEN];
        let mut buf = &mut out[..];
        buf.put_u32_le(self.ts_sec);
        buf.put_u32_le(self.ts_usec);
        buf.put_u32_le(self.captured_len);
        buf.put_u32_le(self.original_len);
        out
    }

    /// Decode from exactly [`RECORD_HEADER_LEN`] bytes.
    pub fn decode(data: &[u8; RECORD_HEADER_LEN]) -> Self {
        let mut buf = &data[..];
        RecordHeader {
            ts_sec: buf.get_u32_le(),
            ts_usec: buf.get_u32_le(),
            captured_len: buf.get_u32_le(),
            original_len: buf.get_u32_le(),
        }
    }

    /// Rebuild the frame from this header and its stored data.
    ///
    /// The leading length byte comes from `original_len`; RSSI is not stored.
    pub fn to_frame(&self, data: &[u8]) -> Frame {
        let mut payload = Vec::with_capacity(data.len() + 1);
        payload.push(self.original_len as u8);
        payload.extend_from_slice(data);
        Frame::for_transmit(payload)
    }
}
