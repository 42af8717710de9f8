//! Append-only capture file writer.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Utc};
use log::{debug, info};
use zigtools_protocol::Frame;

use crate::error::*;
use crate::format::*;

/// Appends received frames to a capture file.
///
/// The global header is written only when the file is new (or empty).
/// Reopening an existing capture appends after its last record.
#[derive(Debug)]
pub struct CaptureWriter {
    file: File,
    path: PathBuf,
    frames_written: u64,
}

impl CaptureWriter {
    /// Open `path` for appending, creating it with a global header if needed.
    pub fn open(path: impl AsRef<Path>) -> CaptureResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new().append(true).create(true).open(&path)?;

        if file.metadata()?.len() == 0 {
            file.write_all(&GlobalHeader::default().encode())?;
            info!("Created capture file {}", path.display());
        } else {
            info!("Appending to capture file {}", path.display());
        }

        Ok(CaptureWriter {
            file,
            path,
            frames_written: 0,
        })
    }

    /// Append one frame captured at `timestamp`.
    ///
    /// The record is assembled in memory and written in one call, so a
    /// rejected frame leaves the file untouched.
    pub fn append_frame(&mut self, frame: &Frame, timestamp: DateTime<Utc>) -> CaptureResult<()> {
        let header = RecordHeader::for_frame(frame, timestamp)?;

        let data = frame.content();
        let mut record = BytesMut::with_capacity(RECORD_HEADER_LEN + data.len());
        record.put_slice(&header.encode());
        record.put_slice(data);

        self.file.write_all(&record)?;
        self.frames_written += 1;
        debug!(
            "Wrote record {} ({} bytes) to {}",
            self.frames_written,
            header.captured_len,
            self.path.display()
        );
        Ok(())
    }

    /// Append one frame stamped with the current time.
    pub fn append_frame_now(&mut self, frame: &Frame) -> CaptureResult<()> {
        self.append_frame(frame, Utc::now())
    }

    /// Number of records written through this writer.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Path of the capture file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and close the file.
    pub fn close(mut self) -> CaptureResult<()> {
        self.file.flush()?;
        info!(
            "Closed capture file {} ({} frames written)",
            self.path.display(),
            self.frames_written
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_new_file_gets_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("new.pcap");

        let writer = CaptureWriter::open(&path).unwrap();
        writer.close().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, GlobalHeader::default().encode().to_vec());
    }

    #[test]
    fn test_record_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("record.pcap");
        let ts = Utc.timestamp_opt(0x0102_0304, 5_000).unwrap();

        let mut writer = CaptureWriter::open(&path).unwrap();
        let frame = Frame::from_radio(3, &[0x41, 0x42, 0x20]).unwrap();
        writer.append_frame(&frame, ts).unwrap();
        assert_eq!(writer.frames_written(), 1);
        writer.close().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(
            &bytes[GLOBAL_HEADER_LEN..],
            &[
                0x04, 0x03, 0x02, 0x01, // ts_sec
                0x05, 0x00, 0x00, 0x00, // ts_usec
                0x02, 0x00, 0x00, 0x00, // captured = L - 1
                0x03, 0x00, 0x00, 0x00, // original = L
                0x41, 0x42,
            ]
        );
    }

    #[test]
    fn test_empty_frame_leaves_file_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.pcap");

        let mut writer = CaptureWriter::open(&path).unwrap();
        let before = std::fs::metadata(&path).unwrap().len();
        let result = writer.append_frame_now(&Frame::for_transmit(Vec::new()));
        assert!(matches!(result, Err(CaptureError::EmptyFrame)));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), before);
        assert_eq!(writer.frames_written(), 0);
    }
}
