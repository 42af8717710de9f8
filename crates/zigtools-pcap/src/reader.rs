//! Sequential capture file reader.
//!
//! Records are located by scanning from the first record every time. Capture
//! files are inspected occasionally, so no index is kept.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use log::{debug, info};
use zigtools_protocol::Frame;

use crate::error::*;
use crate::format::*;

/// Reads frames back out of a capture file.
#[derive(Debug)]
pub struct CaptureReader {
    reader: BufReader<File>,
    header: GlobalHeader,
    path: PathBuf,
}

impl CaptureReader {
    /// Open a capture file and validate its global header.
    pub fn open(path: impl AsRef<Path>) -> CaptureResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut reader = BufReader::new(File::open(&path)?);

        let mut raw = [0u8; GLOBAL_HEADER_LEN];
        reader.read_exact(&mut raw).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => CaptureError::TruncatedHeader,
            _ => CaptureError::Io(e),
        })?;
        let header = GlobalHeader::decode(&raw)?;
        if header.link_type != LINKTYPE_IEEE802_15_4 {
            return Err(CaptureError::UnsupportedLinkType(header.link_type));
        }

        info!("Opened capture file {}", path.display());
        Ok(CaptureReader {
            reader,
            header,
            path,
        })
    }

    /// The validated global header.
    pub fn header(&self) -> &GlobalHeader {
        &self.header
    }

    /// Path of the capture file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the frame stored at 1-based position `index`.
    pub fn get_frame(&mut self, index: usize) -> CaptureResult<Frame> {
        if index == 0 {
            return Err(CaptureError::IndexNotFound(index));
        }
        self.rewind()?;

        for position in 1..index {
            if !self.skip_record()? {
                debug!("{} ends after {} records", self.path.display(), position - 1);
                return Err(CaptureError::IndexNotFound(index));
            }
        }
        match self.read_record()? {
            Some((header, data)) => Ok(header.to_frame(&data)),
            None => Err(CaptureError::IndexNotFound(index)),
        }
    }

    /// Iterate over every record from the start of the file.
    pub fn frames(&mut self) -> CaptureResult<Frames<'_>> {
        self.rewind()?;
        Ok(Frames { reader: self })
    }

    /// Close the file.
    pub fn close(self) {
        info!("Closed capture file {}", self.path.display());
    }

    fn rewind(&mut self) -> CaptureResult<()> {
        self.reader.seek(SeekFrom::Start(GLOBAL_HEADER_LEN as u64))?;
        Ok(())
    }

    fn read_record_header(&mut self) -> CaptureResult<Option<RecordHeader>> {
        let mut raw = [0u8; RECORD_HEADER_LEN];
        match self.reader.read_exact(&mut raw) {
            Ok(()) => Ok(Some(RecordHeader::decode(&raw))),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Skip one record. Returns `false` at end of file.
    fn skip_record(&mut self) -> CaptureResult<bool> {
        match self.read_record_header()? {
            Some(header) => {
                self.reader.seek_relative(i64::from(header.captured_len))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Read one full record. A truncated trailing record counts as end of
    /// file.
    fn read_record(&mut self) -> CaptureResult<Option<(RecordHeader, Vec<u8>)>> {
        let Some(header) = self.read_record_header()? else {
            return Ok(None);
        };
        let wanted = u64::from(header.captured_len);
        let mut data = Vec::new();
        (&mut self.reader).take(wanted).read_to_end(&mut data)?;
        if data.len() as u64 != wanted {
            return Ok(None);
        }
        Ok(Some((header, data)))
    }
}

/// Iterator over the records of a [`CaptureReader`].
pub struct Frames<'a> {
    reader: &'a mut CaptureReader,
}

impl Iterator for Frames<'_> {
    type Item = CaptureResult<(RecordHeader, Frame)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record() {
            Ok(Some((header, data))) => {
                let frame = header.to_frame(&data);
                Some(Ok((header, frame)))
            }
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_index_zero_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("zero.pcap");
        std::fs::write(&path, GlobalHeader::default().encode()).unwrap();

        let mut reader = CaptureReader::open(&path).unwrap();
        assert!(matches!(reader.get_frame(0), Err(CaptureError::IndexNotFound(0))));
        assert!(matches!(reader.get_frame(1), Err(CaptureError::IndexNotFound(1))));
    }

    #[test]
    fn test_wrong_link_type() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ethernet.pcap");
        let header = GlobalHeader {
            link_type: 1,
            ..GlobalHeader::default()
        };
        std::fs::write(&path, header.encode()).unwrap();

        assert!(matches!(
            CaptureReader::open(&path),
            Err(CaptureError::UnsupportedLinkType(1))
        ));
    }

    #[test]
    fn test_truncated_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.pcap");
        std::fs::write(&path, &GlobalHeader::default().encode()[..10]).unwrap();

        assert!(matches!(
            CaptureReader::open(&path),
            Err(CaptureError::TruncatedHeader)
        ));
    }

    #[test]
    fn test_truncated_trailing_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cut.pcap");
        let mut bytes = GlobalHeader::default().encode().to_vec();
        let header = RecordHeader {
            ts_sec: 1,
            ts_usec: 0,
            captured_len: 8,
            original_len: 9,
        };
        bytes.extend_from_slice(&header.encode());
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        std::fs::write(&path, bytes).unwrap();

        let mut reader = CaptureReader::open(&path).unwrap();
        assert!(matches!(reader.get_frame(1), Err(CaptureError::IndexNotFound(1))));
        assert_eq!(reader.frames().unwrap().count(), 0);
    }
}
