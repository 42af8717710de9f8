//! 802.15.4 Capture Files
//!
//! Reads and writes the classic libpcap file layout with link type 195
//! (IEEE 802.15.4 with FCS), so captured traffic can be opened in ordinary
//! frame analyzers.
//!
//! # File Layout
//!
//! ```text
//! +------------------------+------------------+-----------+------------------+-----
//! | global header (24)     | record hdr (16)  | data      | record hdr (16)  | ...
//! +------------------------+------------------+-----------+------------------+-----
//! ```
//!
//! All integers are little-endian. Each record stores the frame content
//! without its length byte; `orig_len` carries that length byte so the
//! original [`Frame`](zigtools_protocol::Frame) payload can be rebuilt on read.

mod error;
mod format;
mod reader;
mod writer;

pub use error::*;
pub use format::*;
pub use reader::*;
pub use writer::*;
