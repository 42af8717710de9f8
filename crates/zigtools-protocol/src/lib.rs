//! ZigTools Radio Serial Protocol
//!
//! This crate provides types and utilities for talking to an 802.15.4 radio
//! dongle over its serial link. Every record on the wire starts with a single
//! marker byte that identifies what follows.
//!
//! # Protocol Overview
//!
//! - **Commands** (host → radio): start with a `CMD_*` byte
//! - **Records** (radio → host): start with a `RESP_*` byte followed by a size byte
//!
//! ```text
//! NewFrame:        +------+---+----------------------+------+
//!                  | 0xB0 | L | content[0..L-1]      | rssi |
//!                  +------+---+----------------------+------+
//! Command status:  +------+------+--------+
//!                  | 0xB1 | size | status |   (also 0xB2, 0xBF)
//!                  +------+------+--------+
//! ```
//!
//! # Example
//!
//! ```rust
//! use zigtools_protocol::{encode_channel_change, next_channel, Direction};
//!
//! let cmd = encode_channel_change(next_channel(26, Direction::Up)).unwrap();
//! assert_eq!(cmd, vec![0xA2, 11]);
//! ```

mod channel;
mod commands;
mod constants;
mod error;
mod hexdump;
mod record;
mod types;

pub use channel::*;
pub use commands::*;
pub use constants::*;
pub use error::*;
pub use hexdump::*;
pub use record::*;
pub use types::*;
