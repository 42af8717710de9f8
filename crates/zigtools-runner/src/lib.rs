//! ZigTools Radio Runner
//!
//! Drives an 802.15.4 radio dongle over a serial link: performs the startup
//! handshake, runs a background listener that turns the byte stream into
//! [`RadioEvent`](zigtools_protocol::RadioEvent)s, and sends commands.
//!
//! ## Key Types
//!
//! - [`Radio`]: session object owning the transport and listener thread
//! - [`Transport`]: byte channel to the device ([`SerialTransport`], [`MockTransport`])
//! - [`EventSink`]: receives frames and command responses in wire order
//! - [`Listener`]: the record-reassembly state machine

pub mod config;
pub mod error;
pub mod listener;
pub mod mock;
pub mod radio;
pub mod sink;
pub mod transport;

pub use config::RadioConfig;
pub use error::{RadioError, RadioResult};
pub use listener::{Listener, ListenerExit, ListenerHandle, ListenerOutcome, ListenerState, Step};
pub use mock::MockTransport;
pub use radio::{Radio, TerminateReport};
pub use sink::{CaptureFrameSink, ChannelSink, EventSink, FanoutSink, FnSink, NullSink};
pub use transport::{SerialTransport, SharedTransport, Transport};
