//! Radio session management.
//!
//! A [`Radio`] owns everything a session needs: the transport, the listener
//! thread and the sink it feeds. Independent radios can run side by side.
//!
//! Startup follows the firmware's boot sequence:
//!
//! 1. Wait (up to `handshake_timeout`) for `0xBF <size> 0x00`.
//! 2. Start the listener.
//! 3. Send `START_STREAM` if the sink wants frames.
//! 4. Tune to the requested channel.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use log::{debug, info, warn};
use parking_lot::Mutex;
use zigtools_protocol::{
    encode_channel_change, encode_send_raw_frame, encode_start_streaming, Channel, Frame,
    RESP_SYSTEM, STATUS_OK,
};

use crate::config::RadioConfig;
use crate::error::{RadioError, RadioResult};
use crate::listener::{self, ListenerExit, ListenerHandle};
use crate::sink::EventSink;
use crate::transport::{SerialTransport, SharedTransport, Transport};

/// What [`Radio::terminate`] hands back from the finished session.
pub struct TerminateReport {
    /// Why the listener stopped.
    pub exit: ListenerExit,
    /// The session's sink, unless the listener panicked.
    pub sink: Option<Box<dyn EventSink>>,
}

impl std::fmt::Debug for TerminateReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminateReport")
            .field("exit", &self.exit)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

struct Session<T: Transport> {
    transport: SharedTransport<T>,
    listener: ListenerHandle<Box<dyn EventSink>>,
    channel: Channel,
}

/// A connection to one radio dongle.
pub struct Radio<T: Transport + 'static> {
    config: RadioConfig,
    session: Option<Session<T>>,
}

impl<T: Transport + 'static> Radio<T> {
    /// Create an idle radio. Nothing is opened until `initialize`.
    pub fn new(config: RadioConfig) -> Self {
        Radio {
            config,
            session: None,
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    /// Whether a session exists and its listener is still running.
    pub fn is_active(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| !s.listener.is_finished())
    }

    /// Channel most recently requested in this session.
    pub fn current_channel(&self) -> Option<Channel> {
        self.session.as_ref().map(|s| s.channel)
    }

    /// Start a session over an already opened transport.
    ///
    /// A session whose listener has already stopped (for example after a
    /// desync) is torn down first. A running session is rejected without
    /// touching the new transport; every other failure closes it again.
    pub fn initialize_with<S>(&mut self, mut transport: T, channel: u8, sink: S) -> RadioResult<()>
    where
        S: EventSink + 'static,
    {
        if self.is_active() {
            return Err(RadioError::AlreadyInitialized);
        }
        if let Some(report) = self.terminate() {
            warn!("Replacing stopped radio session ({:?})", report.exit);
        }
        let channel = match Channel::new(channel) {
            Ok(channel) => channel,
            Err(e) => {
                close_quietly(&mut transport);
                return Err(e.into());
            }
        };

        match wait_for_ready(&mut transport, &self.config) {
            Ok(true) => {}
            Ok(false) => {
                warn!("Radio did not report ready within {:?}", self.config.handshake_timeout());
                close_quietly(&mut transport);
                self.terminate();
                return Err(RadioError::DeviceNotResponding(self.config.handshake_timeout()));
            }
            Err(e) => {
                close_quietly(&mut transport);
                return Err(e);
            }
        }
        info!("Radio ready");

        let stream = self.config.stream_frames && sink.wants_frames();
        let sink: Box<dyn EventSink> = Box::new(sink);
        let transport = Arc::new(Mutex::new(transport));
        let listener = match listener::spawn(
            Arc::clone(&transport),
            sink,
            self.config.listener_poll(),
        ) {
            Ok(listener) => listener,
            Err(e) => {
                close_quietly(&mut *transport.lock());
                return Err(e);
            }
        };
        self.session = Some(Session {
            transport,
            listener,
            channel,
        });

        let started = if stream {
            self.start_streaming()
        } else {
            Ok(())
        }
        .and_then(|()| self.change_channel(channel.get()));

        if let Err(e) = started {
            self.terminate();
            return Err(e);
        }
        Ok(())
    }

    /// Ask the radio to start delivering frames.
    pub fn start_streaming(&mut self) -> RadioResult<()> {
        self.write(&encode_start_streaming())?;
        debug!("Requested frame streaming");
        Ok(())
    }

    /// Tune to `channel` (11-26). Out-of-range channels are rejected before
    /// anything is written, as is any command after the listener lost sync.
    pub fn change_channel(&mut self, channel: u8) -> RadioResult<()> {
        let command = encode_channel_change(channel)?;
        self.write(&command)?;
        if let Some(session) = self.session.as_mut() {
            session.channel = Channel::new(channel)?;
        }
        info!("Changing to channel {}", channel);
        Ok(())
    }

    /// Transmit a raw frame, length byte included.
    pub fn send_raw_frame(&mut self, frame: &Frame) -> RadioResult<()> {
        let command = encode_send_raw_frame(frame)?;
        self.write(&command)?;
        debug!("Sent frame of {} bytes", frame.payload.len());
        Ok(())
    }

    /// End the session: stop and join the listener, then close the
    /// transport. Safe to call when nothing is open.
    pub fn terminate(&mut self) -> Option<TerminateReport> {
        let session = self.session.take()?;

        let outcome = session.listener.stop();
        if let Err(e) = session.transport.lock().close() {
            warn!("Error closing radio transport: {}", e);
        }
        info!("Radio session terminated ({:?})", outcome.exit);

        Some(TerminateReport {
            exit: outcome.exit,
            sink: outcome.sink,
        })
    }

    fn write(&mut self, data: &[u8]) -> RadioResult<()> {
        let session = self.session.as_ref().ok_or(RadioError::NotInitialized)?;
        if let Some(ListenerExit::Desync { marker, .. }) = session.listener.exit() {
            return Err(RadioError::ProtocolDesync(marker));
        }
        session.transport.lock().write_all(data)
    }
}

impl Radio<SerialTransport> {
    /// Open `port` at the configured baud rate and start a session on it.
    pub fn initialize<S>(&mut self, port: &str, channel: u8, sink: S) -> RadioResult<()>
    where
        S: EventSink + 'static,
    {
        if self.is_active() {
            return Err(RadioError::AlreadyInitialized);
        }
        let transport = SerialTransport::open(port, self.config.baud_rate)?;
        self.initialize_with(transport, channel, sink)
    }
}

impl<T: Transport + 'static> Drop for Radio<T> {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn close_quietly<T: Transport>(transport: &mut T) {
    if let Err(e) = transport.close() {
        warn!("Error closing radio transport: {}", e);
    }
}

/// Poll for the radio's ready status.
///
/// Bytes that do not start a `0xBF` record are discarded one at a time.
fn wait_for_ready<T: Transport>(transport: &mut T, config: &RadioConfig) -> RadioResult<bool> {
    let deadline = Instant::now() + config.handshake_timeout();
    let poll = config.handshake_poll();

    while Instant::now() < deadline {
        thread::sleep(poll);
        if transport.bytes_available()? < 2 {
            continue;
        }

        let mut byte = [0u8; 1];
        transport.read_exact(&mut byte)?;
        if byte[0] != RESP_SYSTEM {
            warn!("Discarding 0x{:02X} while waiting for radio", byte[0]);
            continue;
        }
        // Size byte carries nothing for status records.
        transport.read_exact(&mut byte)?;

        // The status byte may trail the header.
        while transport.bytes_available()? < 1 {
            if Instant::now() >= deadline {
                return Ok(false);
            }
            thread::sleep(poll);
        }
        transport.read_exact(&mut byte)?;
        if byte[0] == STATUS_OK {
            return Ok(true);
        }
        debug!("Radio reported system status 0x{:02X}", byte[0]);
    }
    Ok(false)
}
