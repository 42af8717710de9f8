//! Background frame listener.
//!
//! The listener drains the transport, reassembles records and hands decoded
//! events to an [`EventSink`]. It runs on its own thread and is stopped with a
//! cancel flag followed by a join, so the transport is never closed while the
//! listener may still touch it.
//!
//! ## States
//!
//! ```text
//! WaitingMarker --(2 bytes)--> AwaitingBody --(body)--> Dispatching --> WaitingMarker
//!       |
//!       +--(unknown marker / transport error / stop)--> Terminated
//! ```
//!
//! The size byte is trusted. A device announcing more bytes than it sends
//! keeps the listener in `AwaitingBody`; it still honors a stop request there.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use zigtools_protocol::{pretty_hex, Marker, RadioEvent, RECORD_HEADER_LEN};

use crate::error::RadioResult;
use crate::sink::EventSink;
use crate::transport::{SharedTransport, Transport};

/// Where the listener is in the record cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Waiting for a marker and size byte.
    WaitingMarker,
    /// Header read, waiting for the rest of the record.
    AwaitingBody,
    /// Handing a decoded event to the sink.
    Dispatching,
    /// Stopped for good.
    Terminated,
}

/// Why the listener stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerExit {
    /// A stop was requested.
    Stopped,
    /// An unknown marker arrived. `drained` is whatever else was buffered.
    Desync {
        /// The offending marker byte.
        marker: u8,
        /// The byte read where a size was expected.
        size: u8,
        /// Remaining buffered bytes, discarded.
        drained: Vec<u8>,
    },
    /// The transport failed.
    TransportFailed(String),
    /// The sink panicked on the listener thread.
    Panicked,
}

/// Result of a single listener cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Not enough data; the caller should wait before polling again.
    Idle,
    /// One record was decoded and dispatched (or dropped as malformed).
    Dispatched,
    /// The listener is finished.
    Exit(ListenerExit),
}

/// The record reassembly state machine.
///
/// [`Listener::poll`] runs one cycle and can be driven directly; [`spawn`]
/// runs it in a loop on a dedicated thread.
pub struct Listener<T: Transport, S: EventSink> {
    transport: SharedTransport<T>,
    sink: S,
    stop: Arc<AtomicBool>,
    poll_interval: Duration,
    state: ListenerState,
}

impl<T: Transport, S: EventSink> Listener<T, S> {
    /// Create a listener reading from `transport`.
    pub fn new(transport: SharedTransport<T>, sink: S, poll_interval: Duration) -> Self {
        Listener {
            transport,
            sink,
            stop: Arc::new(AtomicBool::new(false)),
            poll_interval,
            state: ListenerState::WaitingMarker,
        }
    }

    /// Current state.
    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// The cancel flag checked between cycles and while waiting for a body.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Give back the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Run one cycle: read a header if one is available, then wait for and
    /// dispatch the record it introduces.
    pub fn poll(&mut self) -> Step {
        if self.state == ListenerState::Terminated {
            return Step::Exit(ListenerExit::Stopped);
        }
        let step = match self.cycle() {
            Ok(step) => step,
            Err(e) => {
                error!("Radio listener transport failure: {}", e);
                Step::Exit(ListenerExit::TransportFailed(e.to_string()))
            }
        };
        self.state = match step {
            Step::Exit(_) => ListenerState::Terminated,
            _ => ListenerState::WaitingMarker,
        };
        step
    }

    /// Loop until stopped, desynchronized or the transport fails.
    pub fn run(&mut self) -> ListenerExit {
        loop {
            if self.stop.load(Ordering::Acquire) {
                self.state = ListenerState::Terminated;
                return ListenerExit::Stopped;
            }
            match self.poll() {
                Step::Idle => thread::sleep(self.poll_interval),
                Step::Dispatched => {}
                Step::Exit(exit) => return exit,
            }
        }
    }

    fn cycle(&mut self) -> RadioResult<Step> {
        self.state = ListenerState::WaitingMarker;
        let mut header = [0u8; RECORD_HEADER_LEN];
        {
            let mut transport = self.transport.lock();
            if transport.bytes_available()? < RECORD_HEADER_LEN {
                return Ok(Step::Idle);
            }
            transport.read_exact(&mut header)?;
        }
        let [marker_byte, size] = header;
        let marker = Marker::from_byte(marker_byte);

        let Some(body_len) = marker.body_len(size) else {
            let drained = self.drain()?;
            error!(
                "Unknown record marker 0x{:02X} (size byte 0x{:02X}), {} bytes left in buffer:\n{}",
                marker_byte,
                size,
                drained.len(),
                pretty_hex(&drained, 16)
            );
            error!("Stopping radio listener");
            return Ok(Step::Exit(ListenerExit::Desync {
                marker: marker_byte,
                size,
                drained,
            }));
        };

        self.state = ListenerState::AwaitingBody;
        let Some(body) = self.read_body(body_len)? else {
            return Ok(Step::Exit(ListenerExit::Stopped));
        };

        self.state = ListenerState::Dispatching;
        match RadioEvent::decode(marker, size, &body) {
            Ok(RadioEvent::Frame(frame)) => {
                debug!("Frame: {} bytes, rssi {:?}", frame.payload.len(), frame.rssi);
                self.sink.on_frame(frame);
            }
            Ok(RadioEvent::Command(response)) => {
                debug!("Response: {} status 0x{:02X}", response.command, response.status);
                self.sink.on_command_response(response);
            }
            Err(e) => warn!("Dropping malformed record 0x{:02X}: {}", marker_byte, e),
        }
        Ok(Step::Dispatched)
    }

    /// Wait until `len` bytes are buffered, then read them. Returns `None` if
    /// a stop is requested first.
    fn read_body(&mut self, len: usize) -> RadioResult<Option<Vec<u8>>> {
        let mut body = vec![0u8; len];
        if len == 0 {
            return Ok(Some(body));
        }
        loop {
            {
                let mut transport = self.transport.lock();
                if transport.bytes_available()? >= len {
                    transport.read_exact(&mut body)?;
                    return Ok(Some(body));
                }
            }
            if self.stop.load(Ordering::Acquire) {
                return Ok(None);
            }
            thread::sleep(self.poll_interval);
        }
    }

    fn drain(&mut self) -> RadioResult<Vec<u8>> {
        let mut transport = self.transport.lock();
        let mut drained = vec![0u8; transport.bytes_available()?];
        transport.read_exact(&mut drained)?;
        Ok(drained)
    }
}

/// What a stopped listener hands back.
#[derive(Debug)]
pub struct ListenerOutcome<S> {
    /// Why it stopped.
    pub exit: ListenerExit,
    /// The sink, unless the listener thread panicked.
    pub sink: Option<S>,
}

/// Handle to a listener thread.
pub struct ListenerHandle<S> {
    stop: Arc<AtomicBool>,
    exit: Arc<Mutex<Option<ListenerExit>>>,
    thread: Option<JoinHandle<(ListenerExit, S)>>,
}

impl<S> ListenerHandle<S> {
    /// Whether the listener thread has exited on its own or been stopped.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Why the listener stopped, once it has. Does not join the thread.
    pub fn exit(&self) -> Option<ListenerExit> {
        self.exit.lock().clone()
    }

    /// Signal the listener and wait for it to exit.
    pub fn stop(mut self) -> ListenerOutcome<S> {
        self.stop.store(true, Ordering::Release);
        let Some(thread) = self.thread.take() else {
            return ListenerOutcome {
                exit: ListenerExit::Stopped,
                sink: None,
            };
        };
        match thread.join() {
            Ok((exit, sink)) => ListenerOutcome {
                exit,
                sink: Some(sink),
            },
            Err(_) => {
                error!("Radio listener thread panicked");
                ListenerOutcome {
                    exit: ListenerExit::Panicked,
                    sink: None,
                }
            }
        }
    }
}

impl<S> Drop for ListenerHandle<S> {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Start a listener thread reading from `transport`.
pub fn spawn<T, S>(
    transport: SharedTransport<T>,
    sink: S,
    poll_interval: Duration,
) -> RadioResult<ListenerHandle<S>>
where
    T: Transport + 'static,
    S: EventSink + 'static,
{
    let mut listener = Listener::new(transport, sink, poll_interval);
    let stop = listener.stop_flag();
    let exit_slot = Arc::new(Mutex::new(None));
    let thread_exit = Arc::clone(&exit_slot);

    let thread = thread::Builder::new()
        .name("zigtools-listener".to_string())
        .spawn(move || {
            info!("Radio listener started");
            let exit = listener.run();
            info!("Radio listener exited: {:?}", exit);
            *thread_exit.lock() = Some(exit.clone());
            (exit, listener.into_sink())
        })?;

    Ok(ListenerHandle {
        stop,
        exit: exit_slot,
        thread: Some(thread),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use crate::sink::{ChannelSink, NullSink};
    use zigtools_protocol::{CommandCode, Frame, RadioResponse};

    fn make_listener(
        mock: &MockTransport,
    ) -> (Listener<MockTransport, ChannelSink>, crossbeam_channel::Receiver<RadioEvent>) {
        let (sink, rx) = ChannelSink::new();
        let transport = Arc::new(Mutex::new(mock.clone()));
        (Listener::new(transport, sink, Duration::from_millis(1)), rx)
    }

    #[test]
    fn test_idle_without_header() {
        let mock = MockTransport::new();
        let (mut listener, rx) = make_listener(&mock);
        assert_eq!(listener.poll(), Step::Idle);
        mock.push_rx(&[0xB0]);
        assert_eq!(listener.poll(), Step::Idle);
        assert_eq!(listener.state(), ListenerState::WaitingMarker);
        assert!(rx.try_recv().is_err());
        assert_eq!(mock.pending_rx(), 1);
    }

    #[test]
    fn test_new_frame_record() {
        let mock = MockTransport::new();
        mock.push_rx(&[0xB0, 0x03, 0x41, 0x42, 0x20]);
        let (mut listener, rx) = make_listener(&mock);

        assert_eq!(listener.poll(), Step::Dispatched);
        assert_eq!(
            rx.try_recv().unwrap(),
            RadioEvent::Frame(Frame {
                payload: vec![0x03, 0x41, 0x42],
                rssi: Some(0x20),
            })
        );
        assert!(rx.try_recv().is_err());
        assert_eq!(mock.pending_rx(), 0);
    }

    #[test]
    fn test_command_records_in_order() {
        let mock = MockTransport::new();
        mock.push_rx(&[0xB2, 0x01, 0x00, 0xB1, 0x01, 0x05, 0xBF, 0x01, 0x00]);
        let (mut listener, rx) = make_listener(&mock);

        for _ in 0..3 {
            assert_eq!(listener.poll(), Step::Dispatched);
        }
        let codes: Vec<_> = rx
            .try_iter()
            .map(|event| match event {
                RadioEvent::Command(r) => (r.command, r.status),
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(
            codes,
            vec![
                (CommandCode::ChannelChanged, 0x00),
                (CommandCode::DataSent, 0x05),
                (CommandCode::SystemResponse, 0x00),
            ]
        );
    }

    #[test]
    fn test_unknown_marker_terminates() {
        let mock = MockTransport::new();
        mock.push_rx(&[0xFF, 0x02, 0xB1, 0x01, 0x00]);
        let (mut listener, rx) = make_listener(&mock);

        assert_eq!(
            listener.poll(),
            Step::Exit(ListenerExit::Desync {
                marker: 0xFF,
                size: 0x02,
                drained: vec![0xB1, 0x01, 0x00],
            })
        );
        assert_eq!(listener.state(), ListenerState::Terminated);

        // Nothing after the bad marker is dispatched, even if more arrives.
        mock.push_rx(&[0xB1, 0x01, 0x00]);
        assert_eq!(listener.poll(), Step::Exit(ListenerExit::Stopped));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_body_wait_honors_stop() {
        let mock = MockTransport::new();
        // Claims 100 bytes, sends 2.
        mock.push_rx(&[0xB0, 100, 0x01, 0x02]);
        let (mut listener, rx) = make_listener(&mock);
        listener.stop_flag().store(true, Ordering::Release);

        assert_eq!(listener.poll(), Step::Exit(ListenerExit::Stopped));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_zero_length_frame_is_dropped() {
        let mock = MockTransport::new();
        mock.push_rx(&[0xB0, 0x00, 0xB1, 0x01, 0x00]);
        let (mut listener, rx) = make_listener(&mock);

        assert_eq!(listener.poll(), Step::Dispatched);
        assert_eq!(listener.poll(), Step::Dispatched);
        assert_eq!(
            rx.try_recv().unwrap(),
            RadioEvent::Command(RadioResponse {
                command: CommandCode::DataSent,
                status: 0,
            })
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_transport_failure_terminates() {
        let mut mock = MockTransport::new();
        let (mut listener, _rx) = make_listener(&mock);
        mock.close().unwrap();

        assert!(matches!(
            listener.poll(),
            Step::Exit(ListenerExit::TransportFailed(_))
        ));
    }

    #[test]
    fn test_spawned_listener_stops_and_returns_sink() {
        let mock = MockTransport::new();
        let (sink, rx) = ChannelSink::new();
        let transport = Arc::new(Mutex::new(mock.clone()));
        let handle = spawn(transport, sink, Duration::from_millis(1)).unwrap();

        mock.push_rx(&[0xB0, 0x03, 0x41, 0x42, 0x20]);
        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(matches!(event, RadioEvent::Frame(_)));

        let outcome = handle.stop();
        assert_eq!(outcome.exit, ListenerExit::Stopped);
        assert!(outcome.sink.is_some());
    }

    #[test]
    fn test_exit_reason_visible_before_join() {
        let mock = MockTransport::new();
        let transport = Arc::new(Mutex::new(mock.clone()));
        let handle = spawn(transport, NullSink, Duration::from_millis(1)).unwrap();
        assert_eq!(handle.exit(), None);

        mock.push_rx(&[0xFF, 0x00]);
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while !handle.is_finished() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(matches!(
            handle.exit(),
            Some(ListenerExit::Desync { marker: 0xFF, .. })
        ));
    }
}
