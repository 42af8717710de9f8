//! Event sinks that receive what the listener decodes.
//!
//! Events arrive on the listener thread in the order their records appeared
//! on the wire.

use crossbeam_channel::{Receiver, Sender};
use log::error;
use zigtools_pcap::CaptureWriter;
use zigtools_protocol::{Frame, RadioEvent, RadioResponse};

/// Receives decoded radio events.
///
/// Both callbacks default to doing nothing, so a sink only implements what it
/// cares about.
pub trait EventSink: Send {
    /// A frame was received off the air.
    fn on_frame(&mut self, _frame: Frame) {}

    /// The radio acknowledged a command or reported a status.
    fn on_command_response(&mut self, _response: RadioResponse) {}

    /// Whether the radio should be asked to stream frames to this sink.
    fn wants_frames(&self) -> bool {
        true
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn on_frame(&mut self, frame: Frame) {
        (**self).on_frame(frame)
    }

    fn on_command_response(&mut self, response: RadioResponse) {
        (**self).on_command_response(response)
    }

    fn wants_frames(&self) -> bool {
        (**self).wants_frames()
    }
}

/// Discards everything and does not request streaming.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn wants_frames(&self) -> bool {
        false
    }
}

type FrameFn = Box<dyn FnMut(Frame) + Send>;
type CommandFn = Box<dyn FnMut(RadioResponse) + Send>;

/// Sink built from optional closures.
#[derive(Default)]
pub struct FnSink {
    frame: Option<FrameFn>,
    command: Option<CommandFn>,
}

impl FnSink {
    /// A sink with no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `f` for every received frame.
    pub fn with_frames(mut self, f: impl FnMut(Frame) + Send + 'static) -> Self {
        self.frame = Some(Box::new(f));
        self
    }

    /// Call `f` for every command response.
    pub fn with_commands(mut self, f: impl FnMut(RadioResponse) + Send + 'static) -> Self {
        self.command = Some(Box::new(f));
        self
    }
}

impl EventSink for FnSink {
    fn on_frame(&mut self, frame: Frame) {
        if let Some(f) = self.frame.as_mut() {
            f(frame);
        }
    }

    fn on_command_response(&mut self, response: RadioResponse) {
        if let Some(f) = self.command.as_mut() {
            f(response);
        }
    }

    fn wants_frames(&self) -> bool {
        self.frame.is_some()
    }
}

/// Forwards events into a channel, for consumers on another thread.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<RadioEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver its events are delivered to.
    pub fn new() -> (Self, Receiver<RadioEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (ChannelSink { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn on_frame(&mut self, frame: Frame) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.tx.send(RadioEvent::Frame(frame));
    }

    fn on_command_response(&mut self, response: RadioResponse) {
        let _ = self.tx.send(RadioEvent::Command(response));
    }
}

/// Appends every received frame to a capture file, stamped with the arrival
/// time.
#[derive(Debug)]
pub struct CaptureFrameSink {
    writer: CaptureWriter,
    failures: u64,
}

impl CaptureFrameSink {
    /// Wrap an open capture writer.
    pub fn new(writer: CaptureWriter) -> Self {
        CaptureFrameSink {
            writer,
            failures: 0,
        }
    }

    /// Number of frames that could not be written.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Give back the writer, e.g. to close it explicitly.
    pub fn into_writer(self) -> CaptureWriter {
        self.writer
    }
}

impl EventSink for CaptureFrameSink {
    fn on_frame(&mut self, frame: Frame) {
        if let Err(e) = self.writer.append_frame_now(&frame) {
            self.failures += 1;
            error!("Failed to write frame to {}: {}", self.writer.path().display(), e);
        }
    }
}

/// Delivers every event to two sinks, first `A` then `B`.
#[derive(Debug, Default)]
pub struct FanoutSink<A, B>(pub A, pub B);

impl<A: EventSink, B: EventSink> EventSink for FanoutSink<A, B> {
    fn on_frame(&mut self, frame: Frame) {
        match (self.0.wants_frames(), self.1.wants_frames()) {
            (true, true) => {
                self.0.on_frame(frame.clone());
                self.1.on_frame(frame);
            }
            (true, false) => self.0.on_frame(frame),
            (false, true) => self.1.on_frame(frame),
            (false, false) => {}
        }
    }

    fn on_command_response(&mut self, response: RadioResponse) {
        self.0.on_command_response(response);
        self.1.on_command_response(response);
    }

    fn wants_frames(&self) -> bool {
        self.0.wants_frames() || self.1.wants_frames()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use zigtools_pcap::CaptureReader;
    use zigtools_protocol::CommandCode;

    fn frame() -> Frame {
        Frame::from_radio(3, &[0x41, 0x42, 0x20]).unwrap()
    }

    #[test]
    fn test_fn_sink_wants_frames_only_with_callback() {
        assert!(!FnSink::new().wants_frames());
        assert!(!FnSink::new().with_commands(|_| {}).wants_frames());
        assert!(FnSink::new().with_frames(|_| {}).wants_frames());
        assert!(!NullSink.wants_frames());
    }

    #[test]
    fn test_channel_sink_preserves_order() {
        let (mut sink, rx) = ChannelSink::new();
        let ack = RadioResponse {
            command: CommandCode::DataSent,
            status: 0,
        };
        sink.on_frame(frame());
        sink.on_command_response(ack);

        assert_eq!(rx.try_recv().unwrap(), RadioEvent::Frame(frame()));
        assert_eq!(rx.try_recv().unwrap(), RadioEvent::Command(ack));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (mut sink, rx) = ChannelSink::new();
        drop(rx);
        sink.on_frame(frame());
    }

    #[test]
    fn test_fanout_delivers_to_both() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_a = seen.clone();
        let seen_b = seen.clone();
        let mut sink = FanoutSink(
            FnSink::new().with_frames(move |f| seen_a.lock().unwrap().push(("a", f))),
            FnSink::new().with_frames(move |f| seen_b.lock().unwrap().push(("b", f))),
        );
        sink.on_frame(frame());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, "a");
        assert_eq!(seen[1].0, "b");
    }

    #[test]
    fn test_capture_sink_writes_frames() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sink.pcap");

        let mut sink = CaptureFrameSink::new(CaptureWriter::open(&path).unwrap());
        sink.on_frame(frame());
        sink.on_frame(Frame::for_transmit(Vec::new()));
        assert_eq!(sink.failures(), 1);
        sink.into_writer().close().unwrap();

        let mut reader = CaptureReader::open(&path).unwrap();
        assert_eq!(reader.get_frame(1).unwrap().payload, vec![0x03, 0x41, 0x42]);
    }
}
