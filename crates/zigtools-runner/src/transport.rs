//! Byte-level link to the radio.
//!
//! The listener only issues blocking reads for byte counts that
//! [`Transport::bytes_available`] has already reported, so implementations
//! never need to support partial reads.

use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use parking_lot::Mutex;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::error::{RadioError, RadioResult};

/// Transport shared between the caller (writes) and the listener (reads).
pub type SharedTransport<T> = Arc<Mutex<T>>;

/// A byte channel to the radio.
pub trait Transport: Send {
    /// Number of received bytes that can be read without blocking.
    fn bytes_available(&mut self) -> RadioResult<usize>;

    /// Read exactly `buf.len()` bytes.
    fn read_exact(&mut self, buf: &mut [u8]) -> RadioResult<()>;

    /// Write all of `data`.
    fn write_all(&mut self, data: &[u8]) -> RadioResult<()>;

    /// Release the link. Further calls fail.
    fn close(&mut self) -> RadioResult<()>;
}

/// Read timeout applied to the serial port. Reads are only issued for bytes
/// already buffered, so this only matters for a misbehaving driver.
const SERIAL_READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Serial port transport (USB virtual COM port), 8N1 without flow control.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    port_name: String,
}

impl SerialTransport {
    /// Open `port` (e.g. `/dev/ttyUSB0`, `COM3`) at `baud_rate`.
    pub fn open(port: &str, baud_rate: u32) -> RadioResult<Self> {
        let serial = serialport::new(port, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(SERIAL_READ_TIMEOUT)
            .open()
            .map_err(|e| RadioError::Transport(format!("failed to open {}: {}", port, e)))?;

        info!("Opened serial port {} at {} baud", port, baud_rate);
        Ok(SerialTransport {
            port: Some(serial),
            port_name: port.to_string(),
        })
    }

    /// Port name as given to [`SerialTransport::open`].
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn port(&mut self) -> RadioResult<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| RadioError::Transport(format!("{} is closed", self.port_name)))
    }
}

impl Transport for SerialTransport {
    fn bytes_available(&mut self) -> RadioResult<usize> {
        Ok(self.port()?.bytes_to_read()? as usize)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> RadioResult<()> {
        self.port()?.read_exact(buf)?;
        Ok(())
    }

    fn write_all(&mut self, data: &[u8]) -> RadioResult<()> {
        let port = self.port()?;
        port.write_all(data)?;
        port.flush()?;
        Ok(())
    }

    fn close(&mut self) -> RadioResult<()> {
        if self.port.take().is_some() {
            debug!("Closed serial port {}", self.port_name);
        }
        Ok(())
    }
}
