//! Session configuration.
//!
//! Defaults match the radio firmware. Values can be overridden from a YAML
//! file:
//!
//! ```yaml
//! baud_rate: 57600
//! handshake_timeout_ms: 5000
//! listener_poll_ms: 5
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use zigtools_protocol::DEFAULT_BAUD_RATE;

use crate::error::{RadioError, RadioResult};

/// Tunables for a [`Radio`](crate::Radio) session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Serial speed.
    pub baud_rate: u32,
    /// How long to wait for the radio's ready status.
    pub handshake_timeout_ms: u64,
    /// Poll interval while waiting for the ready status.
    pub handshake_poll_ms: u64,
    /// Idle wait of the listener between reads.
    pub listener_poll_ms: u64,
    /// Ask the radio to stream frames when the sink wants them.
    pub stream_frames: bool,
}

impl Default for RadioConfig {
    fn default() -> Self {
        RadioConfig {
            baud_rate: DEFAULT_BAUD_RATE,
            handshake_timeout_ms: 5_000,
            handshake_poll_ms: 50,
            listener_poll_ms: 5,
            stream_frames: true,
        }
    }
}

impl RadioConfig {
    /// Load a configuration from a YAML file. Missing keys keep their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> RadioResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| RadioError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&text)
    }

    /// Parse a configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> RadioResult<Self> {
        serde_yaml::from_str(text).map_err(|e| RadioError::Config(e.to_string()))
    }

    /// Handshake window.
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    /// Handshake poll interval.
    pub fn handshake_poll(&self) -> Duration {
        Duration::from_millis(self.handshake_poll_ms)
    }

    /// Listener idle wait.
    pub fn listener_poll(&self) -> Duration {
        Duration::from_millis(self.listener_poll_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RadioConfig::default();
        assert_eq!(config.baud_rate, 57_600);
        assert_eq!(config.handshake_timeout(), Duration::from_secs(5));
        assert_eq!(config.listener_poll(), Duration::from_millis(5));
        assert!(config.stream_frames);
    }

    #[test]
    fn test_partial_yaml() {
        let config = RadioConfig::from_yaml_str("baud_rate: 115200\nstream_frames: false\n").unwrap();
        assert_eq!(config.baud_rate, 115_200);
        assert!(!config.stream_frames);
        assert_eq!(config.handshake_poll_ms, 50);
    }

    #[test]
    fn test_bad_yaml() {
        let err = RadioConfig::from_yaml_str("baud_rate: fast").unwrap_err();
        assert!(matches!(err, RadioError::Config(_)));
    }
}
