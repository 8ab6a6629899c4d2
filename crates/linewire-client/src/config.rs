use std::time::Duration;

use linewire_frame::{FrameConfig, DEFAULT_MAX_LINE_LENGTH};
use linewire_transport::DEFAULT_CONNECT_TIMEOUT;

/// Default idle-read timeout: 30 minutes.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Configuration for [`crate::ServerConnection`].
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Bound on establishing the TCP connection.
    pub connect_timeout: Duration,
    /// How long the receive loop waits for a line before treating the
    /// connection as lost. `None` waits forever.
    pub idle_timeout: Option<Duration>,
    /// Bound on a single blocking write. `None` waits forever.
    pub write_timeout: Option<Duration>,
    /// Longest accepted line in bytes, both directions.
    pub max_line_length: usize,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
            write_timeout: None,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl ConnectConfig {
    /// Override the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Override the idle-read timeout.
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Line framing settings derived from this configuration.
    pub fn to_frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_line_length: self.max_line_length,
            read_timeout: self.idle_timeout,
            write_timeout: self.write_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_timeouts() {
        let cfg = ConnectConfig::default();
        assert_eq!(cfg.connect_timeout, Duration::from_secs(30));
        assert_eq!(cfg.idle_timeout, Some(Duration::from_secs(1800)));
        assert!(cfg.write_timeout.is_none());
    }

    #[test]
    fn frame_config_carries_timeouts() {
        let cfg = ConnectConfig::default()
            .with_connect_timeout(Duration::from_secs(2))
            .with_idle_timeout(Some(Duration::from_millis(250)));
        let frame = cfg.to_frame_config();
        assert_eq!(frame.read_timeout, Some(Duration::from_millis(250)));
        assert_eq!(frame.write_timeout, None);
        assert_eq!(frame.max_line_length, DEFAULT_MAX_LINE_LENGTH);
    }
}
