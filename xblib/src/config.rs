use std::time::Duration;

use crate::protocol::MAX_FRAME_DATA;

/// Default limit on declared frame lengths. Real API frames stay well
/// under this, and a corrupt length above it resyncs at once instead of
/// waiting on tens of kilobytes.
pub const DEFAULT_MAX_FRAME_LEN: usize = 0x200;

/// Timing and buffer settings for a [Client](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Config {
    /// How long to wait for an acknowledgement.
    pub ack_timeout: Duration,
    /// Back-off between empty or failed transport reads.
    pub poll_interval: Duration,
    /// Silence required around `+++`.
    pub guard_time: Duration,
    /// Extra time allowed for each command-mode `OK`.
    pub command_mode_timeout: Duration,
    /// Size of each transport read.
    pub read_buffer: usize,
    /// Longest frame data the decoder will accept.
    pub max_frame_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_secs(3),
            poll_interval: Duration::from_millis(1),
            guard_time: Duration::from_millis(1100),
            command_mode_timeout: Duration::from_secs(1),
            read_buffer: 256,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn guard_time(mut self, guard: Duration) -> Self {
        self.guard_time = guard;
        self
    }

    pub fn command_mode_timeout(mut self, timeout: Duration) -> Self {
        self.command_mode_timeout = timeout;
        self
    }

    pub fn read_buffer(mut self, size: usize) -> Self {
        self.read_buffer = size.max(1);
        self
    }

    pub fn max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = len.clamp(1, MAX_FRAME_DATA);
        self
    }
}
