//! Stream configuration.

use std::time::Duration;

/// Configuration for an event stream.
///
/// # Example
///
/// ```
/// use daedalus_sse::SseConfig;
/// use std::time::Duration;
///
/// let config = SseConfig::new()
///     .with_buffer_size(8)
///     .with_keep_alive(Duration::from_secs(15));
/// assert_eq!(config.buffer_size, 8);
/// ```
#[derive(Debug, Clone)]
pub struct SseConfig {
    /// Number of frames queued before `send` waits for the client.
    pub buffer_size: usize,
    /// Interval for keep-alive comments. `None` disables them.
    pub keep_alive_interval: Option<Duration>,
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            buffer_size: 32,
            keep_alive_interval: None,
        }
    }
}

impl SseConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the channel capacity. Zero is bumped to one.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Enables keep-alive comments.
    #[must_use]
    pub fn with_keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = Some(interval);
        self
    }
}
