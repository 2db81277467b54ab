//! Hub configuration.

use std::time::Duration;

/// Configuration for the hub's dispatcher.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Upper bound on a single write (or close) to one connection.
    ///
    /// A connection that does not accept a frame within this window is
    /// treated exactly like one whose write errored: it is closed and
    /// removed. This bounds how long one slow client can hold up an event.
    pub write_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            write_timeout: Duration::from_secs(5),
        }
    }
}
