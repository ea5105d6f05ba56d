use std::time::Duration;

/// Delay between the end of one render pass and the start of the next.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(50);

/// Width used when the terminal can't be sized, e.g. when stdout isn't a tty.
pub const DEFAULT_FALLBACK_WIDTH: u16 = 80;

/// Settings for an [Aggregator](crate::Aggregator), fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub refresh_interval: Duration,
    pub fallback_width: u16,
}

impl Config {
    pub fn with_refresh_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }

    pub fn with_fallback_width(mut self, fallback_width: u16) -> Self {
        self.fallback_width = fallback_width;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            fallback_width: DEFAULT_FALLBACK_WIDTH,
        }
    }
}
