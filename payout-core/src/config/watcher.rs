use std::time::Duration;

/// Withdrawal watcher settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherConfig {
    /// Pause between the end of one tick and the start of the next.
    pub tick_interval: Duration,
    /// Upper bound on a single gateway call.
    pub gateway_timeout: Duration,
    /// When false the watcher idles without touching the store.
    pub enabled: bool,
}

impl WatcherConfig {
    pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(25);
    pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            tick_interval: Self::DEFAULT_TICK_INTERVAL,
            gateway_timeout: Self::DEFAULT_GATEWAY_TIMEOUT,
            enabled: true,
        }
    }
}
