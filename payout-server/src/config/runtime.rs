//! Runtime configuration re-exports.
//!
//! The validated config types live in `payout-core::config` so the watcher
//! can read them; this module re-exports them for convenience.

pub use payout_core::config::{AdminConfig, ServerConfig, SharedConfig, WatcherConfig};
