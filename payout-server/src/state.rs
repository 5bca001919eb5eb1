//! Application state shared across all request handlers.

use crate::config::runtime::SharedConfig;
use payout_core::import::Importer;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Bulk importer backed by the catalog store.
    pub importer: Arc<Importer>,
    /// Runtime configuration (can be reloaded via SIGHUP).
    pub config: SharedConfig,
}

impl AppState {
    pub fn new(importer: Arc<Importer>, config: SharedConfig) -> Self {
        Self { importer, config }
    }
}
