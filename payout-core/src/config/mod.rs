//! Runtime configuration shared between the server and the watcher.
//!
//! These are the validated forms; reading and rewriting the TOML file is the
//! server crate's job.

mod admin;
mod server;
mod watcher;

pub use admin::AdminConfig;
pub use server::ServerConfig;
pub use watcher::WatcherConfig;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared configuration state with separate locks for each section.
///
/// Sections are replaced wholesale on reload, so readers never observe a
/// half-updated section.
#[derive(Clone)]
pub struct SharedConfig {
    pub server: Arc<RwLock<ServerConfig>>,
    pub admin: Arc<RwLock<AdminConfig>>,
    /// Read by the watcher at the start of every tick.
    pub watcher: Arc<RwLock<WatcherConfig>>,
}

impl SharedConfig {
    pub fn new(server: ServerConfig, admin: AdminConfig, watcher: WatcherConfig) -> Self {
        Self {
            server: Arc::new(RwLock::new(server)),
            admin: Arc::new(RwLock::new(admin)),
            watcher: Arc::new(RwLock::new(watcher)),
        }
    }
}
