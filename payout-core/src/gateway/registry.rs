//! Adapter kinds known to the process.

use super::{Capability, Gateway, GatewayCapabilities, GatewayError, OpendaxCloudGateway};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Builds an unconfigured adapter.
pub type GatewayFactory = Arc<dyn Fn() -> Box<dyn Gateway> + Send + Sync>;

struct RegisteredGateway {
    factory: GatewayFactory,
    capabilities: GatewayCapabilities,
}

/// Maps the `gateway` column of a wallet to an adapter factory.
///
/// Capabilities are read from a probe instance once, at registration.
#[derive(Default)]
pub struct GatewayRegistry {
    entries: HashMap<String, RegisteredGateway>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every adapter shipped in this crate.
    pub fn with_builtin(request_timeout: Duration) -> Self {
        let mut registry = Self::new();
        registry.register(OpendaxCloudGateway::KIND, move || {
            Box::new(OpendaxCloudGateway::new(request_timeout))
        });
        registry
    }

    /// Register `factory` under `kind`, replacing any previous entry.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Gateway> + Send + Sync + 'static,
    {
        let kind = kind.into();
        let probe = factory();
        let capabilities = GatewayCapabilities::of(probe.as_ref());
        let features = probe.features();

        info!(
            gateway = %kind,
            fetch_txid = capabilities.fetch_txid,
            confirm_withdrawal = capabilities.confirm_withdrawal,
            skip_deposit_collection = features.skip_deposit_collection,
            "Registered gateway adapter"
        );

        self.entries.insert(
            kind,
            RegisteredGateway {
                factory: Arc::new(factory),
                capabilities,
            },
        );
    }

    pub fn capabilities(&self, kind: &str) -> Option<GatewayCapabilities> {
        self.entries.get(kind).map(|e| e.capabilities)
    }

    pub fn supports(&self, kind: &str, capability: Capability) -> bool {
        self.capabilities(kind)
            .is_some_and(|c| c.supports(capability))
    }

    /// A new, unconfigured adapter of `kind`.
    pub fn build(&self, kind: &str) -> Result<Box<dyn Gateway>, GatewayError> {
        self.entries
            .get(kind)
            .map(|e| (e.factory)())
            .ok_or_else(|| GatewayError::UnknownGateway(kind.to_owned()))
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
