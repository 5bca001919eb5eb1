//! Per-call gateway configuration.

use super::GatewayError;
use std::time::Duration;

/// Wallet side of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSettings {
    /// Base URI of the wallet node or custodial API.
    pub uri: Option<String>,
    pub address: Option<String>,
    pub secret: Option<String>,
}

/// Currency side of the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencySettings {
    pub id: String,
    pub base_factor: i64,
    pub options: serde_json::Value,
}

/// Everything an adapter gets before a call. Built per unit of work, never
/// persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GatewaySettings {
    pub wallet: Option<WalletSettings>,
    pub currency: Option<CurrencySettings>,
    /// Upper bound for a single backend request. Adapters fall back to the
    /// timeout they were built with when unset.
    pub request_timeout: Option<Duration>,
}

impl GatewaySettings {
    pub fn new(wallet: WalletSettings, currency: CurrencySettings) -> Self {
        Self {
            wallet: Some(wallet),
            currency: Some(currency),
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn require_wallet(&self) -> Result<&WalletSettings, GatewayError> {
        self.wallet
            .as_ref()
            .ok_or(GatewayError::MissingSetting { key: "wallet" })
    }

    pub fn require_currency(&self) -> Result<&CurrencySettings, GatewayError> {
        self.currency
            .as_ref()
            .ok_or(GatewayError::MissingSetting { key: "currency" })
    }
}
