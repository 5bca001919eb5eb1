//! Wallet gateway adapters.
//!
//! A [`Gateway`] wraps one blockchain node or custodial backend behind a fixed
//! operation set. Operations only some backends offer are separate traits
//! ([`TxidFetcher`], [`ConfirmationChecker`]) reached through the `as_*`
//! accessors, so what an adapter supports is a property of its type and can
//! be read once when it is registered (see [`GatewayCapabilities`]).
//!
//! Adapters are built fresh for every unit of work by the
//! [`GatewayRegistry`] and configured with [`GatewaySettings`] derived from
//! the wallet and currency at hand. Nothing configured for one withdrawal is
//! visible while processing another.
//!
//! Every transport or backend failure surfaces as [`GatewayError::Client`],
//! so callers never need to know which HTTP client an adapter uses.

mod opendax;
mod registry;
mod settings;

pub use opendax::OpendaxCloudGateway;
pub use registry::{GatewayFactory, GatewayRegistry};
pub use settings::{CurrencySettings, GatewaySettings, WalletSettings};

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by gateway adapters.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A setting the adapter needs was not provided.
    #[error("missing gateway setting `{key}`")]
    MissingSetting { key: &'static str },

    /// A setting was provided but cannot be used.
    #[error("invalid gateway setting `{key}`: {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    /// No adapter is registered under this kind.
    #[error("unknown gateway `{0}`")]
    UnknownGateway(String),

    /// The backend or the transport to it failed.
    #[error("gateway client error: {0}")]
    Client(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl GatewayError {
    pub fn client(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        GatewayError::Client(Box::new(err))
    }
}

impl From<payout_sdk::client::ClientError> for GatewayError {
    fn from(err: payout_sdk::client::ClientError) -> Self {
        GatewayError::client(err)
    }
}

/// A gateway call did not finish in time.
#[derive(Debug, Error)]
#[error("gateway call timed out after {0:?}")]
pub struct GatewayTimeout(pub Duration);

/// A freshly allocated deposit address.
#[derive(Debug, Clone, PartialEq)]
pub struct DepositAddress {
    pub address: String,
    /// Backend-specific data returned alongside the address.
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// An outgoing transfer handed to, and returned by, a gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayTransaction {
    pub currency_id: String,
    pub to_address: String,
    pub amount: Decimal,
    /// On-chain hash, once known.
    pub hash: Option<String>,
    /// Backend-specific options; replaced by what the backend returns.
    pub options: serde_json::Value,
}

/// Behaviour switches an adapter reports about its backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayFeatures {
    /// The backend sweeps deposit addresses itself.
    pub skip_deposit_collection: bool,
}

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Validate and store `settings` for subsequent calls.
    ///
    /// Replaces any previous configuration, including cached client handles.
    fn configure(&mut self, settings: GatewaySettings) -> Result<(), GatewayError>;

    async fn create_address(&self) -> Result<DepositAddress, GatewayError>;

    async fn create_transaction(
        &self,
        transaction: GatewayTransaction,
    ) -> Result<GatewayTransaction, GatewayError>;

    async fn load_balance(&self) -> Result<Decimal, GatewayError>;

    fn features(&self) -> GatewayFeatures {
        GatewayFeatures::default()
    }

    fn as_txid_fetcher(&self) -> Option<&dyn TxidFetcher> {
        None
    }

    fn as_confirmation_checker(&self) -> Option<&dyn ConfirmationChecker> {
        None
    }
}

/// Backends that can map a submitted transfer to its on-chain transaction id.
#[async_trait]
pub trait TxidFetcher: Send + Sync {
    /// `Ok(None)` while the backend has no transaction id yet.
    async fn fetch_transaction_id(&self, remote_id: &str) -> Result<Option<String>, GatewayError>;
}

/// Backends that can tell whether a transfer reached their confirmation
/// threshold.
#[async_trait]
pub trait ConfirmationChecker: Send + Sync {
    async fn is_withdrawal_confirmed(&self, remote_id: &str) -> Result<bool, GatewayError>;
}

/// An optional gateway operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    FetchTxid,
    ConfirmWithdrawal,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::FetchTxid => f.write_str("fetch_txid"),
            Capability::ConfirmWithdrawal => f.write_str("confirm_withdrawal"),
        }
    }
}

/// Optional operations an adapter type implements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayCapabilities {
    pub fetch_txid: bool,
    pub confirm_withdrawal: bool,
}

impl GatewayCapabilities {
    pub fn of(gateway: &dyn Gateway) -> Self {
        Self {
            fetch_txid: gateway.as_txid_fetcher().is_some(),
            confirm_withdrawal: gateway.as_confirmation_checker().is_some(),
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::FetchTxid => self.fetch_txid,
            Capability::ConfirmWithdrawal => self.confirm_withdrawal,
        }
    }
}

/// Run a gateway future with an upper bound on its duration. Expiry is a
/// [`GatewayError::Client`] like any other transport failure.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, GatewayError>
where
    F: std::future::Future<Output = Result<T, GatewayError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::client(GatewayTimeout(limit))),
    }
}
