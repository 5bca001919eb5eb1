//! OpenDAX Cloud wallet adapter.
//!
//! Supports address creation, sending and balance queries. The backend has
//! no endpoint for looking a transfer up by its remote id, so the adapter
//! offers neither [`TxidFetcher`](super::TxidFetcher) nor
//! [`ConfirmationChecker`](super::ConfirmationChecker); the backend reports
//! those through its own webhooks instead.

use super::{
    CurrencySettings, DepositAddress, Gateway, GatewayError, GatewayFeatures, GatewaySettings,
    GatewayTransaction,
};
use async_trait::async_trait;
use payout_sdk::client::OpendaxClient;
use payout_sdk::objects::opendax::SendTransactionRequest;
use rust_decimal::Decimal;
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
struct Configured {
    uri: Url,
    currency: CurrencySettings,
    request_timeout: Duration,
}

pub struct OpendaxCloudGateway {
    /// Used when the settings carry no request timeout.
    default_timeout: Duration,
    configured: Option<Configured>,
    client: OnceLock<OpendaxClient>,
}

impl OpendaxCloudGateway {
    /// Value of the wallet `gateway` column selecting this adapter.
    pub const KIND: &'static str = "opendax_cloud";

    pub const DEFAULT_FEATURES: GatewayFeatures = GatewayFeatures {
        skip_deposit_collection: true,
    };

    pub fn new(default_timeout: Duration) -> Self {
        Self {
            default_timeout,
            configured: None,
            client: OnceLock::new(),
        }
    }

    fn configured(&self) -> Result<&Configured, GatewayError> {
        self.configured
            .as_ref()
            .ok_or(GatewayError::MissingSetting { key: "wallet" })
    }

    fn currency_id(&self) -> Result<&str, GatewayError> {
        Ok(self.configured()?.currency.id.as_str())
    }

    /// The HTTP client for the configured node, created on first use.
    fn client(&self) -> Result<&OpendaxClient, GatewayError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let configured = self.configured()?;
        let client = OpendaxClient::new(configured.uri.clone(), configured.request_timeout)?;
        Ok(self.client.get_or_init(|| client))
    }
}

#[async_trait]
impl Gateway for OpendaxCloudGateway {
    fn configure(&mut self, settings: GatewaySettings) -> Result<(), GatewayError> {
        self.client = OnceLock::new();
        self.configured = None;

        let wallet = settings.require_wallet()?;
        let currency = settings.require_currency()?;

        let raw_uri = wallet
            .uri
            .as_deref()
            .ok_or(GatewayError::MissingSetting { key: "wallet.uri" })?;
        let uri = Url::parse(raw_uri).map_err(|e| GatewayError::InvalidSetting {
            key: "wallet.uri",
            reason: e.to_string(),
        })?;

        self.configured = Some(Configured {
            uri,
            currency: currency.clone(),
            request_timeout: settings.request_timeout.unwrap_or(self.default_timeout),
        });
        Ok(())
    }

    async fn create_address(&self) -> Result<DepositAddress, GatewayError> {
        let response = self.client()?.new_address(self.currency_id()?).await?;
        Ok(DepositAddress {
            address: response.address,
            details: response.details,
        })
    }

    async fn create_transaction(
        &self,
        mut transaction: GatewayTransaction,
    ) -> Result<GatewayTransaction, GatewayError> {
        let request = SendTransactionRequest {
            currency_id: self.currency_id()?.to_owned(),
            to: transaction.to_address.clone(),
            amount: transaction.amount,
            options: transaction.options.clone(),
        };
        let response = self.client()?.send_transaction(&request).await?;
        transaction.options = response.options;
        Ok(transaction)
    }

    async fn load_balance(&self) -> Result<Decimal, GatewayError> {
        let response = self.client()?.balance(self.currency_id()?).await?;
        Ok(response.balance)
    }

    fn features(&self) -> GatewayFeatures {
        Self::DEFAULT_FEATURES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayCapabilities, WalletSettings};

    fn currency() -> CurrencySettings {
        CurrencySettings {
            id: "eth".into(),
            base_factor: 1_000_000_000_000_000_000,
            options: serde_json::json!({}),
        }
    }

    fn wallet(uri: Option<&str>) -> WalletSettings {
        WalletSettings {
            uri: uri.map(str::to_owned),
            address: Some("0xhot".into()),
            secret: None,
        }
    }

    #[test]
    fn test_configure_requires_wallet_and_currency() {
        let mut gw = OpendaxCloudGateway::new(Duration::from_secs(1));

        let err = gw
            .configure(GatewaySettings {
                wallet: None,
                currency: Some(currency()),
                request_timeout: None,
            })
            .unwrap_err();
        assert!(matches!(err, GatewayError::MissingSetting { key: "wallet" }));

        let err = gw
            .configure(GatewaySettings {
                wallet: Some(wallet(Some("http://node:8000"))),
                currency: None,
                request_timeout: None,
            })
            .unwrap_err();
        assert!(matches!(err, GatewayError::MissingSetting { key: "currency" }));

        let err = gw
            .configure(GatewaySettings::new(wallet(None), currency()))
            .unwrap_err();
        assert!(matches!(err, GatewayError::MissingSetting { key: "wallet.uri" }));
    }

    #[test]
    fn test_backend_collects_its_own_deposits() {
        let gw = OpendaxCloudGateway::new(Duration::from_secs(1));
        assert!(gw.features().skip_deposit_collection);
    }

    #[test]
    fn test_configure_rejects_bad_uri() {
        let mut gw = OpendaxCloudGateway::new(Duration::from_secs(1));
        let err = gw
            .configure(GatewaySettings::new(wallet(Some("not a uri")), currency()))
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidSetting { key: "wallet.uri", .. }));
    }

    #[test]
    fn test_reconfigure_drops_cached_client() {
        let mut gw = OpendaxCloudGateway::new(Duration::from_secs(1));
        gw.configure(GatewaySettings::new(wallet(Some("http://node-a:8000")), currency()))
            .unwrap();
        assert_eq!(gw.client().unwrap().base_url().host_str(), Some("node-a"));

        gw.configure(GatewaySettings::new(wallet(Some("http://node-b:8000")), currency()))
            .unwrap();
        assert_eq!(gw.client().unwrap().base_url().host_str(), Some("node-b"));
    }

    #[test]
    fn test_request_timeout_comes_from_settings() {
        let mut gw = OpendaxCloudGateway::new(Duration::from_secs(10));
        gw.configure(GatewaySettings::new(wallet(Some("http://node:8000")), currency()))
            .unwrap();
        assert_eq!(gw.configured().unwrap().request_timeout, Duration::from_secs(10));

        gw.configure(
            GatewaySettings::new(wallet(Some("http://node:8000")), currency())
                .with_request_timeout(Duration::from_secs(3)),
        )
        .unwrap();
        assert_eq!(gw.configured().unwrap().request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_failed_configure_clears_previous_settings() {
        let mut gw = OpendaxCloudGateway::new(Duration::from_secs(1));
        gw.configure(GatewaySettings::new(wallet(Some("http://node-a:8000")), currency()))
            .unwrap();
        assert!(gw.configure(GatewaySettings::default()).is_err());
        assert!(matches!(
            gw.client().err(),
            Some(GatewayError::MissingSetting { key: "wallet" })
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_calls_fail_fast() {
        let gw = OpendaxCloudGateway::new(Duration::from_secs(1));
        assert!(matches!(
            gw.load_balance().await,
            Err(GatewayError::MissingSetting { .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_is_client_error() {
        let mut gw = OpendaxCloudGateway::new(Duration::from_millis(500));
        gw.configure(GatewaySettings::new(wallet(Some("http://127.0.0.1:9")), currency()))
            .unwrap();
        assert!(matches!(
            gw.create_address().await,
            Err(GatewayError::Client(_))
        ));
    }

    #[test]
    fn test_no_watch_capabilities() {
        let gw = OpendaxCloudGateway::new(Duration::from_secs(1));
        assert_eq!(GatewayCapabilities::of(&gw), GatewayCapabilities::default());
    }
}
