//! OpenDAX Cloud wallet client.

use std::time::Duration;

use reqwest::Client;
use url::Url;

use super::{ClientError, parse_response};
use crate::objects::opendax::{
    BalanceRequest, BalanceResponse, NewAddressRequest, NewAddressResponse,
    SendTransactionRequest, SendTransactionResponse,
};

/// Typed HTTP client for an OpenDAX Cloud wallet node.
///
/// Every call is a JSON `POST` relative to the node's base URI.
#[derive(Debug, Clone)]
pub struct OpendaxClient {
    http: Client,
    base_url: Url,
}

impl OpendaxClient {
    /// Idle connections are dropped after one second.
    const IDLE_TIMEOUT: Duration = Duration::from_secs(1);

    /// Create a client for the node at `base_url`. `timeout` bounds each
    /// request end to end.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder()
            .pool_idle_timeout(Self::IDLE_TIMEOUT)
            .timeout(timeout)
            .build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `POST /address/new` – allocate a deposit address.
    pub async fn new_address(&self, currency_id: &str) -> Result<NewAddressResponse, ClientError> {
        self.post(
            "address/new",
            &NewAddressRequest {
                currency_id: currency_id.to_owned(),
            },
        )
        .await
    }

    /// `POST /tx/send` – submit a transfer.
    pub async fn send_transaction(
        &self,
        request: &SendTransactionRequest,
    ) -> Result<SendTransactionResponse, ClientError> {
        self.post("tx/send", request).await
    }

    /// `POST /address/balance` – balance held by the node for a currency.
    pub async fn balance(&self, currency_id: &str) -> Result<BalanceResponse, ClientError> {
        self.post(
            "address/balance",
            &BalanceRequest {
                currency_id: currency_id.to_owned(),
            },
        )
        .await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let resp = self.http.post(url).json(body).send().await?;
        parse_response(resp).await
    }

    /// Join `path` onto the base URI, keeping any path prefix the base
    /// carries (`http://node/wallet` + `tx/send` → `http://node/wallet/tx/send`).
    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        Ok(base.join(path)?)
    }
}
