//! Request and response bodies of the OpenDAX Cloud wallet REST API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAddressRequest {
    pub currency_id: String,
}

/// `POST /address/new` response. Everything besides `address` is kept as
/// gateway-specific details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAddressResponse {
    pub address: String,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendTransactionRequest {
    pub currency_id: String,
    pub to: String,
    pub amount: Decimal,
    #[serde(default)]
    pub options: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendTransactionResponse {
    #[serde(default)]
    pub options: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRequest {
    pub currency_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: Decimal,
}
