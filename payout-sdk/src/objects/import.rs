//! Bulk import payload records and the report returned after an import.
//!
//! A payload is a JSON object whose keys name a section and whose values are
//! arrays of records:
//!
//! ```json
//! {
//!   "blockchains": [{ "key": "eth-mainnet", "name": "Ethereum", "client": "geth" }],
//!   "currencies":  [{ "id": "eth", "blockchain_key": "eth-mainnet", "base_factor": 1000000000000000000 }],
//!   "wallets":     [{ "name": "ETH hot", "blockchain_key": "eth-mainnet", "kind": "hot",
//!                     "gateway": "opendax_cloud", "address": "0xabc", "currencies": ["eth"],
//!                     "settings": { "uri": "http://wallet:8000" } }]
//! }
//! ```

use super::wallet::{WalletKind, WalletStatus};
use serde::{Deserialize, Serialize};

/// Sections understood by the importer, in the order they are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportSection {
    Blockchains,
    Currencies,
    Wallets,
}

impl ImportSection {
    /// Dependency order: wallets and currencies reference blockchains,
    /// wallets reference currencies.
    pub const ORDERED: [ImportSection; 3] = [
        ImportSection::Blockchains,
        ImportSection::Currencies,
        ImportSection::Wallets,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ImportSection::Blockchains => "blockchains",
            ImportSection::Currencies => "currencies",
            ImportSection::Wallets => "wallets",
        }
    }
}

impl std::fmt::Display for ImportSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A blockchain record. Unique by `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainRecord {
    pub key: String,
    pub name: String,
    pub client: String,
    /// Node endpoint, stored as given.
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub height: i64,
    #[serde(default = "default_status")]
    pub status: String,
}

/// A currency record. Unique by `id`, which is the currency code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRecord {
    pub id: String,
    pub blockchain_key: String,
    /// Subunits per unit; defaults to 1 like the `currencies` column.
    #[serde(default = "default_base_factor")]
    pub base_factor: i64,
    #[serde(default)]
    pub options: serde_json::Value,
    #[serde(default = "default_status")]
    pub status: String,
}

/// A wallet record. Unique by (`blockchain_key`, `kind`).
///
/// Any `id` present in the payload is ignored; the store assigns one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub name: String,
    pub blockchain_key: String,
    pub kind: WalletKind,
    pub gateway: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub currencies: Vec<String>,
    #[serde(default)]
    pub settings: serde_json::Value,
    #[serde(default)]
    pub status: WalletStatus,
}

fn default_status() -> String {
    "enabled".to_string()
}

fn default_base_factor() -> i64 {
    1
}

/// Outcome counters for one section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionReport {
    /// Records inserted.
    pub created: u32,
    /// Records whose natural key already existed.
    pub skipped: u32,
    /// Records that could not be parsed or stored.
    pub failed: u32,
}

/// Result of one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub blockchains: SectionReport,
    pub currencies: SectionReport,
    pub wallets: SectionReport,
    /// Section keys present in the payload that the importer does not know.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_sections: Vec<String>,
}

impl ImportReport {
    pub fn section_mut(&mut self, section: ImportSection) -> &mut SectionReport {
        match section {
            ImportSection::Blockchains => &mut self.blockchains,
            ImportSection::Currencies => &mut self.currencies,
            ImportSection::Wallets => &mut self.wallets,
        }
    }

    pub fn total_failed(&self) -> u32 {
        self.blockchains.failed + self.currencies.failed + self.wallets.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_record_ignores_id_and_defaults_status() {
        let json = r#"{
            "id": 42,
            "name": "BTC hot",
            "blockchain_key": "btc-mainnet",
            "kind": "hot",
            "gateway": "opendax_cloud",
            "currencies": ["btc"],
            "settings": { "uri": "http://wallet:8000" }
        }"#;
        let record: WalletRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind, WalletKind::Hot);
        assert_eq!(record.status, WalletStatus::Active);
        assert_eq!(record.address, "");
        assert_eq!(record.currencies, vec!["btc".to_string()]);
    }

    #[test]
    fn test_currency_record_defaults_base_factor() {
        let json = r#"{ "id": "eth", "blockchain_key": "eth-mainnet" }"#;
        let record: CurrencyRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.base_factor, 1);
        assert_eq!(record.status, "enabled");
    }

    #[test]
    fn test_blockchain_server_is_kept_verbatim() {
        let json = r#"{ "key": "eth-mainnet", "name": "Ethereum", "client": "geth",
                        "server": "geth:8545" }"#;
        let record: BlockchainRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.server.as_deref(), Some("geth:8545"));
    }
}
