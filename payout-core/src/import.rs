//! Bulk import of blockchains, currencies and wallets.
//!
//! Records are created only when their natural key is not taken yet, so a
//! payload can be applied any number of times. One bad record or section does
//! not stop the rest; losing the store connection does.

use crate::entities::blockchain::Blockchain;
use crate::entities::currency::Currency;
use crate::entities::wallet::WalletInsert;
use crate::processors::error_classifier::{Disposition, WatchError, classify};
use crate::store::{CatalogStore, StoreError};
use payout_sdk::objects::{
    BlockchainRecord, CurrencyRecord, ImportReport, ImportSection, WalletRecord,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("import payload must be a JSON object of sections")]
    NotAnObject,

    /// The store went away; records after the failing one were not
    /// attempted.
    #[error("import aborted in section {section}: {source}")]
    Aborted {
        section: ImportSection,
        #[source]
        source: WatchError,
    },
}

/// Why a single record was not imported.
#[derive(Debug, Error)]
enum RecordError {
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

enum RecordOutcome {
    Created,
    Exists,
}

pub struct Importer {
    store: Arc<dyn CatalogStore>,
}

impl Importer {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Apply `payload` and report what happened per section.
    pub async fn import(&self, payload: Value) -> Result<ImportReport, ImportError> {
        let Value::Object(mut sections) = payload else {
            return Err(ImportError::NotAnObject);
        };

        let mut report = ImportReport::default();

        let mut ignored: Vec<String> = sections
            .keys()
            .filter(|key| !ImportSection::ORDERED.iter().any(|s| s.key() == key.as_str()))
            .cloned()
            .collect();
        ignored.sort();
        for key in &ignored {
            warn!(section = %key, "Ignoring unknown import section");
        }
        report.ignored_sections = ignored;

        for section in ImportSection::ORDERED {
            let Some(records) = sections.remove(section.key()) else {
                continue;
            };
            let Value::Array(records) = records else {
                error!(%section, "Import section is not an array");
                report.section_mut(section).failed += 1;
                continue;
            };

            for (index, record) in records.into_iter().enumerate() {
                let result = self.import_record(section, compact(record)).await;
                let counts = report.section_mut(section);
                match result {
                    Ok(RecordOutcome::Created) => counts.created += 1,
                    Ok(RecordOutcome::Exists) => counts.skipped += 1,
                    Err(RecordError::Malformed(e)) => {
                        counts.failed += 1;
                        error!(%section, index, error = %e, "Skipping malformed import record");
                    }
                    Err(RecordError::Store(e)) => {
                        counts.failed += 1;
                        let err = WatchError::Store(e);
                        error!(%section, index, error = %err, "Failed to import record");
                        if classify(&err) == Disposition::Abort {
                            return Err(ImportError::Aborted {
                                section,
                                source: err,
                            });
                        }
                    }
                }
            }
        }

        info!(
            blockchains_created = report.blockchains.created,
            currencies_created = report.currencies.created,
            wallets_created = report.wallets.created,
            failed = report.total_failed(),
            "Import finished"
        );
        Ok(report)
    }

    async fn import_record(
        &self,
        section: ImportSection,
        record: Value,
    ) -> Result<RecordOutcome, RecordError> {
        match section {
            ImportSection::Blockchains => {
                let record: BlockchainRecord = parse(record)?;
                if self.store.blockchain_exists(&record.key).await? {
                    return Ok(RecordOutcome::Exists);
                }
                let created = self
                    .store
                    .insert_blockchain(Blockchain {
                        key: record.key,
                        name: record.name,
                        client: record.client,
                        server: record.server.filter(|s| !s.trim().is_empty()),
                        height: record.height,
                        status: record.status,
                    })
                    .await?;
                Ok(outcome(created))
            }
            ImportSection::Currencies => {
                let record: CurrencyRecord = parse(record)?;
                if self.store.currency_exists(&record.id).await? {
                    return Ok(RecordOutcome::Exists);
                }
                let created = self
                    .store
                    .insert_currency(Currency {
                        id: record.id,
                        blockchain_key: record.blockchain_key,
                        base_factor: record.base_factor,
                        options: object_or_empty(record.options),
                        status: record.status,
                    })
                    .await?;
                Ok(outcome(created))
            }
            ImportSection::Wallets => {
                let record: WalletRecord = parse(record)?;
                let kind = record.kind.into();
                if self.store.wallet_exists(&record.blockchain_key, kind).await? {
                    return Ok(RecordOutcome::Exists);
                }
                self.store
                    .insert_wallet(WalletInsert {
                        blockchain_key: record.blockchain_key,
                        name: record.name,
                        address: record.address,
                        kind,
                        gateway: record.gateway,
                        settings: object_or_empty(record.settings),
                        status: record.status.into(),
                        currencies: record.currencies,
                    })
                    .await?;
                Ok(RecordOutcome::Created)
            }
        }
    }
}

fn parse<T: DeserializeOwned>(record: Value) -> Result<T, RecordError> {
    Ok(serde_json::from_value(record)?)
}

fn outcome(created: bool) -> RecordOutcome {
    if created {
        RecordOutcome::Created
    } else {
        RecordOutcome::Exists
    }
}

/// Drop `null` members so they fall back to field defaults.
fn compact(record: Value) -> Value {
    match record {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

fn object_or_empty(value: Value) -> Value {
    if value.is_null() {
        Value::Object(Map::new())
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::WalletKind;
    use crate::store::memory::{MemoryStore, connection_reset, row_not_found};
    use serde_json::json;

    fn importer() -> (Arc<MemoryStore>, Importer) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), Importer::new(store))
    }

    fn payload() -> Value {
        json!({
            "blockchains": [
                { "key": "btc-mainnet", "name": "Bitcoin", "client": "bitcoin", "height": 800000 },
                { "key": "eth-mainnet", "name": "Ethereum", "client": "geth",
                  "server": "http://geth:8545" }
            ],
            "currencies": [
                { "id": "btc", "blockchain_key": "btc-mainnet", "base_factor": 100000000 },
                { "id": "eth", "blockchain_key": "eth-mainnet",
                  "base_factor": 1000000000000000000i64, "options": null }
            ],
            "wallets": [
                { "id": 99, "name": "BTC hot", "blockchain_key": "btc-mainnet", "kind": "hot",
                  "gateway": "opendax_cloud", "address": "bc1qhot", "currencies": ["btc"],
                  "settings": { "uri": "http://wallet:8000" } }
            ]
        })
    }

    #[tokio::test]
    async fn test_import_creates_everything() {
        let (store, importer) = importer();

        let report = importer.import(payload()).await.unwrap();

        assert_eq!(report.blockchains.created, 2);
        assert_eq!(report.currencies.created, 2);
        assert_eq!(report.wallets.created, 1);
        assert_eq!(report.total_failed(), 0);
        assert!(report.ignored_sections.is_empty());

        let chains = store.blockchains();
        assert_eq!(chains[0].server, None);
        assert_eq!(chains[1].server.as_deref(), Some("http://geth:8545"));
        assert_eq!(store.currencies()[1].options, json!({}));

        let wallets = store.wallets();
        assert_eq!(wallets[0].0.id, 1);
        assert_eq!(wallets[0].0.kind, WalletKind::Hot);
        assert_eq!(wallets[0].1, vec!["btc".to_string()]);
    }

    #[tokio::test]
    async fn test_reimport_is_a_no_op() {
        let (store, importer) = importer();
        importer.import(payload()).await.unwrap();

        let report = importer.import(payload()).await.unwrap();

        assert_eq!(report.blockchains.skipped, 2);
        assert_eq!(report.currencies.skipped, 2);
        assert_eq!(report.wallets.skipped, 1);
        assert_eq!(report.blockchains.created + report.currencies.created, 0);
        assert_eq!(store.currencies().len(), 2);
        assert_eq!(store.wallets().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_currency_keeps_first_record() {
        let (store, importer) = importer();
        let report = importer
            .import(json!({
                "currencies": [
                    { "id": "usdt", "blockchain_key": "eth-mainnet", "base_factor": 1000000 },
                    { "id": "usdt", "blockchain_key": "trx-mainnet", "base_factor": 1 }
                ]
            }))
            .await
            .unwrap();

        assert_eq!(report.currencies.created, 1);
        assert_eq!(report.currencies.skipped, 1);
        let currencies = store.currencies();
        assert_eq!(currencies.len(), 1);
        assert_eq!(currencies[0].blockchain_key, "eth-mainnet");
        assert_eq!(currencies[0].base_factor, 1_000_000);
    }

    #[tokio::test]
    async fn test_malformed_records_do_not_stop_the_import() {
        let (store, importer) = importer();
        let report = importer
            .import(json!({
                "blockchains": "not an array",
                "currencies": [
                    { "blockchain_key": "btc-mainnet" },
                    42,
                    { "id": "ltc", "blockchain_key": "ltc-mainnet", "base_factor": 100000000 }
                ],
                "wallets": [
                    { "name": "LTC hot", "blockchain_key": "ltc-mainnet", "kind": "lukewarm",
                      "gateway": "opendax_cloud" },
                    { "name": "LTC cold", "blockchain_key": "ltc-mainnet", "kind": "cold",
                      "gateway": "opendax_cloud" }
                ]
            }))
            .await
            .unwrap();

        assert_eq!(report.blockchains.failed, 1);
        assert_eq!(report.currencies.failed, 2);
        assert_eq!(report.currencies.created, 1);
        assert_eq!(report.wallets.failed, 1);
        assert_eq!(report.wallets.created, 1);
        assert_eq!(store.currencies()[0].id, "ltc");
        assert_eq!(store.wallets()[0].0.kind, WalletKind::Cold);
    }

    #[tokio::test]
    async fn test_currency_without_base_factor_uses_column_default() {
        let (store, importer) = importer();
        let report = importer
            .import(json!({
                "blockchains": [
                    { "key": "btc-mainnet", "name": "Bitcoin", "client": "bitcoin", "server": "" }
                ],
                "currencies": [{ "id": "btc", "blockchain_key": "btc-mainnet" }]
            }))
            .await
            .unwrap();

        assert_eq!(report.currencies.created, 1);
        assert_eq!(report.total_failed(), 0);
        assert_eq!(store.currencies()[0].base_factor, 1);
        assert_eq!(store.blockchains()[0].server, None);
    }

    #[tokio::test]
    async fn test_wallet_natural_key_is_chain_and_kind() {
        let (store, importer) = importer();
        let report = importer
            .import(json!({
                "wallets": [
                    { "name": "hot A", "blockchain_key": "eth-mainnet", "kind": "hot",
                      "gateway": "opendax_cloud" },
                    { "name": "hot B", "blockchain_key": "eth-mainnet", "kind": "hot",
                      "gateway": "opendax_cloud" },
                    { "name": "fee", "blockchain_key": "eth-mainnet", "kind": "fee",
                      "gateway": "opendax_cloud" }
                ]
            }))
            .await
            .unwrap();

        assert_eq!(report.wallets.created, 2);
        assert_eq!(report.wallets.skipped, 1);
        assert_eq!(store.wallets()[0].0.name, "hot A");
    }

    #[tokio::test]
    async fn test_unknown_sections_are_reported() {
        let (_store, importer) = importer();
        let report = importer
            .import(json!({ "markets": [], "engines": [{}] }))
            .await
            .unwrap();
        assert_eq!(report.ignored_sections, vec!["engines", "markets"]);
    }

    #[tokio::test]
    async fn test_query_error_is_counted_and_skipped() {
        let (store, importer) = importer();
        store.fail_blockchain_insert("btc-mainnet", row_not_found);

        let report = importer.import(payload()).await.unwrap();

        assert_eq!(report.blockchains.failed, 1);
        assert_eq!(report.blockchains.created, 1);
        assert_eq!(report.currencies.created, 2);
    }

    #[tokio::test]
    async fn test_connectivity_error_aborts() {
        let (store, importer) = importer();
        store.fail_blockchain_insert("btc-mainnet", connection_reset);

        let err = importer.import(payload()).await.unwrap_err();

        assert!(matches!(
            err,
            ImportError::Aborted {
                section: ImportSection::Blockchains,
                source: WatchError::Store(ref e),
            } if e.is_connectivity()
        ));
        assert!(store.blockchains().is_empty());
        assert!(store.currencies().is_empty());
    }

    #[tokio::test]
    async fn test_payload_must_be_an_object() {
        let (_store, importer) = importer();
        assert!(matches!(
            importer.import(json!([1, 2, 3])).await,
            Err(ImportError::NotAnObject)
        ));
    }
}
