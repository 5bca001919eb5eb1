//! In-memory store for tests, with fault injection.

use super::{CatalogStore, StoreError, WithdrawalStore};
use crate::entities::WalletKind;
use crate::entities::WalletStatus;
use crate::entities::blockchain::Blockchain;
use crate::entities::currency::Currency;
use crate::entities::wallet::{Wallet, WalletInsert};
use crate::entities::withdrawal::{Withdrawal, WithdrawalState, WithdrawalTransition};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    withdrawals: Vec<Withdrawal>,
    wallets: Vec<(Wallet, Vec<String>)>,
    currencies: Vec<Currency>,
    blockchains: Vec<Blockchain>,
    /// Withdrawal id -> error to raise on its next transition write.
    failing_transitions: HashMap<i64, fn() -> sqlx::Error>,
    /// Listing any of these states raises the error once.
    failing_listings: Vec<(WithdrawalState, fn() -> sqlx::Error)>,
    /// Blockchain key -> error raised while inserting it.
    failing_blockchain_inserts: HashMap<String, fn() -> sqlx::Error>,
    wallet_lookups: Vec<String>,
    transitions_applied: Vec<WithdrawalTransition>,
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    inner: Mutex<Inner>,
}

fn timestamp() -> time::PrimitiveDateTime {
    let epoch = time::OffsetDateTime::UNIX_EPOCH;
    time::PrimitiveDateTime::new(epoch.date(), epoch.time())
}

pub(crate) fn withdrawal(
    id: i64,
    currency_id: &str,
    remote_id: Option<&str>,
    state: WithdrawalState,
) -> Withdrawal {
    Withdrawal {
        id,
        currency_id: currency_id.to_owned(),
        amount: Decimal::new(15, 1),
        rid: format!("dest-{id}"),
        remote_id: remote_id.map(str::to_owned),
        txid: None,
        state,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

pub(crate) fn hot_wallet(id: i64, gateway: &str) -> Wallet {
    Wallet {
        id,
        blockchain_key: "test-chain".into(),
        name: format!("hot-{id}"),
        address: format!("hot-address-{id}"),
        kind: WalletKind::Hot,
        gateway: gateway.to_owned(),
        settings: serde_json::json!({ "uri": format!("http://gateway-{id}.local") }),
        status: WalletStatus::Active,
    }
}

pub(crate) fn currency(code: &str) -> Currency {
    Currency {
        id: code.to_owned(),
        blockchain_key: "test-chain".into(),
        base_factor: 100_000_000,
        options: serde_json::json!({}),
        status: "enabled".into(),
    }
}

pub(crate) fn connection_reset() -> sqlx::Error {
    sqlx::Error::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        "connection reset by peer",
    ))
}

pub(crate) fn row_not_found() -> sqlx::Error {
    sqlx::Error::RowNotFound
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_withdrawal(&self, withdrawal: Withdrawal) {
        self.lock().withdrawals.push(withdrawal);
    }

    pub fn add_wallet(&self, wallet: Wallet, currencies: &[&str]) {
        let currencies = currencies.iter().map(|c| c.to_string()).collect();
        self.lock().wallets.push((wallet, currencies));
    }

    pub fn add_currency(&self, currency: Currency) {
        self.lock().currencies.push(currency);
    }

    pub fn fail_transition(&self, withdrawal_id: i64, error: fn() -> sqlx::Error) {
        self.lock().failing_transitions.insert(withdrawal_id, error);
    }

    pub fn fail_listing(&self, state: WithdrawalState, error: fn() -> sqlx::Error) {
        self.lock().failing_listings.push((state, error));
    }

    pub fn fail_blockchain_insert(&self, key: &str, error: fn() -> sqlx::Error) {
        self.lock()
            .failing_blockchain_inserts
            .insert(key.to_owned(), error);
    }

    /// Move a withdrawal behind the watcher's back.
    pub fn force_state(&self, withdrawal_id: i64, state: WithdrawalState) {
        if let Some(w) = self
            .lock()
            .withdrawals
            .iter_mut()
            .find(|w| w.id == withdrawal_id)
        {
            w.state = state;
        }
    }

    pub fn get(&self, withdrawal_id: i64) -> Option<Withdrawal> {
        self.lock()
            .withdrawals
            .iter()
            .find(|w| w.id == withdrawal_id)
            .cloned()
    }

    pub fn wallet_lookups(&self) -> Vec<String> {
        self.lock().wallet_lookups.clone()
    }

    pub fn transitions_applied(&self) -> Vec<WithdrawalTransition> {
        self.lock().transitions_applied.clone()
    }

    pub fn blockchains(&self) -> Vec<Blockchain> {
        self.lock().blockchains.clone()
    }

    pub fn currencies(&self) -> Vec<Currency> {
        self.lock().currencies.clone()
    }

    pub fn wallets(&self) -> Vec<(Wallet, Vec<String>)> {
        self.lock().wallets.clone()
    }
}

#[async_trait]
impl WithdrawalStore for MemoryStore {
    async fn withdrawals_in_states(
        &self,
        states: &[WithdrawalState],
    ) -> Result<Vec<Withdrawal>, StoreError> {
        let mut inner = self.lock();
        if let Some(pos) = inner
            .failing_listings
            .iter()
            .position(|(state, _)| states.contains(state))
        {
            let (_, error) = inner.failing_listings.remove(pos);
            return Err(StoreError::from(error()));
        }
        let mut found: Vec<Withdrawal> = inner
            .withdrawals
            .iter()
            .filter(|w| states.contains(&w.state))
            .cloned()
            .collect();
        found.sort_by_key(|w| w.id);
        Ok(found)
    }

    async fn active_hot_wallets(&self, currency_id: &str) -> Result<Vec<Wallet>, StoreError> {
        let mut inner = self.lock();
        inner.wallet_lookups.push(currency_id.to_owned());
        let mut found: Vec<Wallet> = inner
            .wallets
            .iter()
            .filter(|(w, currencies)| {
                w.kind == WalletKind::Hot
                    && w.status == WalletStatus::Active
                    && currencies.iter().any(|c| c == currency_id)
            })
            .map(|(w, _)| w.clone())
            .collect();
        found.sort_by_key(|w| w.id);
        Ok(found)
    }

    async fn currency(&self, currency_id: &str) -> Result<Option<Currency>, StoreError> {
        Ok(self
            .lock()
            .currencies
            .iter()
            .find(|c| c.id == currency_id)
            .cloned())
    }

    async fn apply_transition(
        &self,
        transition: &WithdrawalTransition,
    ) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        if let Some(error) = inner.failing_transitions.remove(&transition.withdrawal_id) {
            return Err(StoreError::from(error()));
        }
        let Some(row) = inner
            .withdrawals
            .iter_mut()
            .find(|w| w.id == transition.withdrawal_id && w.state == transition.from)
        else {
            return Ok(false);
        };
        row.state = transition.to;
        if let Some(txid) = &transition.txid {
            row.txid = Some(txid.clone());
        }
        inner.transitions_applied.push(transition.clone());
        Ok(true)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn blockchain_exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.lock().blockchains.iter().any(|b| b.key == key))
    }

    async fn insert_blockchain(&self, blockchain: Blockchain) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        if let Some(error) = inner.failing_blockchain_inserts.get(&blockchain.key) {
            return Err(StoreError::from(error()));
        }
        if inner.blockchains.iter().any(|b| b.key == blockchain.key) {
            return Ok(false);
        }
        inner.blockchains.push(blockchain);
        Ok(true)
    }

    async fn currency_exists(&self, code: &str) -> Result<bool, StoreError> {
        Ok(self.lock().currencies.iter().any(|c| c.id == code))
    }

    async fn insert_currency(&self, currency: Currency) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        if inner.currencies.iter().any(|c| c.id == currency.id) {
            return Ok(false);
        }
        inner.currencies.push(currency);
        Ok(true)
    }

    async fn wallet_exists(
        &self,
        blockchain_key: &str,
        kind: WalletKind,
    ) -> Result<bool, StoreError> {
        Ok(self
            .lock()
            .wallets
            .iter()
            .any(|(w, _)| w.blockchain_key == blockchain_key && w.kind == kind))
    }

    async fn insert_wallet(&self, wallet: WalletInsert) -> Result<i64, StoreError> {
        let mut inner = self.lock();
        let id = inner.wallets.len() as i64 + 1;
        inner.wallets.push((
            Wallet {
                id,
                blockchain_key: wallet.blockchain_key,
                name: wallet.name,
                address: wallet.address,
                kind: wallet.kind,
                gateway: wallet.gateway,
                settings: wallet.settings,
                status: wallet.status,
            },
            wallet.currencies,
        ));
        Ok(id)
    }
}
