use super::{CatalogStore, StoreError, WithdrawalStore};
use crate::entities::WalletKind;
use crate::entities::blockchain::{Blockchain, GetBlockchainByKey, InsertBlockchain};
use crate::entities::currency::{Currency, GetCurrencyById, InsertCurrency};
use crate::entities::wallet::{
    GetActiveHotWalletsForCurrency, GetWalletByBlockchainKind, InsertWallet, Wallet, WalletInsert,
};
use crate::entities::withdrawal::{
    ApplyWithdrawalTransition, GetWithdrawalsByStates, Withdrawal, WithdrawalState,
    WithdrawalTransition,
};
use crate::framework::DatabaseProcessor;
use async_trait::async_trait;
use kanau::processor::Processor;
use sqlx::PgPool;

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    processor: DatabaseProcessor,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            processor: DatabaseProcessor::new(pool),
        }
    }
}

#[async_trait]
impl WithdrawalStore for PgStore {
    async fn withdrawals_in_states(
        &self,
        states: &[WithdrawalState],
    ) -> Result<Vec<Withdrawal>, StoreError> {
        let withdrawals = self
            .processor
            .process(GetWithdrawalsByStates {
                states: states.to_vec(),
            })
            .await?;
        Ok(withdrawals)
    }

    async fn active_hot_wallets(&self, currency_id: &str) -> Result<Vec<Wallet>, StoreError> {
        let wallets = self
            .processor
            .process(GetActiveHotWalletsForCurrency {
                currency_id: currency_id.to_owned(),
            })
            .await?;
        Ok(wallets)
    }

    async fn currency(&self, currency_id: &str) -> Result<Option<Currency>, StoreError> {
        let currency = self
            .processor
            .process(GetCurrencyById {
                id: currency_id.to_owned(),
            })
            .await?;
        Ok(currency)
    }

    async fn apply_transition(
        &self,
        transition: &WithdrawalTransition,
    ) -> Result<bool, StoreError> {
        let applied = self
            .processor
            .process(ApplyWithdrawalTransition {
                transition: transition.clone(),
            })
            .await?;
        Ok(applied)
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn blockchain_exists(&self, key: &str) -> Result<bool, StoreError> {
        let found = self
            .processor
            .process(GetBlockchainByKey {
                key: key.to_owned(),
            })
            .await?;
        Ok(found.is_some())
    }

    async fn insert_blockchain(&self, blockchain: Blockchain) -> Result<bool, StoreError> {
        Ok(self.processor.process(InsertBlockchain { blockchain }).await?)
    }

    async fn currency_exists(&self, code: &str) -> Result<bool, StoreError> {
        let found = self
            .processor
            .process(GetCurrencyById {
                id: code.to_owned(),
            })
            .await?;
        Ok(found.is_some())
    }

    async fn insert_currency(&self, currency: Currency) -> Result<bool, StoreError> {
        Ok(self.processor.process(InsertCurrency { currency }).await?)
    }

    async fn wallet_exists(
        &self,
        blockchain_key: &str,
        kind: WalletKind,
    ) -> Result<bool, StoreError> {
        let found = self
            .processor
            .process(GetWalletByBlockchainKind {
                blockchain_key: blockchain_key.to_owned(),
                kind,
            })
            .await?;
        Ok(found.is_some())
    }

    async fn insert_wallet(&self, wallet: WalletInsert) -> Result<i64, StoreError> {
        Ok(self.processor.process(InsertWallet { wallet }).await?)
    }
}
