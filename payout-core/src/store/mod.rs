//! Persistence seams used by the watcher and the importer.
//!
//! [`PgStore`] is the production implementation. Tests run the same code
//! against an in-memory store.

#[cfg(test)]
pub(crate) mod memory;
mod postgres;

pub use postgres::PgStore;

use crate::entities::WalletKind;
use crate::entities::blockchain::Blockchain;
use crate::entities::currency::Currency;
use crate::entities::wallet::{Wallet, WalletInsert};
use crate::entities::withdrawal::{Withdrawal, WithdrawalState, WithdrawalTransition};
use async_trait::async_trait;
use thiserror::Error;

/// Errors from the persistent store, split by whether the store itself is
/// reachable.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached. Every other query would fail the same way.
    #[error("store unreachable: {0}")]
    Connectivity(#[source] sqlx::Error),

    /// A single statement failed; the store is otherwise healthy.
    #[error("store query failed: {0}")]
    Query(#[source] sqlx::Error),
}

impl StoreError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, StoreError::Connectivity(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if is_connectivity_error(&err) {
            StoreError::Connectivity(err)
        } else {
            StoreError::Query(err)
        }
    }
}

/// Whether `err` means the database connection itself is gone.
///
/// Besides transport errors this covers SQLSTATE class `08` (connection
/// exception) and `57P01`..`57P03` (server shutting down or not accepting
/// connections).
pub fn is_connectivity_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => db
            .code()
            .is_some_and(|code| is_connectivity_sqlstate(&code)),
        _ => false,
    }
}

fn is_connectivity_sqlstate(code: &str) -> bool {
    code.starts_with("08") || matches!(code, "57P01" | "57P02" | "57P03")
}

/// What the withdrawal watcher reads and writes.
#[async_trait]
pub trait WithdrawalStore: Send + Sync {
    /// Withdrawals in any of `states`, in id order.
    async fn withdrawals_in_states(
        &self,
        states: &[WithdrawalState],
    ) -> Result<Vec<Withdrawal>, StoreError>;

    /// Active hot wallets linked to `currency_id`, in id order.
    async fn active_hot_wallets(&self, currency_id: &str) -> Result<Vec<Wallet>, StoreError>;

    async fn currency(&self, currency_id: &str) -> Result<Option<Currency>, StoreError>;

    /// Apply a conditional transition. `Ok(false)` when the row was no longer
    /// in the expected state.
    async fn apply_transition(&self, transition: &WithdrawalTransition)
    -> Result<bool, StoreError>;
}

/// What the bulk importer reads and writes.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn blockchain_exists(&self, key: &str) -> Result<bool, StoreError>;

    /// `Ok(false)` if another writer created the key first.
    async fn insert_blockchain(&self, blockchain: Blockchain) -> Result<bool, StoreError>;

    async fn currency_exists(&self, code: &str) -> Result<bool, StoreError>;

    /// `Ok(false)` if another writer created the code first.
    async fn insert_currency(&self, currency: Currency) -> Result<bool, StoreError>;

    async fn wallet_exists(&self, blockchain_key: &str, kind: WalletKind)
    -> Result<bool, StoreError>;

    async fn insert_wallet(&self, wallet: WalletInsert) -> Result<i64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_are_connectivity() {
        let io = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset by peer",
        ));
        assert!(StoreError::from(io).is_connectivity());
        assert!(StoreError::from(sqlx::Error::PoolTimedOut).is_connectivity());
        assert!(StoreError::from(sqlx::Error::PoolClosed).is_connectivity());
    }

    #[test]
    fn test_query_errors_are_not_connectivity() {
        assert!(!StoreError::from(sqlx::Error::RowNotFound).is_connectivity());
        assert!(
            !StoreError::from(sqlx::Error::ColumnNotFound("txid".into())).is_connectivity()
        );
    }

    #[test]
    fn test_connectivity_sqlstates() {
        assert!(is_connectivity_sqlstate("08006"));
        assert!(is_connectivity_sqlstate("08001"));
        assert!(is_connectivity_sqlstate("57P01"));
        assert!(!is_connectivity_sqlstate("23505"));
        assert!(!is_connectivity_sqlstate("40001"));
    }
}
