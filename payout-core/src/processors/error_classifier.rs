//! Failure taxonomy of the withdrawal watcher.
//!
//! A failure either concerns one withdrawal, in which case the watcher moves
//! on to the next one, or means the store is gone, in which case every later
//! item would fail the same way and the tick is abandoned.

use crate::entities::withdrawal::TransitionRejected;
use crate::gateway::GatewayError;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transition(#[from] TransitionRejected),
}

/// What to do after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Record the failure and go on with the next item.
    Continue,
    /// Stop the current tick (or import) and surface the error.
    Abort,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::Continue => "continue",
            Disposition::Abort => "abort",
        }
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Only a lost store connection aborts.
pub fn classify(err: &WatchError) -> Disposition {
    match err {
        WatchError::Store(StoreError::Connectivity(_)) => Disposition::Abort,
        WatchError::Store(StoreError::Query(_))
        | WatchError::Gateway(_)
        | WatchError::Transition(_) => Disposition::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::withdrawal::{WithdrawalEvent, WithdrawalState};
    use crate::gateway::GatewayTimeout;
    use std::time::Duration;

    #[test]
    fn test_store_connectivity_aborts() {
        let err = WatchError::from(StoreError::from(sqlx::Error::PoolTimedOut));
        assert_eq!(classify(&err), Disposition::Abort);
    }

    #[test]
    fn test_everything_else_continues() {
        let cases = [
            WatchError::from(StoreError::from(sqlx::Error::RowNotFound)),
            WatchError::from(GatewayError::MissingSetting { key: "currency" }),
            WatchError::from(GatewayError::UnknownGateway("bitgo".into())),
            WatchError::from(GatewayError::client(GatewayTimeout(Duration::from_secs(10)))),
            WatchError::from(TransitionRejected {
                withdrawal_id: 7,
                from: WithdrawalState::Success,
                event: WithdrawalEvent::Succeed,
            }),
        ];
        for err in &cases {
            assert_eq!(classify(err), Disposition::Continue, "{err}");
        }
    }

    #[test]
    fn test_messages_pass_through() {
        let err = WatchError::from(GatewayError::MissingSetting { key: "wallet.uri" });
        assert_eq!(err.to_string(), "missing gateway setting `wallet.uri`");
    }
}
