//! Where watcher failures go before the loop decides what to do with them.

use super::error_classifier::{WatchError, classify};
use super::withdraw_watcher::WatchPhase;
use crate::entities::withdrawal::Withdrawal;

/// What the watcher was working on when something failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureContext {
    pub phase: WatchPhase,
    /// `None` when the phase failed before reaching any withdrawal.
    pub withdrawal_id: Option<i64>,
    pub currency_id: Option<String>,
    /// Unknown when the failure happened before a wallet was resolved.
    pub wallet_id: Option<i64>,
}

impl FailureContext {
    /// A failure of the phase as a whole, such as listing its withdrawals.
    pub fn phase(phase: WatchPhase) -> Self {
        Self {
            phase,
            withdrawal_id: None,
            currency_id: None,
            wallet_id: None,
        }
    }

    pub fn withdrawal(
        phase: WatchPhase,
        withdrawal: &Withdrawal,
        wallet_id: Option<i64>,
    ) -> Self {
        Self {
            phase,
            withdrawal_id: Some(withdrawal.id),
            currency_id: Some(withdrawal.currency_id.clone()),
            wallet_id,
        }
    }
}

/// Receives every failure the watcher catches, fatal or not.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &WatchError, context: &FailureContext);
}

/// Reports failures as structured `tracing` error events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &WatchError, context: &FailureContext) {
        tracing::error!(
            withdrawal_id = ?context.withdrawal_id,
            phase = %context.phase,
            currency = ?context.currency_id,
            wallet_id = ?context.wallet_id,
            disposition = %classify(error),
            error = %error_chain(error),
            "Withdrawal watch failed"
        );
    }
}

/// `error: cause: root cause`
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        // transparent wrappers repeat their inner message
        if !chain.ends_with(&cause_text) {
            chain.push_str(": ");
            chain.push_str(&cause_text);
        }
        source = cause.source();
    }
    chain
}
