//! Withdrawal records and their lifecycle.
//!
//! The lifecycle is an explicit state machine:
//!
//! ```text
//! under_review --dispatch--> dispatched --succeed--> success
//!                                 confirming --succeed--> success
//! ```
//!
//! `failed` and `canceled` are terminal states written by other parts of the
//! system; nothing in this crate moves a withdrawal into them.

use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "withdrawal_state")]
pub enum WithdrawalState {
    UnderReview,
    Dispatched,
    Confirming,
    Success,
    Failed,
    Canceled,
}

impl WithdrawalState {
    pub fn as_str(self) -> &'static str {
        match self {
            WithdrawalState::UnderReview => "under_review",
            WithdrawalState::Dispatched => "dispatched",
            WithdrawalState::Confirming => "confirming",
            WithdrawalState::Success => "success",
            WithdrawalState::Failed => "failed",
            WithdrawalState::Canceled => "canceled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WithdrawalState::Success | WithdrawalState::Failed | WithdrawalState::Canceled
        )
    }

    /// The state `event` leads to from `self`, or `None` if the event is not
    /// allowed here.
    pub fn next(self, event: WithdrawalEvent) -> Option<WithdrawalState> {
        use WithdrawalEvent::*;
        use WithdrawalState::*;
        match (self, event) {
            (UnderReview, Dispatch) => Some(Dispatched),
            (Dispatched | Confirming, Succeed) => Some(Success),
            _ => None,
        }
    }
}

impl std::fmt::Display for WithdrawalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WithdrawalEvent {
    /// A transaction id is known; the transfer is on its way.
    Dispatch,
    /// The gateway reports the transfer as confirmed.
    Succeed,
}

impl std::fmt::Display for WithdrawalEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WithdrawalEvent::Dispatch => f.write_str("dispatch"),
            WithdrawalEvent::Succeed => f.write_str("succeed"),
        }
    }
}

/// A state change that is not valid for the withdrawal's current state, or
/// that lost a race against another writer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {event} withdrawal {withdrawal_id} from state {from}")]
pub struct TransitionRejected {
    pub withdrawal_id: i64,
    pub from: WithdrawalState,
    pub event: WithdrawalEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Withdrawal {
    pub id: i64,
    pub currency_id: String,
    pub amount: Decimal,
    /// Destination address.
    pub rid: String,
    /// Identifier assigned by the gateway when the transfer was submitted.
    pub remote_id: Option<String>,
    pub txid: Option<String>,
    pub state: WithdrawalState,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

impl Withdrawal {
    /// Plan the write for `event`. The returned transition is conditional on
    /// the state this record was read in.
    pub fn transition(
        &self,
        event: WithdrawalEvent,
        txid: Option<String>,
    ) -> Result<WithdrawalTransition, TransitionRejected> {
        let to = self.state.next(event).ok_or(TransitionRejected {
            withdrawal_id: self.id,
            from: self.state,
            event,
        })?;
        Ok(WithdrawalTransition {
            withdrawal_id: self.id,
            from: self.state,
            to,
            event,
            txid,
        })
    }
}

/// A conditional state write: applied only while the row is still in `from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalTransition {
    pub withdrawal_id: i64,
    pub from: WithdrawalState,
    pub to: WithdrawalState,
    pub event: WithdrawalEvent,
    /// Stored together with the state when present.
    pub txid: Option<String>,
}

impl WithdrawalTransition {
    /// The error to report when the conditional write matched no row.
    pub fn rejected(&self) -> TransitionRejected {
        TransitionRejected {
            withdrawal_id: self.withdrawal_id,
            from: self.from,
            event: self.event,
        }
    }
}

#[derive(Debug, Clone)]
/// Get all withdrawals in any of `states`, oldest first.
pub struct GetWithdrawalsByStates {
    pub states: Vec<WithdrawalState>,
}

impl Processor<GetWithdrawalsByStates> for DatabaseProcessor {
    type Output = Vec<Withdrawal>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetWithdrawalsByStates")]
    async fn process(&self, query: GetWithdrawalsByStates) -> Result<Vec<Withdrawal>, sqlx::Error> {
        let withdrawals = sqlx::query_as::<_, Withdrawal>(
            r#"
            SELECT id, currency_id, amount, rid, remote_id, txid, state, created_at, updated_at
            FROM withdrawals
            WHERE state = ANY($1)
            ORDER BY id ASC
            "#,
        )
        .bind(query.states)
        .fetch_all(&self.pool)
        .await?;
        Ok(withdrawals)
    }
}

#[derive(Debug, Clone)]
/// Apply a [`WithdrawalTransition`].
///
/// Returns `true` if the row was still in the expected state and got updated.
pub struct ApplyWithdrawalTransition {
    pub transition: WithdrawalTransition,
}

impl Processor<ApplyWithdrawalTransition> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ApplyWithdrawalTransition")]
    async fn process(&self, cmd: ApplyWithdrawalTransition) -> Result<bool, sqlx::Error> {
        let WithdrawalTransition {
            withdrawal_id,
            from,
            to,
            txid,
            ..
        } = cmd.transition;
        let result = sqlx::query(
            r#"
            UPDATE withdrawals
            SET state = $3, txid = COALESCE($4, txid), updated_at = NOW()
            WHERE id = $1 AND state = $2
            "#,
        )
        .bind(withdrawal_id)
        .bind(from)
        .bind(to)
        .bind(txid)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
