//! WithdrawWatcher processor.
//!
//! Advances submitted withdrawals by asking their wallet gateway about them.
//! Every tick runs two phases:
//!
//! - **txid discovery**: `under_review` withdrawals with a remote id are
//!   looked up; once the gateway knows the on-chain transaction id it is
//!   stored and the withdrawal is dispatched.
//! - **confirmation check**: `dispatched` and `confirming` withdrawals are
//!   marked successful once the gateway reports them confirmed.
//!
//! Each withdrawal is handled in isolation. A failure is reported, counted
//! and skipped, unless the store connection itself is gone, which abandons
//! the rest of the tick. Withdrawals only change state through a conditional
//! write made right after a gateway answered for them.

use super::error_classifier::{Disposition, WatchError, classify};
use super::error_reporter::{ErrorReporter, FailureContext, error_chain};
use crate::config::WatcherConfig;
use crate::entities::wallet::Wallet;
use crate::entities::withdrawal::{
    Withdrawal, WithdrawalEvent, WithdrawalState, WithdrawalTransition,
};
use crate::gateway::{Capability, GatewayError, GatewayRegistry, GatewaySettings, with_timeout};
use crate::store::WithdrawalStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tracing::{debug, error, info, warn};

/// One half of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchPhase {
    TxidDiscovery,
    ConfirmationCheck,
}

impl WatchPhase {
    /// In processing order.
    pub const ALL: [WatchPhase; 2] = [WatchPhase::TxidDiscovery, WatchPhase::ConfirmationCheck];

    /// States a withdrawal must be in to be considered by this phase.
    pub fn source_states(self) -> &'static [WithdrawalState] {
        match self {
            WatchPhase::TxidDiscovery => &[WithdrawalState::UnderReview],
            WatchPhase::ConfirmationCheck => {
                &[WithdrawalState::Dispatched, WithdrawalState::Confirming]
            }
        }
    }

    /// Gateway operation this phase relies on.
    pub fn capability(self) -> Capability {
        match self {
            WatchPhase::TxidDiscovery => Capability::FetchTxid,
            WatchPhase::ConfirmationCheck => Capability::ConfirmWithdrawal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WatchPhase::TxidDiscovery => "txid_discovery",
            WatchPhase::ConfirmationCheck => "confirmation_check",
        }
    }
}

impl std::fmt::Display for WatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome counts of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Withdrawals moved to a new state.
    pub advanced: usize,
    /// The gateway was asked and had nothing new.
    pub unchanged: usize,
    /// Not eligible: no remote id, no wallet, or no gateway capability.
    pub skipped: usize,
    pub failed: usize,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        self.advanced == 0 && self.failed == 0
    }

    fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Advanced => self.advanced += 1,
            ItemOutcome::Unchanged => self.unchanged += 1,
            ItemOutcome::Skipped => self.skipped += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Advanced,
    Unchanged,
    Skipped,
}

/// Polls withdrawals and advances them through their lifecycle.
pub struct WithdrawWatcher {
    store: Arc<dyn WithdrawalStore>,
    registry: Arc<GatewayRegistry>,
    reporter: Arc<dyn ErrorReporter>,
    config: Arc<RwLock<WatcherConfig>>,
    shutdown_rx: watch::Receiver<bool>,
    /// (wallet id, phase) pairs whose capability skip was already logged at
    /// info level.
    announced_skips: HashSet<(i64, WatchPhase)>,
}

impl WithdrawWatcher {
    pub fn new(
        store: Arc<dyn WithdrawalStore>,
        registry: Arc<GatewayRegistry>,
        reporter: Arc<dyn ErrorReporter>,
        config: Arc<RwLock<WatcherConfig>>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            registry,
            reporter,
            config,
            shutdown_rx,
            announced_skips: HashSet::new(),
        }
    }

    /// Run ticks until shutdown is signalled.
    pub async fn run(mut self) {
        info!("WithdrawWatcher started");

        loop {
            if self.shutdown_requested() {
                break;
            }

            let config = *self.config.read().await;
            if config.enabled {
                match self.tick().await {
                    Ok(report) if report.is_idle() => debug!(
                        advanced = report.advanced,
                        unchanged = report.unchanged,
                        skipped = report.skipped,
                        failed = report.failed,
                        "Withdraw watch tick finished"
                    ),
                    Ok(report) => info!(
                        advanced = report.advanced,
                        unchanged = report.unchanged,
                        skipped = report.skipped,
                        failed = report.failed,
                        "Withdraw watch tick finished"
                    ),
                    Err(e) => error!(
                        error = %error_chain(&e),
                        "Withdraw watch tick aborted"
                    ),
                }
            } else {
                debug!("WithdrawWatcher disabled, skipping tick");
            }

            tokio::select! {
                biased;

                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("WithdrawWatcher received shutdown signal");
                        break;
                    }
                }

                _ = tokio::time::sleep(config.tick_interval) => {}
            }
        }

        info!("WithdrawWatcher shutdown complete");
    }

    /// Run both phases once.
    ///
    /// Returns `Err` when a phase cannot list its withdrawals, or when an
    /// item failed in a way that makes the rest of the tick pointless. Either
    /// failure has already been reported at that point.
    pub async fn tick(&mut self) -> Result<TickReport, WatchError> {
        let gateway_timeout = self.config.read().await.gateway_timeout;
        let mut report = TickReport::default();

        for phase in WatchPhase::ALL {
            let withdrawals = match self.store.withdrawals_in_states(phase.source_states()).await {
                Ok(withdrawals) => withdrawals,
                Err(e) => {
                    let err = WatchError::Store(e);
                    self.reporter.report(&err, &FailureContext::phase(phase));
                    return Err(err);
                }
            };
            debug!(%phase, count = withdrawals.len(), "Loaded withdrawals");

            for withdrawal in withdrawals {
                if self.shutdown_requested() {
                    info!(%phase, "Shutdown requested, ending tick early");
                    return Ok(report);
                }

                let mut wallet_id = None;
                match self
                    .watch_one(phase, &withdrawal, gateway_timeout, &mut wallet_id)
                    .await
                {
                    Ok(outcome) => report.record(outcome),
                    Err(err) => {
                        report.failed += 1;
                        let context = FailureContext::withdrawal(phase, &withdrawal, wallet_id);
                        self.reporter.report(&err, &context);
                        if classify(&err) == Disposition::Abort {
                            return Err(err);
                        }
                    }
                }
            }
        }

        Ok(report)
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    async fn watch_one(
        &mut self,
        phase: WatchPhase,
        withdrawal: &Withdrawal,
        gateway_timeout: Duration,
        wallet_id: &mut Option<i64>,
    ) -> Result<ItemOutcome, WatchError> {
        let Some(remote_id) = withdrawal.remote_id.as_deref().filter(|r| !r.is_empty()) else {
            warn!(
                withdrawal_id = withdrawal.id,
                state = %withdrawal.state,
                "Withdrawal has no remote id, skipping"
            );
            return Ok(ItemOutcome::Skipped);
        };

        let Some(wallet) = self.resolve_wallet(&withdrawal.currency_id).await? else {
            warn!(
                withdrawal_id = withdrawal.id,
                currency = %withdrawal.currency_id,
                "No active hot wallet for currency, skipping"
            );
            return Ok(ItemOutcome::Skipped);
        };
        *wallet_id = Some(wallet.id);

        let capabilities = self
            .registry
            .capabilities(&wallet.gateway)
            .ok_or_else(|| GatewayError::UnknownGateway(wallet.gateway.clone()))?;
        if !capabilities.supports(phase.capability()) {
            self.log_capability_skip(&wallet, phase);
            return Ok(ItemOutcome::Skipped);
        }

        let currency = self
            .store
            .currency(&withdrawal.currency_id)
            .await?
            .ok_or(GatewayError::MissingSetting { key: "currency" })?;

        let mut gateway = self.registry.build(&wallet.gateway)?;
        gateway.configure(
            GatewaySettings::new(wallet.gateway_settings(), currency.gateway_settings())
                .with_request_timeout(gateway_timeout),
        )?;

        match phase {
            WatchPhase::TxidDiscovery => {
                let Some(fetcher) = gateway.as_txid_fetcher() else {
                    self.log_capability_skip(&wallet, phase);
                    return Ok(ItemOutcome::Skipped);
                };
                let txid = with_timeout(gateway_timeout, fetcher.fetch_transaction_id(remote_id))
                    .await?
                    .filter(|txid| !txid.trim().is_empty());

                let Some(txid) = txid else {
                    warn!(
                        withdrawal_id = withdrawal.id,
                        remote_id,
                        "Transaction id not available yet"
                    );
                    return Ok(ItemOutcome::Unchanged);
                };
                let transition = withdrawal.transition(WithdrawalEvent::Dispatch, Some(txid))?;
                self.apply(transition).await
            }
            WatchPhase::ConfirmationCheck => {
                let Some(checker) = gateway.as_confirmation_checker() else {
                    self.log_capability_skip(&wallet, phase);
                    return Ok(ItemOutcome::Skipped);
                };
                let confirmed =
                    with_timeout(gateway_timeout, checker.is_withdrawal_confirmed(remote_id))
                        .await?;
                if !confirmed {
                    debug!(withdrawal_id = withdrawal.id, remote_id, "Not confirmed yet");
                    return Ok(ItemOutcome::Unchanged);
                }
                let transition = withdrawal.transition(WithdrawalEvent::Succeed, None)?;
                self.apply(transition).await
            }
        }
    }

    /// The hot wallet serving `currency_id`. Several candidates is a
    /// misconfiguration; the oldest one wins.
    async fn resolve_wallet(&self, currency_id: &str) -> Result<Option<Wallet>, WatchError> {
        let wallets = self.store.active_hot_wallets(currency_id).await?;
        if wallets.len() > 1 {
            warn!(
                currency = %currency_id,
                candidates = wallets.len(),
                "Several active hot wallets serve this currency, using the lowest id"
            );
        }
        Ok(wallets.into_iter().min_by_key(|w| w.id))
    }

    async fn apply(&self, transition: WithdrawalTransition) -> Result<ItemOutcome, WatchError> {
        if !self.store.apply_transition(&transition).await? {
            return Err(transition.rejected().into());
        }
        info!(
            withdrawal_id = transition.withdrawal_id,
            from = %transition.from,
            to = %transition.to,
            txid = ?transition.txid,
            "Withdrawal advanced"
        );
        Ok(ItemOutcome::Advanced)
    }

    fn log_capability_skip(&mut self, wallet: &Wallet, phase: WatchPhase) {
        if self.announced_skips.insert((wallet.id, phase)) {
            info!(
                wallet_id = wallet.id,
                gateway = %wallet.gateway,
                %phase,
                capability = %phase.capability(),
                "Gateway lacks capability, skipping its withdrawals"
            );
        } else {
            debug!(
                wallet_id = wallet.id,
                gateway = %wallet.gateway,
                %phase,
                "Gateway lacks capability, skipping"
            );
        }
    }
}
