//! Bounded confirmation polling.
//!
//! # States
//! ```text
//! Pending ──mined, status 1──▶ IncludedSuccess
//!    │    ──mined, status 0──▶ IncludedFail
//!    └── attempts == max ───▶ TimedOut
//! ```
//! Pending, not-found and node errors all spend one attempt. Terminal states
//! absorb every further observation.
//!
//! `TimedOut` is not an on-chain verdict: the transaction may still be mined
//! after the poller gives up.

use alloy::primitives::TxHash;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::blockchain::node::NodeRpc;
use crate::blockchain::types::{
    BlockchainError, BlockchainResult, ConfirmationOutcome, ReceiptInfo,
};
use crate::config::schema::PollingConfig;
use crate::observability::metrics;

/// What one status query returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// Known to the node, not yet in a block.
    Pending,
    /// Unknown to the node (not propagated yet, or never existed).
    NotFound,
    /// The query itself failed.
    NodeError(String),
    /// Mined but the receipt is not served yet.
    MinedWithoutReceipt,
    Mined(ReceiptInfo),
}

impl Observation {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::NotFound => "not_found",
            Self::NodeError(_) => "node_error",
            Self::MinedWithoutReceipt => "mined_without_receipt",
            Self::Mined(_) => "mined",
        }
    }
}

/// Poller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Pending { attempts: u32 },
    IncludedSuccess(ReceiptInfo),
    IncludedFail(ReceiptInfo),
    TimedOut { attempts: u32 },
}

impl PollState {
    pub fn start() -> Self {
        Self::Pending { attempts: 0 }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending { .. })
    }

    /// Fold one observation into the state.
    pub fn advance(self, observation: &Observation, max_attempts: u32) -> Self {
        let attempts = match self {
            Self::Pending { attempts } => attempts,
            terminal => return terminal,
        };
        match observation {
            Observation::Mined(receipt) if receipt.status.is_success() => {
                Self::IncludedSuccess(*receipt)
            }
            Observation::Mined(receipt) => Self::IncludedFail(*receipt),
            _ => {
                let attempts = attempts + 1;
                if attempts >= max_attempts {
                    Self::TimedOut { attempts }
                } else {
                    Self::Pending { attempts }
                }
            }
        }
    }

    /// The caller-facing result of a terminal state; `None` while pending.
    pub fn outcome(&self) -> Option<BlockchainResult<ConfirmationOutcome>> {
        match *self {
            Self::Pending { .. } => None,
            Self::IncludedSuccess(receipt) | Self::IncludedFail(receipt) => {
                Some(Ok(ConfirmationOutcome::from_receipt(receipt)))
            }
            Self::TimedOut { attempts } => Some(Err(BlockchainError::TimedOut { attempts })),
        }
    }
}

/// Tokio intervals reject a zero period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Polls the node for one transaction at a fixed interval.
#[derive(Clone)]
pub struct ConfirmationPoller {
    node: Arc<dyn NodeRpc>,
    interval: Duration,
    max_attempts: u32,
}

impl ConfirmationPoller {
    /// A zero interval or attempt budget is raised to the smallest usable value.
    pub fn new(node: Arc<dyn NodeRpc>, policy: &PollingConfig) -> Self {
        Self {
            node,
            interval: policy.interval().max(MIN_INTERVAL),
            max_attempts: policy.max_attempts.max(1),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Query the node once.
    pub async fn observe(&self, hash: TxHash) -> Observation {
        let lookup = match self.node.transaction_by_hash(hash).await {
            Ok(Some(lookup)) => lookup,
            Ok(None) => return Observation::NotFound,
            Err(e) => return Observation::NodeError(e.to_string()),
        };
        if lookup.is_pending() {
            return Observation::Pending;
        }
        match self.node.transaction_receipt(hash).await {
            Ok(Some(receipt)) => Observation::Mined(receipt),
            Ok(None) => Observation::MinedWithoutReceipt,
            Err(e) => Observation::NodeError(e.to_string()),
        }
    }

    /// Poll until a terminal state or until `cancelled` resolves.
    ///
    /// The first query happens one interval after the call.
    pub async fn poll_until<C>(
        &self,
        hash: TxHash,
        cancelled: C,
    ) -> BlockchainResult<ConfirmationOutcome>
    where
        C: Future<Output = ()>,
    {
        tokio::pin!(cancelled);
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut state = PollState::start();
        loop {
            tokio::select! {
                biased;
                _ = &mut cancelled => {
                    tracing::info!(tx_hash = %hash, ?state, "Status polling cancelled");
                    return Err(BlockchainError::Cancelled);
                }
                _ = ticker.tick() => {}
            }

            let observation = self.observe(hash).await;
            metrics::record_poll_attempt(observation.label());
            state = state.advance(&observation, self.max_attempts);

            match &observation {
                Observation::Pending => {
                    tracing::debug!(tx_hash = %hash, ?state, "Transaction pending")
                }
                Observation::NotFound => tracing::warn!(
                    tx_hash = %hash,
                    ?state,
                    error = %BlockchainError::NotFoundTransient(hash),
                    "Transaction not visible to node yet"
                ),
                Observation::NodeError(e) => {
                    tracing::warn!(tx_hash = %hash, ?state, error = %e, "Status query failed")
                }
                Observation::MinedWithoutReceipt => {
                    tracing::debug!(tx_hash = %hash, ?state, "Mined, receipt not served yet")
                }
                Observation::Mined(_) => {}
            }

            if let Some(outcome) = state.outcome() {
                match &outcome {
                    Ok(result) => tracing::info!(
                        tx_hash = %hash,
                        state = result.state_message(),
                        "Transaction confirmed"
                    ),
                    Err(e) => tracing::warn!(tx_hash = %hash, error = %e, "Giving up on transaction"),
                }
                metrics::record_poll_outcome(match &outcome {
                    Ok(result) if result.is_success() => "included_success",
                    Ok(_) => "included_fail",
                    Err(_) => "timed_out",
                });
                return outcome;
            }
        }
    }

    /// Poll until a terminal state.
    pub async fn poll(&self, hash: TxHash) -> BlockchainResult<ConfirmationOutcome> {
        self.poll_until(hash, std::future::pending()).await
    }
}

/// A running status check.
///
/// Dropping the handle, or calling `cancel`, stops the poller at its next
/// suspension point.
#[derive(Debug)]
pub struct PollHandle {
    tx_hash: TxHash,
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<BlockchainResult<ConfirmationOutcome>>,
}

impl PollHandle {
    pub(crate) fn new(
        tx_hash: TxHash,
        cancel: oneshot::Sender<()>,
        task: JoinHandle<BlockchainResult<ConfirmationOutcome>>,
    ) -> Self {
        Self {
            tx_hash,
            cancel: Some(cancel),
            task,
        }
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Ask the poller to stop. `outcome` then returns `Cancelled`.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }

    /// Wait for the poller's result.
    pub async fn outcome(mut self) -> BlockchainResult<ConfirmationOutcome> {
        // Keep the sender alive until the task settles.
        let _cancel = self.cancel.take();
        match (&mut self.task).await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(BlockchainError::Cancelled),
            Err(e) => Err(BlockchainError::Network(format!("status task failed: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::ReceiptStatus;

    fn receipt(status: ReceiptStatus) -> ReceiptInfo {
        ReceiptInfo {
            status,
            block_number: Some(100),
            gas_used: 51_000,
        }
    }

    fn run(observations: &[Observation], max_attempts: u32) -> (PollState, usize) {
        let mut state = PollState::start();
        let mut consumed = 0;
        for observation in observations {
            if state.is_terminal() {
                break;
            }
            state = state.advance(observation, max_attempts);
            consumed += 1;
        }
        (state, consumed)
    }

    #[test]
    fn test_success_on_third_poll() {
        let observations = [
            Observation::NotFound,
            Observation::Pending,
            Observation::Mined(receipt(ReceiptStatus::Success)),
            Observation::Pending,
        ];
        let (state, consumed) = run(&observations, 20);
        assert_eq!(state, PollState::IncludedSuccess(receipt(ReceiptStatus::Success)));
        assert_eq!(consumed, 3);
    }

    #[test]
    fn test_reverted_receipt_is_included_fail() {
        let (state, _) = run(&[Observation::Mined(receipt(ReceiptStatus::Reverted))], 20);
        assert!(matches!(state, PollState::IncludedFail(_)));
        let outcome = state.outcome().unwrap().unwrap();
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_times_out_at_ceiling() {
        let mut observations = vec![Observation::Pending; 19];
        observations.push(Observation::NotFound);
        let (state, consumed) = run(&observations, 20);
        assert_eq!(state, PollState::TimedOut { attempts: 20 });
        assert_eq!(consumed, 20);
        assert!(matches!(
            state.outcome(),
            Some(Err(BlockchainError::TimedOut { attempts: 20 }))
        ));
    }

    #[test]
    fn test_errors_and_missing_receipts_spend_attempts() {
        let observations = [
            Observation::NodeError("connection reset".into()),
            Observation::MinedWithoutReceipt,
        ];
        let (state, _) = run(&observations, 20);
        assert_eq!(state, PollState::Pending { attempts: 2 });
        assert!(state.outcome().is_none());
    }

    #[test]
    fn test_terminal_states_absorb_observations() {
        let terminals = [
            PollState::IncludedSuccess(receipt(ReceiptStatus::Success)),
            PollState::IncludedFail(receipt(ReceiptStatus::Reverted)),
            PollState::TimedOut { attempts: 20 },
        ];
        for terminal in terminals {
            for observation in [
                Observation::Pending,
                Observation::NotFound,
                Observation::Mined(receipt(ReceiptStatus::Success)),
            ] {
                assert_eq!(terminal.advance(&observation, 20), terminal);
            }
        }
    }

    #[test]
    fn test_mined_on_last_attempt_still_counts() {
        let mut observations = vec![Observation::Pending; 19];
        observations.push(Observation::Mined(receipt(ReceiptStatus::Success)));
        let (state, _) = run(&observations, 20);
        assert!(matches!(state, PollState::IncludedSuccess(_)));
    }
}
