//! Transfer engine: the three entry points the surrounding system calls.
//!
//! # Data Flow
//! ```text
//! transfer(request)
//!     → KeyMaterial::from_hex (sender address)
//!     → TxBuilder::build (reserve, nonce, gas, call data)
//!     → sign_transaction (EIP-155, configured chain)
//!     → Broadcaster::send
//!     → TxHash
//!
//! check_status(hash) / spawn_status_check(hash)
//!     → ConfirmationPoller (cancellable task, registered while running)
//!
//! get_balance(address)
//!     → BalanceReader
//! ```
//!
//! Transfers for one sender are not serialized here. See `transaction.rs`.

use alloy::primitives::{Address, TxHash};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::Instrument;
use uuid::Uuid;

use crate::blockchain::balance::BalanceReader;
use crate::blockchain::broadcast::Broadcaster;
use crate::blockchain::confirmation::{ConfirmationPoller, PollHandle};
use crate::blockchain::node::NodeRpc;
use crate::blockchain::signer::sign_transaction;
use crate::blockchain::transaction::TxBuilder;
use crate::blockchain::types::{
    BalanceSnapshot, BlockchainResult, ConfirmationOutcome, TokenContract, TransferRequest,
};
use crate::blockchain::wallet::KeyMaterial;
use crate::config::schema::EngineConfig;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// Custodial transfer engine bound to one chain and one token contract.
///
/// Cheap to clone; clones share the node client and the poll registry.
#[derive(Clone)]
pub struct TransferEngine {
    chain_id: u64,
    builder: TxBuilder,
    broadcaster: Broadcaster,
    balances: BalanceReader,
    poller: ConfirmationPoller,
    /// Running status checks per hash.
    active_polls: Arc<DashMap<TxHash, usize>>,
    shutdown: Shutdown,
}

impl TransferEngine {
    pub fn new(
        node: Arc<dyn NodeRpc>,
        config: &EngineConfig,
        shutdown: Shutdown,
    ) -> BlockchainResult<Self> {
        let token = TokenContract::from_config(&config.token)?;
        Ok(Self {
            chain_id: config.blockchain.chain_id,
            builder: TxBuilder::new(node.clone(), token.clone(), config.transfer.clone()),
            broadcaster: Broadcaster::new(node.clone()),
            balances: BalanceReader::new(node.clone(), token),
            poller: ConfirmationPoller::new(node, &config.polling),
            active_polls: Arc::new(DashMap::new()),
            shutdown,
        })
    }

    /// Build, sign and broadcast one transfer.
    ///
    /// Returns once the node accepted the transaction into its pool. Any
    /// failure aborts before broadcast, except `BroadcastFailed` itself.
    pub async fn transfer(&self, request: TransferRequest) -> BlockchainResult<TxHash> {
        let kind = request.kind.label();
        let span = tracing::info_span!(
            "transfer",
            transfer_id = %Uuid::new_v4(),
            kind,
            to = %request.to,
            amount = %request.amount
        );

        let result = self.submit(request).instrument(span.clone()).await;
        let _entered = span.enter();
        match &result {
            Ok(hash) => {
                metrics::record_transfer_submitted(kind);
                tracing::info!(tx_hash = %hash, "Transfer submitted");
            }
            Err(e) => {
                metrics::record_transfer_failed(kind, e.kind());
                tracing::warn!(error = %e, "Transfer failed");
            }
        }
        result
    }

    async fn submit(&self, request: TransferRequest) -> BlockchainResult<TxHash> {
        let TransferRequest {
            signing_key,
            to,
            amount,
            kind,
        } = request;
        // Consumes the hex string; only the parsed key survives.
        let key = KeyMaterial::from_hex(signing_key)?;
        let sender = key.address();
        tracing::debug!(sender = %sender, "Signing key parsed");

        let unsigned = self.builder.build(kind, to, amount, sender).await?;
        let signed = sign_transaction(unsigned, &key, self.chain_id)?;
        drop(key);

        self.broadcaster.send(&signed).await
    }

    /// Poll `hash` to a terminal state on the caller's task.
    ///
    /// Stops early with `Cancelled` when shutdown is triggered, including a
    /// trigger that happened before the call. Dropping the future stops the
    /// poll.
    pub async fn check_status(&self, hash: TxHash) -> BlockchainResult<ConfirmationOutcome> {
        let _guard = PollGuard::register(self.active_polls.clone(), hash);
        let shutdown = self.shutdown.clone();
        self.poller
            .poll_until(hash, async move { shutdown.triggered().await })
            .instrument(tracing::info_span!("status_check", tx_hash = %hash))
            .await
    }

    /// Start polling `hash` in the background.
    ///
    /// The poll stops on a terminal state, on `PollHandle::cancel`, when the
    /// handle is dropped, or when shutdown is triggered. Must be called from
    /// within a Tokio runtime.
    pub fn spawn_status_check(&self, hash: TxHash) -> PollHandle {
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let shutdown = self.shutdown.clone();
        let guard = PollGuard::register(self.active_polls.clone(), hash);
        let poller = self.poller.clone();

        let cancelled = async move {
            tokio::select! {
                _ = cancel_rx => {}
                _ = shutdown.triggered() => {}
            }
        };

        let task = tokio::spawn(
            async move {
                let _guard = guard;
                poller.poll_until(hash, cancelled).await
            }
            .instrument(tracing::info_span!("status_check", tx_hash = %hash)),
        );

        PollHandle::new(hash, cancel_tx, task)
    }

    pub async fn get_balance(&self, address: Address) -> BlockchainResult<BalanceSnapshot> {
        self.balances.get_balance(address).await
    }

    /// Token amount `spender` may still move out of `owner`.
    pub async fn allowance(&self, owner: Address, spender: Address) -> BlockchainResult<Decimal> {
        self.balances.allowance(owner, spender).await
    }

    /// Number of distinct hashes currently being polled.
    pub fn active_polls(&self) -> usize {
        self.active_polls.len()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn token(&self) -> &TokenContract {
        self.balances.token()
    }
}

/// Keeps a hash in the poll registry for as long as its task runs.
struct PollGuard {
    registry: Arc<DashMap<TxHash, usize>>,
    hash: TxHash,
}

impl PollGuard {
    fn register(registry: Arc<DashMap<TxHash, usize>>, hash: TxHash) -> Self {
        let running = {
            let mut entry = registry.entry(hash).or_insert(0);
            *entry += 1;
            *entry
        };
        if running > 1 {
            tracing::warn!(tx_hash = %hash, running, "Duplicate status check for transaction");
        }
        metrics::record_active_polls(registry.len());
        Self { registry, hash }
    }
}

impl Drop for PollGuard {
    fn drop(&mut self) {
        self.registry.remove_if_mut(&self.hash, |_, running| {
            *running -= 1;
            *running == 0
        });
        metrics::record_active_polls(self.registry.len());
    }
}
