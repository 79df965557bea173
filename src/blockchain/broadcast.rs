//! Signed transaction submission.

use alloy::primitives::TxHash;
use std::sync::Arc;

use crate::blockchain::node::NodeRpc;
use crate::blockchain::types::{BlockchainError, BlockchainResult, SignedTransaction};

/// Submits signed transactions to the node's mempool.
///
/// One attempt per call. Resubmitting after a failure is the caller's
/// decision, and needs a fresh nonce if the first attempt did land.
#[derive(Clone)]
pub struct Broadcaster {
    node: Arc<dyn NodeRpc>,
}

impl Broadcaster {
    pub fn new(node: Arc<dyn NodeRpc>) -> Self {
        Self { node }
    }

    pub async fn send(&self, signed: &SignedTransaction) -> BlockchainResult<TxHash> {
        let local_hash = signed.hash();
        let node_hash = self
            .node
            .send_raw_transaction(&signed.encoded())
            .await
            .map_err(into_broadcast_error)?;

        if node_hash != local_hash {
            tracing::warn!(
                local = %local_hash,
                node = %node_hash,
                "Node reported a different transaction hash"
            );
        }

        tracing::info!(tx_hash = %node_hash, "Transaction broadcast");
        Ok(node_hash)
    }
}

/// Keep the node's message without stacking error prefixes.
fn into_broadcast_error(e: BlockchainError) -> BlockchainError {
    match e {
        BlockchainError::BroadcastFailed(_) => e,
        BlockchainError::Network(message) => BlockchainError::BroadcastFailed(message),
        other => BlockchainError::BroadcastFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_message_is_not_double_wrapped() {
        let err = into_broadcast_error(BlockchainError::Network("nonce too low".into()));
        assert_eq!(err.to_string(), "Broadcast failed: nonce too low");

        let err = into_broadcast_error(BlockchainError::BroadcastFailed("already known".into()));
        assert_eq!(err.to_string(), "Broadcast failed: already known");
    }
}
