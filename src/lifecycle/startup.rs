//! Startup orchestration.
//!
//! # Order
//! 1. Logging and metrics from the observability section
//! 2. Node client (chain ID checked, mismatch logged)
//! 3. Engine over the shared client
//!
//! Any error here is fatal to the binary.

use std::sync::Arc;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::node::NodeRpc;
use crate::blockchain::types::BlockchainResult;
use crate::config::schema::{EngineConfig, ObservabilityConfig};
use crate::engine::TransferEngine;
use crate::lifecycle::Shutdown;
use crate::observability::{logging, metrics};

/// Install logging and, when enabled, the metrics endpoint.
pub fn init_observability(config: &ObservabilityConfig) {
    logging::init(config);

    if config.metrics_enabled {
        match config.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }
}

/// Connect to the node and assemble the engine.
pub async fn build_engine(
    config: &EngineConfig,
    shutdown: Shutdown,
) -> BlockchainResult<TransferEngine> {
    let client = BlockchainClient::new(config.blockchain.clone()).await?;
    let node: Arc<dyn NodeRpc> = Arc::new(client);
    let engine = TransferEngine::new(node, config, shutdown)?;

    tracing::info!(
        chain_id = config.blockchain.chain_id,
        token = %config.token.symbol,
        poll_interval_ms = config.polling.interval_ms,
        max_attempts = config.polling.max_attempts,
        "Transfer engine ready"
    );
    Ok(engine)
}
