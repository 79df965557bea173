//! Shared utilities for integration tests: a scripted in-memory node.

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{keccak256, Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use custody_engine::blockchain::node::{CallRequest, NodeRpc, TxLookup};
use custody_engine::blockchain::types::{
    BlockchainError, BlockchainResult, ReceiptInfo, ReceiptStatus, SigningKeyHex,
};
use custody_engine::config::EngineConfig;
use custody_engine::{Shutdown, TransferEngine};

/// Anvil account #0.
#[allow(dead_code)]
pub const ANVIL_KEY_0: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
#[allow(dead_code)]
pub const ANVIL_ADDR_0: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

pub const TEST_CHAIN_ID: u64 = 31337;

/// What the node answers to one status query.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum PollStep {
    Pending,
    NotFound,
    NodeError,
    Mined(ReceiptStatus),
}

/// Canned answers. `None` makes the matching call fail.
pub struct Script {
    pub chain_id: u64,
    pub native_balance: U256,
    pub call_result: Option<Bytes>,
    pub nonce: Option<u64>,
    pub gas_price: Option<u128>,
    pub gas_estimate: Option<u64>,
    pub accept_broadcast: bool,
    /// Consumed one per status query; `Pending` once exhausted.
    pub poll_steps: VecDeque<PollStep>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            chain_id: TEST_CHAIN_ID,
            native_balance: U256::ZERO,
            call_result: Some(Bytes::from(vec![0u8; 32])),
            nonce: Some(7),
            gas_price: Some(20_000_000_000),
            gas_estimate: Some(51_234),
            accept_broadcast: true,
            poll_steps: VecDeque::new(),
        }
    }
}

/// In-memory `NodeRpc` that answers from a `Script` and records every call.
#[derive(Default)]
pub struct ScriptedNode {
    script: Mutex<Script>,
    current_step: Mutex<Option<PollStep>>,
    network_calls: AtomicU32,
    lookups: AtomicU32,
    pub estimates: Mutex<Vec<CallRequest>>,
    pub eth_calls: Mutex<Vec<(Address, Bytes)>>,
    pub sent: Mutex<Vec<Vec<u8>>>,
}

#[allow(dead_code)]
impl ScriptedNode {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            ..Self::default()
        })
    }

    pub fn with_polls(steps: impl IntoIterator<Item = PollStep>) -> Arc<Self> {
        Self::new(Script {
            poll_steps: steps.into_iter().collect(),
            ..Script::default()
        })
    }

    /// Every RPC made so far, of any kind.
    pub fn network_calls(&self) -> u32 {
        self.network_calls.load(Ordering::SeqCst)
    }

    /// `eth_getTransactionByHash` calls made so far.
    pub fn lookups(&self) -> u32 {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Decode the single broadcast transaction.
    pub fn sent_transaction(&self) -> alloy::consensus::Signed<TxLegacy> {
        let sent = self.sent.lock().unwrap();
        assert_eq!(sent.len(), 1, "expected exactly one broadcast");
        let envelope = TxEnvelope::decode_2718(&mut sent[0].as_slice()).unwrap();
        envelope.as_legacy().expect("legacy transaction").clone()
    }

    /// Recover the signer of the single broadcast transaction.
    pub fn sent_by(&self) -> Address {
        let tx = self.sent_transaction();
        tx.signature()
            .recover_address_from_prehash(&tx.tx().signature_hash())
            .unwrap()
    }

    fn touch(&self) {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn unavailable(op: &str) -> BlockchainError {
        BlockchainError::Network(format!("scripted failure: {}", op))
    }
}

#[async_trait]
impl NodeRpc for ScriptedNode {
    async fn chain_id(&self) -> BlockchainResult<u64> {
        self.touch();
        Ok(self.script.lock().unwrap().chain_id)
    }

    async fn balance_at(&self, _address: Address) -> BlockchainResult<U256> {
        self.touch();
        Ok(self.script.lock().unwrap().native_balance)
    }

    async fn call(&self, to: Address, data: Bytes) -> BlockchainResult<Bytes> {
        self.touch();
        self.eth_calls.lock().unwrap().push((to, data));
        self.script
            .lock()
            .unwrap()
            .call_result
            .clone()
            .ok_or_else(|| Self::unavailable("eth_call"))
    }

    async fn pending_nonce_at(&self, _address: Address) -> BlockchainResult<u64> {
        self.touch();
        self.script
            .lock()
            .unwrap()
            .nonce
            .ok_or_else(|| Self::unavailable("eth_getTransactionCount"))
    }

    async fn suggest_gas_price(&self) -> BlockchainResult<u128> {
        self.touch();
        self.script
            .lock()
            .unwrap()
            .gas_price
            .ok_or_else(|| Self::unavailable("eth_gasPrice"))
    }

    async fn estimate_gas(&self, call: &CallRequest) -> BlockchainResult<u64> {
        self.touch();
        self.estimates.lock().unwrap().push(call.clone());
        self.script
            .lock()
            .unwrap()
            .gas_estimate
            .ok_or_else(|| Self::unavailable("execution reverted"))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        self.touch();
        if !self.script.lock().unwrap().accept_broadcast {
            return Err(Self::unavailable("nonce too low"));
        }
        self.sent.lock().unwrap().push(raw.to_vec());
        Ok(keccak256(raw))
    }

    async fn transaction_by_hash(&self, _hash: TxHash) -> BlockchainResult<Option<TxLookup>> {
        self.touch();
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .unwrap()
            .poll_steps
            .pop_front()
            .unwrap_or(PollStep::Pending);
        *self.current_step.lock().unwrap() = Some(step);

        match step {
            PollStep::Pending => Ok(Some(TxLookup::pending())),
            PollStep::NotFound => Ok(None),
            PollStep::NodeError => Err(Self::unavailable("eth_getTransactionByHash")),
            PollStep::Mined(_) => Ok(Some(TxLookup::mined(1_000))),
        }
    }

    async fn transaction_receipt(&self, _hash: TxHash) -> BlockchainResult<Option<ReceiptInfo>> {
        self.touch();
        match *self.current_step.lock().unwrap() {
            Some(PollStep::Mined(status)) => Ok(Some(ReceiptInfo {
                status,
                block_number: Some(1_000),
                gas_used: 46_109,
            })),
            _ => Ok(None),
        }
    }
}

/// Defaults with a 1 ms poll interval and the Anvil chain.
pub fn test_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.blockchain.chain_id = TEST_CHAIN_ID;
    config.polling.interval_ms = 1;
    config
}

#[allow(dead_code)]
pub fn engine(node: Arc<ScriptedNode>) -> TransferEngine {
    engine_with(node, test_config(), Shutdown::new())
}

pub fn engine_with(node: Arc<ScriptedNode>, config: EngineConfig, shutdown: Shutdown) -> TransferEngine {
    TransferEngine::new(node, &config, shutdown).unwrap()
}

#[allow(dead_code)]
pub fn anvil_key() -> SigningKeyHex {
    SigningKeyHex::new(ANVIL_KEY_0)
}
