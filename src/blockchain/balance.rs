//! Native and token balance reads.
//!
//! Every read goes to the node at the current chain head; nothing is cached.

use alloy::primitives::Address;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::blockchain::abi;
use crate::blockchain::node::NodeRpc;
use crate::blockchain::types::{
    BalanceSnapshot, BlockchainError, BlockchainResult, TokenContract,
};
use crate::blockchain::units::{from_base_units, NATIVE_DECIMALS};

/// Read-only balance queries against one token contract.
#[derive(Clone)]
pub struct BalanceReader {
    node: Arc<dyn NodeRpc>,
    token: TokenContract,
}

impl BalanceReader {
    pub fn new(node: Arc<dyn NodeRpc>, token: TokenContract) -> Self {
        Self { node, token }
    }

    /// Native and token balance of `address`, in whole units.
    pub async fn get_balance(&self, address: Address) -> BlockchainResult<BalanceSnapshot> {
        let native_balance = self.native_balance(address).await?;
        let token_balance = self.token_balance(address).await?;

        tracing::debug!(
            address = %address,
            native = %native_balance,
            token = %token_balance,
            symbol = %self.token.symbol,
            "Balances read"
        );

        Ok(BalanceSnapshot {
            address,
            native_balance,
            token_balance,
            token_symbol: self.token.symbol.clone(),
        })
    }

    pub async fn native_balance(&self, address: Address) -> BlockchainResult<Decimal> {
        let wei = self
            .node
            .balance_at(address)
            .await
            .map_err(into_network_error)?;
        from_base_units(wei, NATIVE_DECIMALS)
    }

    /// `balanceOf(address)` on the token contract.
    pub async fn token_balance(&self, address: Address) -> BlockchainResult<Decimal> {
        let data = abi::encode_balance_of(address)?;
        let raw = self
            .node
            .call(self.token.address, data)
            .await
            .map_err(into_network_error)?;
        from_base_units(abi::decode_uint(&raw)?, self.token.decimals)
    }

    /// `allowance(owner, spender)`: how much `spender` may still move out of
    /// `owner` with a delegated transfer.
    pub async fn allowance(&self, owner: Address, spender: Address) -> BlockchainResult<Decimal> {
        let data = abi::encode_allowance(owner, spender)?;
        let raw = self
            .node
            .call(self.token.address, data)
            .await
            .map_err(into_network_error)?;
        from_base_units(abi::decode_uint(&raw)?, self.token.decimals)
    }

    pub fn token(&self) -> &TokenContract {
        &self.token
    }
}

fn into_network_error(e: BlockchainError) -> BlockchainError {
    match e {
        BlockchainError::Network(_) => e,
        other => BlockchainError::Network(other.to_string()),
    }
}
