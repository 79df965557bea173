//! Unsigned transaction assembly.
//!
//! # Responsibilities
//! - Enforce the native gas reserve before touching the network
//! - Encode token call data
//! - Fetch the pending nonce and suggested gas price per build
//! - Estimate gas for contract calls
//!
//! # Nonces
//! The nonce is read fresh for every build and never reserved. Two concurrent
//! builds for one sender can read the same nonce; the node then rejects or
//! replaces one of them. Callers that need ordering must serialize transfers
//! per sender.

use alloy::primitives::{Address, Bytes, U256};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::blockchain::abi;
use crate::blockchain::node::{CallRequest, NodeRpc};
use crate::blockchain::types::{
    BlockchainError, BlockchainResult, TokenContract, TransferKind, UnsignedTransaction,
};
use crate::blockchain::units::{to_base_units, NATIVE_DECIMALS};
use crate::config::schema::TransferConfig;

/// Builds unsigned transactions for the three transfer shapes.
#[derive(Clone)]
pub struct TxBuilder {
    node: Arc<dyn NodeRpc>,
    token: TokenContract,
    policy: TransferConfig,
}

impl TxBuilder {
    /// Create a new transaction builder.
    pub fn new(node: Arc<dyn NodeRpc>, token: TokenContract, policy: TransferConfig) -> Self {
        Self {
            node,
            token,
            policy,
        }
    }

    /// Build the unsigned transaction moving `amount` to `to`, sent from `sender`.
    pub async fn build(
        &self,
        kind: TransferKind,
        to: Address,
        amount: Decimal,
        sender: Address,
    ) -> BlockchainResult<UnsignedTransaction> {
        match kind {
            TransferKind::Native => self.build_native(sender, to, amount).await,
            TransferKind::Token => {
                let amount = to_base_units(amount, self.token.decimals)?;
                let data = abi::encode_transfer(to, amount)?;
                self.build_contract_call(sender, data).await
            }
            TransferKind::TokenFrom { owner } => {
                let amount = to_base_units(amount, self.token.decimals)?;
                let data = abi::encode_transfer_from(owner, to, amount)?;
                self.build_contract_call(sender, data).await
            }
        }
    }

    /// Native transfer of `amount` minus the gas reserve.
    async fn build_native(
        &self,
        sender: Address,
        to: Address,
        amount: Decimal,
    ) -> BlockchainResult<UnsignedTransaction> {
        let reserve = self.policy.native_reserve;
        let adjusted = amount
            .checked_sub(reserve)
            .filter(|a| a.is_sign_positive() && !a.is_zero())
            .ok_or(BlockchainError::InsufficientReserve {
                requested: amount,
                reserve,
            })?;
        let value = to_base_units(adjusted, NATIVE_DECIMALS)?;

        let nonce = self.pending_nonce(sender).await?;
        let gas_price = self.gas_price().await?;

        tracing::debug!(
            sender = %sender,
            nonce,
            gas_price,
            value = %value,
            "Native transfer built"
        );

        Ok(UnsignedTransaction {
            nonce,
            to,
            value,
            gas_limit: self.policy.native_gas_limit,
            gas_price,
            data: Bytes::new(),
        })
    }

    /// Zero-value call into the token contract with estimated gas.
    async fn build_contract_call(
        &self,
        sender: Address,
        data: Bytes,
    ) -> BlockchainResult<UnsignedTransaction> {
        let nonce = self.pending_nonce(sender).await?;
        let gas_price = self.gas_price().await?;

        let call = CallRequest {
            from: sender,
            to: self.token.address,
            data,
            value: U256::ZERO,
        };
        let gas_limit = self
            .node
            .estimate_gas(&call)
            .await
            .map_err(|e| BlockchainError::GasEstimationFailed(e.to_string()))?;

        tracing::debug!(
            sender = %sender,
            contract = %self.token.address,
            nonce,
            gas_price,
            gas_limit,
            "Token call built"
        );

        Ok(UnsignedTransaction {
            nonce,
            to: self.token.address,
            value: U256::ZERO,
            gas_limit,
            gas_price,
            data: call.data,
        })
    }

    async fn pending_nonce(&self, sender: Address) -> BlockchainResult<u64> {
        self.node
            .pending_nonce_at(sender)
            .await
            .map_err(|e| BlockchainError::NonceFetchFailed(e.to_string()))
    }

    async fn gas_price(&self) -> BlockchainResult<u128> {
        self.node
            .suggest_gas_price()
            .await
            .map_err(|e| BlockchainError::GasEstimationFailed(format!("gas price: {}", e)))
    }
}
