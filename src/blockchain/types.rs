//! Transfer data model and error definitions.

use alloy::consensus::{Signed, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Address, Bytes, TxHash, TxKind, U256};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use zeroize::Zeroizing;

pub use crate::config::schema::BlockchainConfig;
use crate::config::schema::TokenConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during transfer operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// The private key does not decode to a valid secp256k1 scalar.
    #[error("Malformed signing key: {0}")]
    MalformedKey(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Amount is negative, overflows, or is finer than the asset's decimals.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Native amount does not cover the gas reserve.
    #[error("Amount {requested} does not exceed the gas reserve of {reserve}")]
    InsufficientReserve { requested: Decimal, reserve: Decimal },

    #[error("Gas estimation failed: {0}")]
    GasEstimationFailed(String),

    #[error("Nonce fetch failed: {0}")]
    NonceFetchFailed(String),

    #[error("ABI encoding error: {0}")]
    AbiEncoding(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Broadcast failed: {0}")]
    BroadcastFailed(String),

    /// Node communication failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The node does not know the transaction (yet).
    #[error("Transaction {0} not found")]
    NotFoundTransient(TxHash),

    /// Poll budget exhausted; the transaction may still be mined later.
    #[error("Transaction not confirmed after {attempts} polls")]
    TimedOut { attempts: u32 },

    #[error("Status polling cancelled")]
    Cancelled,

    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

impl BlockchainError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedKey(_) => "malformed_key",
            Self::InvalidAddress(_) => "invalid_address",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InsufficientReserve { .. } => "insufficient_reserve",
            Self::GasEstimationFailed(_) => "gas_estimation_failed",
            Self::NonceFetchFailed(_) => "nonce_fetch_failed",
            Self::AbiEncoding(_) => "abi_encoding",
            Self::Signing(_) => "signing",
            Self::BroadcastFailed(_) => "broadcast_failed",
            Self::Network(_) => "network",
            Self::NotFoundTransient(_) => "not_found",
            Self::TimedOut { .. } => "timed_out",
            Self::Cancelled => "cancelled",
            Self::ChainMismatch { .. } => "chain_mismatch",
        }
    }
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Hex-encoded private key as received from the caller.
///
/// Zeroed on drop; `Debug` and `Display` never print the value. Not `Clone`,
/// so the one copy is the one the transfer consumes.
pub struct SigningKeyHex(Zeroizing<String>);

impl SigningKeyHex {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(Zeroizing::new(hex.into()))
    }

    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SigningKeyHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKeyHex(***REDACTED***)")
    }
}

impl fmt::Display for SigningKeyHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***REDACTED***")
    }
}

/// The token contract transfers and balance reads target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenContract {
    pub address: Address,
    pub symbol: String,
    pub decimals: u32,
}

impl TokenContract {
    pub fn from_config(config: &TokenConfig) -> BlockchainResult<Self> {
        let address = config
            .address
            .parse()
            .map_err(|e| BlockchainError::InvalidAddress(format!("{}: {}", config.address, e)))?;
        Ok(Self {
            address,
            symbol: config.symbol.clone(),
            decimals: config.decimals,
        })
    }
}

/// What a transfer moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Native coin.
    Native,
    /// `transfer(to, amount)` from the signer's own token balance.
    Token,
    /// `transferFrom(owner, to, amount)`; the signer is an approved spender of `owner`.
    TokenFrom { owner: Address },
}

impl TransferKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Token => "token",
            Self::TokenFrom { .. } => "token_from",
        }
    }
}

/// A caller's request to move funds.
#[derive(Debug)]
pub struct TransferRequest {
    pub signing_key: SigningKeyHex,
    pub to: Address,
    /// Amount in whole units of the asset (ETH, USDT), not base units.
    pub amount: Decimal,
    pub kind: TransferKind,
}

/// Fully specified legacy transaction, ready to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub nonce: u64,
    pub to: Address,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub data: Bytes,
}

impl UnsignedTransaction {
    /// Bind the transaction to `chain_id` (EIP-155).
    pub fn into_legacy(self, chain_id: u64) -> TxLegacy {
        TxLegacy {
            chain_id: Some(chain_id),
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: TxKind::Call(self.to),
            value: self.value,
            input: self.data,
        }
    }
}

/// A chain-bound signed transaction.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    inner: Signed<TxLegacy>,
}

impl SignedTransaction {
    pub fn new(inner: Signed<TxLegacy>) -> Self {
        Self { inner }
    }

    pub fn hash(&self) -> TxHash {
        *self.inner.hash()
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.inner.tx().chain_id
    }

    pub fn inner(&self) -> &Signed<TxLegacy> {
        &self.inner
    }

    /// Raw bytes for `eth_sendRawTransaction`.
    pub fn encoded(&self) -> Vec<u8> {
        TxEnvelope::from(self.inner.clone()).encoded_2718()
    }
}

/// Execution status recorded in a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

impl ReceiptStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Receipt fields the poller cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReceiptInfo {
    pub status: ReceiptStatus,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Definitive on-chain result of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConfirmationOutcome {
    IncludedSuccess { block_number: Option<u64>, gas_used: u64 },
    IncludedFail { block_number: Option<u64>, gas_used: u64 },
}

impl ConfirmationOutcome {
    pub fn from_receipt(receipt: ReceiptInfo) -> Self {
        match receipt.status {
            ReceiptStatus::Success => Self::IncludedSuccess {
                block_number: receipt.block_number,
                gas_used: receipt.gas_used,
            },
            ReceiptStatus::Reverted => Self::IncludedFail {
                block_number: receipt.block_number,
                gas_used: receipt.gas_used,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::IncludedSuccess { .. })
    }

    /// Human readable state for the surrounding system.
    pub fn state_message(&self) -> &'static str {
        match self {
            Self::IncludedSuccess { .. } => "Success",
            Self::IncludedFail { .. } => "Fail",
        }
    }
}

/// Balances of one address, read at the current chain head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceSnapshot {
    pub address: Address,
    pub native_balance: Decimal,
    pub token_balance: Decimal,
    pub token_symbol: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_conversion() {
        let chain_id = ChainId::from(1u64);
        assert_eq!(chain_id.0, 1);
        assert_eq!(u64::from(chain_id), 1);
    }

    #[test]
    fn test_error_display() {
        let err = BlockchainError::TimedOut { attempts: 20 };
        assert_eq!(err.to_string(), "Transaction not confirmed after 20 polls");

        let err = BlockchainError::InsufficientReserve {
            requested: Decimal::new(4, 3),
            reserve: Decimal::new(42, 4),
        };
        assert_eq!(
            err.to_string(),
            "Amount 0.004 does not exceed the gas reserve of 0.0042"
        );
        assert_eq!(err.kind(), "insufficient_reserve");
    }

    #[test]
    fn test_signing_key_is_redacted() {
        let key = SigningKeyHex::new("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80");
        assert_eq!(key.to_string(), "***REDACTED***");
        let request = TransferRequest {
            signing_key: key,
            to: Address::ZERO,
            amount: Decimal::ONE,
            kind: TransferKind::Native,
        };
        let debug = format!("{:?}", request);
        assert!(!debug.contains("ac0974"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_token_contract_from_config() {
        let token = TokenContract::from_config(&TokenConfig::default()).unwrap();
        assert_eq!(
            token.address,
            "0xdAC17F958D2ee523a2206206994597C13D831ec7".parse::<Address>().unwrap()
        );
        assert_eq!(token.decimals, 6);

        let bad = TokenConfig {
            address: "0xnothex".into(),
            ..TokenConfig::default()
        };
        assert!(matches!(
            TokenContract::from_config(&bad),
            Err(BlockchainError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_outcome_from_receipt() {
        let receipt = ReceiptInfo {
            status: ReceiptStatus::Reverted,
            block_number: Some(7),
            gas_used: 30_000,
        };
        let outcome = ConfirmationOutcome::from_receipt(receipt);
        assert!(!outcome.is_success());
        assert_eq!(outcome.state_message(), "Fail");
        assert_eq!(
            serde_json::to_value(outcome).unwrap()["state"],
            "included_fail"
        );
    }

    #[test]
    fn test_unsigned_into_legacy_binds_chain() {
        let unsigned = UnsignedTransaction {
            nonce: 3,
            to: Address::repeat_byte(0x11),
            value: U256::from(5u64),
            gas_limit: 21_000,
            gas_price: 1_000_000_000,
            data: Bytes::new(),
        };
        let tx = unsigned.into_legacy(1);
        assert_eq!(tx.chain_id, Some(1));
        assert_eq!(tx.to, TxKind::Call(Address::repeat_byte(0x11)));
        assert_eq!(tx.nonce, 3);
    }
}
