//! EIP-155 transaction signing.

use alloy::consensus::SignableTransaction;
use alloy::network::TxSignerSync;

use crate::blockchain::types::{
    BlockchainError, BlockchainResult, SignedTransaction, UnsignedTransaction,
};
use crate::blockchain::wallet::KeyMaterial;

/// Sign `unsigned` for `chain_id`.
///
/// The chain ID is part of the signed payload, so the resulting bytes are
/// invalid on any other chain.
pub fn sign_transaction(
    unsigned: UnsignedTransaction,
    key: &KeyMaterial,
    chain_id: u64,
) -> BlockchainResult<SignedTransaction> {
    if chain_id == 0 {
        return Err(BlockchainError::Signing("chain id must be non-zero".to_string()));
    }

    let mut tx = unsigned.into_legacy(chain_id);
    let signature = key
        .signer()
        .sign_transaction_sync(&mut tx)
        .map_err(|e| BlockchainError::Signing(e.to_string()))?;

    Ok(SignedTransaction::new(tx.into_signed(signature)))
}
