//! Signing key parsing and sender address derivation.
//!
//! # Security
//! - Keys arrive per request and live only as long as the transfer that uses them
//! - Keys are never logged or serialized
//! - The underlying k256 signing key is zeroed on drop

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;

use crate::blockchain::types::{BlockchainError, BlockchainResult, SigningKeyHex};

/// Environment variable the CLI reads the signing key from.
pub const SIGNING_KEY_ENV_VAR: &str = "CUSTODY_SIGNING_KEY";

/// A parsed secp256k1 signing key and the address it controls.
///
/// Not `Clone`: one transfer owns one key.
#[derive(Debug)]
pub struct KeyMaterial {
    signer: PrivateKeySigner,
}

impl KeyMaterial {
    /// Parse a hex-encoded private key (with or without 0x prefix).
    ///
    /// Fails with `MalformedKey` for bad hex, a wrong length, or a scalar
    /// outside the curve order. The hex string is consumed and zeroed on
    /// return, whether or not parsing succeeds.
    pub fn from_hex(key: SigningKeyHex) -> BlockchainResult<Self> {
        let raw = key.expose_secret().trim();
        let key_hex = raw.strip_prefix("0x").unwrap_or(raw);

        if key_hex.len() != 64 {
            return Err(BlockchainError::MalformedKey(format!(
                "expected 64 hex characters, got {}",
                key_hex.len()
            )));
        }

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::MalformedKey(format!("{}", e)))?;

        Ok(Self { signer })
    }

    /// Load a key from `CUSTODY_SIGNING_KEY`.
    pub fn hex_from_env() -> BlockchainResult<SigningKeyHex> {
        std::env::var(SIGNING_KEY_ENV_VAR)
            .map(SigningKeyHex::new)
            .map_err(|_| {
                BlockchainError::MalformedKey(format!(
                    "Environment variable {} not set",
                    SIGNING_KEY_ENV_VAR
                ))
            })
    }

    /// The sender address: last 20 bytes of keccak256 of the public key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub(crate) fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}
