//! Hand-rolled ABI call data for the handful of ERC-20 functions the engine uses.
//!
//! Call data is `selector ‖ word ‖ word …` where every argument occupies one
//! left-padded 32-byte word. Selectors are the first four bytes of the
//! keccak256 hash of the function signature. They are pinned as constants
//! because a selector computed with the wrong hash (NIST SHA3-256 instead of
//! keccak256) silently targets a function no contract implements.

use alloy::primitives::{Address, Bytes, U256};

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Width of one ABI word.
pub const WORD: usize = 32;

/// `transfer(address,uint256)`
pub const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// `transferFrom(address,address,uint256)`
pub const TRANSFER_FROM_SELECTOR: [u8; 4] = [0x23, 0xb8, 0x72, 0xdd];

/// `balanceOf(address)`
pub const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

/// `allowance(address,address)`
pub const ALLOWANCE_SELECTOR: [u8; 4] = [0xdd, 0x62, 0xed, 0x3e];

/// Left-pad a big-endian value to exactly one word.
///
/// Input longer than 32 bytes is rejected rather than truncated.
pub fn pad32(bytes: &[u8]) -> BlockchainResult<[u8; WORD]> {
    if bytes.len() > WORD {
        return Err(BlockchainError::AbiEncoding(format!(
            "value of {} bytes does not fit a {}-byte word",
            bytes.len(),
            WORD
        )));
    }
    let mut word = [0u8; WORD];
    word[WORD - bytes.len()..].copy_from_slice(bytes);
    Ok(word)
}

/// Concatenate a selector and its argument words.
pub fn encode_call(selector: [u8; 4], args: &[[u8; WORD]]) -> Bytes {
    let mut data = Vec::with_capacity(4 + args.len() * WORD);
    data.extend_from_slice(&selector);
    for arg in args {
        data.extend_from_slice(arg);
    }
    Bytes::from(data)
}

fn address_word(address: Address) -> BlockchainResult<[u8; WORD]> {
    pad32(address.as_slice())
}

fn uint_word(value: U256) -> BlockchainResult<[u8; WORD]> {
    pad32(&value.to_be_bytes_trimmed_vec())
}

pub fn encode_transfer(to: Address, amount: U256) -> BlockchainResult<Bytes> {
    Ok(encode_call(
        TRANSFER_SELECTOR,
        &[address_word(to)?, uint_word(amount)?],
    ))
}

pub fn encode_transfer_from(from: Address, to: Address, amount: U256) -> BlockchainResult<Bytes> {
    Ok(encode_call(
        TRANSFER_FROM_SELECTOR,
        &[address_word(from)?, address_word(to)?, uint_word(amount)?],
    ))
}

pub fn encode_balance_of(owner: Address) -> BlockchainResult<Bytes> {
    Ok(encode_call(BALANCE_OF_SELECTOR, &[address_word(owner)?]))
}

pub fn encode_allowance(owner: Address, spender: Address) -> BlockchainResult<Bytes> {
    Ok(encode_call(
        ALLOWANCE_SELECTOR,
        &[address_word(owner)?, address_word(spender)?],
    ))
}

/// Read a `uint256` return value (the first word of the return data).
pub fn decode_uint(data: &[u8]) -> BlockchainResult<U256> {
    if data.len() < WORD {
        return Err(BlockchainError::AbiEncoding(format!(
            "expected a {}-byte return word, got {} bytes",
            WORD,
            data.len()
        )));
    }
    Ok(U256::from_be_slice(&data[..WORD]))
}
