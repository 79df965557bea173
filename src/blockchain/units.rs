//! Conversion between whole-unit decimal amounts and on-chain integer base units.

use alloy::primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Decimals of the native coin (wei per ether).
pub const NATIVE_DECIMALS: u32 = 18;

/// Largest scale a `Decimal` can represent.
const MAX_DECIMALS: u32 = 28;

fn ten_pow(decimals: u32) -> BlockchainResult<Decimal> {
    if decimals >= MAX_DECIMALS {
        return Err(BlockchainError::InvalidAmount(format!(
            "{} decimals exceed the supported precision",
            decimals
        )));
    }
    Ok(Decimal::from_i128_with_scale(10i128.pow(decimals), 0))
}

/// Scale `amount` up to base units.
///
/// Negative amounts and amounts finer than `decimals` are rejected; nothing is
/// rounded away.
pub fn to_base_units(amount: Decimal, decimals: u32) -> BlockchainResult<U256> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(BlockchainError::InvalidAmount(format!("{} is negative", amount)));
    }
    let scaled = amount
        .checked_mul(ten_pow(decimals)?)
        .ok_or_else(|| BlockchainError::InvalidAmount(format!("{} overflows", amount)))?;
    if !scaled.fract().is_zero() {
        return Err(BlockchainError::InvalidAmount(format!(
            "{} has more than {} decimal places",
            amount, decimals
        )));
    }
    let raw = scaled
        .trunc()
        .to_u128()
        .ok_or_else(|| BlockchainError::InvalidAmount(format!("{} overflows", amount)))?;
    Ok(U256::from(raw))
}

/// Scale an on-chain integer down to whole units.
pub fn from_base_units(raw: U256, decimals: u32) -> BlockchainResult<Decimal> {
    let overflow = || BlockchainError::InvalidAmount(format!("{} does not fit a decimal", raw));
    ten_pow(decimals)?;

    if let Ok(small) = i128::try_from(raw) {
        if let Ok(exact) = Decimal::try_from_i128_with_scale(small, decimals) {
            return Ok(exact.normalize());
        }
    }

    // Too many significant digits for an exact result: keep the integer part
    // exact and let the fraction lose precision.
    let unit = U256::from(10u64).pow(U256::from(decimals));
    let (whole, fraction) = raw.div_rem(unit);
    let whole = i128::try_from(whole)
        .ok()
        .and_then(|w| Decimal::try_from_i128_with_scale(w, 0).ok())
        .ok_or_else(overflow)?;
    let fraction = i128::try_from(fraction)
        .ok()
        .and_then(|f| Decimal::try_from_i128_with_scale(f, decimals).ok())
        .ok_or_else(overflow)?;
    whole
        .checked_add(fraction)
        .map(|d| d.normalize())
        .ok_or_else(overflow)
}
