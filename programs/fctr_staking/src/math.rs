use anchor_lang::prelude::*;

use crate::error::StakingError;

/// `a * b / c` evaluated in 128 bits, rounding down.
pub fn mul_div(a: u64, b: u64, c: u64) -> Result<u64> {
    let value = (a as u128)
        .checked_mul(b as u128)
        .ok_or(StakingError::MathOverflow)?
        .checked_div(c as u128)
        .ok_or(StakingError::MathOverflow)?;
    u64::try_from(value).map_err(|_| error!(StakingError::MathOverflow))
}

pub fn checked_add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or_else(|| error!(StakingError::MathOverflow))
}

pub fn checked_sub(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b).ok_or_else(|| error!(StakingError::MathOverflow))
}
