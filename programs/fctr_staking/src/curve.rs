use anchor_lang::prelude::*;
use anchor_lang::solana_program::native_token::LAMPORTS_PER_SOL;

use crate::error::StakingError;
use crate::math::{checked_add, checked_sub, mul_div};
use crate::{BCDEV_PER_SOL, ONE_BCDEV, ONE_FCTR};

/// Pricing between the lamport reserve and FCTR.
///
/// `supply` is the outstanding FCTR before the operation. Both directions round
/// in favour of the reserve.
pub trait BondingCurve {
    /// Raw FCTR minted for a deposit of `lamports`.
    fn tokens_for_deposit(&self, lamports: u64, supply: u64) -> Result<u64>;

    /// Lamports paid out for burning `tokens` raw FCTR.
    fn reserve_for_redeem(&self, tokens: u64, supply: u64) -> Result<u64>;
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurveKind {
    /// Whole FCTR per whole SOL. Buying and redeeming use separate rates.
    FixedRate { buy_rate: u64, sell_rate: u64 },
    /// Spot price in lamports per whole FCTR: `base_price + slope * whole_supply`.
    SupplyLinear { base_price: u64, slope: u64 },
}

impl Default for CurveKind {
    fn default() -> Self {
        CurveKind::FixedRate {
            buy_rate: 109,
            sell_rate: 101,
        }
    }
}

impl CurveKind {
    pub const SPACE: usize = 1 + 8 + 8;

    pub fn validate(&self) -> Result<()> {
        match *self {
            CurveKind::FixedRate {
                buy_rate,
                sell_rate,
            } => {
                require!(buy_rate > 0 && sell_rate > 0, StakingError::InvalidCurve);
            }
            CurveKind::SupplyLinear { base_price, .. } => {
                require!(base_price > 0, StakingError::InvalidCurve);
            }
        }
        Ok(())
    }

    fn spot_price(base_price: u64, slope: u64, supply: u64) -> Result<u64> {
        let whole_supply = supply / ONE_FCTR;
        let growth = slope
            .checked_mul(whole_supply)
            .ok_or(StakingError::MathOverflow)?;
        checked_add(base_price, growth)
    }
}

impl BondingCurve for CurveKind {
    fn tokens_for_deposit(&self, lamports: u64, supply: u64) -> Result<u64> {
        match *self {
            CurveKind::FixedRate { buy_rate, .. } => {
                let per_sol = buy_rate
                    .checked_mul(ONE_FCTR)
                    .ok_or(StakingError::MathOverflow)?;
                mul_div(lamports, per_sol, LAMPORTS_PER_SOL)
            }
            CurveKind::SupplyLinear { base_price, slope } => {
                let price = Self::spot_price(base_price, slope, supply)?;
                mul_div(lamports, ONE_FCTR, price)
            }
        }
    }

    fn reserve_for_redeem(&self, tokens: u64, supply: u64) -> Result<u64> {
        match *self {
            CurveKind::FixedRate { sell_rate, .. } => {
                let per_sol = sell_rate
                    .checked_mul(ONE_FCTR)
                    .ok_or(StakingError::MathOverflow)?;
                mul_div(tokens, LAMPORTS_PER_SOL, per_sol)
            }
            CurveKind::SupplyLinear { base_price, slope } => {
                // priced at the supply left after the burn
                let remaining = checked_sub(supply, tokens)?;
                let price = Self::spot_price(base_price, slope, remaining)?;
                mul_div(tokens, price, ONE_FCTR)
            }
        }
    }
}

/// Lamports paid for burning `amount` raw BCDEV.
pub fn bcdev_redeem_value(amount: u64) -> Result<u64> {
    let per_sol = BCDEV_PER_SOL
        .checked_mul(ONE_BCDEV)
        .ok_or(StakingError::MathOverflow)?;
    mul_div(amount, LAMPORTS_PER_SOL, per_sol)
}
