use anchor_lang::prelude::*;
use tinyvec::ArrayVec;

use crate::delegation::{GrantorRecord, MAX_GRANTORS};
use crate::error::StakingError;
use crate::math::{checked_add, checked_sub, mul_div};
use crate::BASIS_POINTS;

/// BCDEV minted for a stake of `staked` raw FCTR that participated for
/// `elapsed` seconds of a round lasting `round_duration` seconds.
pub trait RewardRate {
    fn reward_for(&self, staked: u64, elapsed: u64, round_duration: u64) -> Result<u64>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProportionalReward {
    pub rate_bps: u16,
}

impl RewardRate for ProportionalReward {
    fn reward_for(&self, staked: u64, elapsed: u64, round_duration: u64) -> Result<u64> {
        require!(round_duration > 0, StakingError::InvalidRoundDuration);
        let elapsed = elapsed.min(round_duration);
        let earned = mul_div(staked, elapsed, round_duration)?;
        mul_div(earned, self.rate_bps as u64, BASIS_POINTS)
    }
}

/// Per-recipient BCDEV amounts for one unstake. `grantors[i]` belongs to the
/// i-th active grantor of the receipt.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RewardSplit {
    pub confidant: u64,
    pub grantors: ArrayVec<[u64; MAX_GRANTORS]>,
}

impl RewardSplit {
    pub fn total(&self) -> Result<u64> {
        self.grantors
            .iter()
            .try_fold(self.confidant, |acc, share| checked_add(acc, *share))
    }
}

/// Splits `total` between the confidant and its active grantors.
///
/// Without grantors the confidant takes everything. Otherwise the confidant keeps
/// half and the rest is divided by participation weight. Rounding dust stays with
/// the confidant, so the shares always add up to `total`.
pub fn split_reward(total: u64, grantors: &[GrantorRecord]) -> Result<RewardSplit> {
    let mut split = RewardSplit {
        confidant: total,
        grantors: ArrayVec::new(),
    };
    if grantors.is_empty() {
        return Ok(split);
    }

    let pool = checked_sub(total, total / 2)?;
    let total_weight = grantors
        .iter()
        .try_fold(0u64, |acc, g| checked_add(acc, g.weight))?;

    let mut distributed = 0u64;
    for grantor in grantors {
        let share = if total_weight == 0 {
            pool / grantors.len() as u64
        } else {
            mul_div(pool, grantor.weight, total_weight)?
        };
        distributed = checked_add(distributed, share)?;
        if split.grantors.try_push(share).is_some() {
            return err!(StakingError::DelegationCapacityExceeded);
        }
    }
    split.confidant = checked_sub(total, distributed)?;

    Ok(split)
}
