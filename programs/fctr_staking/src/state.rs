use anchor_lang::prelude::*;

use crate::curve::{bcdev_redeem_value, BondingCurve, CurveKind};
use crate::delegation::{GrantorHistoryRecord, GrantorRecord, GrantorSet, MAX_GRANTORS};
use crate::error::StakingError;
use crate::math::{checked_add, checked_sub};
use crate::reward::{ProportionalReward, RewardRate};
use crate::{BASIS_POINTS, GRANTOR_APR_BPS, MIN_BUY_AMOUNT};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SolvencyPolicy {
    /// Reserve is released only when no FCTR or BCDEV is outstanding.
    #[default]
    Strict,
    /// Also releases the reserve when every FCTR sits in platform custody, or
    /// once the final round has been over for three round durations.
    Relaxed,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlatformConfig {
    pub curve: CurveKind,
    pub reward_rate_bps: u16,
    pub solvency: SolvencyPolicy,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            curve: CurveKind::default(),
            reward_rate_bps: BASIS_POINTS as u16,
            solvency: SolvencyPolicy::default(),
        }
    }
}

impl PlatformConfig {
    pub const SPACE: usize = CurveKind::SPACE + 2 + 1;

    pub fn validate(&self) -> Result<()> {
        self.curve.validate()?;
        require!(
            self.reward_rate_bps as u64 <= BASIS_POINTS,
            StakingError::InvalidRewardRate
        );
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundPhase {
    NoRound,
    Active,
    Matured,
}

#[account]
#[derive(Default)]
pub struct Platform {
    pub bump: u8,
    pub bump_fctr_mint: u8,
    pub bump_bcdev_mint: u8,
    pub bump_sol_vault: u8,
    pub bump_fctr_token_vault: u8,
    pub authority: Pubkey,
    pub round_start: u64,
    pub round_duration: u64,
    pub is_final: bool,
    pub registration_price: u64,
    /// Lamports backing outstanding tokens, excluding the vault's rent floor.
    pub reserve_amount: u64,
    pub fctr_token_total_amount: u64,
    pub bcdev_token_total_amount: u64,
    pub config: PlatformConfig,
}

impl Platform {
    pub const SPACE: usize =
        1 + 1 + 1 + 1 + 1 + 32 + 8 + 8 + 1 + 8 + 8 + 8 + 8 + PlatformConfig::SPACE;

    pub fn configure(
        &mut self,
        authority: Pubkey,
        round_duration: u64,
        registration_price: u64,
        config: PlatformConfig,
    ) -> Result<()> {
        require!(round_duration > 0, StakingError::InvalidRoundDuration);
        config.validate()?;

        self.authority = authority;
        self.round_duration = round_duration;
        self.registration_price = registration_price;
        self.config = config;
        self.round_start = 0;
        self.is_final = false;
        self.reserve_amount = 0;
        self.fctr_token_total_amount = 0;
        self.bcdev_token_total_amount = 0;
        Ok(())
    }

    pub fn round_end(&self) -> Result<u64> {
        checked_add(self.round_start, self.round_duration)
    }

    pub fn round_phase(&self, now: u64) -> RoundPhase {
        if self.round_start == 0 {
            RoundPhase::NoRound
        } else if now < self.round_start.saturating_add(self.round_duration) {
            RoundPhase::Active
        } else {
            RoundPhase::Matured
        }
    }

    pub fn start_round(&mut self, now: u64, is_final: bool) -> Result<()> {
        require!(
            self.round_phase(now) != RoundPhase::Active,
            StakingError::RoundAlreadyStarted
        );
        require!(!self.is_final, StakingError::StakingFinished);
        require!(now > 0, StakingError::RoundNotActive);

        self.round_start = now;
        self.is_final = is_final;
        Ok(())
    }

    /// End of the running round, or an error when no round accepts stakes.
    pub fn active_round_end(&self, now: u64) -> Result<u64> {
        require!(
            self.round_phase(now) == RoundPhase::Active,
            StakingError::RoundNotActive
        );
        self.round_end()
    }

    pub fn reward_policy(&self) -> ProportionalReward {
        ProportionalReward {
            rate_bps: self.config.reward_rate_bps,
        }
    }

    pub fn record_deposit(&mut self, lamports: u64) -> Result<()> {
        self.reserve_amount = checked_add(self.reserve_amount, lamports)?;
        Ok(())
    }

    pub fn quote_buy(&self, lamports: u64) -> Result<u64> {
        let minted = self
            .config
            .curve
            .tokens_for_deposit(lamports, self.fctr_token_total_amount)?;
        require!(minted >= MIN_BUY_AMOUNT, StakingError::InvalidBuyAmount);
        Ok(minted)
    }

    pub fn record_buy(&mut self, lamports: u64, minted: u64) -> Result<()> {
        let reserve = checked_add(self.reserve_amount, lamports)?;
        let supply = checked_add(self.fctr_token_total_amount, minted)?;
        self.reserve_amount = reserve;
        self.fctr_token_total_amount = supply;
        Ok(())
    }

    pub fn quote_fctr_sale(&self, amount: u64) -> Result<u64> {
        require!(amount > 0, StakingError::InsufficientBalance);
        require!(
            amount <= self.fctr_token_total_amount,
            StakingError::InsufficientBalance
        );
        let payout = self
            .config
            .curve
            .reserve_for_redeem(amount, self.fctr_token_total_amount)?;
        require!(
            payout <= self.reserve_amount,
            StakingError::InsufficientReserve
        );
        Ok(payout)
    }

    pub fn record_fctr_sale(&mut self, amount: u64, payout: u64) -> Result<()> {
        let supply = checked_sub(self.fctr_token_total_amount, amount)?;
        let reserve = checked_sub(self.reserve_amount, payout)?;
        self.fctr_token_total_amount = supply;
        self.reserve_amount = reserve;
        Ok(())
    }

    pub fn quote_bcdev_sale(&self, amount: u64) -> Result<u64> {
        require!(amount > 0, StakingError::InvalidAmount);
        require!(
            amount <= self.bcdev_token_total_amount,
            StakingError::InsufficientBalance
        );
        let payout = bcdev_redeem_value(amount)?;
        require!(
            payout <= self.reserve_amount,
            StakingError::InsufficientReserve
        );
        Ok(payout)
    }

    pub fn record_bcdev_sale(&mut self, amount: u64, payout: u64) -> Result<()> {
        let supply = checked_sub(self.bcdev_token_total_amount, amount)?;
        let reserve = checked_sub(self.reserve_amount, payout)?;
        self.bcdev_token_total_amount = supply;
        self.reserve_amount = reserve;
        Ok(())
    }

    pub fn record_reward_mint(&mut self, amount: u64) -> Result<()> {
        self.bcdev_token_total_amount = checked_add(self.bcdev_token_total_amount, amount)?;
        Ok(())
    }

    /// Lamports the authority may withdraw. `custody_fctr` is the balance of the
    /// platform FCTR custody vault.
    pub fn withdrawable(&self, now: u64, custody_fctr: u64) -> Result<u64> {
        let nothing_outstanding =
            self.fctr_token_total_amount == 0 && self.bcdev_token_total_amount == 0;
        let allowed = match self.config.solvency {
            SolvencyPolicy::Strict => nothing_outstanding,
            SolvencyPolicy::Relaxed => {
                let all_in_custody = self.fctr_token_total_amount == custody_fctr
                    && self.bcdev_token_total_amount == 0;
                let grace = self.round_duration.saturating_mul(3);
                let final_round_over = self.is_final
                    && self.round_start != 0
                    && now > self.round_start.saturating_add(grace);
                nothing_outstanding || all_in_custody || final_round_over
            }
        };
        require!(allowed, StakingError::SolvencyViolation);
        Ok(self.reserve_amount)
    }

    /// Empties the reserve, returning the lamports to pay out.
    pub fn release_reserve(&mut self, now: u64, custody_fctr: u64) -> Result<u64> {
        let amount = self.withdrawable(now, custody_fctr)?;
        self.reserve_amount = 0;
        Ok(amount)
    }
}

#[account]
#[derive(Default)]
pub struct User {
    pub bump: u8,
    pub bump_fctr_vault: u8,
    pub bump_bcdev_vault: u8,
    pub bump_receipt: u8,
    pub grant_program: bool,
    /// FCTR currently staked by this user.
    pub user_fctr_amount: u64,
    /// FCTR this user has in custody as delegations to confidants.
    pub granted_fctr_amount: u64,
    pub authority: Pubkey,
}

impl User {
    pub const SPACE: usize = 1 + 1 + 1 + 1 + 1 + 8 + 8 + 32;

    pub fn record_grant(&mut self, amount: u64) -> Result<()> {
        self.granted_fctr_amount = checked_add(self.granted_fctr_amount, amount)?;
        Ok(())
    }

    pub fn release_grant(&mut self, amount: u64) -> Result<()> {
        self.granted_fctr_amount = checked_sub(self.granted_fctr_amount, amount)?;
        Ok(())
    }
}

/// Where a grant landed in the confidant's receipt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantPlacement {
    Active { weight: u64 },
    Pending,
}

/// Everything needed to settle a stake after `close_stake`.
#[derive(Debug)]
pub struct ClosedStake {
    pub own_amount: u64,
    pub grantors: GrantorSet,
    pub elapsed: u64,
}

impl ClosedStake {
    pub fn staked_total(&self) -> Result<u64> {
        self.grantors
            .as_slice()
            .iter()
            .try_fold(self.own_amount, |acc, g| checked_add(acc, g.amount))
    }

    /// Own stake earns over `elapsed`, each delegation only over its own
    /// participation `weight`.
    pub fn reward<P: RewardRate>(&self, policy: &P, round_duration: u64) -> Result<u64> {
        let own = policy.reward_for(self.own_amount, self.elapsed, round_duration)?;
        self.grantors.as_slice().iter().try_fold(own, |acc, g| {
            checked_add(acc, policy.reward_for(g.amount, g.weight, round_duration)?)
        })
    }
}

#[account]
#[derive(Default)]
pub struct Receipt {
    pub authority: Pubkey,
    pub is_valid: bool,
    pub stake_ts: u64,
    /// Maturity bound of the round this stake entered.
    pub round_end: u64,
    pub amount_deposited: u64,
    /// Reward rate promised to this user as a grantor.
    pub apr_bps: u16,
    pub grantors: GrantorSet,
    pub next_round_grantors: GrantorSet,
    /// Every grant ever made to this confidant. Grows by reallocation.
    pub grantors_history: Vec<GrantorHistoryRecord>,
}

impl Receipt {
    pub const SPACE: usize = Self::space_for(0);

    pub const fn space_for(history_len: usize) -> usize {
        32 + 1
            + 8
            + 8
            + 8
            + 2
            + GrantorSet::SPACE
            + GrantorSet::SPACE
            + 4
            + history_len * GrantorHistoryRecord::SPACE
    }

    pub fn grantor_slots_left(&self) -> usize {
        MAX_GRANTORS.saturating_sub(self.grantors.len() + self.next_round_grantors.len())
    }

    pub fn has_grantor(&self, grantor: &Pubkey) -> bool {
        self.grantors.contains(grantor) || self.next_round_grantors.contains(grantor)
    }

    /// Locks `amount` for the round ending at `round_end` and moves pending
    /// grantors into this round's split.
    pub fn open_stake(&mut self, amount: u64, now: u64, round_end: u64) -> Result<()> {
        require!(!self.is_valid, StakingError::AlreadyStaked);
        require!(amount > 0, StakingError::InsufficientBalance);
        require!(now < round_end, StakingError::RoundNotActive);

        let weight = round_end - now;
        let mut grantors = self.grantors.clone();
        for pending in self.next_round_grantors.as_slice() {
            grantors.push(GrantorRecord {
                joined_at: now,
                weight,
                ..*pending
            })?;
        }

        self.grantors = grantors;
        self.next_round_grantors = GrantorSet::default();
        self.is_valid = true;
        self.stake_ts = now;
        self.round_end = round_end;
        self.amount_deposited = amount;
        Ok(())
    }

    pub fn admit_grantor(
        &mut self,
        grantor: Pubkey,
        amount: u64,
        now: u64,
    ) -> Result<GrantPlacement> {
        require!(amount > 0, StakingError::InvalidAmount);
        require!(!self.has_grantor(&grantor), StakingError::DuplicateGrantor);
        require!(
            self.grantor_slots_left() > 0,
            StakingError::DelegationCapacityExceeded
        );

        let placement = if self.is_valid && now < self.round_end {
            let weight = self.round_end - now;
            self.grantors.push(GrantorRecord {
                grantor,
                amount,
                joined_at: now,
                weight,
            })?;
            GrantPlacement::Active { weight }
        } else {
            self.next_round_grantors.push(GrantorRecord {
                grantor,
                amount,
                joined_at: 0,
                weight: 0,
            })?;
            GrantPlacement::Pending
        };
        self.grantors_history.push(GrantorHistoryRecord {
            grantor,
            amount,
            grant_ts: now,
        });
        Ok(placement)
    }

    /// Drops `grantor` from the active or pending set, returning its record.
    pub fn release_grantor(&mut self, grantor: &Pubkey, now: u64) -> Result<GrantorRecord> {
        if self.grantors.contains(grantor) {
            require!(now < self.round_end, StakingError::ClaimWindowClosed);
            return self
                .grantors
                .remove(grantor)
                .ok_or_else(|| error!(StakingError::GrantorNotFound));
        }
        self.next_round_grantors
            .remove(grantor)
            .ok_or_else(|| error!(StakingError::GrantorNotFound))
    }

    pub fn close_stake(&mut self, now: u64) -> Result<ClosedStake> {
        require!(self.is_valid, StakingError::NotStaked);
        require!(now >= self.round_end, StakingError::RoundNotMatured);

        let closed = ClosedStake {
            own_amount: self.amount_deposited,
            grantors: self.grantors.take(),
            elapsed: self.round_end.saturating_sub(self.stake_ts),
        };
        self.is_valid = false;
        self.amount_deposited = 0;
        Ok(closed)
    }

    pub fn mark_grantor(&mut self) {
        if self.apr_bps == 0 {
            self.apr_bps = GRANTOR_APR_BPS;
        }
    }
}
