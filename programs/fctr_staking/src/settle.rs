//! Instruction bookkeeping that does not depend on CPIs: grant admission checks,
//! stake settlement and validation of the grantor accounts passed to `unstake`.

use anchor_lang::prelude::*;

use crate::delegation::GrantorRecord;
use crate::error::StakingError;
use crate::reward::{split_reward, RewardSplit};
use crate::state::{ClosedStake, Platform, Receipt, User};
use crate::{BCDEV_VAULT_SEED, FCTR_VAULT_SEED};

/// Accounts `unstake` expects per active grantor: User, FCTR vault, BCDEV vault.
pub const ACCOUNTS_PER_GRANTOR: usize = 3;

/// Everything `unstake` pays out once the stake is closed.
#[derive(Debug)]
pub struct Settlement {
    pub closed: ClosedStake,
    pub total: u64,
    pub split: RewardSplit,
}

/// Validates a grant of `amount` from `grantor` (holding `balance` FCTR) to
/// `confidant`.
pub fn check_grant(
    grantor: &Pubkey,
    confidant: &Pubkey,
    grantor_user: &User,
    grantor_receipt: &Receipt,
    confidant_user: &User,
    amount: u64,
    balance: u64,
) -> Result<()> {
    require!(grantor != confidant, StakingError::SelfGrant);
    require!(
        grantor_user.grant_program && confidant_user.grant_program,
        StakingError::GrantProgramDisabled
    );
    require!(!grantor_receipt.is_valid, StakingError::GrantorIsStaking);
    require!(amount <= balance, StakingError::InsufficientBalance);
    Ok(())
}

pub fn settle_stake(platform: &Platform, receipt: &mut Receipt, now: u64) -> Result<Settlement> {
    let closed = receipt.close_stake(now)?;
    let total = closed.reward(&platform.reward_policy(), platform.round_duration)?;
    let split = split_reward(total, closed.grantors.as_slice())?;
    Ok(Settlement {
        closed,
        total,
        split,
    })
}

impl Settlement {
    pub fn require_grantor_accounts(&self, passed: usize) -> Result<()> {
        require!(
            passed == self.closed.grantors.len() * ACCOUNTS_PER_GRANTOR,
            StakingError::GrantorAccountsMismatch
        );
        Ok(())
    }
}

/// Checks that `grantor_user` belongs to `record` and that the vault keys are
/// the grantor's PDAs, derived from the bumps stored at registration.
pub fn verify_grantor_accounts(
    program_id: &Pubkey,
    record: &GrantorRecord,
    grantor_user: &User,
    fctr_vault: &Pubkey,
    bcdev_vault: &Pubkey,
) -> Result<()> {
    require_keys_eq!(
        grantor_user.authority,
        record.grantor,
        StakingError::GrantorAccountsMismatch
    );
    let expected_fctr = Pubkey::create_program_address(
        &[
            FCTR_VAULT_SEED,
            record.grantor.as_ref(),
            &[grantor_user.bump_fctr_vault],
        ],
        program_id,
    )
    .map_err(|_| error!(StakingError::GrantorAccountsMismatch))?;
    let expected_bcdev = Pubkey::create_program_address(
        &[
            BCDEV_VAULT_SEED,
            record.grantor.as_ref(),
            &[grantor_user.bump_bcdev_vault],
        ],
        program_id,
    )
    .map_err(|_| error!(StakingError::GrantorAccountsMismatch))?;
    require_keys_eq!(*fctr_vault, expected_fctr, StakingError::GrantorAccountsMismatch);
    require_keys_eq!(*bcdev_vault, expected_bcdev, StakingError::GrantorAccountsMismatch);
    Ok(())
}
