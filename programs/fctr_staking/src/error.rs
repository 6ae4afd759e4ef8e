use anchor_lang::prelude::*;

#[error_code]
pub enum StakingError {
    #[msg("Can't get bump")]
    EmptyBump,
    #[msg("Signer is not allowed to act on this account")]
    Unauthorized,
    #[msg("User is not registered")]
    NotRegistered,
    #[msg("Round duration must be greater than zero")]
    InvalidRoundDuration,
    #[msg("Invalid bonding curve parameters")]
    InvalidCurve,
    #[msg("Reward rate can't exceed 100%")]
    InvalidRewardRate,
    #[msg("Amount must be greater than zero")]
    InvalidAmount,
    #[msg("Invalid amount to buy. The minimum amount to buy is 10")]
    InvalidBuyAmount,
    #[msg("No active round")]
    RoundNotActive,
    #[msg("Round still going")]
    RoundNotMatured,
    #[msg("Round already started")]
    RoundAlreadyStarted,
    #[msg("Staking campaign finished")]
    StakingFinished,
    #[msg("Insufficient token amount")]
    InsufficientBalance,
    #[msg("Reserve can't cover the redemption")]
    InsufficientReserve,
    #[msg("Confidant already has the maximum number of grantors")]
    DelegationCapacityExceeded,
    #[msg("Withdraw conditions are unsatisfied")]
    SolvencyViolation,
    #[msg("Tokens are already staked")]
    AlreadyStaked,
    #[msg("Nothing is staked")]
    NotStaked,
    #[msg("Both users must participate in the grant program")]
    GrantProgramDisabled,
    #[msg("Can't grant tokens to yourself")]
    SelfGrant,
    #[msg("A staking user can't grant tokens")]
    GrantorIsStaking,
    #[msg("Grantor already delegates to this confidant")]
    DuplicateGrantor,
    #[msg("Grantor not found")]
    GrantorNotFound,
    #[msg("Round matured, wait for the confidant to unstake")]
    ClaimWindowClosed,
    #[msg("Grantor accounts don't match the receipt")]
    GrantorAccountsMismatch,
    #[msg("Math overflow")]
    MathOverflow,
}
