use anchor_lang::prelude::*;

#[event]
pub struct PlatformInitializedEvent {
    pub authority: Pubkey,
    pub round_duration: u64,
    pub registration_price: u64,
}

#[event]
pub struct UserRegisteredEvent {
    pub user: Pubkey,
    pub grant_program: bool,
}

#[event]
pub struct LiquidityAddedEvent {
    pub amount: u64,
}

#[event]
pub struct BuyFctrTokensEvent {
    pub user: Pubkey,
    pub lamports: u64,
    pub amount: u64,
}

#[event]
pub struct SellFctrTokensEvent {
    pub user: Pubkey,
    pub amount: u64,
    pub lamports: u64,
}

#[event]
pub struct SellBcdevTokensEvent {
    pub user: Pubkey,
    pub amount: u64,
    pub lamports: u64,
}

#[event]
pub struct RoundStartEvent {
    pub round_start: u64,
    pub is_final: bool,
}

#[event]
pub struct StakeEvent {
    pub user: Pubkey,
    pub amount: u64,
    pub promoted_grantors: u8,
}

#[event]
pub struct GrantEvent {
    pub from: Pubkey,
    pub to: Pubkey,
    pub amount: u64,
    pub pending: bool,
    /// Seconds of the current round the grant takes part in, 0 when pending.
    pub weight: u64,
}

#[event]
pub struct ClaimEvent {
    pub from: Pubkey,
    pub to: Pubkey,
    pub amount: u64,
}

#[event]
pub struct UnstakeEvent {
    pub user: Pubkey,
    pub amount: u64,
}

#[event]
pub struct RewardDistributedEvent {
    pub confidant: Pubkey,
    pub total: u64,
    pub confidant_share: u64,
    pub grantors: u8,
}

#[event]
pub struct WithdrawEvent {
    pub amount: u64,
}
