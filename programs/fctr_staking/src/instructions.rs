use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::error::StakingError;
use crate::state::{Platform, Receipt, User};
use crate::{
    BCDEV_DECIMALS, BCDEV_MINT_SEED, BCDEV_VAULT_SEED, FCTR_DECIMALS, FCTR_MINT_SEED,
    FCTR_TOKEN_VAULT_SEED, FCTR_VAULT_SEED, PLATFORM_SEED, RECEIPT_SEED, SOL_VAULT_SEED,
    USER_SEED,
};

#[derive(Accounts)]
pub struct Initialize<'info> {
    #[account(init, payer = authority, space = 8 + Platform::SPACE, seeds = [PLATFORM_SEED], bump)]
    pub platform: Account<'info, Platform>,
    /// CHECK: system-owned lamport reserve, only addressed through its seeds
    #[account(mut, seeds = [SOL_VAULT_SEED], bump)]
    pub sol_vault: UncheckedAccount<'info>,
    #[account(
        init,
        payer = authority,
        seeds = [FCTR_MINT_SEED],
        bump,
        mint::decimals = FCTR_DECIMALS,
        mint::authority = platform,
    )]
    pub fctr_mint: Account<'info, Mint>,
    #[account(
        init,
        payer = authority,
        seeds = [BCDEV_MINT_SEED],
        bump,
        mint::decimals = BCDEV_DECIMALS,
        mint::authority = platform,
    )]
    pub bcdev_mint: Account<'info, Mint>,
    #[account(
        init,
        payer = authority,
        seeds = [FCTR_TOKEN_VAULT_SEED],
        bump,
        token::mint = fctr_mint,
        token::authority = platform,
    )]
    pub fctr_token_vault: Account<'info, TokenAccount>,
    #[account(mut)]
    pub authority: Signer<'info>,
    pub rent: Sysvar<'info, Rent>,
    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct RegisterUser<'info> {
    #[account(mut, seeds = [PLATFORM_SEED], bump = platform.bump)]
    pub platform: Account<'info, Platform>,
    #[account(
        init,
        payer = authority,
        space = 8 + User::SPACE,
        seeds = [USER_SEED, authority.key().as_ref()],
        bump,
    )]
    pub user: Account<'info, User>,
    #[account(
        init,
        payer = authority,
        space = 8 + Receipt::SPACE,
        seeds = [RECEIPT_SEED, authority.key().as_ref()],
        bump,
    )]
    pub receipt: Account<'info, Receipt>,
    #[account(
        init,
        payer = authority,
        seeds = [FCTR_VAULT_SEED, authority.key().as_ref()],
        bump,
        token::mint = fctr_mint,
        token::authority = platform,
    )]
    pub fctr_vault: Account<'info, TokenAccount>,
    #[account(
        init,
        payer = authority,
        seeds = [BCDEV_VAULT_SEED, authority.key().as_ref()],
        bump,
        token::mint = bcdev_mint,
        token::authority = platform,
    )]
    pub bcdev_vault: Account<'info, TokenAccount>,
    #[account(seeds = [FCTR_MINT_SEED], bump = platform.bump_fctr_mint)]
    pub fctr_mint: Account<'info, Mint>,
    #[account(seeds = [BCDEV_MINT_SEED], bump = platform.bump_bcdev_mint)]
    pub bcdev_mint: Account<'info, Mint>,
    /// CHECK: lamport reserve
    #[account(mut, seeds = [SOL_VAULT_SEED], bump = platform.bump_sol_vault)]
    pub sol_vault: UncheckedAccount<'info>,
    #[account(mut)]
    pub authority: Signer<'info>,
    pub rent: Sysvar<'info, Rent>,
    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct AddLiquidity<'info> {
    #[account(mut, seeds = [PLATFORM_SEED], bump = platform.bump)]
    pub platform: Account<'info, Platform>,
    /// CHECK: lamport reserve
    #[account(mut, seeds = [SOL_VAULT_SEED], bump = platform.bump_sol_vault)]
    pub sol_vault: UncheckedAccount<'info>,
    #[account(mut, address = platform.authority @ StakingError::Unauthorized)]
    pub authority: Signer<'info>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct BuyTokens<'info> {
    #[account(mut, seeds = [PLATFORM_SEED], bump = platform.bump)]
    pub platform: Account<'info, Platform>,
    #[account(
        seeds = [USER_SEED, authority.key().as_ref()],
        bump = user.bump,
        has_one = authority @ StakingError::Unauthorized,
    )]
    pub user: Account<'info, User>,
    #[account(mut, seeds = [FCTR_VAULT_SEED, authority.key().as_ref()], bump = user.bump_fctr_vault)]
    pub fctr_vault: Account<'info, TokenAccount>,
    #[account(mut, seeds = [FCTR_MINT_SEED], bump = platform.bump_fctr_mint)]
    pub fctr_mint: Account<'info, Mint>,
    /// CHECK: lamport reserve
    #[account(mut, seeds = [SOL_VAULT_SEED], bump = platform.bump_sol_vault)]
    pub sol_vault: UncheckedAccount<'info>,
    #[account(mut)]
    pub authority: Signer<'info>,
    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct SellFctrTokens<'info> {
    #[account(mut, seeds = [PLATFORM_SEED], bump = platform.bump)]
    pub platform: Account<'info, Platform>,
    #[account(
        seeds = [USER_SEED, authority.key().as_ref()],
        bump = user.bump,
        has_one = authority @ StakingError::Unauthorized,
    )]
    pub user: Account<'info, User>,
    #[account(mut, seeds = [FCTR_VAULT_SEED, authority.key().as_ref()], bump = user.bump_fctr_vault)]
    pub fctr_vault: Account<'info, TokenAccount>,
    #[account(mut, seeds = [FCTR_MINT_SEED], bump = platform.bump_fctr_mint)]
    pub fctr_mint: Account<'info, Mint>,
    /// CHECK: lamport reserve
    #[account(mut, seeds = [SOL_VAULT_SEED], bump = platform.bump_sol_vault)]
    pub sol_vault: UncheckedAccount<'info>,
    #[account(mut)]
    pub authority: Signer<'info>,
    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct SellBcdevTokens<'info> {
    #[account(mut, seeds = [PLATFORM_SEED], bump = platform.bump)]
    pub platform: Account<'info, Platform>,
    #[account(
        seeds = [USER_SEED, authority.key().as_ref()],
        bump = user.bump,
        has_one = authority @ StakingError::Unauthorized,
    )]
    pub user: Account<'info, User>,
    #[account(mut, seeds = [BCDEV_VAULT_SEED, authority.key().as_ref()], bump = user.bump_bcdev_vault)]
    pub bcdev_vault: Account<'info, TokenAccount>,
    #[account(mut, seeds = [BCDEV_MINT_SEED], bump = platform.bump_bcdev_mint)]
    pub bcdev_mint: Account<'info, Mint>,
    /// CHECK: lamport reserve
    #[account(mut, seeds = [SOL_VAULT_SEED], bump = platform.bump_sol_vault)]
    pub sol_vault: UncheckedAccount<'info>,
    #[account(mut)]
    pub authority: Signer<'info>,
    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct StartRound<'info> {
    #[account(mut, seeds = [PLATFORM_SEED], bump = platform.bump)]
    pub platform: Account<'info, Platform>,
    #[account(address = platform.authority @ StakingError::Unauthorized)]
    pub authority: Signer<'info>,
}

#[derive(Accounts)]
pub struct Stake<'info> {
    #[account(seeds = [PLATFORM_SEED], bump = platform.bump)]
    pub platform: Account<'info, Platform>,
    #[account(
        mut,
        seeds = [USER_SEED, authority.key().as_ref()],
        bump = user.bump,
        has_one = authority @ StakingError::Unauthorized,
    )]
    pub user: Account<'info, User>,
    #[account(
        mut,
        seeds = [RECEIPT_SEED, authority.key().as_ref()],
        bump = user.bump_receipt,
        has_one = authority @ StakingError::Unauthorized,
    )]
    pub receipt: Account<'info, Receipt>,
    #[account(mut, seeds = [FCTR_VAULT_SEED, authority.key().as_ref()], bump = user.bump_fctr_vault)]
    pub fctr_vault: Account<'info, TokenAccount>,
    #[account(mut, seeds = [FCTR_TOKEN_VAULT_SEED], bump = platform.bump_fctr_token_vault)]
    pub fctr_token_vault: Account<'info, TokenAccount>,
    pub authority: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
#[instruction(amount: u64, confidant: Pubkey)]
pub struct GrantTokens<'info> {
    #[account(seeds = [PLATFORM_SEED], bump = platform.bump)]
    pub platform: Account<'info, Platform>,
    #[account(
        mut,
        seeds = [USER_SEED, authority.key().as_ref()],
        bump = user.bump,
        has_one = authority @ StakingError::Unauthorized,
    )]
    pub user: Account<'info, User>,
    #[account(
        mut,
        seeds = [RECEIPT_SEED, authority.key().as_ref()],
        bump = user.bump_receipt,
        has_one = authority @ StakingError::Unauthorized,
    )]
    pub receipt: Account<'info, Receipt>,
    #[account(mut, seeds = [FCTR_VAULT_SEED, authority.key().as_ref()], bump = user.bump_fctr_vault)]
    pub fctr_vault: Account<'info, TokenAccount>,
    #[account(seeds = [USER_SEED, confidant.as_ref()], bump = confidant_user.bump)]
    pub confidant_user: Account<'info, User>,
    #[account(
        mut,
        seeds = [RECEIPT_SEED, confidant.as_ref()],
        bump = confidant_user.bump_receipt,
        constraint = confidant_receipt.authority == confidant @ StakingError::NotRegistered,
    )]
    pub confidant_receipt: Account<'info, Receipt>,
    #[account(mut, seeds = [FCTR_TOKEN_VAULT_SEED], bump = platform.bump_fctr_token_vault)]
    pub fctr_token_vault: Account<'info, TokenAccount>,
    /// Pays for the confidant receipt's history growth.
    #[account(mut)]
    pub authority: Signer<'info>,
    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(confidant: Pubkey)]
pub struct ClaimTokens<'info> {
    #[account(seeds = [PLATFORM_SEED], bump = platform.bump)]
    pub platform: Account<'info, Platform>,
    #[account(
        mut,
        seeds = [USER_SEED, authority.key().as_ref()],
        bump = user.bump,
        has_one = authority @ StakingError::Unauthorized,
    )]
    pub user: Account<'info, User>,
    #[account(mut, seeds = [FCTR_VAULT_SEED, authority.key().as_ref()], bump = user.bump_fctr_vault)]
    pub fctr_vault: Account<'info, TokenAccount>,
    #[account(seeds = [USER_SEED, confidant.as_ref()], bump = confidant_user.bump)]
    pub confidant_user: Account<'info, User>,
    #[account(
        mut,
        seeds = [RECEIPT_SEED, confidant.as_ref()],
        bump = confidant_user.bump_receipt,
        constraint = confidant_receipt.authority == confidant @ StakingError::NotRegistered,
    )]
    pub confidant_receipt: Account<'info, Receipt>,
    #[account(mut, seeds = [FCTR_TOKEN_VAULT_SEED], bump = platform.bump_fctr_token_vault)]
    pub fctr_token_vault: Account<'info, TokenAccount>,
    pub authority: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

/// Remaining accounts: `[User, FCTR vault, BCDEV vault]` for every active
/// grantor, in the order they appear on the receipt.
#[derive(Accounts)]
pub struct Unstake<'info> {
    #[account(mut, seeds = [PLATFORM_SEED], bump = platform.bump)]
    pub platform: Account<'info, Platform>,
    #[account(
        mut,
        seeds = [USER_SEED, authority.key().as_ref()],
        bump = user.bump,
        has_one = authority @ StakingError::Unauthorized,
    )]
    pub user: Account<'info, User>,
    #[account(
        mut,
        seeds = [RECEIPT_SEED, authority.key().as_ref()],
        bump = user.bump_receipt,
        has_one = authority @ StakingError::Unauthorized,
    )]
    pub receipt: Account<'info, Receipt>,
    #[account(mut, seeds = [FCTR_VAULT_SEED, authority.key().as_ref()], bump = user.bump_fctr_vault)]
    pub fctr_vault: Account<'info, TokenAccount>,
    #[account(mut, seeds = [BCDEV_VAULT_SEED, authority.key().as_ref()], bump = user.bump_bcdev_vault)]
    pub bcdev_vault: Account<'info, TokenAccount>,
    #[account(mut, seeds = [FCTR_TOKEN_VAULT_SEED], bump = platform.bump_fctr_token_vault)]
    pub fctr_token_vault: Account<'info, TokenAccount>,
    #[account(mut, seeds = [BCDEV_MINT_SEED], bump = platform.bump_bcdev_mint)]
    pub bcdev_mint: Account<'info, Mint>,
    pub authority: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct Withdraw<'info> {
    #[account(mut, seeds = [PLATFORM_SEED], bump = platform.bump)]
    pub platform: Account<'info, Platform>,
    /// CHECK: lamport reserve
    #[account(mut, seeds = [SOL_VAULT_SEED], bump = platform.bump_sol_vault)]
    pub sol_vault: UncheckedAccount<'info>,
    #[account(seeds = [FCTR_TOKEN_VAULT_SEED], bump = platform.bump_fctr_token_vault)]
    pub fctr_token_vault: Account<'info, TokenAccount>,
    #[account(mut, address = platform.authority @ StakingError::Unauthorized)]
    pub authority: Signer<'info>,
    pub system_program: Program<'info, System>,
}
