use anchor_lang::prelude::*;

pub mod curve;
pub mod delegation;
pub mod error;
pub mod events;
pub mod instructions;
pub mod math;
pub mod reward;
pub mod settle;
pub mod state;
pub mod vault;

#[cfg(test)]
mod scenarios;

pub use curve::CurveKind;
use error::StakingError;
use instructions::*;
pub use state::{PlatformConfig, SolvencyPolicy};

declare_id!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

pub const FCTR_DECIMALS: u8 = 12;
pub const BCDEV_DECIMALS: u8 = 18;
pub const ONE_FCTR: u64 = 10_u64.pow(FCTR_DECIMALS as u32);
pub const ONE_BCDEV: u64 = 10_u64.pow(BCDEV_DECIMALS as u32);
pub const BCDEV_PER_SOL: u64 = 11;
pub const MIN_BUY_AMOUNT: u64 = 10;
pub const BASIS_POINTS: u64 = 10_000;
/// 0.02
pub const GRANTOR_APR_BPS: u16 = 200;

pub const PLATFORM_SEED: &[u8] = b"platform";
pub const SOL_VAULT_SEED: &[u8] = b"sol_vault";
pub const FCTR_MINT_SEED: &[u8] = b"fctr_mint";
pub const BCDEV_MINT_SEED: &[u8] = b"bcdev_mint";
pub const FCTR_TOKEN_VAULT_SEED: &[u8] = b"fctr_token_vault";
pub const USER_SEED: &[u8] = b"user";
pub const RECEIPT_SEED: &[u8] = b"receipt";
pub const FCTR_VAULT_SEED: &[u8] = b"fctr_vault";
pub const BCDEV_VAULT_SEED: &[u8] = b"bcdev_vault";

fn current_time() -> Result<u64> {
    let clock = Clock::get()?;
    u64::try_from(clock.unix_timestamp).map_err(|_| error!(StakingError::MathOverflow))
}

#[program]
pub mod fctr_staking {
    use super::*;
    use crate::events::*;
    use crate::settle;
    use crate::state::{GrantPlacement, Receipt, User};
    use crate::vault;

    pub fn initialize(
        ctx: Context<Initialize>,
        round_duration: u64,
        registration_price: u64,
        config: PlatformConfig,
    ) -> Result<()> {
        let authority = ctx.accounts.authority.key();
        let platform = &mut ctx.accounts.platform;
        platform.configure(authority, round_duration, registration_price, config)?;

        platform.bump = *ctx.bumps.get("platform").ok_or(StakingError::EmptyBump)?;
        platform.bump_sol_vault = *ctx.bumps.get("sol_vault").ok_or(StakingError::EmptyBump)?;
        platform.bump_fctr_mint = *ctx.bumps.get("fctr_mint").ok_or(StakingError::EmptyBump)?;
        platform.bump_bcdev_mint = *ctx.bumps.get("bcdev_mint").ok_or(StakingError::EmptyBump)?;
        platform.bump_fctr_token_vault = *ctx
            .bumps
            .get("fctr_token_vault")
            .ok_or(StakingError::EmptyBump)?;

        // the reserve must exist before the first small deposit lands in it
        let rent_floor = Rent::get()?
            .minimum_balance(0)
            .saturating_sub(ctx.accounts.sol_vault.lamports());
        vault::deposit_lamports(
            ctx.accounts.authority.to_account_info(),
            ctx.accounts.sol_vault.to_account_info(),
            ctx.accounts.system_program.to_account_info(),
            rent_floor,
        )?;

        emit!(PlatformInitializedEvent {
            authority,
            round_duration,
            registration_price,
        });

        Ok(())
    }

    pub fn register_user(ctx: Context<RegisterUser>, grant_program: bool) -> Result<()> {
        let authority = ctx.accounts.authority.key();
        let price = ctx.accounts.platform.registration_price;

        vault::deposit_lamports(
            ctx.accounts.authority.to_account_info(),
            ctx.accounts.sol_vault.to_account_info(),
            ctx.accounts.system_program.to_account_info(),
            price,
        )?;
        ctx.accounts.platform.record_deposit(price)?;

        let user = &mut ctx.accounts.user;
        user.bump = *ctx.bumps.get("user").ok_or(StakingError::EmptyBump)?;
        user.bump_receipt = *ctx.bumps.get("receipt").ok_or(StakingError::EmptyBump)?;
        user.bump_fctr_vault = *ctx.bumps.get("fctr_vault").ok_or(StakingError::EmptyBump)?;
        user.bump_bcdev_vault = *ctx.bumps.get("bcdev_vault").ok_or(StakingError::EmptyBump)?;
        user.authority = authority;
        user.grant_program = grant_program;
        user.user_fctr_amount = 0;
        user.granted_fctr_amount = 0;

        ctx.accounts.receipt.authority = authority;

        emit!(UserRegisteredEvent {
            user: authority,
            grant_program,
        });

        Ok(())
    }

    pub fn add_liquidity(ctx: Context<AddLiquidity>, amount: u64) -> Result<()> {
        require!(amount > 0, StakingError::InvalidAmount);

        vault::deposit_lamports(
            ctx.accounts.authority.to_account_info(),
            ctx.accounts.sol_vault.to_account_info(),
            ctx.accounts.system_program.to_account_info(),
            amount,
        )?;
        ctx.accounts.platform.record_deposit(amount)?;

        emit!(LiquidityAddedEvent { amount });

        Ok(())
    }

    pub fn buy_tokens(ctx: Context<BuyTokens>, lamports: u64) -> Result<()> {
        let minted = ctx.accounts.platform.quote_buy(lamports)?;

        vault::deposit_lamports(
            ctx.accounts.authority.to_account_info(),
            ctx.accounts.sol_vault.to_account_info(),
            ctx.accounts.system_program.to_account_info(),
            lamports,
        )?;
        vault::mint_tokens(
            ctx.accounts.token_program.to_account_info(),
            ctx.accounts.fctr_mint.to_account_info(),
            ctx.accounts.fctr_vault.to_account_info(),
            ctx.accounts.platform.to_account_info(),
            ctx.accounts.platform.bump,
            minted,
        )?;
        ctx.accounts.platform.record_buy(lamports, minted)?;

        emit!(BuyFctrTokensEvent {
            user: ctx.accounts.authority.key(),
            lamports,
            amount: minted,
        });

        Ok(())
    }

    pub fn sell_fctr_tokens(ctx: Context<SellFctrTokens>) -> Result<()> {
        let amount = ctx.accounts.fctr_vault.amount;
        let lamports = ctx.accounts.platform.quote_fctr_sale(amount)?;

        vault::burn_tokens(
            ctx.accounts.token_program.to_account_info(),
            ctx.accounts.fctr_mint.to_account_info(),
            ctx.accounts.fctr_vault.to_account_info(),
            ctx.accounts.platform.to_account_info(),
            ctx.accounts.platform.bump,
            amount,
        )?;
        vault::pay_from_reserve(
            ctx.accounts.sol_vault.to_account_info(),
            ctx.accounts.authority.to_account_info(),
            ctx.accounts.system_program.to_account_info(),
            ctx.accounts.platform.bump_sol_vault,
            lamports,
        )?;
        ctx.accounts.platform.record_fctr_sale(amount, lamports)?;

        emit!(SellFctrTokensEvent {
            user: ctx.accounts.authority.key(),
            amount,
            lamports,
        });

        Ok(())
    }

    pub fn sell_bcdev_tokens(ctx: Context<SellBcdevTokens>, amount: u64) -> Result<()> {
        require!(
            amount <= ctx.accounts.bcdev_vault.amount,
            StakingError::InsufficientBalance
        );
        let lamports = ctx.accounts.platform.quote_bcdev_sale(amount)?;

        vault::burn_tokens(
            ctx.accounts.token_program.to_account_info(),
            ctx.accounts.bcdev_mint.to_account_info(),
            ctx.accounts.bcdev_vault.to_account_info(),
            ctx.accounts.platform.to_account_info(),
            ctx.accounts.platform.bump,
            amount,
        )?;
        vault::pay_from_reserve(
            ctx.accounts.sol_vault.to_account_info(),
            ctx.accounts.authority.to_account_info(),
            ctx.accounts.system_program.to_account_info(),
            ctx.accounts.platform.bump_sol_vault,
            lamports,
        )?;
        ctx.accounts.platform.record_bcdev_sale(amount, lamports)?;

        emit!(SellBcdevTokensEvent {
            user: ctx.accounts.authority.key(),
            amount,
            lamports,
        });

        Ok(())
    }

    pub fn start_round(ctx: Context<StartRound>, is_final: bool) -> Result<()> {
        let now = current_time()?;
        ctx.accounts.platform.start_round(now, is_final)?;

        emit!(RoundStartEvent {
            round_start: now,
            is_final,
        });

        Ok(())
    }

    pub fn stake(ctx: Context<Stake>) -> Result<()> {
        let now = current_time()?;
        let round_end = ctx.accounts.platform.active_round_end(now)?;
        let amount = ctx.accounts.fctr_vault.amount;
        let promoted_grantors = ctx.accounts.receipt.next_round_grantors.len() as u8;

        ctx.accounts.receipt.open_stake(amount, now, round_end)?;
        vault::move_tokens(
            ctx.accounts.token_program.to_account_info(),
            ctx.accounts.fctr_vault.to_account_info(),
            ctx.accounts.fctr_token_vault.to_account_info(),
            ctx.accounts.platform.to_account_info(),
            ctx.accounts.platform.bump,
            amount,
        )?;
        ctx.accounts.user.user_fctr_amount = amount;

        emit!(StakeEvent {
            user: ctx.accounts.authority.key(),
            amount,
            promoted_grantors,
        });

        Ok(())
    }

    pub fn grant_tokens(ctx: Context<GrantTokens>, amount: u64, confidant: Pubkey) -> Result<()> {
        let now = current_time()?;
        let grantor = ctx.accounts.authority.key();

        settle::check_grant(
            &grantor,
            &confidant,
            &ctx.accounts.user,
            &ctx.accounts.receipt,
            &ctx.accounts.confidant_user,
            amount,
            ctx.accounts.fctr_vault.amount,
        )?;

        let history_len = ctx.accounts.confidant_receipt.grantors_history.len();
        vault::grow_account(
            ctx.accounts.authority.to_account_info(),
            ctx.accounts.confidant_receipt.to_account_info(),
            ctx.accounts.system_program.to_account_info(),
            8 + Receipt::space_for(history_len + 1),
        )?;

        let placement = ctx
            .accounts
            .confidant_receipt
            .admit_grantor(grantor, amount, now)?;
        vault::move_tokens(
            ctx.accounts.token_program.to_account_info(),
            ctx.accounts.fctr_vault.to_account_info(),
            ctx.accounts.fctr_token_vault.to_account_info(),
            ctx.accounts.platform.to_account_info(),
            ctx.accounts.platform.bump,
            amount,
        )?;
        ctx.accounts.user.record_grant(amount)?;
        ctx.accounts.receipt.mark_grantor();

        let (pending, weight) = match placement {
            GrantPlacement::Active { weight } => (false, weight),
            GrantPlacement::Pending => (true, 0),
        };
        emit!(GrantEvent {
            from: grantor,
            to: confidant,
            amount,
            pending,
            weight,
        });

        Ok(())
    }

    pub fn claim_tokens(ctx: Context<ClaimTokens>, confidant: Pubkey) -> Result<()> {
        let now = current_time()?;
        let grantor = ctx.accounts.authority.key();

        let record = ctx
            .accounts
            .confidant_receipt
            .release_grantor(&grantor, now)?;
        vault::move_tokens(
            ctx.accounts.token_program.to_account_info(),
            ctx.accounts.fctr_token_vault.to_account_info(),
            ctx.accounts.fctr_vault.to_account_info(),
            ctx.accounts.platform.to_account_info(),
            ctx.accounts.platform.bump,
            record.amount,
        )?;
        ctx.accounts.user.release_grant(record.amount)?;

        emit!(ClaimEvent {
            from: grantor,
            to: confidant,
            amount: record.amount,
        });

        Ok(())
    }

    pub fn unstake<'info>(ctx: Context<'_, '_, '_, 'info, Unstake<'info>>) -> Result<()> {
        let now = current_time()?;
        let confidant = ctx.accounts.authority.key();

        let settlement =
            settle::settle_stake(&ctx.accounts.platform, &mut ctx.accounts.receipt, now)?;
        settlement.require_grantor_accounts(ctx.remaining_accounts.len())?;
        let settle::Settlement {
            closed,
            total,
            split,
        } = settlement;
        msg!(
            "reward {} for stake {} over {}s, confidant share {}",
            total,
            closed.staked_total()?,
            closed.elapsed,
            split.confidant
        );

        let token_program = ctx.accounts.token_program.to_account_info();
        let platform_info = ctx.accounts.platform.to_account_info();
        let platform_bump = ctx.accounts.platform.bump;
        let custody = ctx.accounts.fctr_token_vault.to_account_info();
        let bcdev_mint = ctx.accounts.bcdev_mint.to_account_info();

        vault::move_tokens(
            token_program.clone(),
            custody.clone(),
            ctx.accounts.fctr_vault.to_account_info(),
            platform_info.clone(),
            platform_bump,
            closed.own_amount,
        )?;
        vault::mint_tokens(
            token_program.clone(),
            bcdev_mint.clone(),
            ctx.accounts.bcdev_vault.to_account_info(),
            platform_info.clone(),
            platform_bump,
            split.confidant,
        )?;

        for ((record, share), accounts) in closed
            .grantors
            .as_slice()
            .iter()
            .zip(split.grantors.iter())
            .zip(ctx.remaining_accounts.chunks_exact(settle::ACCOUNTS_PER_GRANTOR))
        {
            let mut grantor_user = Account::<User>::try_from(&accounts[0])?;
            settle::verify_grantor_accounts(
                ctx.program_id,
                record,
                &grantor_user,
                accounts[1].key,
                accounts[2].key,
            )?;

            vault::move_tokens(
                token_program.clone(),
                custody.clone(),
                accounts[1].clone(),
                platform_info.clone(),
                platform_bump,
                record.amount,
            )?;
            vault::mint_tokens(
                token_program.clone(),
                bcdev_mint.clone(),
                accounts[2].clone(),
                platform_info.clone(),
                platform_bump,
                *share,
            )?;

            grantor_user.release_grant(record.amount)?;
            grantor_user.exit(ctx.program_id)?;
        }

        ctx.accounts.platform.record_reward_mint(total)?;
        ctx.accounts.user.user_fctr_amount = 0;

        emit!(RewardDistributedEvent {
            confidant,
            total,
            confidant_share: split.confidant,
            grantors: closed.grantors.len() as u8,
        });
        emit!(UnstakeEvent {
            user: confidant,
            amount: closed.own_amount,
        });

        Ok(())
    }

    pub fn withdraw(ctx: Context<Withdraw>) -> Result<()> {
        let now = current_time()?;
        let custody = ctx.accounts.fctr_token_vault.amount;
        let amount = ctx.accounts.platform.release_reserve(now, custody)?;

        vault::pay_from_reserve(
            ctx.accounts.sol_vault.to_account_info(),
            ctx.accounts.authority.to_account_info(),
            ctx.accounts.system_program.to_account_info(),
            ctx.accounts.platform.bump_sol_vault,
            amount,
        )?;

        emit!(WithdrawEvent { amount });

        Ok(())
    }
}
