//! Value movement primitives. Token vaults are custodial: every user vault and
//! the platform custody vault have the platform PDA as token authority, so each
//! helper here signs with the platform seeds.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::{
    program::{invoke, invoke_signed},
    system_instruction,
};
use anchor_spl::token::{self, Burn, MintTo, Transfer};

use crate::{PLATFORM_SEED, SOL_VAULT_SEED};

pub fn deposit_lamports<'info>(
    from: AccountInfo<'info>,
    sol_vault: AccountInfo<'info>,
    system_program: AccountInfo<'info>,
    lamports: u64,
) -> Result<()> {
    if lamports == 0 {
        return Ok(());
    }
    invoke(
        &system_instruction::transfer(from.key, sol_vault.key, lamports),
        &[from, sol_vault, system_program],
    )?;
    Ok(())
}

pub fn pay_from_reserve<'info>(
    sol_vault: AccountInfo<'info>,
    to: AccountInfo<'info>,
    system_program: AccountInfo<'info>,
    sol_vault_bump: u8,
    lamports: u64,
) -> Result<()> {
    if lamports == 0 {
        return Ok(());
    }
    invoke_signed(
        &system_instruction::transfer(sol_vault.key, to.key, lamports),
        &[sol_vault, to, system_program],
        &[&[SOL_VAULT_SEED, &[sol_vault_bump]]],
    )?;
    Ok(())
}

/// Grows a program-owned account to `new_size` bytes, topping its balance up to
/// the rent-exempt minimum from `payer`.
pub fn grow_account<'info>(
    payer: AccountInfo<'info>,
    account: AccountInfo<'info>,
    system_program: AccountInfo<'info>,
    new_size: usize,
) -> Result<()> {
    if account.data_len() >= new_size {
        return Ok(());
    }
    let shortfall = Rent::get()?
        .minimum_balance(new_size)
        .saturating_sub(account.lamports());
    deposit_lamports(payer, account.clone(), system_program, shortfall)?;
    account.realloc(new_size, false)?;
    Ok(())
}

pub fn move_tokens<'info>(
    token_program: AccountInfo<'info>,
    from: AccountInfo<'info>,
    to: AccountInfo<'info>,
    platform: AccountInfo<'info>,
    platform_bump: u8,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let signer: &[&[&[u8]]] = &[&[PLATFORM_SEED, &[platform_bump]]];
    let cpi_ctx = CpiContext::new_with_signer(
        token_program,
        Transfer {
            from,
            to,
            authority: platform,
        },
        signer,
    );
    token::transfer(cpi_ctx, amount)
}

pub fn mint_tokens<'info>(
    token_program: AccountInfo<'info>,
    mint: AccountInfo<'info>,
    to: AccountInfo<'info>,
    platform: AccountInfo<'info>,
    platform_bump: u8,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let signer: &[&[&[u8]]] = &[&[PLATFORM_SEED, &[platform_bump]]];
    let cpi_ctx = CpiContext::new_with_signer(
        token_program,
        MintTo {
            mint,
            to,
            authority: platform,
        },
        signer,
    );
    token::mint_to(cpi_ctx, amount)
}

pub fn burn_tokens<'info>(
    token_program: AccountInfo<'info>,
    mint: AccountInfo<'info>,
    from: AccountInfo<'info>,
    platform: AccountInfo<'info>,
    platform_bump: u8,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let signer: &[&[&[u8]]] = &[&[PLATFORM_SEED, &[platform_bump]]];
    let cpi_ctx = CpiContext::new_with_signer(
        token_program,
        Burn {
            mint,
            from,
            authority: platform,
        },
        signer,
    );
    token::burn(cpi_ctx, amount)
}
