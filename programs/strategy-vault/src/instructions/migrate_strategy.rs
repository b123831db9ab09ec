use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::{
    adapters::{CpiStrategy, StrategyAccounts},
    constants::*,
    errors::*,
    events::*,
    ledger::VaultRoles,
    state::*,
};

/// Move a strategy's position and ledger record to a replacement strategy
#[derive(Accounts)]
pub struct MigrateStrategy<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Account<'info, VaultState>,

    /// CHECK: Strategy being replaced; must be registered
    #[account(mut)]
    pub old_strategy: UncheckedAccount<'info>,

    /// CHECK: Program of the old strategy, must own it
    #[account(
        executable,
        constraint = old_strategy.owner == &strategy_program.key() @ VaultError::InvalidStrategyProgram,
    )]
    pub strategy_program: UncheckedAccount<'info>,

    #[account(
        mut,
        constraint = old_strategy_token_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = old_strategy_token_account.owner == old_strategy.key() @ VaultError::InvalidOwner,
    )]
    pub old_strategy_token_account: Account<'info, TokenAccount>,

    /// CHECK: Replacement strategy; only its key is recorded
    #[account(mut)]
    pub new_strategy: UncheckedAccount<'info>,

    #[account(
        mut,
        constraint = new_strategy_token_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = new_strategy_token_account.owner == new_strategy.key() @ VaultError::InvalidOwner,
    )]
    pub new_strategy_token_account: Account<'info, TokenAccount>,

    /// CHECK: PDA used as authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// Passed writable to the strategy's migrate call
    #[account(
        mut,
        constraint = vault_token_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = vault_token_account.owner == vault_authority.key() @ VaultError::InvalidOwner,
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<MigrateStrategy>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let old_key = ctx.accounts.old_strategy.key();
    let new_key = ctx.accounts.new_strategy.key();

    let asset_mint_key = ctx.accounts.vault_state.asset_mint;
    let authority_bump = ctx.accounts.vault_state.authority_bump;
    let authority_seeds: &[&[u8]] = &[
        VAULT_AUTHORITY_SEED,
        asset_mint_key.as_ref(),
        &[authority_bump],
    ];
    let signer_seeds = &[&authority_seeds[..]];

    let mut old = CpiStrategy {
        accounts: StrategyAccounts {
            strategy: ctx.accounts.old_strategy.to_account_info(),
            strategy_program: ctx.accounts.strategy_program.to_account_info(),
            strategy_token_account: ctx.accounts.old_strategy_token_account.to_account_info(),
        },
        vault_token_account: ctx.accounts.vault_token_account.to_account_info(),
        vault_authority: ctx.accounts.vault_authority.to_account_info(),
        token_program: ctx.accounts.token_program.to_account_info(),
        migration_target: Some((
            ctx.accounts.new_strategy.to_account_info(),
            ctx.accounts.new_strategy_token_account.to_account_info(),
        )),
        signer_seeds,
    };

    let vault_state = &mut ctx.accounts.vault_state;
    let roles = VaultRoles::from_vault(vault_state);
    vault_state.migrate_strategy(
        &roles,
        &ctx.accounts.authority.key(),
        &mut old,
        new_key,
        now,
    )?;

    let total_debt = vault_state.strategy(&new_key)?.total_debt;
    msg!("Strategy {} migrated to {}", old_key, new_key);

    emit!(StrategyMigrated {
        vault: vault_state.key(),
        old_strategy: old_key,
        new_strategy: new_key,
        total_debt,
        timestamp: now,
    });

    Ok(())
}
