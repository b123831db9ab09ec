use anchor_lang::prelude::*;
use anchor_spl::token::TokenAccount;

use crate::{
    constants::*,
    errors::*,
    events::*,
    ledger::{StrategyConfig, VaultRoles},
    state::*,
};

/// Register a strategy and append it to the withdrawal queue
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: Governance must sign (checked by the ledger)
/// ✅ 2. ACCOUNT OWNERSHIP: Vault state PDA validated with seeds
/// ✅ 7. TOKEN ACCOUNT VALIDATION: Strategist fee account holds vault shares
/// ✅ 10. EVENTS: Emits StrategyAdded event
#[derive(Accounts)]
pub struct AddStrategy<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Account<'info, VaultState>,

    /// CHECK: Strategy state account; only its key is recorded
    pub strategy: UncheckedAccount<'info>,

    /// Share account receiving the strategist's fee shares
    #[account(
        constraint = strategist_rewards.mint == vault_state.share_mint @ VaultError::InvalidMint,
    )]
    pub strategist_rewards: Account<'info, TokenAccount>,
}

pub fn handler(ctx: Context<AddStrategy>, config: StrategyConfig) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let strategy = ctx.accounts.strategy.key();
    let vault_state = &mut ctx.accounts.vault_state;

    let roles = VaultRoles::from_vault(vault_state);
    vault_state.add_strategy(
        &roles,
        &ctx.accounts.authority.key(),
        strategy,
        ctx.accounts.strategist_rewards.key(),
        config,
        now,
    )?;

    msg!("Strategy {} added with ratio {}", strategy, config.debt_ratio);

    emit!(StrategyAdded {
        vault: vault_state.key(),
        strategy,
        debt_ratio: config.debt_ratio,
        debt_limit: config.debt_limit,
        min_debt_per_harvest: config.min_debt_per_harvest,
        max_debt_per_harvest: config.max_debt_per_harvest,
        performance_fee: config.performance_fee,
        timestamp: now,
    });

    Ok(())
}
