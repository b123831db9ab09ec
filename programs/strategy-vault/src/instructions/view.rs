use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::set_return_data;
use anchor_spl::token::TokenAccount;

use crate::{adapters::StrategyAccounts, errors::VaultError, state::VaultState};

#[derive(Accounts)]
pub struct VaultView<'info> {
    pub vault_state: Account<'info, VaultState>,
}

#[derive(Accounts)]
pub struct StrategyView<'info> {
    pub vault_state: Account<'info, VaultState>,

    /// CHECK: Strategy state account, owned by `strategy_program`
    pub strategy: UncheckedAccount<'info>,

    /// CHECK: Strategy program, queried read-only
    #[account(
        executable,
        constraint = strategy.owner == &strategy_program.key() @ VaultError::InvalidStrategyProgram,
    )]
    pub strategy_program: UncheckedAccount<'info>,

    #[account(
        constraint = strategy_token_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = strategy_token_account.owner == strategy.key() @ VaultError::InvalidOwner,
    )]
    pub strategy_token_account: Account<'info, TokenAccount>,
}

/// Asset value of one whole share
pub fn price_per_share(ctx: Context<VaultView>) -> Result<()> {
    let price = ctx.accounts.vault_state.price_per_share()?;
    set_return_data(&price.to_le_bytes());
    Ok(())
}

/// Idle funds plus all strategy debt
pub fn get_total_assets(ctx: Context<VaultView>) -> Result<()> {
    let total = ctx.accounts.vault_state.total_assets()?;
    set_return_data(&total.to_le_bytes());
    Ok(())
}

/// Room left under the deposit limit
pub fn available_deposit_limit(ctx: Context<VaultView>) -> Result<()> {
    let available = ctx.accounts.vault_state.available_deposit_limit()?;
    set_return_data(&available.to_le_bytes());
    Ok(())
}

/// Shares redeemable from idle funds and queued strategy debt
pub fn max_available_shares(ctx: Context<VaultView>) -> Result<()> {
    let shares = ctx.accounts.vault_state.max_available_shares()?;
    set_return_data(&shares.to_le_bytes());
    Ok(())
}

/// Credit the strategy would receive on its next report
pub fn credit_available(ctx: Context<VaultView>, strategy: Pubkey) -> Result<()> {
    let credit = ctx.accounts.vault_state.credit_available(&strategy)?;
    set_return_data(&credit.to_le_bytes());
    Ok(())
}

/// Debt the strategy should return on its next report, bounded by the
/// holdings its program reports
pub fn debt_outstanding(ctx: Context<StrategyView>) -> Result<()> {
    let strategy = StrategyAccounts {
        strategy: ctx.accounts.strategy.to_account_info(),
        strategy_program: ctx.accounts.strategy_program.to_account_info(),
        strategy_token_account: ctx.accounts.strategy_token_account.to_account_info(),
    };
    let holdings = strategy.total_assets()?;
    let outstanding = ctx
        .accounts
        .vault_state
        .debt_outstanding_for(strategy.strategy.key, holdings)?;
    set_return_data(&outstanding.to_le_bytes());
    Ok(())
}

/// Gain the strategy would report if it kept its historical pace
pub fn expected_return(ctx: Context<VaultView>, strategy: Pubkey) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let expected = ctx.accounts.vault_state.expected_return(&strategy, now)?;
    set_return_data(&expected.to_le_bytes());
    Ok(())
}
