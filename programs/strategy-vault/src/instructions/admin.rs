use anchor_lang::prelude::*;

use crate::{
    constants::*,
    events::*,
    ledger::{Role, VaultRoles},
    state::*,
};

/// Role-gated configuration. The ledger decides which role may perform each
/// change; the accounts only pin the vault.
#[derive(Accounts)]
pub struct Admin<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Account<'info, VaultState>,
}

fn emit_strategy_params(vault_state: &Account<VaultState>, strategy: &Pubkey) -> Result<()> {
    let record = vault_state.strategy(strategy)?;
    emit!(StrategyParamsUpdated {
        vault: vault_state.key(),
        strategy: *strategy,
        min_debt_per_harvest: record.min_debt_per_harvest,
        max_debt_per_harvest: record.max_debt_per_harvest,
        debt_limit: record.debt_limit,
        performance_fee: record.performance_fee,
        do_health_check: record.do_health_check,
    });
    Ok(())
}

fn emit_config(vault_state: &Account<VaultState>) {
    emit!(ConfigUpdated {
        vault: vault_state.key(),
        governance: vault_state.governance,
        management: vault_state.management,
        guardian: vault_state.guardian,
        rewards: vault_state.rewards,
        deposit_limit: vault_state.deposit_limit,
        management_fee: vault_state.management_fee,
        performance_fee: vault_state.performance_fee,
        health_check_enabled: vault_state.health_check.is_some(),
    });
}

fn emit_queue(vault_state: &Account<VaultState>) {
    emit!(WithdrawalQueueUpdated {
        vault: vault_state.key(),
        queue: vault_state.withdrawal_queue.clone(),
    });
}

/// Revoke a strategy: its ratio drops to zero and its whole debt becomes due
pub fn revoke_strategy(ctx: Context<Admin>, strategy: Pubkey) -> Result<()> {
    let vault_state = &mut ctx.accounts.vault_state;
    let roles = VaultRoles::from_vault(vault_state);
    vault_state.revoke_strategy(&roles, &ctx.accounts.authority.key(), &strategy)?;

    msg!("Strategy {} revoked", strategy);

    emit!(StrategyRevoked {
        vault: vault_state.key(),
        strategy,
        total_debt: vault_state.strategy(&strategy)?.total_debt,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}

pub fn update_strategy_debt_ratio(
    ctx: Context<Admin>,
    strategy: Pubkey,
    debt_ratio: u64,
) -> Result<()> {
    let vault_state = &mut ctx.accounts.vault_state;
    let roles = VaultRoles::from_vault(vault_state);
    vault_state.update_strategy_debt_ratio(
        &roles,
        &ctx.accounts.authority.key(),
        &strategy,
        debt_ratio,
    )?;

    emit!(StrategyUpdateDebtRatio {
        vault: vault_state.key(),
        strategy,
        debt_ratio,
        vault_debt_ratio: vault_state.debt_ratio,
    });

    Ok(())
}

pub fn update_strategy_min_debt_per_harvest(
    ctx: Context<Admin>,
    strategy: Pubkey,
    amount: u64,
) -> Result<()> {
    let vault_state = &mut ctx.accounts.vault_state;
    let roles = VaultRoles::from_vault(vault_state);
    vault_state.update_strategy_min_debt_per_harvest(
        &roles,
        &ctx.accounts.authority.key(),
        &strategy,
        amount,
    )?;
    emit_strategy_params(vault_state, &strategy)
}

pub fn update_strategy_max_debt_per_harvest(
    ctx: Context<Admin>,
    strategy: Pubkey,
    amount: u64,
) -> Result<()> {
    let vault_state = &mut ctx.accounts.vault_state;
    let roles = VaultRoles::from_vault(vault_state);
    vault_state.update_strategy_max_debt_per_harvest(
        &roles,
        &ctx.accounts.authority.key(),
        &strategy,
        amount,
    )?;
    emit_strategy_params(vault_state, &strategy)
}

pub fn update_strategy_debt_limit(
    ctx: Context<Admin>,
    strategy: Pubkey,
    debt_limit: u64,
) -> Result<()> {
    let vault_state = &mut ctx.accounts.vault_state;
    let roles = VaultRoles::from_vault(vault_state);
    vault_state.update_strategy_debt_limit(
        &roles,
        &ctx.accounts.authority.key(),
        &strategy,
        debt_limit,
    )?;
    emit_strategy_params(vault_state, &strategy)
}

pub fn update_strategy_performance_fee(
    ctx: Context<Admin>,
    strategy: Pubkey,
    fee: u64,
) -> Result<()> {
    let vault_state = &mut ctx.accounts.vault_state;
    let roles = VaultRoles::from_vault(vault_state);
    vault_state.update_strategy_performance_fee(
        &roles,
        &ctx.accounts.authority.key(),
        &strategy,
        fee,
    )?;
    emit_strategy_params(vault_state, &strategy)
}

/// Skip (or restore) the health check for the strategy's next report
pub fn set_do_health_check(ctx: Context<Admin>, strategy: Pubkey, enabled: bool) -> Result<()> {
    let vault_state = &mut ctx.accounts.vault_state;
    let roles = VaultRoles::from_vault(vault_state);
    vault_state.set_do_health_check(&roles, &ctx.accounts.authority.key(), &strategy, enabled)?;
    emit_strategy_params(vault_state, &strategy)
}

pub fn add_strategy_to_queue(ctx: Context<Admin>, strategy: Pubkey) -> Result<()> {
    let vault_state = &mut ctx.accounts.vault_state;
    let roles = VaultRoles::from_vault(vault_state);
    vault_state.add_strategy_to_queue(&roles, &ctx.accounts.authority.key(), &strategy)?;
    emit_queue(vault_state);
    Ok(())
}

pub fn remove_strategy_from_queue(ctx: Context<Admin>, strategy: Pubkey) -> Result<()> {
    let vault_state = &mut ctx.accounts.vault_state;
    let roles = VaultRoles::from_vault(vault_state);
    vault_state.remove_strategy_from_queue(&roles, &ctx.accounts.authority.key(), &strategy)?;
    emit_queue(vault_state);
    Ok(())
}

pub fn set_withdrawal_queue(ctx: Context<Admin>, queue: Vec<Pubkey>) -> Result<()> {
    let vault_state = &mut ctx.accounts.vault_state;
    let roles = VaultRoles::from_vault(vault_state);
    vault_state.set_withdrawal_queue(&roles, &ctx.accounts.authority.key(), queue)?;
    emit_queue(vault_state);
    Ok(())
}

/// Toggle emergency shutdown (guardian may only activate)
pub fn set_emergency_shutdown(ctx: Context<Admin>, active: bool) -> Result<()> {
    let vault_state = &mut ctx.accounts.vault_state;
    let roles = VaultRoles::from_vault(vault_state);
    vault_state.set_emergency_shutdown(&roles, &ctx.accounts.authority.key(), active)?;

    if active {
        msg!("Emergency shutdown activated");
    }

    emit!(EmergencyShutdown {
        vault: vault_state.key(),
        active,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}

pub fn set_deposit_limit(ctx: Context<Admin>, limit: u64) -> Result<()> {
    let vault_state = &mut ctx.accounts.vault_state;
    let roles = VaultRoles::from_vault(vault_state);
    vault_state.set_deposit_limit(&roles, &ctx.accounts.authority.key(), limit)?;
    emit_config(vault_state);
    Ok(())
}

pub fn set_management_fee(ctx: Context<Admin>, fee: u64) -> Result<()> {
    let vault_state = &mut ctx.accounts.vault_state;
    let roles = VaultRoles::from_vault(vault_state);
    vault_state.set_management_fee(&roles, &ctx.accounts.authority.key(), fee)?;
    emit_config(vault_state);
    Ok(())
}

pub fn set_performance_fee(ctx: Context<Admin>, fee: u64) -> Result<()> {
    let vault_state = &mut ctx.accounts.vault_state;
    let roles = VaultRoles::from_vault(vault_state);
    vault_state.set_performance_fee(&roles, &ctx.accounts.authority.key(), fee)?;
    emit_config(vault_state);
    Ok(())
}

/// Replace the health-check limits; `None` disables the check
pub fn set_health_check(ctx: Context<Admin>, limits: Option<HealthCheckLimits>) -> Result<()> {
    let vault_state = &mut ctx.accounts.vault_state;
    let roles = VaultRoles::from_vault(vault_state);
    vault_state.set_health_check(&roles, &ctx.accounts.authority.key(), limits)?;
    emit_config(vault_state);
    Ok(())
}

pub fn set_role(ctx: Context<Admin>, role: Role, key: Pubkey) -> Result<()> {
    let vault_state = &mut ctx.accounts.vault_state;
    let roles = VaultRoles::from_vault(vault_state);
    vault_state.set_role(&roles, &ctx.accounts.authority.key(), role, key)?;
    emit_config(vault_state);
    Ok(())
}
