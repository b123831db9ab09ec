use anchor_lang::prelude::*;
use anchor_spl::token::{self, Mint, MintTo, Token, TokenAccount};

use crate::{
    constants::*,
    adapters::{CpiStrategy, StrategyAccounts, TokenCustody},
    errors::*,
    events::*,
    ledger::{StrategyReport, VaultRoles},
    state::*,
};

/// Settlement cycle driven by a strategy
///
/// The strategy transfers `gain + debt_payment` into the vault token account
/// in the same transaction, before this instruction, and signs as itself.
/// Anything it sent beyond what the report applies is booked to it as well.
#[derive(Accounts)]
pub struct Report<'info> {
    /// Strategy signer; its key identifies the ledger record
    pub strategy: Signer<'info>,

    /// CHECK: Strategy program, must own the strategy account
    #[account(
        executable,
        constraint = strategy.owner == &strategy_program.key() @ VaultError::InvalidStrategyProgram,
    )]
    pub strategy_program: UncheckedAccount<'info>,

    /// Strategy's asset account, receives credit
    #[account(
        mut,
        constraint = strategy_token_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = strategy_token_account.owner == strategy.key() @ VaultError::InvalidOwner,
    )]
    pub strategy_token_account: Account<'info, TokenAccount>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Account<'info, VaultState>,

    #[account(
        mut,
        address = vault_state.share_mint,
    )]
    pub share_mint: Account<'info, Mint>,

    /// Vault fee recipient
    #[account(
        mut,
        address = vault_state.rewards @ VaultError::InvalidOwner,
    )]
    pub rewards_share_account: Account<'info, TokenAccount>,

    /// Strategist fee recipient, checked against the strategy record
    #[account(
        mut,
        constraint = strategist_share_account.mint == vault_state.share_mint @ VaultError::InvalidMint,
    )]
    pub strategist_share_account: Account<'info, TokenAccount>,

    /// CHECK: PDA used as authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        constraint = vault_token_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = vault_token_account.owner == vault_authority.key() @ VaultError::InvalidOwner,
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<Report>, gain: u64, loss: u64, debt_payment: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let strategy_key = ctx.accounts.strategy.key();

    let strategist_rewards = ctx.accounts.vault_state.strategy(&strategy_key)?.strategist_rewards;
    require_keys_eq!(
        ctx.accounts.strategist_share_account.key(),
        strategist_rewards,
        VaultError::InvalidOwner
    );

    let asset_mint_key = ctx.accounts.vault_state.asset_mint;
    let authority_bump = ctx.accounts.vault_state.authority_bump;
    let authority_seeds: &[&[u8]] = &[
        VAULT_AUTHORITY_SEED,
        asset_mint_key.as_ref(),
        &[authority_bump],
    ];
    let signer_seeds = &[&authority_seeds[..]];

    let vault_token_info = ctx.accounts.vault_token_account.to_account_info();
    let vault_authority_info = ctx.accounts.vault_authority.to_account_info();
    let token_program_info = ctx.accounts.token_program.to_account_info();
    let strategy_token_info = ctx.accounts.strategy_token_account.to_account_info();

    let adapter = CpiStrategy {
        accounts: StrategyAccounts {
            strategy: ctx.accounts.strategy.to_account_info(),
            strategy_program: ctx.accounts.strategy_program.to_account_info(),
            strategy_token_account: strategy_token_info.clone(),
        },
        vault_token_account: vault_token_info.clone(),
        vault_authority: vault_authority_info.clone(),
        token_program: token_program_info.clone(),
        migration_target: None,
        signer_seeds,
    };
    let mut custody = TokenCustody::new(
        vault_token_info,
        vault_authority_info.clone(),
        token_program_info.clone(),
        signer_seeds,
    )
    .with_destination(strategy_key, strategy_token_info);

    let vault_state = &mut ctx.accounts.vault_state;
    let roles = VaultRoles::from_vault(vault_state);
    let health_check = vault_state.health_check;
    let outcome = vault_state.report(
        &roles,
        &strategy_key,
        &adapter,
        &mut custody,
        &health_check,
        StrategyReport {
            gain,
            loss,
            debt_payment,
        },
        now,
    )?;

    let fee_mints = [
        (
            ctx.accounts.strategist_share_account.to_account_info(),
            outcome.fees.strategist,
        ),
        (
            ctx.accounts.rewards_share_account.to_account_info(),
            outcome.fees.vault,
        ),
    ];
    for (to, shares) in fee_mints {
        if shares == 0 {
            continue;
        }
        let mint_ctx = CpiContext::new_with_signer(
            token_program_info.clone(),
            MintTo {
                mint: ctx.accounts.share_mint.to_account_info(),
                to,
                authority: vault_authority_info.clone(),
            },
            signer_seeds,
        );
        token::mint_to(mint_ctx, shares)?;
    }

    let record = vault_state.strategy(&strategy_key)?;
    emit!(StrategyReported {
        vault: vault_state.key(),
        strategy: strategy_key,
        gain: outcome.gain,
        loss: outcome.loss,
        debt_paid: outcome.debt_payment,
        credit: outcome.credit,
        debt_outstanding: outcome.debt_outstanding,
        total_gain: record.total_gain,
        total_loss: record.total_loss,
        total_debt: record.total_debt,
        debt_ratio: record.debt_ratio,
        fee_shares: outcome.fees.total(),
        health_check_skipped: outcome.health_check_skipped,
        timestamp: now,
    });

    Ok(())
}
