use anchor_lang::prelude::*;
use anchor_spl::token::{self, Burn, Mint, Token, TokenAccount};

use crate::{
    constants::*,
    adapters::{strategies_from_remaining, TokenCustody},
    errors::*,
    events::*,
    state::*,
};

/// Redeem shares for assets, pulling from strategies when idle funds fall short
///
/// Remaining accounts: one `[strategy, strategy_program, strategy_token_account]`
/// triple per queued strategy the withdrawal may reach. The strategy and its
/// token account are passed writable; the program must own the strategy.
#[derive(Accounts)]
pub struct Withdraw<'info> {
    #[account(mut)]
    pub user: Signer<'info>,

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

    /// CHECK: PDA used as authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// User's share token account (burned from)
    #[account(
        mut,
        constraint = user_share_account.mint == vault_state.share_mint @ VaultError::InvalidMint,
        constraint = user_share_account.owner == user.key() @ VaultError::InvalidOwner,
    )]
    pub user_share_account: Account<'info, TokenAccount>,

    /// Recipient of the redeemed assets
    #[account(
        mut,
        constraint = recipient_asset_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
    )]
    pub recipient_asset_account: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = vault_token_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = vault_token_account.owner == vault_authority.key() @ VaultError::InvalidOwner,
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn handler<'info>(
    ctx: Context<'_, '_, '_, 'info, Withdraw<'info>>,
    shares: u64,
    max_loss_bps: Option<u64>,
) -> Result<()> {
    require!(
        ctx.accounts.user_share_account.amount >= shares,
        VaultError::InsufficientShares
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
    let recipient = ctx.accounts.recipient_asset_account.key();

    let mut adapters = strategies_from_remaining(
        ctx.remaining_accounts,
        &asset_mint_key,
        &vault_token_info,
        &vault_authority_info,
        &token_program_info,
        signer_seeds,
    )?;
    let mut custody = TokenCustody::new(
        vault_token_info.clone(),
        vault_authority_info.clone(),
        token_program_info.clone(),
        signer_seeds,
    )
    .with_destination(recipient, ctx.accounts.recipient_asset_account.to_account_info());

    let vault_state = &mut ctx.accounts.vault_state;
    let outcome = vault_state.withdraw(
        &mut adapters,
        &mut custody,
        shares,
        &recipient,
        max_loss_bps.unwrap_or(DEFAULT_MAX_LOSS_BPS),
    )?;

    let burn_ctx = CpiContext::new(
        token_program_info,
        Burn {
            mint: ctx.accounts.share_mint.to_account_info(),
            from: ctx.accounts.user_share_account.to_account_info(),
            authority: ctx.accounts.user.to_account_info(),
        },
    );
    token::burn(burn_ctx, outcome.shares_burned)?;

    emit!(Withdrawn {
        vault: vault_state.key(),
        user: ctx.accounts.user.key(),
        shares_burned: outcome.shares_burned,
        assets_paid: outcome.assets_paid,
        loss: outcome.loss,
        total_idle: vault_state.total_idle,
        total_supply: vault_state.total_supply,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
