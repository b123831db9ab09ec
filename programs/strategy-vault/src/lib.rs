// Strategy Vault - multi-strategy capital allocation vault on Solana
// Security: Every state transition runs through the ledger core, which checks
// roles and invariants before anything is committed
// Architecture: Strategies are external programs reached through CPI; the vault
// only trusts its own token balances

use anchor_lang::prelude::*;

pub mod adapters;
pub mod constants;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod ledger;
pub mod math;
pub mod state;

use instructions::*;
use ledger::{Role, StrategyConfig};
use state::{HealthCheckLimits, VaultConfig};

declare_id!("6xJYRVKitvKWcC9sfiZTxJtLwVW6chQ5Aib1pB3rQ2Zh");

#[program]
pub mod strategy_vault {
    use super::*;

    /// Initialize a new vault for a given asset token
    ///
    /// Security considerations:
    /// - Initializes vault state with proper PDAs
    /// - Creates share mint with vault authority PDA as mint authority
    /// - Validates fee and health-check configuration
    pub fn initialize(ctx: Context<Initialize>, config: VaultConfig) -> Result<()> {
        instructions::initialize::handler(ctx, config)
    }

    /// Deposit assets into the vault and receive shares
    ///
    /// Security considerations:
    /// - Validates user token accounts (mint, owner)
    /// - Rejected during emergency shutdown and above the deposit limit
    /// - Follows checks-effects-interactions pattern
    pub fn deposit(ctx: Context<Deposit>, amount: u64) -> Result<()> {
        instructions::deposit::handler(ctx, amount)
    }

    /// Redeem shares, pulling from strategies in withdrawal-queue order
    ///
    /// Security considerations:
    /// - Strategy withdrawals are measured by the vault's own balance
    /// - Realized losses above `max_loss_bps` abort the redemption
    /// - Shares burned never exceed the shares requested
    pub fn withdraw<'info>(
        ctx: Context<'_, '_, '_, 'info, Withdraw<'info>>,
        shares: u64,
        max_loss_bps: Option<u64>,
    ) -> Result<()> {
        instructions::withdraw::handler(ctx, shares, max_loss_bps)
    }

    /// Settle a strategy: book gain and loss, charge fees, move credit or debt
    ///
    /// Security considerations:
    /// - Only the strategy itself may report
    /// - Reported gain and repayment must already sit in the vault
    /// - Health check bounds the reported gain and loss
    pub fn report(ctx: Context<Report>, gain: u64, loss: u64, debt_payment: u64) -> Result<()> {
        instructions::report::handler(ctx, gain, loss, debt_payment)
    }

    /// Register a new strategy (governance)
    pub fn add_strategy(ctx: Context<AddStrategy>, config: StrategyConfig) -> Result<()> {
        instructions::add_strategy::handler(ctx, config)
    }

    /// Replace a strategy with a new one, carrying its debt over (governance)
    pub fn migrate_strategy(ctx: Context<MigrateStrategy>) -> Result<()> {
        instructions::migrate_strategy::handler(ctx)
    }

    /// Revoke a strategy (governance, management, guardian or the strategy)
    pub fn revoke_strategy(ctx: Context<Admin>, strategy: Pubkey) -> Result<()> {
        instructions::admin::revoke_strategy(ctx, strategy)
    }

    pub fn update_strategy_debt_ratio(
        ctx: Context<Admin>,
        strategy: Pubkey,
        debt_ratio: u64,
    ) -> Result<()> {
        instructions::admin::update_strategy_debt_ratio(ctx, strategy, debt_ratio)
    }

    pub fn update_strategy_min_debt_per_harvest(
        ctx: Context<Admin>,
        strategy: Pubkey,
        amount: u64,
    ) -> Result<()> {
        instructions::admin::update_strategy_min_debt_per_harvest(ctx, strategy, amount)
    }

    pub fn update_strategy_max_debt_per_harvest(
        ctx: Context<Admin>,
        strategy: Pubkey,
        amount: u64,
    ) -> Result<()> {
        instructions::admin::update_strategy_max_debt_per_harvest(ctx, strategy, amount)
    }

    pub fn update_strategy_debt_limit(
        ctx: Context<Admin>,
        strategy: Pubkey,
        debt_limit: u64,
    ) -> Result<()> {
        instructions::admin::update_strategy_debt_limit(ctx, strategy, debt_limit)
    }

    pub fn update_strategy_performance_fee(
        ctx: Context<Admin>,
        strategy: Pubkey,
        fee: u64,
    ) -> Result<()> {
        instructions::admin::update_strategy_performance_fee(ctx, strategy, fee)
    }

    pub fn set_do_health_check(
        ctx: Context<Admin>,
        strategy: Pubkey,
        enabled: bool,
    ) -> Result<()> {
        instructions::admin::set_do_health_check(ctx, strategy, enabled)
    }

    pub fn add_strategy_to_queue(ctx: Context<Admin>, strategy: Pubkey) -> Result<()> {
        instructions::admin::add_strategy_to_queue(ctx, strategy)
    }

    pub fn remove_strategy_from_queue(ctx: Context<Admin>, strategy: Pubkey) -> Result<()> {
        instructions::admin::remove_strategy_from_queue(ctx, strategy)
    }

    pub fn set_withdrawal_queue(ctx: Context<Admin>, queue: Vec<Pubkey>) -> Result<()> {
        instructions::admin::set_withdrawal_queue(ctx, queue)
    }

    /// Emergency circuit breaker
    ///
    /// Security considerations:
    /// - Governance or guardian may activate, only governance may lift it
    /// - While active: no deposits, no credit, all debt becomes outstanding
    pub fn set_emergency_shutdown(ctx: Context<Admin>, active: bool) -> Result<()> {
        instructions::admin::set_emergency_shutdown(ctx, active)
    }

    pub fn set_deposit_limit(ctx: Context<Admin>, limit: u64) -> Result<()> {
        instructions::admin::set_deposit_limit(ctx, limit)
    }

    pub fn set_management_fee(ctx: Context<Admin>, fee: u64) -> Result<()> {
        instructions::admin::set_management_fee(ctx, fee)
    }

    pub fn set_performance_fee(ctx: Context<Admin>, fee: u64) -> Result<()> {
        instructions::admin::set_performance_fee(ctx, fee)
    }

    pub fn set_health_check(
        ctx: Context<Admin>,
        limits: Option<HealthCheckLimits>,
    ) -> Result<()> {
        instructions::admin::set_health_check(ctx, limits)
    }

    pub fn set_role(ctx: Context<Admin>, role: Role, key: Pubkey) -> Result<()> {
        instructions::admin::set_role(ctx, role, key)
    }

    // ============ View Functions ============

    pub fn price_per_share(ctx: Context<VaultView>) -> Result<()> {
        instructions::view::price_per_share(ctx)
    }

    pub fn total_assets(ctx: Context<VaultView>) -> Result<()> {
        instructions::view::get_total_assets(ctx)
    }

    pub fn available_deposit_limit(ctx: Context<VaultView>) -> Result<()> {
        instructions::view::available_deposit_limit(ctx)
    }

    pub fn max_available_shares(ctx: Context<VaultView>) -> Result<()> {
        instructions::view::max_available_shares(ctx)
    }

    pub fn credit_available(ctx: Context<VaultView>, strategy: Pubkey) -> Result<()> {
        instructions::view::credit_available(ctx, strategy)
    }

    pub fn debt_outstanding(ctx: Context<StrategyView>) -> Result<()> {
        instructions::view::debt_outstanding(ctx)
    }

    pub fn expected_return(ctx: Context<VaultView>, strategy: Pubkey) -> Result<()> {
        instructions::view::expected_return(ctx, strategy)
    }
}
