// Constants for the Strategy Vault program

/// Seed for vault state PDA
pub const VAULT_SEED: &[u8] = b"vault";

/// Seed for share mint PDA
pub const SHARE_MINT_SEED: &[u8] = b"shares";

/// Seed for vault token account authority PDA
pub const VAULT_AUTHORITY_SEED: &[u8] = b"vault_authority";

/// Denominator for every ratio and fee expressed in basis points
pub const MAX_BPS: u64 = 10_000;

/// Seconds per year used to pro-rate the management fee (365.2425 days)
pub const SECS_PER_YEAR: u64 = 31_556_952;

/// Maximum number of strategies in the withdrawal queue
pub const MAX_QUEUE_LEN: usize = 20;

/// Maximum number of strategy records the vault account can hold.
/// Records are never removed, so migrations consume slots.
pub const MAX_STRATEGIES: usize = 32;

/// Upper bound for vault and strategist performance fees (50%)
pub const MAX_PERFORMANCE_FEE: u64 = MAX_BPS / 2;

/// Upper bound for the yearly management fee (100%)
pub const MAX_MANAGEMENT_FEE: u64 = MAX_BPS;

/// Default vault performance fee (10%)
pub const DEFAULT_PERFORMANCE_FEE: u64 = 1_000;

/// Default yearly management fee (2%)
pub const DEFAULT_MANAGEMENT_FEE: u64 = 200;

/// Default tolerated loss on withdrawal (0.01%)
pub const DEFAULT_MAX_LOSS_BPS: u64 = 1;

/// Space for one StrategyParams entry:
/// 32 strategy + 32 strategist_rewards + 8 performance_fee + 8 activation +
/// 8 debt_ratio + 8 min_debt_per_harvest + 8 max_debt_per_harvest +
/// 8 debt_limit + 8 last_report + 8 total_debt + 8 total_gain +
/// 8 total_loss + 1 do_health_check + 1 revoked
pub const STRATEGY_PARAMS_SIZE: usize = 32 + 32 + 8 * 10 + 1 + 1;

/// Space for VaultState account:
/// 8 discriminator + 4 * 32 roles + 32 asset_mint + 32 share_mint +
/// 1 decimals + 8 total_supply + 8 total_idle + 8 total_debt + 8 debt_ratio +
/// 8 deposit_limit + 8 management_fee + 8 performance_fee +
/// 1 emergency_shutdown + 8 activation + 8 last_report +
/// 17 health_check (option tag + 2 * 8) +
/// strategies vec + withdrawal queue vec + 3 bumps + 64 padding
pub const VAULT_STATE_SIZE: usize = 8
    + 4 * 32
    + 32
    + 32
    + 1
    + 8 * 7
    + 1
    + 8
    + 8
    + 17
    + 4
    + MAX_STRATEGIES * STRATEGY_PARAMS_SIZE
    + 4
    + MAX_QUEUE_LEN * 32
    + 3
    + 64;
