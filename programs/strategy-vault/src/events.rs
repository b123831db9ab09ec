use anchor_lang::prelude::*;

/// Event emitted when a new vault is initialized
#[event]
pub struct VaultInitialized {
    pub vault: Pubkey,
    pub governance: Pubkey,
    pub asset_mint: Pubkey,
    pub share_mint: Pubkey,
    pub deposit_limit: u64,
    pub timestamp: i64,
}

/// Event emitted when assets are deposited
#[event]
pub struct Deposited {
    pub vault: Pubkey,
    pub user: Pubkey,
    pub asset_amount: u64,
    pub shares_minted: u64,
    pub total_idle: u64,
    pub total_supply: u64,
    pub timestamp: i64,
}

/// Event emitted when shares are redeemed
#[event]
pub struct Withdrawn {
    pub vault: Pubkey,
    pub user: Pubkey,
    pub shares_burned: u64,
    pub assets_paid: u64,
    pub loss: u64,
    pub total_idle: u64,
    pub total_supply: u64,
    pub timestamp: i64,
}

/// Event emitted when a strategy is registered
#[event]
pub struct StrategyAdded {
    pub vault: Pubkey,
    pub strategy: Pubkey,
    pub debt_ratio: u64,
    pub debt_limit: u64,
    pub min_debt_per_harvest: u64,
    pub max_debt_per_harvest: u64,
    pub performance_fee: u64,
    pub timestamp: i64,
}

/// Event emitted after every settlement cycle
#[event]
pub struct StrategyReported {
    pub vault: Pubkey,
    pub strategy: Pubkey,
    pub gain: u64,
    pub loss: u64,
    pub debt_paid: u64,
    pub credit: u64,
    pub debt_outstanding: u64,
    pub total_gain: u64,
    pub total_loss: u64,
    pub total_debt: u64,
    pub debt_ratio: u64,
    pub fee_shares: u64,
    pub health_check_skipped: bool,
    pub timestamp: i64,
}

/// Event emitted when a strategy's debt ratio changes
#[event]
pub struct StrategyUpdateDebtRatio {
    pub vault: Pubkey,
    pub strategy: Pubkey,
    pub debt_ratio: u64,
    pub vault_debt_ratio: u64,
}

/// Event emitted for any other per-strategy parameter change
#[event]
pub struct StrategyParamsUpdated {
    pub vault: Pubkey,
    pub strategy: Pubkey,
    pub min_debt_per_harvest: u64,
    pub max_debt_per_harvest: u64,
    pub debt_limit: u64,
    pub performance_fee: u64,
    pub do_health_check: bool,
}

/// Event emitted when a strategy is revoked
#[event]
pub struct StrategyRevoked {
    pub vault: Pubkey,
    pub strategy: Pubkey,
    pub total_debt: u64,
    pub timestamp: i64,
}

/// Event emitted when a strategy is replaced
#[event]
pub struct StrategyMigrated {
    pub vault: Pubkey,
    pub old_strategy: Pubkey,
    pub new_strategy: Pubkey,
    pub total_debt: u64,
    pub timestamp: i64,
}

/// Event emitted when the withdrawal queue changes
#[event]
pub struct WithdrawalQueueUpdated {
    pub vault: Pubkey,
    pub queue: Vec<Pubkey>,
}

/// Event emitted when emergency shutdown is toggled
#[event]
pub struct EmergencyShutdown {
    pub vault: Pubkey,
    pub active: bool,
    pub timestamp: i64,
}

/// Event emitted when vault-level configuration changes
#[event]
pub struct ConfigUpdated {
    pub vault: Pubkey,
    pub governance: Pubkey,
    pub management: Pubkey,
    pub guardian: Pubkey,
    pub rewards: Pubkey,
    pub deposit_limit: u64,
    pub management_fee: u64,
    pub performance_fee: u64,
    pub health_check_enabled: bool,
}
