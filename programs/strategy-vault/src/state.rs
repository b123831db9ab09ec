use anchor_lang::prelude::*;

use crate::{
    constants::{MAX_BPS, MAX_MANAGEMENT_FEE, MAX_PERFORMANCE_FEE},
    errors::VaultError,
    math::{checked_add, mul_div, Rounding},
};

/// Global vault state: the single ledger aggregate
///
/// Holds vault-wide totals, every strategy record ever registered and the
/// withdrawal queue. Every mutating ledger operation runs on a draft copy and
/// only replaces this state once the invariants hold (see `transact`).
#[account]
#[derive(Debug)]
pub struct VaultState {
    /// Can add and migrate strategies, set fees and roles
    pub governance: Pubkey,             // 32 bytes

    /// Can tune strategy allocation and the withdrawal queue
    pub management: Pubkey,             // 32 bytes

    /// Can revoke strategies and trigger emergency shutdown
    pub guardian: Pubkey,               // 32 bytes

    /// Share token account receiving vault fees
    pub rewards: Pubkey,                // 32 bytes

    /// Mint of the underlying asset token
    pub asset_mint: Pubkey,             // 32 bytes

    /// Mint of the vault share token
    pub share_mint: Pubkey,             // 32 bytes

    /// Decimals shared by asset and share mints
    pub decimals: u8,                   // 1 byte

    /// Shares outstanding
    pub total_supply: u64,              // 8 bytes

    /// Assets held by the vault and not lent to any strategy
    pub total_idle: u64,                // 8 bytes

    /// Sum of every strategy's recorded debt
    pub total_debt: u64,                // 8 bytes

    /// Sum of every strategy's debt ratio, in basis points
    pub debt_ratio: u64,                // 8 bytes

    /// Cap on total assets accepted through deposits
    pub deposit_limit: u64,             // 8 bytes

    /// Yearly management fee in basis points
    pub management_fee: u64,            // 8 bytes

    /// Performance fee on gains in basis points
    pub performance_fee: u64,           // 8 bytes

    /// Halts deposits and new credit while debt unwinds
    pub emergency_shutdown: bool,       // 1 byte

    pub activation: i64,                // 8 bytes
    pub last_report: i64,               // 8 bytes

    /// Bounds applied to strategy reports, `None` disables the check
    pub health_check: Option<HealthCheckLimits>, // 17 bytes

    /// Append-only strategy records, addressed by strategy key
    pub strategies: Vec<StrategyParams>,

    /// Order in which strategies are drained on withdrawal
    pub withdrawal_queue: Vec<Pubkey>,

    /// Bump seed for vault state PDA
    pub bump: u8,                       // 1 byte

    /// Bump seed for share mint PDA
    pub share_bump: u8,                 // 1 byte

    /// Bump seed for vault authority PDA
    pub authority_bump: u8,             // 1 byte

    // Padding for future upgrades
    pub _reserved: [u8; 64],            // 64 bytes
}

/// Ledger record for one strategy
///
/// Records are never removed: revocation and migration only zero them, so a
/// strategy key stays resolvable for the life of the vault.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct StrategyParams {
    pub strategy: Pubkey,
    /// Share token account receiving the strategist fee
    pub strategist_rewards: Pubkey,
    pub performance_fee: u64,
    pub activation: i64,
    pub debt_ratio: u64,
    pub min_debt_per_harvest: u64,
    pub max_debt_per_harvest: u64,
    /// Absolute cap on this strategy's debt, independent of the ratio
    pub debt_limit: u64,
    pub last_report: i64,
    pub total_debt: u64,
    pub total_gain: u64,
    pub total_loss: u64,
    /// Cleared for a single report to bypass the health check
    pub do_health_check: bool,
    pub revoked: bool,
}

/// Profit and loss bounds for a single report, relative to strategy debt
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct HealthCheckLimits {
    pub profit_limit_bps: u64,
    pub loss_limit_bps: u64,
}

/// Parameters supplied at vault initialization
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct VaultConfig {
    pub governance: Pubkey,
    pub management: Pubkey,
    pub guardian: Pubkey,
    pub rewards: Pubkey,
    pub deposit_limit: u64,
    pub management_fee: u64,
    pub performance_fee: u64,
    pub health_check: Option<HealthCheckLimits>,
}

impl VaultState {
    /// Build a fresh ledger from its configuration
    pub fn new(
        config: &VaultConfig,
        asset_mint: Pubkey,
        share_mint: Pubkey,
        decimals: u8,
        now: i64,
    ) -> Result<Self> {
        require!(
            config.management_fee <= MAX_MANAGEMENT_FEE,
            VaultError::InvalidFee
        );
        require!(
            config.performance_fee <= MAX_PERFORMANCE_FEE,
            VaultError::InvalidFee
        );
        if let Some(limits) = config.health_check {
            limits.validate()?;
        }

        Ok(Self {
            governance: config.governance,
            management: config.management,
            guardian: config.guardian,
            rewards: config.rewards,
            asset_mint,
            share_mint,
            decimals,
            total_supply: 0,
            total_idle: 0,
            total_debt: 0,
            debt_ratio: 0,
            deposit_limit: config.deposit_limit,
            management_fee: config.management_fee,
            performance_fee: config.performance_fee,
            emergency_shutdown: false,
            activation: now,
            last_report: now,
            health_check: config.health_check,
            strategies: Vec::new(),
            withdrawal_queue: Vec::new(),
            bump: 0,
            share_bump: 0,
            authority_bump: 0,
            _reserved: [0; 64],
        })
    }

    /// Total assets under management: idle funds plus strategy debt
    pub fn total_assets(&self) -> Result<u64> {
        checked_add(self.total_idle, self.total_debt)
    }

    /// Calculate shares to mint for a given asset amount
    ///
    /// - If first deposit: shares = assets
    /// - Otherwise: shares = assets * totalSupply / totalAssets
    pub fn calculate_shares(&self, assets: u64) -> Result<u64> {
        let total_assets = self.total_assets()?;
        if self.total_supply == 0 || total_assets == 0 {
            return Ok(assets);
        }

        mul_div(assets, self.total_supply, total_assets, Rounding::Floor)
    }

    /// Calculate asset value of shares: shares * totalAssets / totalSupply
    pub fn calculate_assets(&self, shares: u64) -> Result<u64> {
        if self.total_supply == 0 {
            return Ok(0);
        }

        mul_div(shares, self.total_assets()?, self.total_supply, Rounding::Floor)
    }

    /// Value of one whole share (10^decimals base units)
    pub fn price_per_share(&self) -> Result<u64> {
        let unit = 10u64
            .checked_pow(self.decimals as u32)
            .ok_or(VaultError::MathOverflow)?;
        if self.total_supply == 0 {
            return Ok(unit);
        }
        self.calculate_assets(unit)
    }

    pub fn strategy_index(&self, strategy: &Pubkey) -> Result<usize> {
        self.strategies
            .iter()
            .position(|s| s.strategy == *strategy)
            .ok_or(error!(VaultError::StrategyNotFound))
    }

    pub fn strategy(&self, strategy: &Pubkey) -> Result<&StrategyParams> {
        let index = self.strategy_index(strategy)?;
        Ok(&self.strategies[index])
    }

    pub fn is_registered(&self, strategy: &Pubkey) -> bool {
        self.strategies.iter().any(|s| s.strategy == *strategy)
    }

    pub fn is_queued(&self, strategy: &Pubkey) -> bool {
        self.withdrawal_queue.contains(strategy)
    }

    /// Check the ledger invariants:
    /// - strategy debt ratios sum to the cached vault ratio, at most 10_000
    /// - vault debt equals the sum of strategy debt
    /// - the queue holds registered strategies without duplicates
    pub fn check_invariants(&self) -> Result<()> {
        let mut ratio_sum: u64 = 0;
        let mut debt_sum: u64 = 0;
        for record in &self.strategies {
            ratio_sum = checked_add(ratio_sum, record.debt_ratio)?;
            debt_sum = checked_add(debt_sum, record.total_debt)?;
            require!(
                !record.revoked || record.debt_ratio == 0,
                VaultError::InvariantViolation
            );
        }

        require!(ratio_sum <= MAX_BPS, VaultError::InvariantViolation);
        require!(ratio_sum == self.debt_ratio, VaultError::InvariantViolation);
        require!(debt_sum == self.total_debt, VaultError::InvariantViolation);

        for (i, key) in self.withdrawal_queue.iter().enumerate() {
            require!(self.is_registered(key), VaultError::InvariantViolation);
            require!(
                !self.withdrawal_queue[..i].contains(key),
                VaultError::InvariantViolation
            );
        }

        Ok(())
    }

    /// Run `op` against a draft of the ledger and commit it only if both the
    /// operation and the invariant check succeed. A failed operation leaves
    /// the committed state untouched.
    pub fn transact<T>(&mut self, op: impl FnOnce(&mut VaultState) -> Result<T>) -> Result<T> {
        let mut draft = self.clone();
        let outcome = op(&mut draft)?;
        draft.check_invariants()?;
        *self = draft;
        Ok(outcome)
    }
}

impl HealthCheckLimits {
    pub fn validate(&self) -> Result<()> {
        require!(self.profit_limit_bps <= MAX_BPS, VaultError::InvalidFee);
        require!(self.loss_limit_bps <= MAX_BPS, VaultError::InvalidFee);
        Ok(())
    }
}
