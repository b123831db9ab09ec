use anchor_lang::prelude::*;

use crate::{
    constants::MAX_BPS,
    errors::VaultError,
    ledger::{
        adapter::StrategyAdapter,
        auth::{require_authorized, Action, Authorize},
    },
    math::{bps_of, checked_add, checked_sub, mul_div, Rounding},
    state::{StrategyParams, VaultState},
};

impl VaultState {
    /// Debt a strategy should carry given current vault assets: its ratio of
    /// total assets, capped by the strategy's absolute debt limit
    pub fn target_debt(&self, record: &StrategyParams) -> Result<u64> {
        let by_ratio = bps_of(self.total_assets()?, record.debt_ratio)?;
        Ok(by_ratio.min(record.debt_limit))
    }

    /// Amount the strategy holds above its target and must return.
    ///
    /// Under emergency shutdown or with a zero ratio the whole debt is
    /// demanded, bounded by what the strategy reports holding.
    pub fn debt_outstanding(&self, adapter: &dyn StrategyAdapter) -> Result<u64> {
        let key = adapter.key();
        let record = self.strategy(&key)?;
        let holdings = if self.emergency_shutdown || record.debt_ratio == 0 {
            adapter.total_assets()?
        } else {
            u64::MAX
        };
        self.debt_outstanding_for(&key, holdings)
    }

    /// `debt_outstanding` with the strategy's holdings supplied directly
    pub fn debt_outstanding_for(&self, strategy: &Pubkey, holdings: u64) -> Result<u64> {
        let record = self.strategy(strategy)?;
        if self.emergency_shutdown || record.debt_ratio == 0 {
            return Ok(record.total_debt.min(holdings));
        }

        let target = self.target_debt(record)?;
        Ok(record.total_debt.saturating_sub(target))
    }

    /// Amount the vault is willing to lend the strategy on its next report.
    ///
    /// Bounded by the strategy's room under its target, the vault-wide room
    /// under the aggregate ratio, idle funds and `max_debt_per_harvest`.
    /// Returns 0 below `min_debt_per_harvest`.
    pub fn credit_available(&self, strategy: &Pubkey) -> Result<u64> {
        let record = self.strategy(strategy)?;
        if self.emergency_shutdown || record.debt_ratio == 0 {
            return Ok(0);
        }

        let strategy_limit = self.target_debt(record)?;
        let vault_limit = bps_of(self.total_assets()?, self.debt_ratio)?;
        if strategy_limit <= record.total_debt || vault_limit <= self.total_debt {
            return Ok(0);
        }

        let available = (strategy_limit - record.total_debt)
            .min(vault_limit - self.total_debt)
            .min(self.total_idle);

        if available < record.min_debt_per_harvest {
            return Ok(0);
        }
        Ok(available.min(record.max_debt_per_harvest))
    }

    /// Record a deposit and return the shares minted for it
    pub fn deposit(&mut self, amount: u64) -> Result<u64> {
        require!(amount > 0, VaultError::ZeroAmount);
        require!(!self.emergency_shutdown, VaultError::VaultShutdown);

        self.transact(|vault| {
            let new_total = checked_add(vault.total_assets()?, amount)?;
            require!(
                new_total <= vault.deposit_limit,
                VaultError::DepositLimitExceeded
            );

            let shares = vault.calculate_shares(amount)?;
            require!(shares > 0, VaultError::ZeroAmount);

            vault.total_idle = checked_add(vault.total_idle, amount)?;
            vault.total_supply = checked_add(vault.total_supply, shares)?;
            Ok(shares)
        })
    }

    /// Change a strategy's target share of vault assets
    pub fn update_strategy_debt_ratio(
        &mut self,
        auth: &dyn Authorize,
        caller: &Pubkey,
        strategy: &Pubkey,
        debt_ratio: u64,
    ) -> Result<()> {
        require_authorized(auth, caller, Action::TuneStrategy)?;

        self.transact(|vault| {
            let index = vault.strategy_index(strategy)?;
            require!(
                !vault.strategies[index].revoked,
                VaultError::StrategyNotActive
            );

            let others = checked_sub(vault.debt_ratio, vault.strategies[index].debt_ratio)?;
            let new_total = checked_add(others, debt_ratio)?;
            require!(new_total <= MAX_BPS, VaultError::InvariantViolation);

            vault.strategies[index].debt_ratio = debt_ratio;
            vault.debt_ratio = new_total;
            Ok(())
        })
    }

    /// Room left under the deposit limit
    pub fn available_deposit_limit(&self) -> Result<u64> {
        Ok(self.deposit_limit.saturating_sub(self.total_assets()?))
    }

    /// Shares that could be redeemed right now from idle funds and the debt
    /// of queued strategies
    pub fn max_available_shares(&self) -> Result<u64> {
        let mut available = self.total_idle;
        for key in &self.withdrawal_queue {
            available = checked_add(available, self.strategy(key)?.total_debt)?;
        }
        let shares = self.calculate_shares(available)?;
        Ok(shares.min(self.total_supply))
    }

    /// Gain the strategy is expected to report at `now`, extrapolated from
    /// its realized gain rate since activation
    pub fn expected_return(&self, strategy: &Pubkey, now: i64) -> Result<u64> {
        let record = self.strategy(strategy)?;
        let since_last = now.saturating_sub(record.last_report);
        let active_for = record.last_report.saturating_sub(record.activation);
        if since_last <= 0 || active_for <= 0 {
            return Ok(0);
        }

        mul_div(
            record.total_gain,
            since_last as u64,
            active_for as u64,
            Rounding::Floor,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::VaultConfig;

    fn vault() -> VaultState {
        let config = VaultConfig {
            governance: Pubkey::default(),
            management: Pubkey::default(),
            guardian: Pubkey::default(),
            rewards: Pubkey::default(),
            deposit_limit: 10_000,
            management_fee: 0,
            performance_fee: 0,
            health_check: None,
        };
        VaultState::new(&config, Pubkey::default(), Pubkey::default(), 6, 0).unwrap()
    }

    fn record(strategy: Pubkey, debt_ratio: u64, total_debt: u64) -> StrategyParams {
        StrategyParams {
            strategy,
            strategist_rewards: Pubkey::default(),
            performance_fee: 0,
            activation: 0,
            debt_ratio,
            min_debt_per_harvest: 0,
            max_debt_per_harvest: u64::MAX,
            debt_limit: u64::MAX,
            last_report: 0,
            total_debt,
            total_gain: 0,
            total_loss: 0,
            do_health_check: true,
            revoked: false,
        }
    }

    #[test]
    fn test_deposit_mints_at_current_price() {
        let mut vault = vault();
        assert_eq!(vault.deposit(1_000).unwrap(), 1_000);
        vault.total_idle += 1_000; // gain landed in idle
        assert_eq!(vault.deposit(500).unwrap(), 250);
        assert_eq!(vault.total_supply, 1_250);
    }

    #[test]
    fn test_deposit_rejects_limit_and_zero() {
        let mut vault = vault();
        assert!(vault.deposit(0).is_err());
        vault.deposit(10_000).unwrap();
        let err = vault.deposit(1).unwrap_err();
        assert_eq!(
            err,
            anchor_lang::error::Error::from(VaultError::DepositLimitExceeded)
        );
        assert_eq!(vault.total_idle, 10_000);
    }

    #[test]
    fn test_target_debt_capped_by_debt_limit() {
        let mut vault = vault();
        let key = Pubkey::new_unique();
        let mut params = record(key, 5_000, 0);
        params.debt_limit = 100;
        vault.strategies.push(params);
        vault.debt_ratio = 5_000;
        vault.total_idle = 1_000;

        assert_eq!(vault.target_debt(vault.strategy(&key).unwrap()).unwrap(), 100);
        assert_eq!(vault.credit_available(&key).unwrap(), 100);
    }

    #[test]
    fn test_credit_respects_harvest_bounds() {
        let mut vault = vault();
        let key = Pubkey::new_unique();
        let mut params = record(key, 10_000, 0);
        params.max_debt_per_harvest = 300;
        vault.strategies.push(params);
        vault.debt_ratio = 10_000;
        vault.total_idle = 1_000;
        assert_eq!(vault.credit_available(&key).unwrap(), 300);

        vault.strategies[0].min_debt_per_harvest = 2_000;
        assert_eq!(vault.credit_available(&key).unwrap(), 0);
    }

    #[test]
    fn test_debt_outstanding_for_over_target() {
        let mut vault = vault();
        let key = Pubkey::new_unique();
        vault.strategies.push(record(key, 2_500, 800));
        vault.debt_ratio = 2_500;
        vault.total_debt = 800;
        vault.total_idle = 200;

        // target = 1000 * 25% = 250
        assert_eq!(vault.debt_outstanding_for(&key, u64::MAX).unwrap(), 550);

        vault.emergency_shutdown = true;
        assert_eq!(vault.debt_outstanding_for(&key, 600).unwrap(), 600);
        assert_eq!(vault.credit_available(&key).unwrap(), 0);
    }

    #[test]
    fn test_expected_return_extrapolates_gain_rate() {
        let mut vault = vault();
        let key = Pubkey::new_unique();
        let mut params = record(key, 0, 0);
        params.activation = 100;
        params.last_report = 200;
        params.total_gain = 50;
        vault.strategies.push(params);

        assert_eq!(vault.expected_return(&key, 300).unwrap(), 50);
        assert_eq!(vault.expected_return(&key, 200).unwrap(), 0);
    }
}
