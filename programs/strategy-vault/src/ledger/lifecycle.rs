use anchor_lang::prelude::*;

use crate::{
    constants::{MAX_BPS, MAX_MANAGEMENT_FEE, MAX_PERFORMANCE_FEE, MAX_QUEUE_LEN, MAX_STRATEGIES},
    errors::VaultError,
    ledger::{
        adapter::StrategyAdapter,
        auth::{require_authorized, Action, Authorize},
    },
    math::checked_add,
    state::{HealthCheckLimits, StrategyParams, VaultState},
};

/// Allocation parameters for a newly registered strategy
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct StrategyConfig {
    pub debt_ratio: u64,
    pub debt_limit: u64,
    pub min_debt_per_harvest: u64,
    pub max_debt_per_harvest: u64,
    pub performance_fee: u64,
}

/// Vault role that can be reassigned
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Governance,
    Management,
    Guardian,
    Rewards,
}

impl VaultState {
    /// Register a strategy and append it to the withdrawal queue
    pub fn add_strategy(
        &mut self,
        auth: &dyn Authorize,
        caller: &Pubkey,
        strategy: Pubkey,
        strategist_rewards: Pubkey,
        config: StrategyConfig,
        now: i64,
    ) -> Result<()> {
        require_authorized(auth, caller, Action::ManageStrategies)?;
        require!(!self.emergency_shutdown, VaultError::VaultShutdown);

        self.transact(|vault| {
            require!(
                vault.withdrawal_queue.len() < MAX_QUEUE_LEN,
                VaultError::QueueFull
            );
            require!(
                !vault.is_registered(&strategy),
                VaultError::StrategyAlreadyExists
            );
            require!(
                vault.strategies.len() < MAX_STRATEGIES,
                VaultError::RegistryFull
            );
            require!(
                config.min_debt_per_harvest <= config.max_debt_per_harvest,
                VaultError::InvalidDebtBounds
            );
            require!(
                config.performance_fee <= MAX_PERFORMANCE_FEE,
                VaultError::InvalidFee
            );

            let new_ratio = checked_add(vault.debt_ratio, config.debt_ratio)?;
            require!(new_ratio <= MAX_BPS, VaultError::InvariantViolation);

            vault.strategies.push(StrategyParams {
                strategy,
                strategist_rewards,
                performance_fee: config.performance_fee,
                activation: now,
                debt_ratio: config.debt_ratio,
                min_debt_per_harvest: config.min_debt_per_harvest,
                max_debt_per_harvest: config.max_debt_per_harvest,
                debt_limit: config.debt_limit,
                last_report: now,
                total_debt: 0,
                total_gain: 0,
                total_loss: 0,
                do_health_check: true,
                revoked: false,
            });
            vault.debt_ratio = new_ratio;
            vault.withdrawal_queue.push(strategy);
            Ok(())
        })
    }

    /// Stop allocating to a strategy. Its full debt becomes outstanding;
    /// it leaves the withdrawal queue once that debt reaches zero.
    pub fn revoke_strategy(
        &mut self,
        auth: &dyn Authorize,
        caller: &Pubkey,
        strategy: &Pubkey,
    ) -> Result<()> {
        require_authorized(auth, caller, Action::Revoke { strategy: *strategy })?;

        self.transact(|vault| {
            let index = vault.strategy_index(strategy)?;
            if vault.strategies[index].revoked {
                return Ok(());
            }

            vault.debt_ratio -= vault.strategies[index].debt_ratio;
            vault.strategies[index].debt_ratio = 0;
            vault.strategies[index].revoked = true;
            vault.release_if_drained(index);
            Ok(())
        })
    }

    /// Drop a revoked strategy from the queue once it owes nothing
    pub(crate) fn release_if_drained(&mut self, index: usize) {
        let record = &self.strategies[index];
        if record.revoked && record.total_debt == 0 {
            let key = record.strategy;
            self.withdrawal_queue.retain(|k| *k != key);
        }
    }

    pub fn add_strategy_to_queue(
        &mut self,
        auth: &dyn Authorize,
        caller: &Pubkey,
        strategy: &Pubkey,
    ) -> Result<()> {
        require_authorized(auth, caller, Action::TuneStrategy)?;

        self.transact(|vault| {
            let record = vault.strategy(strategy)?;
            require!(!record.revoked, VaultError::StrategyNotActive);
            require!(!vault.is_queued(strategy), VaultError::InvalidQueue);
            require!(
                vault.withdrawal_queue.len() < MAX_QUEUE_LEN,
                VaultError::QueueFull
            );
            vault.withdrawal_queue.push(*strategy);
            Ok(())
        })
    }

    /// Stop routing withdrawals to a strategy. Debt and ratio are untouched;
    /// the strategy keeps unwinding through its reports.
    pub fn remove_strategy_from_queue(
        &mut self,
        auth: &dyn Authorize,
        caller: &Pubkey,
        strategy: &Pubkey,
    ) -> Result<()> {
        require_authorized(auth, caller, Action::TuneStrategy)?;

        self.transact(|vault| {
            let position = vault
                .withdrawal_queue
                .iter()
                .position(|k| k == strategy)
                .ok_or(VaultError::StrategyNotFound)?;
            vault.withdrawal_queue.remove(position);
            Ok(())
        })
    }

    /// Reorder the withdrawal queue. `queue` must be a permutation of the
    /// current queue.
    pub fn set_withdrawal_queue(
        &mut self,
        auth: &dyn Authorize,
        caller: &Pubkey,
        queue: Vec<Pubkey>,
    ) -> Result<()> {
        require_authorized(auth, caller, Action::TuneStrategy)?;
        require!(
            queue.len() == self.withdrawal_queue.len(),
            VaultError::InvalidQueue
        );

        self.transact(|vault| {
            for (i, key) in queue.iter().enumerate() {
                require!(vault.is_queued(key), VaultError::InvalidQueue);
                require!(!queue[..i].contains(key), VaultError::InvalidQueue);
            }
            vault.withdrawal_queue = queue;
            Ok(())
        })
    }

    /// Replace `old` with a fresh record for `new_strategy`.
    ///
    /// The old strategy's migrate hook moves the underlying position; the
    /// swap only commits if the old strategy holds nothing afterwards, so a
    /// failed or partial hand-over leaves the old record attributable.
    pub fn migrate_strategy(
        &mut self,
        auth: &dyn Authorize,
        caller: &Pubkey,
        old: &mut dyn StrategyAdapter,
        new_strategy: Pubkey,
        now: i64,
    ) -> Result<()> {
        require_authorized(auth, caller, Action::ManageStrategies)?;
        let old_key = old.key();
        require!(new_strategy != old_key, VaultError::StrategyAlreadyExists);

        self.transact(|vault| {
            let index = vault.strategy_index(&old_key)?;
            require!(
                !vault.strategies[index].revoked,
                VaultError::StrategyNotActive
            );
            require!(
                !vault.is_registered(&new_strategy),
                VaultError::StrategyAlreadyExists
            );
            require!(
                vault.strategies.len() < MAX_STRATEGIES,
                VaultError::RegistryFull
            );

            old.migrate(&new_strategy)?;
            require!(old.total_assets()? == 0, VaultError::MigrationIncomplete);

            let previous = vault.strategies[index].clone();
            vault.strategies.push(StrategyParams {
                strategy: new_strategy,
                activation: now,
                do_health_check: true,
                revoked: false,
                ..previous
            });

            let retired = &mut vault.strategies[index];
            retired.debt_ratio = 0;
            retired.total_debt = 0;
            retired.total_gain = 0;
            retired.total_loss = 0;
            retired.revoked = true;

            match vault.withdrawal_queue.iter().position(|k| *k == old_key) {
                Some(position) => vault.withdrawal_queue[position] = new_strategy,
                None => {
                    require!(
                        vault.withdrawal_queue.len() < MAX_QUEUE_LEN,
                        VaultError::QueueFull
                    );
                    vault.withdrawal_queue.push(new_strategy);
                }
            }
            Ok(())
        })
    }

    /// Toggle the vault-wide emergency switch. While active no credit is
    /// extended and deposits are refused; existing debt is collected through
    /// normal reports.
    pub fn set_emergency_shutdown(
        &mut self,
        auth: &dyn Authorize,
        caller: &Pubkey,
        active: bool,
    ) -> Result<()> {
        let action = if active {
            Action::ActivateShutdown
        } else {
            Action::DeactivateShutdown
        };
        require_authorized(auth, caller, action)?;
        self.emergency_shutdown = active;
        Ok(())
    }

    pub fn update_strategy_min_debt_per_harvest(
        &mut self,
        auth: &dyn Authorize,
        caller: &Pubkey,
        strategy: &Pubkey,
        amount: u64,
    ) -> Result<()> {
        require_authorized(auth, caller, Action::TuneStrategy)?;
        let index = self.strategy_index(strategy)?;
        require!(
            amount <= self.strategies[index].max_debt_per_harvest,
            VaultError::InvalidDebtBounds
        );
        self.strategies[index].min_debt_per_harvest = amount;
        Ok(())
    }

    pub fn update_strategy_max_debt_per_harvest(
        &mut self,
        auth: &dyn Authorize,
        caller: &Pubkey,
        strategy: &Pubkey,
        amount: u64,
    ) -> Result<()> {
        require_authorized(auth, caller, Action::TuneStrategy)?;
        let index = self.strategy_index(strategy)?;
        require!(
            amount >= self.strategies[index].min_debt_per_harvest,
            VaultError::InvalidDebtBounds
        );
        self.strategies[index].max_debt_per_harvest = amount;
        Ok(())
    }

    pub fn update_strategy_debt_limit(
        &mut self,
        auth: &dyn Authorize,
        caller: &Pubkey,
        strategy: &Pubkey,
        debt_limit: u64,
    ) -> Result<()> {
        require_authorized(auth, caller, Action::TuneStrategy)?;
        let index = self.strategy_index(strategy)?;
        self.strategies[index].debt_limit = debt_limit;
        Ok(())
    }

    pub fn update_strategy_performance_fee(
        &mut self,
        auth: &dyn Authorize,
        caller: &Pubkey,
        strategy: &Pubkey,
        fee: u64,
    ) -> Result<()> {
        require_authorized(auth, caller, Action::ConfigureVault)?;
        require!(fee <= MAX_PERFORMANCE_FEE, VaultError::InvalidFee);
        let index = self.strategy_index(strategy)?;
        self.strategies[index].performance_fee = fee;
        Ok(())
    }

    /// Disable the health check for the strategy's next report only
    pub fn set_do_health_check(
        &mut self,
        auth: &dyn Authorize,
        caller: &Pubkey,
        strategy: &Pubkey,
        enabled: bool,
    ) -> Result<()> {
        require_authorized(auth, caller, Action::TuneStrategy)?;
        let index = self.strategy_index(strategy)?;
        self.strategies[index].do_health_check = enabled;
        Ok(())
    }

    pub fn set_health_check(
        &mut self,
        auth: &dyn Authorize,
        caller: &Pubkey,
        limits: Option<HealthCheckLimits>,
    ) -> Result<()> {
        require_authorized(auth, caller, Action::ConfigureVault)?;
        if let Some(limits) = limits {
            limits.validate()?;
        }
        self.health_check = limits;
        Ok(())
    }

    pub fn set_deposit_limit(
        &mut self,
        auth: &dyn Authorize,
        caller: &Pubkey,
        limit: u64,
    ) -> Result<()> {
        require_authorized(auth, caller, Action::ConfigureVault)?;
        self.deposit_limit = limit;
        Ok(())
    }

    pub fn set_management_fee(
        &mut self,
        auth: &dyn Authorize,
        caller: &Pubkey,
        fee: u64,
    ) -> Result<()> {
        require_authorized(auth, caller, Action::ConfigureVault)?;
        require!(fee <= MAX_MANAGEMENT_FEE, VaultError::InvalidFee);
        self.management_fee = fee;
        Ok(())
    }

    pub fn set_performance_fee(
        &mut self,
        auth: &dyn Authorize,
        caller: &Pubkey,
        fee: u64,
    ) -> Result<()> {
        require_authorized(auth, caller, Action::ConfigureVault)?;
        require!(fee <= MAX_PERFORMANCE_FEE, VaultError::InvalidFee);
        self.performance_fee = fee;
        Ok(())
    }

    pub fn set_role(
        &mut self,
        auth: &dyn Authorize,
        caller: &Pubkey,
        role: Role,
        key: Pubkey,
    ) -> Result<()> {
        require_authorized(auth, caller, Action::ConfigureVault)?;
        match role {
            Role::Governance => self.governance = key,
            Role::Management => self.management = key,
            Role::Guardian => self.guardian = key,
            Role::Rewards => self.rewards = key,
        }
        Ok(())
    }
}
