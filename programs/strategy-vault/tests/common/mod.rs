//! In-memory strategies and custody for driving the ledger off-chain

#![allow(dead_code)]

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use anchor_lang::prelude::*;
use strategy_vault::{
    constants::MAX_BPS,
    errors::VaultError,
    ledger::{
        AssetCustody, SettlementOutcome, StrategyAdapter, StrategyConfig, StrategyReport,
        VaultRoles, WithdrawalOutcome,
    },
    state::{HealthCheckLimits, VaultConfig, VaultState},
};

pub const START: i64 = 1_700_000_000;

/// Token balances of the vault and everyone it pays
#[derive(Default)]
pub struct Bank {
    pub vault: u64,
    pub accounts: HashMap<Pubkey, u64>,
}

impl Bank {
    pub fn balance_of(&self, key: &Pubkey) -> u64 {
        self.accounts.get(key).copied().unwrap_or(0)
    }
}

pub type SharedBank = Rc<RefCell<Bank>>;

pub struct MockCustody {
    pub bank: SharedBank,
}

impl AssetCustody for MockCustody {
    fn balance(&self) -> Result<u64> {
        Ok(self.bank.borrow().vault)
    }

    fn transfer_out(&mut self, destination: &Pubkey, amount: u64) -> Result<()> {
        let mut bank = self.bank.borrow_mut();
        bank.vault = bank
            .vault
            .checked_sub(amount)
            .ok_or(VaultError::InvariantViolation)?;
        *bank.accounts.entry(*destination).or_default() += amount;
        Ok(())
    }
}

/// Strategy whose holdings live in the bank under its own key
pub struct MockStrategy {
    pub key: Pubkey,
    pub bank: SharedBank,
    /// Share of each requested withdrawal that actually arrives; the rest is lost
    pub delivery_bps: u64,
    pub locked: bool,
    /// Whether the migrate hook moves the position
    pub migrates: bool,
}

impl MockStrategy {
    pub fn new(key: Pubkey, bank: SharedBank) -> Self {
        Self {
            key,
            bank,
            delivery_bps: MAX_BPS,
            locked: false,
            migrates: true,
        }
    }
}

impl StrategyAdapter for MockStrategy {
    fn key(&self) -> Pubkey {
        self.key
    }

    fn total_assets(&self) -> Result<u64> {
        Ok(self.bank.borrow().balance_of(&self.key))
    }

    fn withdraw(&mut self, amount: u64) -> Result<u64> {
        let mut bank = self.bank.borrow_mut();
        let held = bank.balance_of(&self.key);
        let freed = amount.min(held);
        let delivered = freed * self.delivery_bps / MAX_BPS;
        bank.accounts.insert(self.key, held - freed);
        bank.vault += delivered;
        Ok(delivered)
    }

    fn migrate(&mut self, new_strategy: &Pubkey) -> Result<()> {
        if !self.migrates {
            return Ok(());
        }
        let mut bank = self.bank.borrow_mut();
        let held = bank.accounts.remove(&self.key).unwrap_or(0);
        *bank.accounts.entry(*new_strategy).or_default() += held;
        Ok(())
    }

    fn is_locked(&self) -> Result<bool> {
        Ok(self.locked)
    }
}

pub fn config(roles: &VaultRoles, rewards: Pubkey) -> VaultConfig {
    VaultConfig {
        governance: roles.governance,
        management: roles.management,
        guardian: roles.guardian,
        rewards,
        deposit_limit: u64::MAX,
        management_fee: 0,
        performance_fee: 0,
        health_check: None,
    }
}

pub fn strategy_config(debt_ratio: u64) -> StrategyConfig {
    StrategyConfig {
        debt_ratio,
        debt_limit: u64::MAX,
        min_debt_per_harvest: 0,
        max_debt_per_harvest: u64::MAX,
        performance_fee: 0,
    }
}

/// A vault ledger wired to an in-memory bank
pub struct Harness {
    pub vault: VaultState,
    pub bank: SharedBank,
    pub roles: VaultRoles,
    pub now: i64,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(tweak: impl FnOnce(&mut VaultConfig)) -> Self {
        let roles = VaultRoles {
            governance: Pubkey::new_unique(),
            management: Pubkey::new_unique(),
            guardian: Pubkey::new_unique(),
        };
        let mut config = config(&roles, Pubkey::new_unique());
        tweak(&mut config);
        let vault =
            VaultState::new(&config, Pubkey::new_unique(), Pubkey::new_unique(), 6, START)
                .unwrap();

        Self {
            vault,
            bank: SharedBank::default(),
            roles,
            now: START,
        }
    }

    pub fn governance(&self) -> Pubkey {
        self.roles.governance
    }

    pub fn advance(&mut self, seconds: i64) {
        self.now += seconds;
    }

    pub fn custody(&self) -> MockCustody {
        MockCustody {
            bank: self.bank.clone(),
        }
    }

    pub fn adapter(&self, key: Pubkey) -> MockStrategy {
        MockStrategy::new(key, self.bank.clone())
    }

    pub fn deposit(&mut self, amount: u64) -> Result<u64> {
        let shares = self.vault.deposit(amount)?;
        self.bank.borrow_mut().vault += amount;
        Ok(shares)
    }

    pub fn add_strategy(&mut self, debt_ratio: u64) -> Pubkey {
        self.add_strategy_with(strategy_config(debt_ratio))
    }

    pub fn add_strategy_with(&mut self, config: StrategyConfig) -> Pubkey {
        let key = Pubkey::new_unique();
        let governance = self.governance();
        self.vault
            .add_strategy(
                &self.roles,
                &governance,
                key,
                Pubkey::new_unique(),
                config,
                self.now,
            )
            .unwrap();
        key
    }

    pub fn holdings(&self, strategy: &Pubkey) -> u64 {
        self.bank.borrow().balance_of(strategy)
    }

    /// Strategy generates `amount` of yield on its position
    pub fn earn(&mut self, strategy: &Pubkey, amount: u64) {
        *self.bank.borrow_mut().accounts.entry(*strategy).or_default() += amount;
    }

    /// Strategy loses `amount` of its position
    pub fn lose(&mut self, strategy: &Pubkey, amount: u64) {
        let mut bank = self.bank.borrow_mut();
        let held = bank.accounts.entry(*strategy).or_default();
        *held -= amount;
    }

    /// Strategy moves `amount` into vault custody without reporting it
    pub fn send(&mut self, strategy: &Pubkey, amount: u64) {
        let mut bank = self.bank.borrow_mut();
        *bank.accounts.entry(*strategy).or_default() -= amount;
        bank.vault += amount;
    }

    /// Strategy sends `gain + debt_payment` to the vault, then reports
    pub fn report(
        &mut self,
        strategy: &Pubkey,
        gain: u64,
        loss: u64,
        debt_payment: u64,
    ) -> Result<SettlementOutcome> {
        let adapter = self.adapter(*strategy);
        self.report_with_adapter(&adapter, gain, loss, debt_payment)
    }

    pub fn report_with_adapter(
        &mut self,
        adapter: &MockStrategy,
        gain: u64,
        loss: u64,
        debt_payment: u64,
    ) -> Result<SettlementOutcome> {
        let key = adapter.key;
        let sent = gain + debt_payment;
        {
            let mut bank = self.bank.borrow_mut();
            let held = bank.accounts.entry(key).or_default();
            *held -= sent;
            bank.vault += sent;
        }

        let health: Option<HealthCheckLimits> = self.vault.health_check;
        let mut custody = self.custody();
        let result = self.vault.report(
            &self.roles,
            &key,
            adapter,
            &mut custody,
            &health,
            StrategyReport {
                gain,
                loss,
                debt_payment,
            },
            self.now,
        );

        if result.is_err() {
            let mut bank = self.bank.borrow_mut();
            bank.vault -= sent;
            *bank.accounts.entry(key).or_default() += sent;
        }
        result
    }

    pub fn withdraw(
        &mut self,
        adapters: &mut [MockStrategy],
        shares: u64,
        max_loss_bps: u64,
    ) -> Result<WithdrawalOutcome> {
        let recipient = Pubkey::new_unique();
        let mut custody = self.custody();
        self.vault
            .withdraw(adapters, &mut custody, shares, &recipient, max_loss_bps)
    }

    /// Adapters for every queued strategy, in queue order
    pub fn queued_adapters(&self) -> Vec<MockStrategy> {
        self.vault
            .withdrawal_queue
            .iter()
            .map(|key| self.adapter(*key))
            .collect()
    }
}

pub fn vault_error(err: VaultError) -> anchor_lang::error::Error {
    anchor_lang::error::Error::from(err)
}
