use anchor_lang::prelude::*;

use crate::{
    constants::MAX_BPS,
    ledger::settlement::StrategyReport,
    state::{HealthCheckLimits, StrategyParams},
};

/// Capabilities the ledger needs from a strategy it allocates capital to.
///
/// Every number a strategy returns is untrusted. The ledger only uses
/// `total_assets` as an upper-bound hint and measures real transfers through
/// [`AssetCustody::balance`].
pub trait StrategyAdapter {
    /// Stable identifier, the key of the strategy's ledger record
    fn key(&self) -> Pubkey;

    /// Assets the strategy claims to hold
    fn total_assets(&self) -> Result<u64>;

    /// Ask the strategy to free `amount` into vault custody.
    /// Returns the amount the strategy claims to have sent.
    fn withdraw(&mut self, amount: u64) -> Result<u64>;

    /// Hand the underlying position over to `new_strategy`
    fn migrate(&mut self, new_strategy: &Pubkey) -> Result<()>;

    /// Whether the strategy's funds are provably inaccessible right now
    fn is_locked(&self) -> Result<bool> {
        Ok(false)
    }
}

/// The vault's own token holdings
pub trait AssetCustody {
    /// Actual token balance held by the vault
    fn balance(&self) -> Result<u64>;

    /// Send `amount` out of the vault to `destination`
    fn transfer_out(&mut self, destination: &Pubkey, amount: u64) -> Result<()>;
}

/// Judges whether a strategy report is plausible
pub trait HealthCheck {
    fn check(&self, strategy: &StrategyParams, report: &StrategyReport, debt_outstanding: u64)
        -> bool;
}

impl HealthCheck for HealthCheckLimits {
    fn check(
        &self,
        strategy: &StrategyParams,
        report: &StrategyReport,
        _debt_outstanding: u64,
    ) -> bool {
        let debt = strategy.total_debt as u128;
        let within = |amount: u64, limit_bps: u64| {
            (amount as u128) * (MAX_BPS as u128) <= debt * (limit_bps as u128)
        };

        within(report.gain, self.profit_limit_bps) && within(report.loss, self.loss_limit_bps)
    }
}

/// No limits configured means every report passes
impl HealthCheck for Option<HealthCheckLimits> {
    fn check(&self, strategy: &StrategyParams, report: &StrategyReport, debt_outstanding: u64)
        -> bool {
        match self {
            Some(limits) => limits.check(strategy, report, debt_outstanding),
            None => true,
        }
    }
}
