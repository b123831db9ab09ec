use anchor_lang::prelude::*;

use crate::{
    constants::{MAX_BPS, SECS_PER_YEAR},
    errors::VaultError,
    ledger::{
        adapter::{AssetCustody, HealthCheck, StrategyAdapter},
        auth::{require_authorized, Action, Authorize},
    },
    math::{bps_of, checked_add, checked_sub, mul_div, Rounding},
    state::VaultState,
};

/// Figures a strategy reports for one settlement cycle, measured by the
/// strategy against its last recorded debt
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StrategyReport {
    pub gain: u64,
    pub loss: u64,
    pub debt_payment: u64,
}

/// Fee shares minted during a report
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeeShares {
    /// Minted to the strategy's strategist rewards account
    pub strategist: u64,
    /// Management and performance fees minted to the vault rewards account
    pub vault: u64,
}

impl FeeShares {
    pub fn total(&self) -> u64 {
        self.strategist.saturating_add(self.vault)
    }
}

/// What a report changed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SettlementOutcome {
    /// Gain recognized, including any inflow beyond the strategy's debt
    pub gain: u64,
    pub loss: u64,
    /// Debt payment applied: the reported payment up to the outstanding
    /// debt, plus any surplus inflow up to the strategy's remaining debt
    pub debt_payment: u64,
    /// Funds sent from idle to the strategy
    pub credit: u64,
    /// Debt still demanded back after this cycle
    pub debt_outstanding: u64,
    pub fees: FeeShares,
    pub health_check_skipped: bool,
}

impl VaultState {
    /// Run one settlement cycle for the strategy behind `adapter`.
    ///
    /// The strategy must have moved `gain + debt_payment` into vault custody
    /// before calling; the inflow is measured against the recorded idle
    /// balance, never taken from the report. Every unbooked token in custody
    /// is settled by this report, so the health check judges the settled
    /// figures. The cycle is atomic: any error leaves the ledger unchanged.
    #[allow(clippy::too_many_arguments)]
    pub fn report(
        &mut self,
        auth: &dyn Authorize,
        caller: &Pubkey,
        adapter: &dyn StrategyAdapter,
        custody: &mut dyn AssetCustody,
        health: &dyn HealthCheck,
        report: StrategyReport,
        now: i64,
    ) -> Result<SettlementOutcome> {
        let key = adapter.key();
        require_authorized(auth, caller, Action::Report { strategy: key })?;

        self.transact(|vault| {
            let index = vault.strategy_index(&key)?;

            // Funds the strategy already moved into custody still count as
            // its holdings when bounding the debt it can repay
            let unaccounted = checked_sub(custody.balance()?, vault.total_idle)?;
            let holdings = adapter.total_assets()?.saturating_add(unaccounted);
            let record_before = vault.strategies[index].clone();
            let outstanding_before = vault.debt_outstanding_for(&key, holdings)?;

            if report.loss > 0 {
                vault.report_loss(index, report.loss)?;
            }

            let debt = vault.debt_outstanding_for(&key, holdings)?;
            let requested_payment = report.debt_payment.min(debt);
            let inflow = checked_add(report.gain, requested_payment)?;
            require!(unaccounted >= inflow, VaultError::SettlementUnderfunded);

            // Nothing in custody stays unbooked: a surplus first repays the
            // rest of this strategy's debt, whatever remains is its gain
            let surplus = unaccounted - inflow;
            let remaining_debt =
                checked_sub(vault.strategies[index].total_debt, requested_payment)?;
            let extra_payment = surplus.min(remaining_debt);
            let settled = StrategyReport {
                gain: checked_add(report.gain, surplus - extra_payment)?,
                loss: report.loss,
                debt_payment: requested_payment + extra_payment,
            };

            let health_check_skipped = if record_before.do_health_check {
                require!(
                    health.check(&record_before, &settled, outstanding_before),
                    VaultError::HealthCheckFailed
                );
                false
            } else {
                msg!("Health check skipped for strategy {}", key);
                vault.strategies[index].do_health_check = true;
                true
            };

            let fees = vault.assess_fees(index, settled.gain, now)?;
            let credit = vault.credit_available(&key)?;

            {
                let record = &mut vault.strategies[index];
                record.total_gain = checked_add(record.total_gain, settled.gain)?;
                record.total_debt = checked_sub(record.total_debt, settled.debt_payment)?;
                record.total_debt = checked_add(record.total_debt, credit)?;
                record.last_report = now;
            }
            vault.total_debt = checked_sub(vault.total_debt, settled.debt_payment)?;
            vault.total_debt = checked_add(vault.total_debt, credit)?;
            vault.total_idle = checked_add(vault.total_idle, unaccounted)?;
            vault.total_idle = checked_sub(vault.total_idle, credit)?;
            vault.last_report = now;

            if credit > 0 {
                custody.transfer_out(&key, credit)?;
            }
            vault.release_if_drained(index);

            Ok(SettlementOutcome {
                gain: settled.gain,
                loss: settled.loss,
                debt_payment: settled.debt_payment,
                credit,
                debt_outstanding: vault.debt_outstanding(adapter)?,
                fees,
                health_check_skipped,
            })
        })
    }

    /// Book a realized loss against a strategy.
    ///
    /// The strategy's ratio shrinks in proportion to the loss so the other
    /// strategies keep their allocation of the now smaller vault.
    pub(crate) fn report_loss(&mut self, index: usize, loss: u64) -> Result<()> {
        let strategy_debt = self.strategies[index].total_debt;
        require!(loss <= strategy_debt, VaultError::InvariantViolation);
        if loss == 0 {
            return Ok(());
        }

        if self.debt_ratio != 0 {
            let ratio_change = mul_div(loss, self.debt_ratio, self.total_debt, Rounding::Floor)?
                .min(self.strategies[index].debt_ratio);
            self.strategies[index].debt_ratio -= ratio_change;
            self.debt_ratio = checked_sub(self.debt_ratio, ratio_change)?;
        }

        let record = &mut self.strategies[index];
        record.total_loss = checked_add(record.total_loss, loss)?;
        record.total_debt = strategy_debt - loss;
        self.total_debt = checked_sub(self.total_debt, loss)?;

        msg!("Strategy {} realized loss {}", record.strategy, loss);
        Ok(())
    }

    /// Mint fee shares for a report with `gain`.
    ///
    /// Management fee accrues on debt over the time since the last report;
    /// strategist and vault performance fees are a share of the gain. The
    /// total never exceeds the gain, so fees cannot lower the share price.
    /// Shares are priced before the gain is recognized.
    pub(crate) fn assess_fees(&mut self, index: usize, gain: u64, now: i64) -> Result<FeeShares> {
        let record = &self.strategies[index];
        if gain == 0 || record.activation == now {
            return Ok(FeeShares::default());
        }

        let duration = now.saturating_sub(record.last_report).max(0) as u128;
        let management_fee = (record.total_debt as u128)
            .checked_mul(duration)
            .and_then(|v| v.checked_mul(self.management_fee as u128))
            .ok_or(VaultError::MathOverflow)?
            / ((MAX_BPS as u128) * (SECS_PER_YEAR as u128));
        let mut management_fee =
            u64::try_from(management_fee).map_err(|_| error!(VaultError::MathOverflow))?;

        let strategist_fee = bps_of(gain, record.performance_fee)?;
        let performance_fee = bps_of(gain, self.performance_fee)?;

        let mut total_fee = checked_add(
            checked_add(management_fee, strategist_fee)?,
            performance_fee,
        )?;
        if total_fee > gain {
            total_fee = gain;
            management_fee = gain.saturating_sub(strategist_fee + performance_fee);
        }
        if total_fee == 0 {
            return Ok(FeeShares::default());
        }

        let reward = self.calculate_shares(total_fee)?;
        let strategist = if strategist_fee > 0 {
            mul_div(reward, strategist_fee, total_fee, Rounding::Floor)?
        } else {
            0
        };
        self.total_supply = checked_add(self.total_supply, reward)?;

        msg!(
            "Fees: management {} strategist {} performance {}",
            management_fee,
            strategist_fee,
            performance_fee
        );

        Ok(FeeShares {
            strategist,
            vault: reward - strategist,
        })
    }
}
