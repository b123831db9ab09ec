use anchor_lang::prelude::*;

use crate::{
    constants::MAX_BPS,
    errors::VaultError,
    ledger::adapter::{AssetCustody, StrategyAdapter},
    math::{checked_add, checked_sub, mul_div, Rounding},
    state::VaultState,
};

/// Result of a redemption
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WithdrawalOutcome {
    pub shares_burned: u64,
    pub assets_paid: u64,
    /// Loss realized from strategy under-delivery, borne by the redeemer
    pub loss: u64,
}

impl VaultState {
    /// Redeem `shares` for assets sent to `recipient`.
    ///
    /// Idle funds pay first. Any remainder is pulled from strategies in
    /// withdrawal-queue order; what a strategy fails to deliver is booked as
    /// realized loss against it and deducted from the payout, so remaining
    /// holders keep their share price. Locked strategies are skipped.
    ///
    /// `adapters` must contain every queued strategy the walk reaches.
    pub fn withdraw<A: StrategyAdapter>(
        &mut self,
        adapters: &mut [A],
        custody: &mut dyn AssetCustody,
        shares: u64,
        recipient: &Pubkey,
        max_loss_bps: u64,
    ) -> Result<WithdrawalOutcome> {
        require!(shares > 0, VaultError::ZeroAmount);
        require!(max_loss_bps <= MAX_BPS, VaultError::InvalidLossTolerance);
        require!(shares <= self.total_supply, VaultError::InsufficientShares);

        self.transact(|vault| {
            let mut shares = shares;
            let assets_before = vault.total_assets()?;
            let supply_before = vault.total_supply;
            let mut value = vault.calculate_assets(shares)?;
            require!(value > 0, VaultError::ZeroAmount);

            let mut total_loss: u64 = 0;
            if value > vault.total_idle {
                let queue = vault.withdrawal_queue.clone();
                for key in queue {
                    if value <= vault.total_idle {
                        break;
                    }

                    let index = vault.strategy_index(&key)?;
                    let amount_needed =
                        (value - vault.total_idle).min(vault.strategies[index].total_debt);
                    if amount_needed == 0 {
                        continue;
                    }

                    let adapter = adapters
                        .iter_mut()
                        .find(|a| a.key() == key)
                        .ok_or(VaultError::MissingStrategyAccounts)?;
                    if adapter.is_locked()? {
                        msg!("Strategy {} locked, skipped", key);
                        continue;
                    }

                    let before = custody.balance()?;
                    adapter.withdraw(amount_needed)?;
                    let delivered = custody.balance()?.saturating_sub(before);

                    let repaid = delivered.min(vault.strategies[index].total_debt);
                    vault.strategies[index].total_debt -= repaid;
                    vault.total_debt = checked_sub(vault.total_debt, repaid)?;
                    vault.total_idle = checked_add(vault.total_idle, delivered)?;

                    let shortfall = amount_needed
                        .saturating_sub(delivered)
                        .min(vault.strategies[index].total_debt);
                    if shortfall > 0 {
                        value -= shortfall;
                        total_loss = checked_add(total_loss, shortfall)?;
                        vault.report_loss(index, shortfall)?;
                    }

                    vault.release_if_drained(index);
                }

                if value > vault.total_idle {
                    // Queue exhausted: pay what idle holds and burn only the
                    // shares matching payout plus loss, at the pre-loss price
                    value = vault.total_idle;
                    shares = mul_div(
                        checked_add(value, total_loss)?,
                        supply_before,
                        assets_before,
                        Rounding::Ceiling,
                    )?
                    .min(shares);
                }
            }

            let tolerated = (max_loss_bps as u128) * (checked_add(value, total_loss)? as u128);
            require!(
                (total_loss as u128) * (MAX_BPS as u128) <= tolerated,
                VaultError::MaxLossExceeded
            );

            vault.total_supply = checked_sub(vault.total_supply, shares)?;
            vault.total_idle = checked_sub(vault.total_idle, value)?;

            if value > 0 {
                custody.transfer_out(recipient, value)?;
            }

            Ok(WithdrawalOutcome {
                shares_burned: shares,
                assets_paid: value,
                loss: total_loss,
            })
        })
    }
}
