mod common;

use anchor_lang::prelude::*;
use common::{strategy_config, vault_error, Harness};
use strategy_vault::{
    constants::{MAX_BPS, SECS_PER_YEAR},
    errors::VaultError,
    ledger::{StrategyAdapter, StrategyReport},
    state::HealthCheckLimits,
};

/// Vault with 1,000 deposited and one strategy holding all of it
fn funded_strategy() -> (Harness, Pubkey) {
    let mut h = Harness::new();
    h.deposit(1_000).unwrap();
    let strategy = h.add_strategy(MAX_BPS);
    h.report(&strategy, 0, 0, 0).unwrap();
    (h, strategy)
}

#[test]
fn test_first_report_allocates_full_ratio() {
    let (h, strategy) = funded_strategy();

    let record = h.vault.strategy(&strategy).unwrap();
    assert_eq!(record.total_debt, 1_000);
    assert_eq!(h.vault.total_idle, 0);
    assert_eq!(h.vault.total_debt, 1_000);
    assert_eq!(h.holdings(&strategy), 1_000);
    assert_eq!(h.bank.borrow().vault, 0);
}

#[test]
fn test_lowering_ratio_creates_outstanding_debt() {
    let (mut h, strategy) = funded_strategy();
    let management = h.roles.management;

    h.vault
        .update_strategy_debt_ratio(&h.roles, &management, &strategy, 5_000)
        .unwrap();

    let adapter = h.adapter(strategy);
    assert_eq!(h.vault.debt_outstanding(&adapter).unwrap(), 500);
    assert_eq!(h.vault.credit_available(&strategy).unwrap(), 0);
}

#[test]
fn test_reported_loss_lowers_debt_and_price() {
    let (mut h, strategy) = funded_strategy();
    let price_before = h.vault.price_per_share().unwrap();

    h.lose(&strategy, 100);
    h.report(&strategy, 0, 100, 0).unwrap();

    let record = h.vault.strategy(&strategy).unwrap();
    assert_eq!(record.total_debt, 900);
    assert_eq!(record.total_loss, 100);
    // ratio shrinks with the loss: 100 / 1_000 of 10_000
    assert_eq!(record.debt_ratio, 9_000);
    assert!(h.vault.price_per_share().unwrap() < price_before);
}

#[test]
fn test_loss_above_debt_is_rejected() {
    let (mut h, strategy) = funded_strategy();

    let err = h.report(&strategy, 0, 1_001, 0).unwrap_err();
    assert_eq!(err, vault_error(VaultError::InvariantViolation));
    assert_eq!(h.vault.strategy(&strategy).unwrap().total_debt, 1_000);
}

#[test]
fn test_withdraw_with_zero_tolerance_rejects_under_delivery() {
    let (mut h, strategy) = funded_strategy();
    let mut adapter = h.adapter(strategy);
    adapter.delivery_bps = 9_990;

    let err = h.withdraw(&mut [adapter], 500, 0).unwrap_err();
    assert_eq!(err, vault_error(VaultError::MaxLossExceeded));

    // ledger untouched
    assert_eq!(h.vault.total_supply, 1_000);
    assert_eq!(h.vault.total_debt, 1_000);
    assert_eq!(h.vault.strategy(&strategy).unwrap().total_loss, 0);
}

#[test]
fn test_withdraw_books_shortfall_against_redeemer() {
    let mut h = Harness::new();
    h.deposit(1_000).unwrap();
    let strategy = h.add_strategy(MAX_BPS);
    h.report(&strategy, 0, 0, 0).unwrap();
    let mut adapter = h.adapter(strategy);
    adapter.delivery_bps = 9_000;

    let outcome = h.withdraw(&mut [adapter], 500, 1_000).unwrap();

    assert_eq!(outcome.shares_burned, 500);
    assert_eq!(outcome.loss, 50);
    assert_eq!(outcome.assets_paid, 450);
    assert_eq!(h.vault.total_supply, 500);
    assert_eq!(h.vault.total_debt, 500);
    assert_eq!(h.vault.total_idle, 0);
    // remaining holders keep a 1:1 price
    assert_eq!(h.vault.calculate_assets(500).unwrap(), 500);
}

#[test]
fn test_shutdown_blocks_deposits_but_collects_debt() {
    let (mut h, strategy) = funded_strategy();
    let guardian = h.roles.guardian;

    h.vault
        .set_emergency_shutdown(&h.roles, &guardian, true)
        .unwrap();

    let err = h.deposit(10).unwrap_err();
    assert_eq!(err, vault_error(VaultError::VaultShutdown));

    let adapter = h.adapter(strategy);
    assert_eq!(h.vault.debt_outstanding(&adapter).unwrap(), 1_000);
    assert_eq!(h.vault.credit_available(&strategy).unwrap(), 0);

    let outcome = h.report(&strategy, 0, 0, 1_000).unwrap();
    assert_eq!(outcome.debt_payment, 1_000);
    assert_eq!(outcome.credit, 0);
    assert_eq!(h.vault.strategy(&strategy).unwrap().total_debt, 0);
    assert_eq!(h.vault.total_idle, 1_000);

    // guardian cannot lift it
    let err = h
        .vault
        .set_emergency_shutdown(&h.roles, &guardian, false)
        .unwrap_err();
    assert_eq!(err, vault_error(VaultError::Unauthorized));
}

#[test]
fn test_migration_requires_position_to_move() {
    let (mut h, old) = funded_strategy();
    let governance = h.governance();
    let new = Pubkey::new_unique();

    let mut stuck = h.adapter(old);
    stuck.migrates = false;
    let err = h
        .vault
        .migrate_strategy(&h.roles, &governance, &mut stuck, new, h.now)
        .unwrap_err();
    assert_eq!(err, vault_error(VaultError::MigrationIncomplete));
    assert_eq!(h.vault.strategy(&old).unwrap().total_debt, 1_000);
    assert!(!h.vault.is_registered(&new));
}

#[test]
fn test_migration_moves_record_and_queue_slot() {
    let (mut h, old) = funded_strategy();
    let other = h.add_strategy(0);
    let governance = h.governance();
    let new = Pubkey::new_unique();

    h.advance(100);
    let mut adapter = h.adapter(old);
    h.vault
        .migrate_strategy(&h.roles, &governance, &mut adapter, new, h.now)
        .unwrap();

    let retired = h.vault.strategy(&old).unwrap();
    assert!(retired.revoked);
    assert_eq!(retired.total_debt, 0);
    assert_eq!(retired.debt_ratio, 0);

    let fresh = h.vault.strategy(&new).unwrap();
    assert_eq!(fresh.total_debt, 1_000);
    assert_eq!(fresh.debt_ratio, MAX_BPS);
    assert_eq!(fresh.activation, h.now);
    assert_eq!(h.vault.withdrawal_queue, vec![new, other]);
    assert_eq!(h.holdings(&new), 1_000);
    assert_eq!(h.adapter(old).total_assets().unwrap(), 0);
}

#[test]
fn test_deposit_then_withdraw_round_trips() {
    let mut h = Harness::new();
    h.deposit(700).unwrap();
    let shares = h.deposit(1_234).unwrap();

    let outcome = h.withdraw(&mut [], shares, 0).unwrap();
    assert_eq!(outcome.assets_paid, 1_234);
    assert_eq!(outcome.loss, 0);
    assert_eq!(h.vault.total_idle, 700);
}

#[test]
fn test_withdraw_pulls_from_queue_in_order() {
    let mut h = Harness::new();
    h.deposit(1_000).unwrap();
    let first = h.add_strategy(4_000);
    let second = h.add_strategy(4_000);
    h.report(&first, 0, 0, 0).unwrap();
    h.report(&second, 0, 0, 0).unwrap();
    assert_eq!(h.vault.total_idle, 200);

    let mut adapters = h.queued_adapters();
    let outcome = h.withdraw(&mut adapters, 500, 0).unwrap();

    assert_eq!(outcome.assets_paid, 500);
    // idle 200 first, then 300 from the head of the queue
    assert_eq!(h.vault.strategy(&first).unwrap().total_debt, 100);
    assert_eq!(h.vault.strategy(&second).unwrap().total_debt, 400);
    assert_eq!(h.vault.total_idle, 0);
}

#[test]
fn test_withdraw_skips_locked_strategy() {
    let mut h = Harness::new();
    h.deposit(1_000).unwrap();
    let locked = h.add_strategy(5_000);
    let liquid = h.add_strategy(5_000);
    h.report(&locked, 0, 0, 0).unwrap();
    h.report(&liquid, 0, 0, 0).unwrap();

    let mut adapters = h.queued_adapters();
    adapters[0].locked = true;
    let outcome = h.withdraw(&mut adapters, 400, 0).unwrap();

    assert_eq!(outcome.assets_paid, 400);
    assert_eq!(h.vault.strategy(&locked).unwrap().total_debt, 500);
    assert_eq!(h.vault.strategy(&liquid).unwrap().total_debt, 100);
}

#[test]
fn test_withdraw_pays_available_when_queue_exhausted() {
    let mut h = Harness::new();
    h.deposit(1_000).unwrap();
    let strategy = h.add_strategy(6_000);
    h.report(&strategy, 0, 0, 0).unwrap();

    let mut adapters = h.queued_adapters();
    adapters[0].locked = true;
    let outcome = h.withdraw(&mut adapters, 1_000, 0).unwrap();

    assert_eq!(outcome.assets_paid, 400);
    assert_eq!(outcome.shares_burned, 400);
    assert_eq!(h.vault.total_supply, 600);
    assert_eq!(h.vault.calculate_assets(600).unwrap(), 600);
}

#[test]
fn test_locked_strategy_keeps_outstanding_debt_without_loss() {
    let (mut h, strategy) = funded_strategy();
    let governance = h.governance();
    h.vault
        .revoke_strategy(&h.roles, &governance, &strategy)
        .unwrap();

    // only part of the position can be freed this cycle
    h.report(&strategy, 0, 0, 300).unwrap();
    let record = h.vault.strategy(&strategy).unwrap();
    assert_eq!(record.total_debt, 700);
    assert_eq!(record.total_loss, 0);
    assert!(h.vault.is_queued(&strategy));

    h.report(&strategy, 0, 0, 700).unwrap();
    assert_eq!(h.vault.strategy(&strategy).unwrap().total_debt, 0);
    assert!(!h.vault.is_queued(&strategy));
}

#[test]
fn test_report_requires_funds_in_custody() {
    let (mut h, strategy) = funded_strategy();
    h.earn(&strategy, 50);
    let adapter = h.adapter(strategy);
    let mut custody = h.custody();
    let health = h.vault.health_check;

    // gain claimed but never transferred
    let err = h
        .vault
        .report(
            &h.roles,
            &strategy,
            &adapter,
            &mut custody,
            &health,
            StrategyReport {
                gain: 50,
                loss: 0,
                debt_payment: 0,
            },
            h.now,
        )
        .unwrap_err();
    assert_eq!(err, vault_error(VaultError::SettlementUnderfunded));
}

#[test]
fn test_repayment_beyond_outstanding_is_booked_to_sender() {
    let mut h = Harness::new();
    h.deposit(1_000).unwrap();
    let a = h.add_strategy(5_000);
    let b = h.add_strategy(5_000);
    h.report(&a, 0, 0, 0).unwrap();
    h.report(&b, 0, 0, 0).unwrap();
    assert_eq!(h.vault.debt_outstanding(&h.adapter(a)).unwrap(), 0);

    // a returns 300 nobody asked for
    let outcome = h.report(&a, 0, 0, 300).unwrap();
    assert_eq!(outcome.debt_payment, 300);
    assert_eq!(outcome.gain, 0);
    assert_eq!(h.vault.strategy(&a).unwrap().total_debt, 200);
    assert_eq!(h.vault.total_idle, 300);
    assert_eq!(h.bank.borrow().vault, h.vault.total_idle);

    // b cannot claim those funds as its own gain
    let adapter = h.adapter(b);
    let mut custody = h.custody();
    let health = h.vault.health_check;
    let err = h
        .vault
        .report(
            &h.roles,
            &b,
            &adapter,
            &mut custody,
            &health,
            StrategyReport {
                gain: 300,
                loss: 0,
                debt_payment: 0,
            },
            h.now,
        )
        .unwrap_err();
    assert_eq!(err, vault_error(VaultError::SettlementUnderfunded));
    assert_eq!(h.vault.strategy(&b).unwrap().total_gain, 0);
    assert_eq!(h.holdings(&b), 500);
}

#[test]
fn test_inflow_beyond_debt_is_recognized_as_gain() {
    let (mut h, strategy) = funded_strategy();
    let governance = h.governance();
    h.vault
        .revoke_strategy(&h.roles, &governance, &strategy)
        .unwrap();

    h.earn(&strategy, 100);
    h.send(&strategy, 100);
    let outcome = h.report(&strategy, 0, 0, 1_000).unwrap();

    assert_eq!(outcome.debt_payment, 1_000);
    assert_eq!(outcome.gain, 100);
    let record = h.vault.strategy(&strategy).unwrap();
    assert_eq!(record.total_debt, 0);
    assert_eq!(record.total_gain, 100);
    assert_eq!(h.vault.total_idle, 1_100);
    assert_eq!(h.bank.borrow().vault, h.vault.total_idle);
    assert!(!h.vault.is_queued(&strategy));
}

#[test]
fn test_only_strategy_may_report() {
    let (mut h, strategy) = funded_strategy();
    let adapter = h.adapter(strategy);
    let mut custody = h.custody();
    let health = h.vault.health_check;
    let governance = h.governance();

    let err = h
        .vault
        .report(
            &h.roles,
            &governance,
            &adapter,
            &mut custody,
            &health,
            Default::default(),
            h.now,
        )
        .unwrap_err();
    assert_eq!(err, vault_error(VaultError::Unauthorized));
}

#[test]
fn test_fees_minted_from_gain() {
    let mut h = Harness::with_config(|config| {
        config.management_fee = 200;
        config.performance_fee = 1_000;
    });
    h.deposit(1_000).unwrap();
    let mut config = strategy_config(MAX_BPS);
    config.performance_fee = 1_000;
    let strategy = h.add_strategy_with(config);
    h.report(&strategy, 0, 0, 0).unwrap();

    h.advance(SECS_PER_YEAR as i64);
    h.earn(&strategy, 100);
    let outcome = h.report(&strategy, 100, 0, 0).unwrap();

    // management 20, strategist 10, performance 10, priced at 1:1
    assert_eq!(outcome.fees.strategist, 10);
    assert_eq!(outcome.fees.vault, 30);
    assert_eq!(h.vault.total_supply, 1_040);
    assert_eq!(h.vault.strategy(&strategy).unwrap().total_gain, 100);
    // gain sits idle until the next cycle
    assert_eq!(outcome.credit, 0);
    assert_eq!(h.vault.total_idle, 100);
    assert!(h.vault.price_per_share().unwrap() > 1_000_000);
}

#[test]
fn test_fees_capped_at_gain() {
    let mut h = Harness::with_config(|config| {
        config.management_fee = 10_000;
        config.performance_fee = 5_000;
    });
    h.deposit(1_000).unwrap();
    let strategy = h.add_strategy(MAX_BPS);
    h.report(&strategy, 0, 0, 0).unwrap();

    h.advance(SECS_PER_YEAR as i64);
    h.earn(&strategy, 10);
    let price_before = h.vault.price_per_share().unwrap();
    let outcome = h.report(&strategy, 10, 0, 0).unwrap();

    assert_eq!(outcome.fees.total(), 10);
    assert!(h.vault.price_per_share().unwrap() >= price_before);
}

#[test]
fn test_no_fees_without_gain() {
    let mut h = Harness::with_config(|config| config.management_fee = 200);
    h.deposit(1_000).unwrap();
    let strategy = h.add_strategy(MAX_BPS);
    h.report(&strategy, 0, 0, 0).unwrap();

    h.advance(SECS_PER_YEAR as i64);
    let outcome = h.report(&strategy, 0, 0, 0).unwrap();
    assert_eq!(outcome.fees.total(), 0);
    assert_eq!(h.vault.total_supply, 1_000);
}

#[test]
fn test_health_check_override_is_one_shot() {
    let mut h = Harness::with_config(|config| {
        config.health_check = Some(HealthCheckLimits {
            profit_limit_bps: 100,
            loss_limit_bps: 1,
        });
    });
    h.deposit(1_000).unwrap();
    let strategy = h.add_strategy(MAX_BPS);
    h.report(&strategy, 0, 0, 0).unwrap();

    h.earn(&strategy, 50);
    let err = h.report(&strategy, 50, 0, 0).unwrap_err();
    assert_eq!(err, vault_error(VaultError::HealthCheckFailed));
    assert_eq!(h.vault.strategy(&strategy).unwrap().total_gain, 0);

    let management = h.roles.management;
    h.vault
        .set_do_health_check(&h.roles, &management, &strategy, false)
        .unwrap();
    let outcome = h.report(&strategy, 50, 0, 0).unwrap();
    assert!(outcome.health_check_skipped);
    assert!(h.vault.strategy(&strategy).unwrap().do_health_check);

    h.earn(&strategy, 50);
    let err = h.report(&strategy, 50, 0, 0).unwrap_err();
    assert_eq!(err, vault_error(VaultError::HealthCheckFailed));
}

#[test]
fn test_add_strategy_rejects_ratio_overflow_and_duplicates() {
    let mut h = Harness::new();
    let governance = h.governance();
    let first = h.add_strategy(6_000);

    let err = h
        .vault
        .add_strategy(
            &h.roles,
            &governance,
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            strategy_config(5_000),
            h.now,
        )
        .unwrap_err();
    assert_eq!(err, vault_error(VaultError::InvariantViolation));

    let err = h
        .vault
        .add_strategy(
            &h.roles,
            &governance,
            first,
            Pubkey::new_unique(),
            strategy_config(0),
            h.now,
        )
        .unwrap_err();
    assert_eq!(err, vault_error(VaultError::StrategyAlreadyExists));

    let management = h.roles.management;
    let err = h
        .vault
        .add_strategy(
            &h.roles,
            &management,
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            strategy_config(0),
            h.now,
        )
        .unwrap_err();
    assert_eq!(err, vault_error(VaultError::Unauthorized));
}

#[test]
fn test_queue_full_rejects_new_strategy() {
    let mut h = Harness::new();
    let governance = h.governance();
    for _ in 0..20 {
        h.add_strategy(0);
    }

    let err = h
        .vault
        .add_strategy(
            &h.roles,
            &governance,
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            strategy_config(0),
            h.now,
        )
        .unwrap_err();
    assert_eq!(err, vault_error(VaultError::QueueFull));
}

#[test]
fn test_revoked_strategy_stays_queued_until_drained() {
    let (mut h, strategy) = funded_strategy();
    let guardian = h.roles.guardian;
    h.vault
        .revoke_strategy(&h.roles, &guardian, &strategy)
        .unwrap();

    assert_eq!(h.vault.debt_ratio, 0);
    assert!(h.vault.is_queued(&strategy));

    let management = h.roles.management;
    let err = h
        .vault
        .update_strategy_debt_ratio(&h.roles, &management, &strategy, 100)
        .unwrap_err();
    assert_eq!(err, vault_error(VaultError::StrategyNotActive));

    let mut adapters = h.queued_adapters();
    h.withdraw(&mut adapters, 1_000, 0).unwrap();
    assert!(!h.vault.is_queued(&strategy));
}

#[test]
fn test_queue_management() {
    let mut h = Harness::new();
    let a = h.add_strategy(0);
    let b = h.add_strategy(0);
    let management = h.roles.management;

    h.vault
        .set_withdrawal_queue(&h.roles, &management, vec![b, a])
        .unwrap();
    assert_eq!(h.vault.withdrawal_queue, vec![b, a]);

    let err = h
        .vault
        .set_withdrawal_queue(&h.roles, &management, vec![b, b])
        .unwrap_err();
    assert_eq!(err, vault_error(VaultError::InvalidQueue));

    let err = h
        .vault
        .set_withdrawal_queue(&h.roles, &management, vec![b, Pubkey::new_unique()])
        .unwrap_err();
    assert_eq!(err, vault_error(VaultError::InvalidQueue));

    h.vault
        .remove_strategy_from_queue(&h.roles, &management, &b)
        .unwrap();
    assert_eq!(h.vault.withdrawal_queue, vec![a]);
    // record survives dequeue
    assert!(h.vault.is_registered(&b));

    h.vault
        .add_strategy_to_queue(&h.roles, &management, &b)
        .unwrap();
    assert_eq!(h.vault.withdrawal_queue, vec![a, b]);

    let err = h
        .vault
        .add_strategy_to_queue(&h.roles, &management, &b)
        .unwrap_err();
    assert_eq!(err, vault_error(VaultError::InvalidQueue));
}

#[test]
fn test_credit_available_is_idempotent() {
    let mut h = Harness::new();
    h.deposit(1_000).unwrap();
    let strategy = h.add_strategy(3_000);

    let first = h.vault.credit_available(&strategy).unwrap();
    let second = h.vault.credit_available(&strategy).unwrap();
    assert_eq!(first, 300);
    assert_eq!(first, second);
}

#[test]
fn test_settlements_commute_across_strategies() {
    let run = |reverse: bool| {
        let mut h = Harness::new();
        h.deposit(1_000).unwrap();
        let a = h.add_strategy(3_000);
        let b = h.add_strategy(5_000);
        let order = if reverse { [b, a] } else { [a, b] };
        for key in order {
            h.report(&key, 0, 0, 0).unwrap();
        }
        (
            h.vault.strategy(&a).unwrap().total_debt,
            h.vault.strategy(&b).unwrap().total_debt,
            h.vault.total_idle,
        )
    };

    assert_eq!(run(false), run(true));
}
