//! Vault deposit, withdrawal and harvest timing

mod common;

use bootstrap_core::{ClockSnapshot, CoreError, EngineEvent, Side};
use common::test_constants::*;
use common::*;

const COOLDOWN: i64 = 21_600;

fn at(ts: i64) -> ClockSnapshot {
    ClockSnapshot::new(START_SLOT + (ts - START_TS) as u64, ts)
}

#[test]
fn test_withdraw_cooldown_boundary() {
    let mut engine = new_engine();
    let market = bootstrap(&mut engine, 2_000_000);
    let receipt = engine.deposit_to_vault(BOB, market, Side::Yes, 1_000, FAR_DEADLINE).unwrap();
    assert_eq!(receipt.shares, 1_000);

    engine.set_clock(at(START_TS + COOLDOWN - 1));
    assert_eq!(
        engine.withdraw_from_vault(BOB, market, Side::Yes, 1_000, FAR_DEADLINE),
        Err(CoreError::WithdrawalTooSoon { available_at: START_TS + COOLDOWN })
    );

    engine.set_clock(at(START_TS + COOLDOWN + 1));
    let withdrawn = engine.withdraw_from_vault(BOB, market, Side::Yes, 1_000, FAR_DEADLINE).unwrap();
    assert_eq!(withdrawn.redeemed, 1_000);
    assert_eq!(withdrawn.harvested, 0);
    assert!(engine.vault(market).unwrap().ledger(Side::Yes).position(&BOB).is_none());
    assert!(matches!(
        engine.events().last(),
        Some(EngineEvent::VaultWithdrawn { shares: 1_000, redeemed: 1_000, .. })
    ));
}

#[test]
fn test_redeposit_restarts_cooldown() {
    let mut engine = new_engine();
    let market = bootstrap(&mut engine, 2_000_000);
    engine.deposit_to_vault(BOB, market, Side::No, 1_000, FAR_DEADLINE).unwrap();

    engine.set_clock(at(START_TS + COOLDOWN - 100));
    engine.deposit_to_vault(BOB, market, Side::No, 1_000, FAR_DEADLINE).unwrap();

    engine.set_clock(at(START_TS + COOLDOWN + 1));
    assert_eq!(
        engine.withdraw_from_vault(BOB, market, Side::No, 500, FAR_DEADLINE),
        Err(CoreError::WithdrawalTooSoon { available_at: START_TS + 2 * COOLDOWN - 100 })
    );
}

#[test]
fn test_withdraw_errors() {
    let mut engine = new_engine();
    let market = bootstrap(&mut engine, 2_000_000);
    engine.deposit_to_vault(BOB, market, Side::Yes, 1_000, FAR_DEADLINE).unwrap();
    engine.set_clock(at(START_TS + COOLDOWN));

    assert_eq!(
        engine.withdraw_from_vault(BOB, market, Side::Yes, 0, FAR_DEADLINE),
        Err(CoreError::ZeroVaultShares)
    );
    assert_eq!(
        engine.withdraw_from_vault(ALICE, market, Side::Yes, 1, FAR_DEADLINE),
        Err(CoreError::PositionNotFound)
    );
    assert_eq!(
        engine.withdraw_from_vault(BOB, market, Side::Yes, 1_001, FAR_DEADLINE),
        Err(CoreError::InsufficientVaultShares { requested: 1_001, balance: 1_000 })
    );
    assert_eq!(
        engine.withdraw_from_vault(BOB, market, Side::Yes, 1_000, START_TS),
        Err(CoreError::DeadlineExpired)
    );
    assert_eq!(
        engine.deposit_to_vault(BOB, market, Side::Yes, 0, FAR_DEADLINE),
        Err(CoreError::ZeroShares)
    );
}

#[test]
fn test_deposits_stop_at_close_but_cooldown_still_applies() {
    let mut engine = new_engine();
    let market = bootstrap(&mut engine, 2_000_000);

    engine.set_clock(at(CLOSE_TS - 100));
    engine.deposit_to_vault(ALICE, market, Side::Yes, 5_000, FAR_DEADLINE).unwrap();

    engine.set_clock(at(CLOSE_TS + 100));
    assert_eq!(
        engine.deposit_to_vault(BOB, market, Side::Yes, 5_000, FAR_DEADLINE),
        Err(CoreError::MarketClosed)
    );
    assert_eq!(
        engine.withdraw_from_vault(ALICE, market, Side::Yes, 5_000, FAR_DEADLINE),
        Err(CoreError::WithdrawalTooSoon { available_at: CLOSE_TS - 100 + COOLDOWN })
    );

    // The creator's bootstrap position is long past its cooldown
    let withdrawn = engine.withdraw_from_vault(CREATOR, market, Side::Yes, 1_000_000, FAR_DEADLINE).unwrap();
    assert_eq!(withdrawn.redeemed, 1_000_000);
}

#[test]
fn test_harvest_without_position_is_noop() {
    let mut engine = new_engine();
    let market = bootstrap(&mut engine, 2_000_000);
    let events = engine.events().len();

    assert_eq!(engine.harvest_vault_fees(ALICE, market, Side::No), Ok(0));
    assert_eq!(engine.events().len(), events);
    assert_eq!(
        engine.harvest_vault_fees(ALICE, bootstrap_core::MarketId(99), Side::No),
        Err(CoreError::MarketNotFound)
    );
}
