//! Batched requests and native payment accounting

mod common;

use bootstrap_core::{AccountId, CollateralAsset, CoreError, MarketId, Operation, OperationResult, Side};
use common::test_constants::*;
use common::*;

fn buy(market: MarketId, collateral_in: u128) -> Operation {
    Operation::Buy { market, side: Side::Yes, collateral_in, min_shares_out: 0, deadline: FAR_DEADLINE }
}

#[test]
fn test_exact_funding_leaves_no_refund() {
    let mut engine = new_engine();
    let market = bootstrap(&mut engine, 2_000_000);

    let outcome = engine
        .multicall(ALICE, vec![buy(market, 10_000), buy(market, 5_000)], 15_000)
        .unwrap();
    assert_eq!(outcome.native_spent, 15_000);
    assert_eq!(outcome.native_refund, 0);
    assert_eq!(outcome.results.len(), 2);
}

#[test]
fn test_excess_funding_refunded() {
    let mut engine = new_engine();
    let market = bootstrap(&mut engine, 2_000_000);

    let outcome = engine
        .multicall(ALICE, vec![buy(market, 10_000), buy(market, 5_000)], 20_000)
        .unwrap();
    assert_eq!(outcome.native_spent, 15_000);
    assert_eq!(outcome.native_refund, 5_000);
}

#[test]
fn test_nested_batches_share_payment() {
    let mut engine = new_engine();
    let market = bootstrap(&mut engine, 2_000_000);

    let nested = Operation::Multicall(vec![
        buy(market, 6_000),
        Operation::DepositToVault { market, side: Side::No, amount: 1_000, deadline: FAR_DEADLINE },
    ]);
    let outcome = engine.multicall(ALICE, vec![buy(market, 4_000), nested], 12_000).unwrap();

    assert_eq!(outcome.native_spent, 10_000);
    assert_eq!(outcome.native_refund, 2_000);
    match &outcome.results[1] {
        OperationResult::Batch(inner) => {
            assert_eq!(inner.len(), 2);
            assert!(matches!(inner[1], OperationResult::Deposited(receipt) if receipt.shares == 1_000));
        }
        other => panic!("expected nested batch, got {other:?}"),
    }

    // The nested buy alone overdraws what the outer buy left
    let nested = Operation::Multicall(vec![buy(market, 6_000)]);
    assert_eq!(
        engine.multicall(ALICE, vec![buy(market, 4_000), nested], 9_999),
        Err(CoreError::InsufficientNativePayment { needed: 10_000, provided: 9_999 })
    );
}

#[test]
fn test_underfunded_batch_rolls_back() {
    let mut engine = new_engine();
    let market = bootstrap(&mut engine, 2_000_000);
    let reserves = engine.pool_reserves(market).unwrap();
    let events = engine.events().len();

    assert_eq!(
        engine.multicall(ALICE, vec![buy(market, 10_000), buy(market, 5_000)], 14_999),
        Err(CoreError::InsufficientNativePayment { needed: 15_000, provided: 14_999 })
    );
    assert_eq!(engine.pool_reserves(market).unwrap(), reserves);
    assert_eq!(engine.events().len(), events);
}

#[test]
fn test_token_market_rejects_native_value() {
    let mut engine = new_engine();
    let mut params = bootstrap_params(2_000_000);
    params.collateral = CollateralAsset::Token(AccountId::repeat(0x77));
    let market = engine.bootstrap_market(CREATOR, params).unwrap().market;

    assert_eq!(
        engine.multicall(ALICE, vec![buy(market, 1_000)], 1),
        Err(CoreError::NativePaymentMismatch)
    );
    let outcome = engine.multicall(ALICE, vec![buy(market, 1_000)], 0).unwrap();
    assert_eq!(outcome.native_spent, 0);
}

#[test]
fn test_bootstrap_and_trade_in_one_batch() {
    let mut engine = new_engine();

    let (result, refund) = engine
        .execute(CREATOR, Operation::BootstrapMarket(bootstrap_params(2_000_000)), 2_000_500)
        .unwrap();
    assert_eq!(refund, 500);
    let OperationResult::Bootstrapped(outcome) = result else {
        panic!("expected bootstrap result, got {result:?}");
    };

    // Sells and oracle updates consume no native value
    let outcome = engine
        .multicall(
            ALICE,
            vec![
                Operation::Sell {
                    market: outcome.market,
                    side: Side::No,
                    shares_in: 1_000,
                    min_collateral_out: 1,
                    deadline: FAR_DEADLINE,
                },
                Operation::UpdateTwapObservation { market: outcome.market },
            ],
            100,
        )
        .unwrap();
    assert_eq!(outcome.native_refund, 100);
    assert_eq!(outcome.results[1], OperationResult::TwapUpdated(false));
}

#[test]
fn test_batch_decoded_from_json() -> anyhow::Result<()> {
    let mut engine = new_engine();
    let market = bootstrap(&mut engine, 2_000_000);

    let request = format!(
        r#"[
            {{"Buy": {{"market": {id}, "side": "Yes", "collateral_in": 1000, "min_shares_out": 0, "deadline": {FAR_DEADLINE}}}}},
            {{"HarvestVaultFees": {{"market": {id}, "side": "No"}}}}
        ]"#,
        id = market.0
    );
    let ops: Vec<Operation> = serde_json::from_str(&request)?;
    assert_eq!(ops[0], buy(market, 1_000));

    let outcome = engine.multicall(ALICE, ops, 1_000)?;
    assert_eq!(outcome.native_refund, 0);
    assert_eq!(outcome.results[1], OperationResult::Harvested(0));
    Ok(())
}
