//! Router, vault and fee curve scenarios

use crate::report::{pct, wad, Table};
use anyhow::Result;
use bootstrap_core::collaborators::{ExternalVenue, MemoryBook, MemoryRegistry, MemoryVenue};
use bootstrap_core::fees::{DecayCurve, FeeConfig, FeeContext, FeeCurve, SkewCurve};
use bootstrap_core::router::{max_input_under_impact, price_impact_bps, reserves_after_swap};
use bootstrap_core::{
    AccountId, BootstrapParams, ClockSnapshot, CollateralAsset, Engine, EngineConfig, MarketId, PoolId,
    PoolReserves, Side, BPS_DENOMINATOR,
};
use tracing::{debug, info};

const START: i64 = 1_700_000_000;
const HOUR: i64 = 3_600;
const CREATOR: AccountId = AccountId::repeat(1);
const DEPOSITOR: AccountId = AccountId::repeat(2);
const TRADER: AccountId = AccountId::repeat(3);

const DEPTHS: [u128; 3] = [10_000, 100_000, 1_000_000];

type SimEngine = Engine<MemoryVenue, MemoryRegistry, MemoryBook>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    PriceImpact,
    MaxTrade,
    MultiVenue,
    FeeDecay,
    SkewFee,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::PriceImpact,
        Scenario::MaxTrade,
        Scenario::MultiVenue,
        Scenario::FeeDecay,
        Scenario::SkewFee,
    ];

    pub fn run(self, config: &EngineConfig) -> Result<Table> {
        info!(scenario = ?self, "running scenario");
        match self {
            Scenario::PriceImpact => price_impact(config),
            Scenario::MaxTrade => max_trade(config),
            Scenario::MultiVenue => multi_venue(config),
            Scenario::FeeDecay => fee_decay(config),
            Scenario::SkewFee => skew_fee(config),
        }
    }
}

fn pool(depth: u128) -> Result<(MemoryVenue, PoolId)> {
    let mut venue = MemoryVenue::new();
    let pool = venue.create_pool(MarketId(1), PoolReserves::new(depth, depth))?;
    Ok((venue, pool))
}

/// Impact of buying YES with a share of pool depth, swapping NO in
fn price_impact(config: &EngineConfig) -> Result<Table> {
    let fee = config.fees.min_fee_bps;
    let mut table = Table::new("price impact vs trade size", &["depth", "size", "size/depth", "p_yes after", "impact"]);

    for depth in DEPTHS {
        let (venue, pool) = pool(depth)?;
        let before = venue.reserves(pool)?;
        for fraction_bps in [100u128, 500, 1_000, 2_500, 5_000] {
            let size = depth * fraction_bps / BPS_DENOMINATOR;
            let out = venue.quote_exact_in(pool, Side::No, size, fee)?;
            let after = reserves_after_swap(&before, Side::No, size, out)?;
            let impact = price_impact_bps(&before, &after)?;
            table.row(vec![
                depth.to_string(),
                size.to_string(),
                pct(fraction_bps),
                wad(after.price_yes()?),
                pct(impact),
            ]);
        }
    }
    Ok(table)
}

fn max_trade(config: &EngineConfig) -> Result<Table> {
    let router = &config.router;
    let fee = config.fees.min_fee_bps;
    let mut table = Table::new(
        format!("largest swap under {} impact", pct(u128::from(router.max_price_impact_bps))),
        &["depth", "max input", "of depth", "impact"],
    );

    for depth in DEPTHS {
        let (venue, pool) = pool(depth)?;
        let amount = max_input_under_impact(
            &venue,
            pool,
            Side::No,
            depth,
            fee,
            router.max_price_impact_bps,
            router.impact_search_iterations,
        )?;
        let before = venue.reserves(pool)?;
        let out = venue.quote_exact_in(pool, Side::No, amount, fee)?;
        let impact = price_impact_bps(&before, &reserves_after_swap(&before, Side::No, amount, out)?)?;
        table.row(vec![
            depth.to_string(),
            amount.to_string(),
            pct(amount * BPS_DENOMINATOR / depth),
            pct(impact),
        ]);
    }
    Ok(table)
}

/// Engine with one market whose vault is short YES and a warmed oracle
fn skewed_market(config: &EngineConfig) -> Result<(SimEngine, MarketId)> {
    let mut engine = Engine::new(
        config.clone(),
        CREATOR,
        MemoryVenue::new(),
        MemoryRegistry::new(),
        MemoryBook::new(),
        ClockSnapshot::new(1, START),
    )?;
    let outcome = engine.bootstrap_market(
        CREATOR,
        BootstrapParams {
            description: "simulated market".to_string(),
            resolver: CREATOR,
            collateral: CollateralAsset::Native,
            close_time: START + 30 * 24 * HOUR,
            initial_collateral: 200_000,
            side_preference: None,
            deadline: START,
        },
    )?;
    engine.deposit_to_vault(DEPOSITOR, outcome.market, Side::No, 50_000, START)?;

    let interval = config.oracle.min_observation_interval_secs;
    engine.advance_clock(interval + 1, 1);
    engine.update_twap_observation(outcome.market)?;
    Ok((engine, outcome.market))
}

fn multi_venue(config: &EngineConfig) -> Result<Table> {
    let mut table = Table::new(
        "buy YES across venues",
        &["collateral", "otc", "external", "minted", "shares out", "avg price"],
    );

    for collateral in [1_000u128, 10_000, 30_000, 60_000, 120_000] {
        let (mut engine, market) = skewed_market(config)?;
        let deadline = engine.clock().unix_timestamp;
        let result = engine.buy(TRADER, market, Side::Yes, collateral, 0, deadline)?;
        debug!(collateral, source = ?result.source, "simulated buy");

        let avg = bootstrap_math::mul_div(result.input, bootstrap_core::PRICE_SCALE, result.output)?;
        table.row(vec![
            collateral.to_string(),
            result.otc_output.to_string(),
            result.external_output.to_string(),
            result.minted_output.to_string(),
            result.output.to_string(),
            wad(avg),
        ]);
    }
    Ok(table)
}

fn fee_decay(config: &EngineConfig) -> Result<Table> {
    let curves = [DecayCurve::Linear, DecayCurve::Exponential, DecayCurve::SquareRoot, DecayCurve::Logarithmic];
    let mut headers = vec!["hours"];
    headers.extend(["linear", "exponential", "sqrt", "log"]);
    let mut table = Table::new("bootstrap fee decay (bps)", &headers);

    let window = config.fees.bootstrap_window_secs.max(HOUR);
    let curve = FeeCurve::new(0, config.price_history.volatility_reference_bps);
    let steps = 8;
    for step in 0..=steps {
        let now = window * step / steps;
        let mut row = vec![(now / HOUR).to_string()];
        for decay_curve in curves {
            let fees = FeeConfig { decay_curve, ..config.fees };
            let ctx = FeeContext {
                now,
                close_time: window * 10,
                resolved: false,
                reserves: PoolReserves::new(1_000, 1_000),
            };
            row.push(curve.quote(&fees, &ctx)?.to_raw().to_string());
        }
        table.row(row);
    }
    Ok(table)
}

fn skew_fee(config: &EngineConfig) -> Result<Table> {
    let curves = [SkewCurve::Linear, SkewCurve::Quadratic, SkewCurve::Cubic, SkewCurve::Quartic];
    let mut table = Table::new("skew fee by P(YES) (bps)", &["p_yes", "linear", "quadratic", "cubic", "quartic"]);

    let curve = FeeCurve::new(0, config.price_history.volatility_reference_bps);
    let now = config.fees.bootstrap_window_secs;
    for p_yes_bps in [5_000u128, 6_000, 7_000, 8_000, 9_000, 9_500] {
        // P(YES) = no / (yes + no)
        let reserves = PoolReserves::new(BPS_DENOMINATOR - p_yes_bps, p_yes_bps);
        let ctx = FeeContext { now, close_time: now * 10 + 1, resolved: false, reserves };

        let mut row = vec![pct(p_yes_bps)];
        for skew_curve in curves {
            let fees = FeeConfig { skew_curve, ..config.fees };
            row.push(curve.breakdown(&fees, &ctx)?.skew_bps.to_string());
        }
        table.row(row);
    }
    Ok(table)
}
