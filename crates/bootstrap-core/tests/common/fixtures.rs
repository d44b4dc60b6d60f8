use bootstrap_core::collaborators::{MemoryBook, MemoryRegistry, MemoryVenue};
use bootstrap_core::{
    AccountId, BootstrapParams, ClockSnapshot, CollateralAsset, Engine, EngineConfig, MarketId, Side,
    PRICE_SCALE,
};

pub mod test_constants {
    pub const START_TS: i64 = 1_700_000_000;
    pub const START_SLOT: u64 = 1_000;
    pub const DAY: i64 = 86_400;
    pub const CLOSE_TS: i64 = START_TS + 30 * DAY;
    pub const FAR_DEADLINE: i64 = i64::MAX;

    /// Seconds between oracle samples, just past the minimum interval
    pub const ORACLE_STEP: i64 = 301;
}

use test_constants::*;

pub const ADMIN: AccountId = AccountId::repeat(0xad);
pub const CREATOR: AccountId = AccountId::repeat(1);
pub const ALICE: AccountId = AccountId::repeat(2);
pub const BOB: AccountId = AccountId::repeat(3);

pub const HALF: u128 = PRICE_SCALE / 2;

pub type TestEngine = Engine<MemoryVenue, MemoryRegistry, MemoryBook>;

pub fn new_engine() -> TestEngine {
    new_engine_with(EngineConfig::default())
}

pub fn new_engine_with(config: EngineConfig) -> TestEngine {
    super::init_test_tracing();
    Engine::new(
        config,
        ADMIN,
        MemoryVenue::new(),
        MemoryRegistry::new(),
        MemoryBook::new(),
        ClockSnapshot::new(START_SLOT, START_TS),
    )
    .unwrap()
}

pub fn bootstrap_params(initial_collateral: u128) -> BootstrapParams {
    BootstrapParams {
        description: format!("market seeded with {initial_collateral}"),
        resolver: CREATOR,
        collateral: CollateralAsset::Native,
        close_time: CLOSE_TS,
        initial_collateral,
        side_preference: None,
        deadline: FAR_DEADLINE,
    }
}

/// Bootstrap a native-collateral market with `initial_collateral`
pub fn bootstrap(engine: &mut TestEngine, initial_collateral: u128) -> MarketId {
    engine.bootstrap_market(CREATOR, bootstrap_params(initial_collateral)).unwrap().market
}

/// Market whose vault holds `extra_no` more NO than YES, with a usable
/// reference price
pub fn market_with_scarce_yes(engine: &mut TestEngine, initial_collateral: u128, extra_no: u128) -> MarketId {
    let market = bootstrap(engine, initial_collateral);
    engine.deposit_to_vault(BOB, market, Side::No, extra_no, FAR_DEADLINE).unwrap();
    warm_oracle(engine, market);
    market
}

/// Record a second TWAP sample so the reference price becomes usable
pub fn warm_oracle(engine: &mut TestEngine, market: MarketId) {
    engine.advance_clock(ORACLE_STEP, 1);
    assert!(engine.update_twap_observation(market).unwrap());
}
