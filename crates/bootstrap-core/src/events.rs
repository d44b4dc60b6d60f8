//! Event definitions
//!
//! Every committed state change appends one of these. Events raised inside a
//! request that is rolled back are discarded with it.

use crate::router::FillSource;
use crate::types::{AccountId, MarketId, PoolId, Side, TradeDirection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    MarketBootstrapped {
        market: MarketId,
        pool: PoolId,
        creator: AccountId,
        pool_seed: u128,
        vault_seed: u128,
        side_preference: Option<Side>,
        timestamp: i64,
    },
    OtcFilled {
        market: MarketId,
        side: Side,
        direction: TradeDirection,
        size: u128,
        collateral: u128,
        price: u128,
        spread_fee: u128,
        subsidy: u128,
        timestamp: i64,
    },
    VenueSwapped {
        market: MarketId,
        pool: PoolId,
        side_in: Side,
        amount_in: u128,
        amount_out: u128,
        fee_bps: u16,
        price_impact_bps: u128,
        timestamp: i64,
    },
    MintFallback {
        market: MarketId,
        side: Side,
        pairs_minted: u128,
        sold_to_book: u128,
        book_proceeds: u128,
        absorbed_by_vault: u128,
        timestamp: i64,
    },
    TradeRouted {
        market: MarketId,
        trader: AccountId,
        side: Side,
        direction: TradeDirection,
        input: u128,
        output: u128,
        source: FillSource,
        timestamp: i64,
    },
    VaultDeposited {
        market: MarketId,
        side: Side,
        depositor: AccountId,
        amount: u128,
        shares: u128,
        timestamp: i64,
    },
    VaultWithdrawn {
        market: MarketId,
        side: Side,
        owner: AccountId,
        shares: u128,
        redeemed: u128,
        harvested: u128,
        timestamp: i64,
    },
    FeesHarvested {
        market: MarketId,
        side: Side,
        owner: AccountId,
        amount: u128,
        timestamp: i64,
    },
    TwapObserved {
        market: MarketId,
        spot: u128,
        cumulative: u128,
        slot: u64,
        timestamp: i64,
    },
    FeeConfigUpdated {
        market: MarketId,
        has_override: bool,
        timestamp: i64,
    },
    MarketResolved {
        market: MarketId,
        winning_side: Side,
        timestamp: i64,
    },
}

impl EngineEvent {
    pub fn market(&self) -> MarketId {
        match self {
            EngineEvent::MarketBootstrapped { market, .. }
            | EngineEvent::OtcFilled { market, .. }
            | EngineEvent::VenueSwapped { market, .. }
            | EngineEvent::MintFallback { market, .. }
            | EngineEvent::TradeRouted { market, .. }
            | EngineEvent::VaultDeposited { market, .. }
            | EngineEvent::VaultWithdrawn { market, .. }
            | EngineEvent::FeesHarvested { market, .. }
            | EngineEvent::TwapObserved { market, .. }
            | EngineEvent::FeeConfigUpdated { market, .. }
            | EngineEvent::MarketResolved { market, .. } => *market,
        }
    }
}
