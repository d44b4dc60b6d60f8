//! # External Collaborators
//!
//! The constant-product venue, the claim registry and the resting order book
//! are owned elsewhere; the engine reaches them only through these traits.
//! Implementations are `Clone` so a request can be rolled back by restoring a
//! snapshot.

pub mod memory;

pub use memory::*;

use crate::errors::CoreResult;
use crate::types::{AccountId, CollateralAsset, MarketId, MarketInfo, PoolId, PoolReserves, Side};

/// Constant-product YES/NO venue. The fee is supplied per swap.
pub trait ExternalVenue: Clone {
    fn create_pool(&mut self, market: MarketId, reserves: PoolReserves) -> CoreResult<PoolId>;

    fn pool_for(&self, market: MarketId) -> Option<PoolId>;

    fn reserves(&self, pool: PoolId) -> CoreResult<PoolReserves>;

    /// Output of swapping `amount_in` of `side_in` for the other side
    fn quote_exact_in(&self, pool: PoolId, side_in: Side, amount_in: u128, fee_bps: u16) -> CoreResult<u128>;

    fn swap_exact_in(
        &mut self,
        pool: PoolId,
        side_in: Side,
        amount_in: u128,
        min_out: u128,
        fee_bps: u16,
    ) -> CoreResult<u128>;

    fn add_liquidity(&mut self, pool: PoolId, amounts: PoolReserves) -> CoreResult<()>;
}

/// Market registry and paired-claim mint/burn
pub trait ClaimRegistry: Clone {
    fn create_market(
        &mut self,
        description: &str,
        resolver: AccountId,
        collateral: CollateralAsset,
        close_time: i64,
    ) -> CoreResult<MarketId>;

    fn market(&self, id: MarketId) -> CoreResult<MarketInfo>;

    /// Lock `collateral` and mint as many YES/NO pairs
    fn split(&mut self, id: MarketId, collateral: u128) -> CoreResult<u128>;

    /// Burn `pairs` YES/NO pairs and release as much collateral
    fn merge(&mut self, id: MarketId, pairs: u128) -> CoreResult<u128>;

    fn resolve(&mut self, id: MarketId, winning_side: Side) -> CoreResult<()>;
}

/// Proceeds of selling into resting bids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BookFill {
    pub shares_sold: u128,
    pub proceeds: u128,
}

/// Standing limit orders usable as exit liquidity during mint fallback
pub trait RestingBook: Clone {
    /// Sell up to `shares` of `side` into bids priced at or above `min_price`
    fn fill_against_bids(&mut self, market: MarketId, side: Side, shares: u128, min_price: u128) -> CoreResult<BookFill>;
}
