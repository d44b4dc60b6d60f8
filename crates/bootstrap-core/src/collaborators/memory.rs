//! In-memory collaborators for tests and simulation

use super::{BookFill, ClaimRegistry, ExternalVenue, RestingBook};
use crate::constants::{BPS_DENOMINATOR, PRICE_SCALE};
use crate::errors::{CoreError, CoreResult};
use crate::types::{AccountId, CollateralAsset, MarketId, MarketInfo, PoolId, PoolReserves, Side};
use bootstrap_math::{mul_div, safe_add_u128, safe_mul_u128, safe_sub_u128};
use std::collections::BTreeMap;

// ============================================================================
// Constant-Product Venue
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryVenue {
    pools: BTreeMap<PoolId, PoolReserves>,
    by_market: BTreeMap<MarketId, PoolId>,
    next_id: u64,
}

impl MemoryVenue {
    pub fn new() -> Self {
        Self::default()
    }

    fn pool(&self, pool: PoolId) -> CoreResult<&PoolReserves> {
        self.pools.get(&pool).ok_or(CoreError::PoolNotFound)
    }
}

/// `x * y = k` output with the fee taken from the input
pub fn constant_product_out(reserve_in: u128, reserve_out: u128, amount_in: u128, fee_bps: u16) -> CoreResult<u128> {
    if reserve_in == 0 || reserve_out == 0 {
        return Err(CoreError::InsufficientLiquidity);
    }
    let fee = u128::from(fee_bps).min(BPS_DENOMINATOR);
    let in_with_fee = safe_mul_u128(amount_in, BPS_DENOMINATOR - fee)?;
    let denominator = safe_add_u128(safe_mul_u128(reserve_in, BPS_DENOMINATOR)?, in_with_fee)?;
    Ok(mul_div(in_with_fee, reserve_out, denominator)?)
}

impl ExternalVenue for MemoryVenue {
    fn create_pool(&mut self, market: MarketId, reserves: PoolReserves) -> CoreResult<PoolId> {
        if self.by_market.contains_key(&market) {
            return Err(CoreError::DuplicateRegistration);
        }
        if reserves.yes == 0 || reserves.no == 0 {
            return Err(CoreError::ZeroAmount);
        }
        self.next_id += 1;
        let id = PoolId(self.next_id);
        self.pools.insert(id, reserves);
        self.by_market.insert(market, id);
        Ok(id)
    }

    fn pool_for(&self, market: MarketId) -> Option<PoolId> {
        self.by_market.get(&market).copied()
    }

    fn reserves(&self, pool: PoolId) -> CoreResult<PoolReserves> {
        self.pool(pool).copied()
    }

    fn quote_exact_in(&self, pool: PoolId, side_in: Side, amount_in: u128, fee_bps: u16) -> CoreResult<u128> {
        let reserves = self.pool(pool)?;
        let out = constant_product_out(reserves.get(side_in), reserves.get(side_in.opposite()), amount_in, fee_bps)?;
        if out >= reserves.get(side_in.opposite()) {
            return Err(CoreError::InsufficientLiquidity);
        }
        Ok(out)
    }

    fn swap_exact_in(
        &mut self,
        pool: PoolId,
        side_in: Side,
        amount_in: u128,
        min_out: u128,
        fee_bps: u16,
    ) -> CoreResult<u128> {
        if amount_in == 0 {
            return Err(CoreError::ZeroAmount);
        }
        let out = self.quote_exact_in(pool, side_in, amount_in, fee_bps)?;
        if out < min_out {
            return Err(CoreError::SlippageExceeded { output: out, minimum: min_out });
        }

        let reserves = *self.pool(pool)?;
        let new_in = safe_add_u128(reserves.get(side_in), amount_in)?;
        let new_out = safe_sub_u128(reserves.get(side_in.opposite()), out)?;
        let updated = match side_in {
            Side::Yes => PoolReserves::new(new_in, new_out),
            Side::No => PoolReserves::new(new_out, new_in),
        };
        self.pools.insert(pool, updated);
        Ok(out)
    }

    fn add_liquidity(&mut self, pool: PoolId, amounts: PoolReserves) -> CoreResult<()> {
        let reserves = *self.pool(pool)?;
        let updated = PoolReserves::new(
            safe_add_u128(reserves.yes, amounts.yes)?,
            safe_add_u128(reserves.no, amounts.no)?,
        );
        self.pools.insert(pool, updated);
        Ok(())
    }
}

// ============================================================================
// Claim Registry
// ============================================================================

#[derive(Debug, Clone)]
struct RegistryEntry {
    info: MarketInfo,
    locked_collateral: u128,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    markets: BTreeMap<MarketId, RegistryEntry>,
    next_id: u64,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collateral currently locked behind outstanding pairs
    pub fn locked_collateral(&self, id: MarketId) -> CoreResult<u128> {
        Ok(self.entry(id)?.locked_collateral)
    }

    fn entry(&self, id: MarketId) -> CoreResult<&RegistryEntry> {
        self.markets.get(&id).ok_or(CoreError::MarketNotFound)
    }

    fn entry_mut(&mut self, id: MarketId) -> CoreResult<&mut RegistryEntry> {
        self.markets.get_mut(&id).ok_or(CoreError::MarketNotFound)
    }
}

impl ClaimRegistry for MemoryRegistry {
    fn create_market(
        &mut self,
        description: &str,
        resolver: AccountId,
        collateral: CollateralAsset,
        close_time: i64,
    ) -> CoreResult<MarketId> {
        if self.markets.values().any(|entry| entry.info.description == description) {
            return Err(CoreError::DuplicateRegistration);
        }
        self.next_id += 1;
        let id = MarketId(self.next_id);
        let info = MarketInfo {
            id,
            description: description.to_string(),
            resolver,
            collateral,
            close_time,
            resolved: false,
            winning_side: None,
        };
        self.markets.insert(id, RegistryEntry { info, locked_collateral: 0 });
        Ok(id)
    }

    fn market(&self, id: MarketId) -> CoreResult<MarketInfo> {
        Ok(self.entry(id)?.info.clone())
    }

    fn split(&mut self, id: MarketId, collateral: u128) -> CoreResult<u128> {
        if collateral == 0 {
            return Err(CoreError::ZeroAmount);
        }
        let entry = self.entry_mut(id)?;
        if entry.info.resolved {
            return Err(CoreError::MarketClosed);
        }
        entry.locked_collateral = safe_add_u128(entry.locked_collateral, collateral)?;
        Ok(collateral)
    }

    fn merge(&mut self, id: MarketId, pairs: u128) -> CoreResult<u128> {
        if pairs == 0 {
            return Err(CoreError::ZeroAmount);
        }
        let entry = self.entry_mut(id)?;
        entry.locked_collateral = safe_sub_u128(entry.locked_collateral, pairs)?;
        Ok(pairs)
    }

    fn resolve(&mut self, id: MarketId, winning_side: Side) -> CoreResult<()> {
        let entry = self.entry_mut(id)?;
        if entry.info.resolved {
            return Err(CoreError::MarketClosed);
        }
        entry.info.resolved = true;
        entry.info.winning_side = Some(winning_side);
        Ok(())
    }
}

// ============================================================================
// Resting Order Book
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestingBid {
    /// Limit price, scaled by `PRICE_SCALE`
    pub price: u128,
    pub shares: u128,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBook {
    bids: BTreeMap<(MarketId, Side), Vec<RestingBid>>,
}

impl MemoryBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place_bid(&mut self, market: MarketId, side: Side, price: u128, shares: u128) -> CoreResult<()> {
        if shares == 0 {
            return Err(CoreError::ZeroAmount);
        }
        if price == 0 || price > PRICE_SCALE {
            return Err(CoreError::InvalidParameter("bid price outside (0, 1]"));
        }
        let book = self.bids.entry((market, side)).or_default();
        book.push(RestingBid { price, shares });
        // Best bid first, FIFO within a price
        book.sort_by(|a, b| b.price.cmp(&a.price));
        Ok(())
    }

    pub fn bids(&self, market: MarketId, side: Side) -> &[RestingBid] {
        self.bids.get(&(market, side)).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl RestingBook for MemoryBook {
    fn fill_against_bids(&mut self, market: MarketId, side: Side, shares: u128, min_price: u128) -> CoreResult<BookFill> {
        let Some(book) = self.bids.get_mut(&(market, side)) else {
            return Ok(BookFill::default());
        };

        let mut fill = BookFill::default();
        for bid in book.iter_mut() {
            if fill.shares_sold == shares || bid.price < min_price {
                break;
            }
            let take = bid.shares.min(shares - fill.shares_sold);
            fill.shares_sold += take;
            fill.proceeds = safe_add_u128(fill.proceeds, mul_div(take, bid.price, PRICE_SCALE)?)?;
            bid.shares -= take;
        }
        book.retain(|bid| bid.shares > 0);
        Ok(fill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_product_output() {
        // 10 in against 100/100 with no fee: 100 * 10 / 110
        assert_eq!(constant_product_out(100, 100, 10, 0).unwrap(), 9);
        assert_eq!(constant_product_out(1_000_000, 1_000_000, 1_000, 30).unwrap(), 996);
        assert_eq!(constant_product_out(0, 100, 10, 0), Err(CoreError::InsufficientLiquidity));
    }

    #[test]
    fn test_swap_moves_reserves() {
        let mut venue = MemoryVenue::new();
        let pool = venue.create_pool(MarketId(1), PoolReserves::new(1_000, 1_000)).unwrap();
        let out = venue.swap_exact_in(pool, Side::No, 100, 0, 0).unwrap();
        assert_eq!(out, 90);
        assert_eq!(venue.reserves(pool).unwrap(), PoolReserves::new(910, 1_100));

        let err = venue.swap_exact_in(pool, Side::No, 100, 1_000, 0).unwrap_err();
        assert!(matches!(err, CoreError::SlippageExceeded { .. }));
    }

    #[test]
    fn test_duplicate_pool_rejected() {
        let mut venue = MemoryVenue::new();
        let pool = venue.create_pool(MarketId(1), PoolReserves::new(1, 1)).unwrap();
        assert_eq!(
            venue.create_pool(MarketId(1), PoolReserves::new(1, 1)),
            Err(CoreError::DuplicateRegistration)
        );
        assert_eq!(venue.pool_for(MarketId(1)), Some(pool));
        assert_eq!(venue.pool_for(MarketId(2)), None);
    }

    #[test]
    fn test_add_liquidity() {
        let mut venue = MemoryVenue::new();
        let pool = venue.create_pool(MarketId(1), PoolReserves::new(100, 300)).unwrap();
        venue.add_liquidity(pool, PoolReserves::new(50, 150)).unwrap();
        assert_eq!(venue.reserves(pool).unwrap(), PoolReserves::new(150, 450));
        assert_eq!(venue.add_liquidity(PoolId(9), PoolReserves::new(1, 1)), Err(CoreError::PoolNotFound));
    }

    #[test]
    fn test_registry_split_merge() {
        let mut registry = MemoryRegistry::new();
        let id = registry
            .create_market("q", AccountId::repeat(1), CollateralAsset::Native, 100)
            .unwrap();
        assert_eq!(
            registry.create_market("q", AccountId::repeat(2), CollateralAsset::Native, 100),
            Err(CoreError::DuplicateRegistration)
        );

        registry.split(id, 50).unwrap();
        assert_eq!(registry.merge(id, 20).unwrap(), 20);
        assert_eq!(registry.locked_collateral(id).unwrap(), 30);
        assert!(registry.merge(id, 31).is_err());
        assert_eq!(registry.market(MarketId(9)), Err(CoreError::MarketNotFound));
    }

    #[test]
    fn test_book_fills_best_bids_above_floor() {
        let mut book = MemoryBook::new();
        let market = MarketId(1);
        book.place_bid(market, Side::No, PRICE_SCALE / 2, 10).unwrap();
        book.place_bid(market, Side::No, PRICE_SCALE * 6 / 10, 5).unwrap();
        book.place_bid(market, Side::No, PRICE_SCALE / 10, 100).unwrap();

        let fill = book.fill_against_bids(market, Side::No, 12, PRICE_SCALE / 4).unwrap();
        assert_eq!(fill.shares_sold, 12);
        // 5 at 0.6 then 7 at 0.5
        assert_eq!(fill.proceeds, 3 + 3);
        assert_eq!(book.bids(market, Side::No).len(), 2);

        let fill = book.fill_against_bids(market, Side::No, 50, PRICE_SCALE / 4).unwrap();
        assert_eq!(fill.shares_sold, 3);
    }
}
