//! # OTC Fill Engine
//!
//! Prices and sizes fills against the bootstrap vault. Execution price is the
//! TWAP price moved against the taker by `max(min_spread, price / divisor)`.
//! Size is bounded by:
//!
//! 1. the requested size,
//! 2. `depletion_cap_bps` of the opposite-side inventory, rounded down,
//! 3. the inventory available to hand out (buys), or the size that keeps the
//!    traded side scarce (sells),
//! 4. what the rebalance budget can subsidize when the execution price is on
//!    the wrong side of the current spot price.

use super::inventory::VaultInventory;
use crate::config::RouterConfig;
use crate::constants::{BPS_DENOMINATOR, PRICE_SCALE};
use crate::errors::CoreResult;
use crate::oracle::ReferencePrice;
use crate::types::{Side, TradeDirection};
use bootstrap_math::{bps_of, mul_div, mul_div_up};
use serde::{Deserialize, Serialize};

/// OTC pricing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtcParams {
    pub depletion_cap_bps: u16,
    pub min_spread_bps: u16,
    pub spread_divisor: u128,
}

impl From<&RouterConfig> for OtcParams {
    fn from(config: &RouterConfig) -> Self {
        Self {
            depletion_cap_bps: config.otc_depletion_cap_bps,
            min_spread_bps: config.min_spread_bps,
            spread_divisor: u128::from(config.spread_divisor.max(1)),
        }
    }
}

impl OtcParams {
    /// Spread around `price`, both scaled by `PRICE_SCALE`
    pub fn spread(&self, price: u128) -> u128 {
        let floor = PRICE_SCALE / BPS_DENOMINATOR * u128::from(self.min_spread_bps);
        floor.max(price / self.spread_divisor)
    }
}

/// A priced fill, not yet applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtcQuote {
    pub side: Side,
    pub direction: TradeDirection,
    /// Shares moved
    pub size: u128,
    /// Collateral paid by the taker (buy) or to the taker (sell)
    pub collateral: u128,
    /// Execution price, scaled by `PRICE_SCALE`
    pub price: u128,
    /// Spread earned by the vault
    pub spread_fee: u128,
    /// Budget consumed to cover an off-market execution price
    pub subsidy: u128,
}

fn depletion_cap(inventory: &VaultInventory, side: Side, params: &OtcParams) -> CoreResult<u128> {
    Ok(bps_of(inventory.get(side.opposite()), u128::from(params.depletion_cap_bps))?)
}

/// Largest sell that leaves `side` strictly scarcer than the opposite side
fn scarcity_cap(inventory: &VaultInventory, side: Side) -> u128 {
    let gap = inventory.get(side.opposite()).saturating_sub(inventory.get(side));
    gap.saturating_sub(1) / 2
}

/// Largest size the budget covers at `subsidy_per_share`
fn budget_cap(budget: u128, subsidy_per_share: u128) -> CoreResult<u128> {
    if subsidy_per_share == 0 {
        return Ok(u128::MAX);
    }
    Ok(mul_div(budget, PRICE_SCALE, subsidy_per_share)?)
}

fn subsidy_for(size: u128, subsidy_per_share: u128, budget: u128) -> CoreResult<u128> {
    if subsidy_per_share == 0 {
        return Ok(0);
    }
    Ok(mul_div_up(size, subsidy_per_share, PRICE_SCALE)?.min(budget))
}

/// Quote a buy of `side` for `collateral_in`. `None` when the vault cannot
/// fill anything.
pub fn quote_buy(
    inventory: &VaultInventory,
    budget: u128,
    side: Side,
    collateral_in: u128,
    reference: &ReferencePrice,
    params: &OtcParams,
) -> CoreResult<Option<OtcQuote>> {
    if collateral_in == 0 || !inventory.is_scarce(side) {
        return Ok(None);
    }

    let fair = reference.twap_for(side);
    let price = fair.saturating_add(params.spread(fair)).min(PRICE_SCALE);
    if price == 0 {
        return Ok(None);
    }

    let raw = mul_div(collateral_in, PRICE_SCALE, price)?;
    let spot = reference.spot_for(side);
    let subsidy_per_share = spot.saturating_sub(price);

    let size = raw
        .min(depletion_cap(inventory, side, params)?)
        .min(inventory.get(side))
        .min(budget_cap(budget, subsidy_per_share)?);
    if size == 0 {
        return Ok(None);
    }

    let collateral = if size == raw {
        collateral_in
    } else {
        mul_div_up(size, price, PRICE_SCALE)?.min(collateral_in)
    };

    Ok(Some(OtcQuote {
        side,
        direction: TradeDirection::Buy,
        size,
        collateral,
        price,
        spread_fee: mul_div(size, price - fair.min(price), PRICE_SCALE)?,
        subsidy: subsidy_for(size, subsidy_per_share, budget)?,
    }))
}

/// Quote a sale of `shares_in` of `side` to the vault
pub fn quote_sell(
    inventory: &VaultInventory,
    budget: u128,
    side: Side,
    shares_in: u128,
    reference: &ReferencePrice,
    params: &OtcParams,
) -> CoreResult<Option<OtcQuote>> {
    if shares_in == 0 || !inventory.is_scarce(side) {
        return Ok(None);
    }

    let fair = reference.twap_for(side);
    let spread = params.spread(fair);
    if fair <= spread {
        return Ok(None);
    }
    let price = fair - spread;

    let spot = reference.spot_for(side);
    let subsidy_per_share = price.saturating_sub(spot);

    let size = shares_in
        .min(depletion_cap(inventory, side, params)?)
        .min(scarcity_cap(inventory, side))
        .min(budget_cap(budget, subsidy_per_share)?);
    if size == 0 {
        return Ok(None);
    }

    let collateral = mul_div(size, price, PRICE_SCALE)?;
    if collateral == 0 {
        return Ok(None);
    }

    Ok(Some(OtcQuote {
        side,
        direction: TradeDirection::Sell,
        size,
        collateral,
        price,
        spread_fee: mul_div(size, spread, PRICE_SCALE)?,
        subsidy: subsidy_for(size, subsidy_per_share, budget)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::PriceStatus;

    fn params() -> OtcParams {
        OtcParams::from(&RouterConfig::default())
    }

    fn reference(p_yes: u128) -> ReferencePrice {
        ReferencePrice { twap: p_yes, spot: p_yes, deviation_bps: 0, status: PriceStatus::Fresh }
    }

    fn inventory(yes: u128, no: u128) -> VaultInventory {
        VaultInventory { yes, no, last_activity: 0 }
    }

    const E18: u128 = PRICE_SCALE;

    #[test]
    fn test_spread_floor_and_relative() {
        let params = params();
        // 10 bps floor dominates below a price of 0.05
        assert_eq!(params.spread(E18 / 100), E18 / 1_000);
        assert_eq!(params.spread(E18 / 2), E18 / 100);
    }

    #[test]
    fn test_abundant_side_skips() {
        let inv = inventory(100, 60);
        assert!(quote_buy(&inv, 0, Side::Yes, 10, &reference(E18 / 2), &params()).unwrap().is_none());
        assert!(quote_sell(&inv, 0, Side::Yes, 10, &reference(E18 / 2), &params()).unwrap().is_none());

        let balanced = inventory(100, 100);
        assert!(quote_buy(&balanced, 0, Side::No, 10, &reference(E18 / 2), &params()).unwrap().is_none());
    }

    #[test]
    fn test_buy_price_and_size() {
        let inv = inventory(1_000 * E18, 2_000 * E18);
        let quote = quote_buy(&inv, 0, Side::Yes, 51 * E18, &reference(E18 / 2), &params())
            .unwrap()
            .unwrap();
        // 0.5 + 0.01
        assert_eq!(quote.price, E18 * 51 / 100);
        assert_eq!(quote.size, 100 * E18);
        assert_eq!(quote.collateral, 51 * E18);
        assert_eq!(quote.spread_fee, E18);
        assert_eq!(quote.subsidy, 0);
    }

    #[test]
    fn test_depletion_cap_binds() {
        let inv = inventory(90, 100);
        let quote = quote_buy(&inv, 0, Side::Yes, 1_000, &reference(E18 / 2), &params())
            .unwrap()
            .unwrap();
        assert_eq!(quote.size, 30);
        // ceil(30 * 0.51)
        assert_eq!(quote.collateral, 16);
    }

    #[test]
    fn test_cap_below_one_unit_skips() {
        // 30% of 3 rounds to zero
        let inv = inventory(1, 3);
        assert!(quote_buy(&inv, 0, Side::Yes, 10, &reference(E18 / 2), &params()).unwrap().is_none());

        let inv = inventory(1, 4);
        let quote = quote_buy(&inv, 0, Side::Yes, 10, &reference(E18 / 2), &params())
            .unwrap()
            .unwrap();
        assert_eq!(quote.size, 1);
        assert_eq!(quote.collateral, 1);
    }

    #[test]
    fn test_sell_keeps_side_scarce() {
        let inv = inventory(40, 60);
        let quote = quote_sell(&inv, 0, Side::Yes, 18, &reference(E18 / 2), &params())
            .unwrap()
            .unwrap();
        assert_eq!(quote.size, 9);

        let after = inv.with_otc_fill(Side::Yes, quote.size, TradeDirection::Sell, 1).unwrap();
        assert_eq!((after.yes, after.no), (49, 51));
        assert!(after.is_scarce(Side::Yes));

        // Gap of one leaves no room
        let tight = inventory(59, 60);
        assert!(quote_sell(&tight, 0, Side::Yes, 5, &reference(E18 / 2), &params()).unwrap().is_none());
    }

    #[test]
    fn test_budget_limits_subsidized_fill() {
        // Spot ran ahead of the TWAP: execution at 0.51 is below spot 0.6
        let reference = ReferencePrice {
            twap: E18 / 2,
            spot: E18 * 6 / 10,
            deviation_bps: 0,
            status: PriceStatus::Fresh,
        };
        let inv = inventory(1_000 * E18, 2_000 * E18);

        assert!(quote_buy(&inv, 0, Side::Yes, 51 * E18, &reference, &params()).unwrap().is_none());

        // 0.09 subsidy per share, budget 4.5 covers 50 shares
        let budget = 45 * E18 / 10;
        let quote = quote_buy(&inv, budget, Side::Yes, 51 * E18, &reference, &params())
            .unwrap()
            .unwrap();
        assert_eq!(quote.size, 50 * E18);
        assert_eq!(quote.subsidy, budget);
    }

    #[test]
    fn test_sell_quote() {
        let inv = inventory(1_000 * E18, 2_000 * E18);
        let quote = quote_sell(&inv, 0, Side::Yes, 100 * E18, &reference(E18 / 2), &params())
            .unwrap()
            .unwrap();
        assert_eq!(quote.price, E18 * 49 / 100);
        assert_eq!(quote.collateral, 49 * E18);
        assert_eq!(quote.spread_fee, E18);
    }

    #[test]
    fn test_sell_dust_yields_nothing() {
        let inv = inventory(1, 3);
        assert!(quote_sell(&inv, 0, Side::Yes, 1, &reference(E18 / 2), &params()).unwrap().is_none());
    }
}
