//! Router stages: vault OTC, external venue, mint fallback

use super::{RouteContext, TradePlan};
use crate::collaborators::{ClaimRegistry, ExternalVenue, RestingBook};
use crate::constants::BPS_DENOMINATOR;
use crate::errors::{CoreError, CoreResult};
use crate::events::EngineEvent;
use crate::types::{PoolId, PoolReserves, Side, TradeDirection};
use crate::vault::{quote_buy, quote_sell, OtcParams};
use bootstrap_math::{abs_diff, bps_of, safe_add_u128, safe_sub_u128};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Otc,
    External,
    MintFallback,
}

impl Stage {
    /// Venues tried, in order, for a direction. Sells never mint.
    pub fn pipeline(direction: TradeDirection) -> &'static [Stage] {
        match direction {
            TradeDirection::Buy => &[Stage::Otc, Stage::External, Stage::MintFallback],
            TradeDirection::Sell => &[Stage::Otc, Stage::External],
        }
    }

    pub fn index(self) -> usize {
        match self {
            Stage::Otc => 0,
            Stage::External => 1,
            Stage::MintFallback => 2,
        }
    }

    pub(crate) fn bit(self) -> u8 {
        1 << self.index()
    }
}

/// What one stage did with the remaining input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageFill {
    pub consumed: u128,
    pub output: u128,
    pub returned: u128,
    /// The price-impact bound cut this stage short
    pub impact_limited: bool,
}

/// Move in P(YES), in bps, between two reserve states
pub fn price_impact_bps(before: &PoolReserves, after: &PoolReserves) -> CoreResult<u128> {
    Ok(abs_diff(before.price_yes_bps()?, after.price_yes_bps()?))
}

pub fn reserves_after_swap(reserves: &PoolReserves, side_in: Side, amount_in: u128, amount_out: u128) -> CoreResult<PoolReserves> {
    let new_in = safe_add_u128(reserves.get(side_in), amount_in)?;
    let new_out = safe_sub_u128(reserves.get(side_in.opposite()), amount_out)?;
    Ok(match side_in {
        Side::Yes => PoolReserves::new(new_in, new_out),
        Side::No => PoolReserves::new(new_out, new_in),
    })
}

fn quote_or_none<V: ExternalVenue>(venue: &V, pool: PoolId, side_in: Side, amount: u128, fee_bps: u16) -> CoreResult<Option<u128>> {
    match venue.quote_exact_in(pool, side_in, amount, fee_bps) {
        Ok(out) => Ok(Some(out)),
        Err(CoreError::InsufficientLiquidity) => Ok(None),
        Err(err) => Err(err),
    }
}

fn within_impact<V: ExternalVenue>(
    venue: &V,
    pool: PoolId,
    side_in: Side,
    amount: u128,
    fee_bps: u16,
    max_impact_bps: u16,
) -> CoreResult<bool> {
    let Some(out) = quote_or_none(venue, pool, side_in, amount, fee_bps)? else {
        return Ok(false);
    };
    let before = venue.reserves(pool)?;
    let after = reserves_after_swap(&before, side_in, amount, out)?;
    Ok(price_impact_bps(&before, &after)? <= u128::from(max_impact_bps))
}

/// Largest `amount <= max_amount` of `side_in` swappable without moving
/// P(YES) by more than `max_impact_bps`
pub fn max_input_under_impact<V: ExternalVenue>(
    venue: &V,
    pool: PoolId,
    side_in: Side,
    max_amount: u128,
    fee_bps: u16,
    max_impact_bps: u16,
    iterations: u32,
) -> CoreResult<u128> {
    if max_amount == 0 || max_impact_bps == 0 {
        return Ok(0);
    }
    if within_impact(venue, pool, side_in, max_amount, fee_bps, max_impact_bps)? {
        return Ok(max_amount);
    }

    let (mut lo, mut hi) = (0u128, max_amount);
    for _ in 0..iterations {
        if hi - lo <= 1 {
            break;
        }
        let mid = lo + (hi - lo) / 2;
        if within_impact(venue, pool, side_in, mid, fee_bps, max_impact_bps)? {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(lo)
}

/// Smallest `y` of `side_in` whose swap output pairs with the `shares - y`
/// left over, so all of it can be merged
fn swap_amount_for_merge<V: ExternalVenue>(
    venue: &V,
    pool: PoolId,
    side_in: Side,
    shares: u128,
    fee_bps: u16,
    iterations: u32,
) -> CoreResult<Option<u128>> {
    let covers = |y: u128| -> CoreResult<bool> {
        Ok(quote_or_none(venue, pool, side_in, y, fee_bps)?.map_or(false, |out| out >= shares - y))
    };
    if shares == 0 || !covers(shares)? {
        return Ok(None);
    }

    let (mut lo, mut hi) = (0u128, shares);
    for _ in 0..iterations {
        if hi - lo <= 1 {
            break;
        }
        let mid = lo + (hi - lo) / 2;
        if covers(mid)? {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    Ok(Some(hi))
}

impl<'a, V, R, B> RouteContext<'a, V, R, B>
where
    V: ExternalVenue,
    R: ClaimRegistry,
    B: RestingBook,
{
    pub(crate) fn run_stage(&mut self, stage: Stage, plan: &TradePlan, remaining: u128) -> CoreResult<StageFill> {
        match (stage, plan.direction) {
            (Stage::Otc, _) => self.otc_stage(plan, remaining),
            (Stage::External, TradeDirection::Buy) => self.external_buy(plan, remaining),
            (Stage::External, TradeDirection::Sell) => self.external_sell(plan, remaining),
            (Stage::MintFallback, TradeDirection::Buy) => self.mint_fallback(plan, remaining),
            (Stage::MintFallback, TradeDirection::Sell) => Ok(StageFill::default()),
        }
    }

    fn otc_stage(&mut self, plan: &TradePlan, remaining: u128) -> CoreResult<StageFill> {
        if plan.close_window {
            debug!(market = %self.info.id, "OTC disabled in close window");
            return Ok(StageFill::default());
        }
        if !plan.reference.is_usable() {
            debug!(market = %self.info.id, status = ?plan.reference.status, "OTC skipped: reference price unusable");
            return Ok(StageFill::default());
        }

        let params = OtcParams::from(&self.config.router);
        let vault = &self.market.vault;
        let quote = match plan.direction {
            TradeDirection::Buy => quote_buy(&vault.inventory, vault.budget, plan.side, remaining, &plan.reference, &params)?,
            TradeDirection::Sell => quote_sell(&vault.inventory, vault.budget, plan.side, remaining, &plan.reference, &params)?,
        };
        let Some(quote) = quote else {
            debug!(market = %self.info.id, side = %plan.side, "OTC skipped: no fill available");
            return Ok(StageFill::default());
        };

        let now = self.clock.unix_timestamp;
        self.market.vault.apply_otc(&quote, now)?;

        info!(
            market = %self.info.id,
            side = %quote.side,
            size = quote.size,
            collateral = quote.collateral,
            spread_fee = quote.spread_fee,
            "OTC fill"
        );
        self.events.push(EngineEvent::OtcFilled {
            market: self.info.id,
            side: quote.side,
            direction: quote.direction,
            size: quote.size,
            collateral: quote.collateral,
            price: quote.price,
            spread_fee: quote.spread_fee,
            subsidy: quote.subsidy,
            timestamp: now,
        });

        Ok(match plan.direction {
            TradeDirection::Buy => StageFill { consumed: quote.collateral, output: quote.size, ..StageFill::default() },
            TradeDirection::Sell => StageFill { consumed: quote.size, output: quote.collateral, ..StageFill::default() },
        })
    }

    /// Split collateral into pairs and swap the unwanted half for more of `side`
    fn external_buy(&mut self, plan: &TradePlan, remaining: u128) -> CoreResult<StageFill> {
        let pool = self.market.pool;
        let side_in = plan.side.opposite();
        let router = &self.config.router;

        let amount = max_input_under_impact(
            &*self.venue,
            pool,
            side_in,
            remaining,
            plan.fee_bps,
            router.max_price_impact_bps,
            router.impact_search_iterations,
        )?;
        let impact_limited = amount < remaining;
        if amount == 0 {
            debug!(market = %self.info.id, "external venue skipped: impact bound");
            return Ok(StageFill { impact_limited, ..StageFill::default() });
        }

        let expected = self.venue.quote_exact_in(pool, side_in, amount, plan.fee_bps)?;
        let pairs = self.registry.split(self.info.id, amount)?;
        let out = self.swap(pool, side_in, pairs, expected, plan.fee_bps)?;

        Ok(StageFill {
            consumed: amount,
            output: safe_add_u128(pairs, out)?,
            returned: 0,
            impact_limited,
        })
    }

    /// Swap part of the shares for the other side and merge the pairs
    fn external_sell(&mut self, plan: &TradePlan, remaining: u128) -> CoreResult<StageFill> {
        let pool = self.market.pool;
        let side_in = plan.side;
        let router = &self.config.router;
        let (fee, iterations) = (plan.fee_bps, router.impact_search_iterations);

        let max_swap = max_input_under_impact(
            &*self.venue,
            pool,
            side_in,
            remaining,
            fee,
            router.max_price_impact_bps,
            iterations,
        )?;

        let venue = &*self.venue;
        let fits = |shares: u128| -> CoreResult<Option<u128>> {
            Ok(swap_amount_for_merge(venue, pool, side_in, shares, fee, iterations)?.filter(|y| *y <= max_swap))
        };

        let (shares, swap_in) = match fits(remaining)? {
            Some(y) => (remaining, y),
            None => {
                let (mut lo, mut hi) = (0u128, remaining);
                let mut best = 0u128;
                for _ in 0..iterations {
                    if hi - lo <= 1 {
                        break;
                    }
                    let mid = lo + (hi - lo) / 2;
                    match fits(mid)? {
                        Some(y) => {
                            lo = mid;
                            best = y;
                        }
                        None => hi = mid,
                    }
                }
                (lo, best)
            }
        };
        let impact_limited = shares < remaining;

        let merge_pairs = shares.saturating_sub(swap_in);
        if shares == 0 || merge_pairs == 0 {
            debug!(market = %self.info.id, "external venue skipped: nothing mergeable under impact bound");
            return Ok(StageFill { impact_limited, ..StageFill::default() });
        }

        let expected = self.venue.quote_exact_in(pool, side_in, swap_in, fee)?;
        let out = self.swap(pool, side_in, swap_in, expected, fee)?;
        let collateral = self.registry.merge(self.info.id, merge_pairs)?;

        // Swap overshoot stays with the vault
        let dust = safe_sub_u128(out, merge_pairs)?;
        if dust > 0 {
            self.market.vault.absorb(side_in.opposite(), dust, self.clock.unix_timestamp)?;
        }

        Ok(StageFill { consumed: shares, output: collateral, returned: 0, impact_limited })
    }

    /// Mint pairs from the leftover collateral and sell the unwanted side to
    /// resting bids. Unsold claims go to the vault.
    fn mint_fallback(&mut self, plan: &TradePlan, remaining: u128) -> CoreResult<StageFill> {
        let opposite = plan.side.opposite();
        let max_discount = BPS_DENOMINATOR - u128::from(self.config.router.max_price_impact_bps);
        let floor_price = bps_of(plan.reference.spot_for(opposite), max_discount)?;

        let pairs = self.registry.split(self.info.id, remaining)?;
        let sold = self.book.fill_against_bids(self.info.id, opposite, pairs, floor_price)?;
        let unsold = safe_sub_u128(pairs, sold.shares_sold)?;
        if unsold > 0 {
            self.market.vault.absorb(opposite, unsold, self.clock.unix_timestamp)?;
        }

        info!(
            market = %self.info.id,
            side = %plan.side,
            pairs,
            sold = sold.shares_sold,
            proceeds = sold.proceeds,
            "mint fallback"
        );
        self.events.push(EngineEvent::MintFallback {
            market: self.info.id,
            side: plan.side,
            pairs_minted: pairs,
            sold_to_book: sold.shares_sold,
            book_proceeds: sold.proceeds,
            absorbed_by_vault: unsold,
            timestamp: self.clock.unix_timestamp,
        });

        Ok(StageFill { consumed: remaining, output: pairs, returned: sold.proceeds, impact_limited: false })
    }

    /// Swap on the venue with the fee hooks around it
    fn swap(&mut self, pool: PoolId, side_in: Side, amount_in: u128, min_out: u128, fee_bps: u16) -> CoreResult<u128> {
        let before = self.venue.reserves(pool)?;
        let out = self.venue.swap_exact_in(pool, side_in, amount_in, min_out, fee_bps)?;
        let after = self.venue.reserves(pool)?;
        self.market.fee_curve.after_swap(after, self.clock)?;

        let price_impact_bps = price_impact_bps(&before, &after)?;
        info!(market = %self.info.id, %side_in, amount_in, out, fee_bps, price_impact_bps, "venue swap");
        self.events.push(EngineEvent::VenueSwapped {
            market: self.info.id,
            pool,
            side_in,
            amount_in,
            amount_out: out,
            fee_bps,
            price_impact_bps,
            timestamp: self.clock.unix_timestamp,
        });
        Ok(out)
    }
}
