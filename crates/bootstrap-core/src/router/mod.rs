//! # Multi-Venue Router
//!
//! Fills one trade request through a fixed pipeline of venues:
//!
//! ```text
//! buy:  OTC -> external venue -> mint fallback
//! sell: OTC -> external venue
//! ```
//!
//! Each stage consumes part of the remaining input and the result is tagged
//! with every venue that contributed. Quotes are taken before internal state
//! changes, and internal state changes before collaborator calls.

pub mod stages;

pub use stages::*;

use crate::collaborators::{ClaimRegistry, ExternalVenue, RestingBook};
use crate::config::EngineConfig;
use crate::errors::{CoreError, CoreResult};
use crate::events::EngineEvent;
use crate::fees::{in_close_window, FeeConfig, FeeContext, FeeQuote};
use crate::oracle::ReferencePrice;
use crate::state::MarketState;
use crate::types::{AccountId, ClockSnapshot, MarketId, MarketInfo, Side, TradeDirection};
use bootstrap_math::safe_add_u128;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A buy spends `amount` collateral; a sell spends `amount` shares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub market: MarketId,
    pub side: Side,
    pub direction: TradeDirection,
    pub amount: u128,
    pub min_output: u128,
    pub deadline: i64,
}

/// Which venues filled a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillSource {
    None,
    Otc,
    External,
    Mint,
    MultiVenue,
}

/// Set of contributing venues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VenueSet(u8);

impl VenueSet {
    pub fn insert(&mut self, stage: Stage) {
        self.0 |= stage.bit();
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.0 & stage.bit() != 0
    }

    pub fn len(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn source(&self) -> FillSource {
        match self.len() {
            0 => FillSource::None,
            1 if self.contains(Stage::Otc) => FillSource::Otc,
            1 if self.contains(Stage::External) => FillSource::External,
            1 => FillSource::Mint,
            _ => FillSource::MultiVenue,
        }
    }
}

/// Aggregate outcome of a routed trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeResult {
    pub market: MarketId,
    pub side: Side,
    pub direction: TradeDirection,
    /// Collateral (buy) or shares (sell) consumed
    pub input: u128,
    /// Shares (buy) or collateral (sell) delivered
    pub output: u128,
    pub otc_output: u128,
    pub external_output: u128,
    pub minted_output: u128,
    /// Collateral handed back from selling minted opposite claims
    pub collateral_returned: u128,
    /// Input left unfilled and returned to the trader
    pub unfilled: u128,
    pub fee_bps: u16,
    pub source: FillSource,
}

/// Everything priced once at the start of a request
#[derive(Debug, Clone, Copy)]
pub struct TradePlan {
    pub side: Side,
    pub direction: TradeDirection,
    pub fee_bps: u16,
    pub reference: ReferencePrice,
    pub close_window: bool,
}

/// Mutable view over one market and the collaborators for one request
pub struct RouteContext<'a, V, R, B> {
    pub config: &'a EngineConfig,
    pub fee_config: FeeConfig,
    pub info: &'a MarketInfo,
    pub market: &'a mut MarketState,
    pub venue: &'a mut V,
    pub registry: &'a mut R,
    pub book: &'a mut B,
    pub clock: ClockSnapshot,
    pub events: &'a mut Vec<EngineEvent>,
}

/// Reject requests past the deadline, itself clamped to the market close
pub fn check_deadline(info: &MarketInfo, deadline: i64, now: i64) -> CoreResult<()> {
    if info.is_closed(now) {
        return Err(CoreError::MarketClosed);
    }
    if now > deadline.min(info.close_time) {
        return Err(CoreError::DeadlineExpired);
    }
    Ok(())
}

impl<'a, V, R, B> RouteContext<'a, V, R, B>
where
    V: ExternalVenue,
    R: ClaimRegistry,
    B: RestingBook,
{
    /// Record a TWAP sample at the current spot. Returns whether one was written.
    pub fn observe_twap(&mut self) -> CoreResult<bool> {
        let reserves = self.venue.reserves(self.market.pool)?;
        let spot = reserves.price_yes()?;
        let recorded = self.market.twap.observe(
            spot,
            self.clock,
            self.config.oracle.min_observation_interval_secs,
        );
        if recorded {
            self.events.push(EngineEvent::TwapObserved {
                market: self.info.id,
                spot,
                cumulative: self.market.twap.cumulative_last,
                slot: self.clock.slot,
                timestamp: self.clock.unix_timestamp,
            });
        }
        Ok(recorded)
    }

    fn plan(&mut self, request: &TradeRequest) -> CoreResult<TradePlan> {
        let now = self.clock.unix_timestamp;
        let reserves = self.venue.reserves(self.market.pool)?;
        let ctx = FeeContext {
            now,
            close_time: self.info.close_time,
            resolved: self.info.resolved,
            reserves,
        };
        let fee_bps = match self.market.fee_curve.before_swap(&self.fee_config, &ctx)? {
            FeeQuote::Fee(bps) => bps,
            FeeQuote::Halted => {
                warn!(market = %self.info.id, "trading halted");
                return Err(CoreError::TradingHalted);
            }
        };

        let reference = self
            .market
            .twap
            .reference_price(reserves.price_yes()?, self.config.oracle.max_deviation_bps)?;

        Ok(TradePlan {
            side: request.side,
            direction: request.direction,
            fee_bps,
            reference,
            close_window: in_close_window(&self.fee_config, now, self.info.close_time),
        })
    }

    /// Route one trade through the venue pipeline
    pub fn route(&mut self, trader: AccountId, request: &TradeRequest) -> CoreResult<TradeResult> {
        check_deadline(self.info, request.deadline, self.clock.unix_timestamp)?;
        if request.amount == 0 {
            return Err(CoreError::ZeroAmount);
        }

        self.observe_twap()?;
        let plan = self.plan(request)?;

        let mut remaining = request.amount;
        let mut venues = VenueSet::default();
        let mut outputs = [0u128; 3];
        let mut returned: u128 = 0;
        let mut impact_limited = false;

        for &stage in Stage::pipeline(request.direction) {
            if remaining == 0 {
                break;
            }
            let fill = self.run_stage(stage, &plan, remaining)?;
            impact_limited |= fill.impact_limited;
            if fill.consumed == 0 {
                continue;
            }
            remaining -= fill.consumed;
            outputs[stage.index()] = safe_add_u128(outputs[stage.index()], fill.output)?;
            returned = safe_add_u128(returned, fill.returned)?;
            venues.insert(stage);
        }

        let output = outputs.iter().try_fold(0u128, |acc, out| safe_add_u128(acc, *out))?;
        if output == 0 {
            return Err(if plan.close_window {
                CoreError::CloseWindowNoVenue
            } else if impact_limited {
                CoreError::PriceImpactExceeded
            } else {
                CoreError::InsufficientLiquidity
            });
        }
        if output < request.min_output {
            return Err(CoreError::SlippageExceeded { output, minimum: request.min_output });
        }

        let result = TradeResult {
            market: request.market,
            side: request.side,
            direction: request.direction,
            input: request.amount - remaining,
            output,
            otc_output: outputs[Stage::Otc.index()],
            external_output: outputs[Stage::External.index()],
            minted_output: outputs[Stage::MintFallback.index()],
            collateral_returned: returned,
            unfilled: remaining,
            fee_bps: plan.fee_bps,
            source: venues.source(),
        };

        info!(
            market = %request.market,
            side = %request.side,
            direction = %request.direction,
            input = result.input,
            output,
            source = ?result.source,
            "trade routed"
        );
        self.events.push(EngineEvent::TradeRouted {
            market: request.market,
            trader,
            side: request.side,
            direction: request.direction,
            input: result.input,
            output,
            source: result.source,
            timestamp: self.clock.unix_timestamp,
        });
        debug!(unfilled = remaining, returned, "trade settled");
        Ok(result)
    }
}
