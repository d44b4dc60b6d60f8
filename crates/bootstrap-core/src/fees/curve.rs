//! # Dynamic Fee Curve
//!
//! Fee charged by the external venue, priced per swap:
//!
//! ```text
//! fee = min(base(t) + skew(p) + asymmetric(p) + volatility(history), fee_cap)
//! ```
//!
//! with the close window and market close overriding the sum.

use super::config::{CloseWindowMode, DecayCurve, FeeConfig};
use super::history::PriceHistory;
use crate::constants::{BPS_DENOMINATOR, FEE_HALTED_SENTINEL, HALF_BPS};
use crate::errors::CoreResult;
use crate::types::{ClockSnapshot, PoolReserves, Side};
use bootstrap_math::{abs_diff, log2_one_plus_bps, mul_div, pow_bps, sqrt_bps};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fee answer for one swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeQuote {
    Fee(u16),
    /// No trading possible
    Halted,
}

impl FeeQuote {
    /// Raw encoding with `FEE_HALTED_SENTINEL` standing in for a halt
    pub fn to_raw(self) -> u16 {
        match self {
            FeeQuote::Fee(bps) => bps,
            FeeQuote::Halted => FEE_HALTED_SENTINEL,
        }
    }

    pub fn is_halted(self) -> bool {
        matches!(self, FeeQuote::Halted)
    }

    pub fn bps(self) -> Option<u16> {
        match self {
            FeeQuote::Fee(bps) => Some(bps),
            FeeQuote::Halted => None,
        }
    }
}

/// Per-component fee amounts before the cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub base_bps: u128,
    pub skew_bps: u128,
    pub asymmetric_bps: u128,
    pub volatility_bps: u128,
    /// Sum clamped to the cap
    pub total_bps: u16,
}

/// Market timing inputs for a quote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeContext {
    pub now: i64,
    pub close_time: i64,
    pub resolved: bool,
    pub reserves: PoolReserves,
}

/// Per-market fee state: activation time and the price history ring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeCurve {
    pub activation_time: i64,
    pub history: PriceHistory,
    volatility_reference_bps: u16,
}

/// True in the `close_window_secs` immediately preceding close
pub fn in_close_window(config: &FeeConfig, now: i64, close_time: i64) -> bool {
    now < close_time && now >= close_time.saturating_sub(config.close_window_secs)
}

impl FeeCurve {
    pub fn new(activation_time: i64, volatility_reference_bps: u16) -> Self {
        Self {
            activation_time,
            history: PriceHistory::new(),
            volatility_reference_bps: volatility_reference_bps.max(1),
        }
    }

    /// Fee for the next swap
    pub fn quote(&self, config: &FeeConfig, ctx: &FeeContext) -> CoreResult<FeeQuote> {
        if ctx.resolved || ctx.now >= ctx.close_time {
            return Ok(FeeQuote::Halted);
        }

        if in_close_window(config, ctx.now, ctx.close_time) {
            match config.close_window_mode {
                CloseWindowMode::Halt => return Ok(FeeQuote::Halted),
                CloseWindowMode::FixedFee => {
                    return Ok(FeeQuote::Fee(config.close_window_fee_bps.min(config.fee_cap_bps)))
                }
                CloseWindowMode::MinFee => return Ok(FeeQuote::Fee(config.min_fee_bps)),
                CloseWindowMode::Dynamic => {}
            }
        }

        Ok(FeeQuote::Fee(self.breakdown(config, ctx)?.total_bps))
    }

    /// Hook called by the venue before a swap
    pub fn before_swap(&self, config: &FeeConfig, ctx: &FeeContext) -> CoreResult<FeeQuote> {
        let quote = self.quote(config, ctx)?;
        debug!(fee = quote.to_raw(), now = ctx.now, "fee quoted");
        Ok(quote)
    }

    /// Hook called by the venue with post-trade reserves
    pub fn after_swap(&mut self, reserves: PoolReserves, clock: ClockSnapshot) -> CoreResult<bool> {
        let price = reserves.price_yes()?;
        Ok(self.history.record(clock, price))
    }

    /// Dynamic components, ignoring close-window policy
    pub fn breakdown(&self, config: &FeeConfig, ctx: &FeeContext) -> CoreResult<FeeBreakdown> {
        let base_bps = self.base_fee(config, ctx.now)?;

        let p_yes_bps = ctx.reserves.price_yes_bps()?;
        let deviation = abs_diff(p_yes_bps, HALF_BPS);
        let skew_bps = skew_fee(config, deviation)?;
        let asymmetric_bps = asymmetric_fee(config, p_yes_bps, deviation)?;
        let volatility_bps = self.volatility_fee(config, ctx.now)?;

        let sum = base_bps + skew_bps + asymmetric_bps + volatility_bps;
        let total_bps = sum.min(u128::from(config.fee_cap_bps)) as u16;

        Ok(FeeBreakdown { base_bps, skew_bps, asymmetric_bps, volatility_bps, total_bps })
    }

    fn base_fee(&self, config: &FeeConfig, now: i64) -> CoreResult<u128> {
        let max = u128::from(config.max_fee_bps);
        let min = u128::from(config.min_fee_bps);

        let elapsed = now.saturating_sub(self.activation_time);
        if elapsed <= 0 {
            return Ok(max);
        }
        if config.bootstrap_window_secs == 0 || elapsed >= config.bootstrap_window_secs {
            return Ok(min);
        }

        let progress = mul_div(elapsed as u128, BPS_DENOMINATOR, config.bootstrap_window_secs as u128)?;
        let decayed = decay_progress(config.decay_curve, progress)?;
        Ok(max - mul_div(max - min, decayed, BPS_DENOMINATOR)?)
    }

    fn volatility_fee(&self, config: &FeeConfig, now: i64) -> CoreResult<u128> {
        if config.volatility_fee_bps == 0 {
            return Ok(0);
        }
        let Some(cv_bps) = self.history.coefficient_of_variation_bps(now, config.volatility_window_secs)? else {
            return Ok(0);
        };
        let reference = u128::from(self.volatility_reference_bps);
        Ok(mul_div(u128::from(config.volatility_fee_bps), cv_bps.min(reference), reference)?)
    }
}

/// Fraction of the fee span already decayed, in bps
fn decay_progress(curve: DecayCurve, t_bps: u128) -> CoreResult<u128> {
    let t = t_bps.min(BPS_DENOMINATOR);
    Ok(match curve {
        DecayCurve::Linear => t,
        DecayCurve::Exponential => BPS_DENOMINATOR - pow_bps(BPS_DENOMINATOR - t, 3),
        DecayCurve::SquareRoot => sqrt_bps(t),
        DecayCurve::Logarithmic => log2_one_plus_bps(t)?,
    })
}

fn skew_fee(config: &FeeConfig, deviation_bps: u128) -> CoreResult<u128> {
    let reference = u128::from(config.skew_ref_bps.max(1));
    let ratio = mul_div(deviation_bps, BPS_DENOMINATOR, reference)?.min(BPS_DENOMINATOR);
    let shaped = pow_bps(ratio, config.skew_curve.exponent());
    Ok(mul_div(u128::from(config.max_skew_fee_bps), shaped, BPS_DENOMINATOR)?)
}

fn asymmetric_fee(config: &FeeConfig, p_yes_bps: u128, deviation_bps: u128) -> CoreResult<u128> {
    if deviation_bps == 0 {
        return Ok(0);
    }
    let favored = if p_yes_bps > HALF_BPS { Side::Yes } else { Side::No };
    if let Some(side) = config.asymmetric_side {
        if side != favored {
            return Ok(0);
        }
    }
    Ok(mul_div(u128::from(config.asymmetric_fee_bps), deviation_bps.min(HALF_BPS), HALF_BPS)?)
}
