//! # TWAP Oracle
//!
//! Per-market cumulative-price accumulator over the external venue's spot
//! price. At most one observation is recorded per slot, and a new one only
//! after `min_observation_interval` seconds, so a single block cannot move
//! the reference price.

use crate::constants::{BPS_DENOMINATOR, PRICE_SCALE};
use crate::errors::{CoreError, CoreResult};
use crate::types::{ClockSnapshot, Side};
use bootstrap_math::{abs_diff, mul_div};
use serde::{Deserialize, Serialize};

/// Two most recent cumulative-price samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "anchor", derive(anchor_lang::AnchorSerialize, anchor_lang::AnchorDeserialize))]
pub struct TwapObservation {
    /// Cumulative P(YES) x seconds at `timestamp_prev`
    pub cumulative_prev: u128,
    pub timestamp_prev: i64,
    /// Cumulative P(YES) x seconds at `timestamp_last`
    pub cumulative_last: u128,
    pub timestamp_last: i64,
    /// Spot P(YES) recorded with the last sample
    pub last_spot: u128,
    pub last_slot: u64,
    pub observation_count: u32,
}

/// How far a reference price can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceStatus {
    /// TWAP within the deviation bound of spot
    Fresh,
    /// TWAP and spot disagree; OTC must not price off it
    Stale,
    /// Fewer than two samples recorded
    Warming,
}

/// Reference P(YES) with its spot comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePrice {
    pub twap: u128,
    pub spot: u128,
    pub deviation_bps: u128,
    pub status: PriceStatus,
}

impl ReferencePrice {
    pub fn is_usable(&self) -> bool {
        self.status == PriceStatus::Fresh
    }

    /// TWAP price of `side`
    pub fn twap_for(&self, side: Side) -> u128 {
        match side {
            Side::Yes => self.twap,
            Side::No => PRICE_SCALE.saturating_sub(self.twap),
        }
    }

    /// Spot price of `side`
    pub fn spot_for(&self, side: Side) -> u128 {
        match side {
            Side::Yes => self.spot,
            Side::No => PRICE_SCALE.saturating_sub(self.spot),
        }
    }
}

impl TwapObservation {
    /// First sample, taken when the market is bootstrapped
    pub fn initialize(spot: u128, clock: ClockSnapshot) -> Self {
        Self {
            cumulative_prev: 0,
            timestamp_prev: clock.unix_timestamp,
            cumulative_last: 0,
            timestamp_last: clock.unix_timestamp,
            last_spot: spot,
            last_slot: clock.slot,
            observation_count: 1,
        }
    }

    /// Record `spot` if the slot changed and the interval elapsed.
    ///
    /// Returns whether a sample was written. Never fails on a repeated call.
    pub fn observe(&mut self, spot: u128, clock: ClockSnapshot, min_interval: i64) -> bool {
        if clock.slot == self.last_slot {
            return false;
        }
        let elapsed = clock.unix_timestamp.saturating_sub(self.timestamp_last);
        if elapsed < min_interval || elapsed <= 0 {
            return false;
        }

        // Cumulative price wraps; only differences are meaningful
        let cumulative = self
            .cumulative_last
            .wrapping_add(self.last_spot.wrapping_mul(elapsed as u128));

        *self = Self {
            cumulative_prev: self.cumulative_last,
            timestamp_prev: self.timestamp_last,
            cumulative_last: cumulative,
            timestamp_last: clock.unix_timestamp,
            last_spot: spot,
            last_slot: clock.slot,
            observation_count: self.observation_count.saturating_add(1),
        };
        true
    }

    /// Average P(YES) between the two most recent samples
    pub fn twap(&self) -> CoreResult<Option<u128>> {
        if self.observation_count < 2 {
            return Ok(None);
        }
        let window = self.timestamp_last - self.timestamp_prev;
        if window <= 0 {
            return Err(CoreError::DivisionByZero);
        }
        let delta = self.cumulative_last.wrapping_sub(self.cumulative_prev);
        Ok(Some(delta / window as u128))
    }

    /// Compare the TWAP against the current spot
    pub fn reference_price(&self, spot: u128, max_deviation_bps: u16) -> CoreResult<ReferencePrice> {
        let Some(twap) = self.twap()? else {
            return Ok(ReferencePrice {
                twap: self.last_spot,
                spot,
                deviation_bps: 0,
                status: PriceStatus::Warming,
            });
        };

        let deviation_bps = if twap == 0 {
            if spot == 0 { 0 } else { BPS_DENOMINATOR }
        } else {
            mul_div(abs_diff(twap, spot), BPS_DENOMINATOR, twap)?
        };

        let status = if deviation_bps > u128::from(max_deviation_bps) {
            PriceStatus::Stale
        } else {
            PriceStatus::Fresh
        };

        Ok(ReferencePrice { twap, spot, deviation_bps, status })
    }
}
