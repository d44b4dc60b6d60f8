//! Fixed-capacity price history used for the volatility fee

use crate::constants::{BPS_DENOMINATOR, MIN_VOLATILITY_SAMPLES, PRICE_HISTORY_CAPACITY};
use crate::errors::CoreResult;
use crate::types::ClockSnapshot;
use bootstrap_math::{isqrt, mul_div, safe_add_u128, safe_mul_u128, abs_diff};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceSnapshot {
    pub timestamp: i64,
    /// P(YES), scaled by `PRICE_SCALE`
    pub price: u128,
}

/// Circular buffer of (timestamp, price), one insertion per slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceHistory {
    snapshots: [PriceSnapshot; PRICE_HISTORY_CAPACITY],
    head: usize,
    len: usize,
    last_slot: Option<u64>,
}

impl Default for PriceHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceHistory {
    pub fn new() -> Self {
        Self {
            snapshots: [PriceSnapshot::default(); PRICE_HISTORY_CAPACITY],
            head: 0,
            len: 0,
            last_slot: None,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append a snapshot unless this slot already has one
    pub fn record(&mut self, clock: ClockSnapshot, price: u128) -> bool {
        if self.last_slot == Some(clock.slot) {
            return false;
        }
        self.snapshots[self.head] = PriceSnapshot { timestamp: clock.unix_timestamp, price };
        self.head = (self.head + 1) % PRICE_HISTORY_CAPACITY;
        self.len = (self.len + 1).min(PRICE_HISTORY_CAPACITY);
        self.last_slot = Some(clock.slot);
        true
    }

    /// Snapshots from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &PriceSnapshot> {
        let start = (self.head + PRICE_HISTORY_CAPACITY - self.len) % PRICE_HISTORY_CAPACITY;
        (0..self.len).map(move |i| &self.snapshots[(start + i) % PRICE_HISTORY_CAPACITY])
    }

    /// Coefficient of variation (stddev / mean) in bps over samples no older
    /// than `window` seconds. Samples stamped after `now` are ignored.
    ///
    /// `None` with fewer than `MIN_VOLATILITY_SAMPLES` usable samples.
    pub fn coefficient_of_variation_bps(&self, now: i64, window: i64) -> CoreResult<Option<u128>> {
        let usable = || {
            self.iter()
                .filter(move |s| s.timestamp <= now && now - s.timestamp <= window)
        };

        let count = usable().count();
        if count < MIN_VOLATILITY_SAMPLES {
            return Ok(None);
        }

        let mut sum: u128 = 0;
        for snapshot in usable() {
            sum = safe_add_u128(sum, snapshot.price)?;
        }
        let mean = sum / count as u128;
        if mean == 0 {
            return Ok(None);
        }

        let mut squares: u128 = 0;
        for snapshot in usable() {
            let diff = abs_diff(snapshot.price, mean);
            squares = safe_add_u128(squares, safe_mul_u128(diff, diff)?)?;
        }
        let std_dev = isqrt(squares / count as u128);

        Ok(Some(mul_div(std_dev, BPS_DENOMINATOR, mean)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PRICE_SCALE;

    #[test]
    fn test_one_snapshot_per_slot() {
        let mut history = PriceHistory::new();
        assert!(history.record(ClockSnapshot::new(5, 100), PRICE_SCALE / 2));
        assert!(!history.record(ClockSnapshot::new(5, 101), PRICE_SCALE));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_ring_wraps() {
        let mut history = PriceHistory::new();
        for i in 0..(PRICE_HISTORY_CAPACITY as u64 + 5) {
            history.record(ClockSnapshot::new(i, i as i64), u128::from(i));
        }
        assert_eq!(history.len(), PRICE_HISTORY_CAPACITY);
        let first = history.iter().next().unwrap();
        assert_eq!(first.price, 5);
        let last = history.iter().last().unwrap();
        assert_eq!(last.price, PRICE_HISTORY_CAPACITY as u128 + 4);
    }

    #[test]
    fn test_too_few_samples() {
        let mut history = PriceHistory::new();
        history.record(ClockSnapshot::new(1, 10), PRICE_SCALE / 2);
        history.record(ClockSnapshot::new(2, 20), PRICE_SCALE / 4);
        assert_eq!(history.coefficient_of_variation_bps(30, 3_600).unwrap(), None);
    }

    #[test]
    fn test_future_samples_ignored() {
        let mut history = PriceHistory::new();
        history.record(ClockSnapshot::new(1, 10), PRICE_SCALE / 2);
        history.record(ClockSnapshot::new(2, 20), PRICE_SCALE / 2);
        history.record(ClockSnapshot::new(3, 5_000), PRICE_SCALE / 2);
        // The third sample is ahead of `now`
        assert_eq!(history.coefficient_of_variation_bps(30, 3_600).unwrap(), None);
    }

    #[test]
    fn test_flat_prices_have_zero_variation() {
        let mut history = PriceHistory::new();
        for slot in 0..4 {
            history.record(ClockSnapshot::new(slot, slot as i64 * 60), PRICE_SCALE / 2);
        }
        assert_eq!(history.coefficient_of_variation_bps(300, 3_600).unwrap(), Some(0));
    }

    #[test]
    fn test_variation_of_spread_prices() {
        let mut history = PriceHistory::new();
        // 0.4, 0.6, 0.4, 0.6: mean 0.5, stddev 0.1
        for (slot, tenths) in [4u128, 6, 4, 6].into_iter().enumerate() {
            history.record(ClockSnapshot::new(slot as u64, slot as i64), PRICE_SCALE * tenths / 10);
        }
        assert_eq!(history.coefficient_of_variation_bps(10, 3_600).unwrap(), Some(2_000));
    }
}
