//! # Protocol Constants
//!
//! Fixed-point scales, fee-curve defaults, oracle and vault parameters.
//! Defaults here seed `EngineConfig`; anything tunable per deployment is
//! read from the config instead of these constants.

pub use bootstrap_math::BPS_DENOMINATOR;

// ============================================================================
// Fixed-Point Scales
// ============================================================================

/// Price scale: probability 1.0 == 1e18
pub const PRICE_SCALE: u128 = bootstrap_math::WAD;

/// Reward-per-share accumulator scale
pub const ACC_SCALE: u128 = bootstrap_math::WAD;

/// Midpoint of the probability range in bps
pub const HALF_BPS: u128 = 5_000;

// ============================================================================
// Fee Curve Defaults
// ============================================================================

/// Steady-state fee (0.10%)
pub const DEFAULT_MIN_FEE_BPS: u16 = 10;

/// Fee at market activation (0.75%)
pub const DEFAULT_MAX_FEE_BPS: u16 = 75;

/// Maximum skew surcharge (0.80%)
pub const DEFAULT_MAX_SKEW_FEE_BPS: u16 = 80;

/// Probability deviation that earns the full skew surcharge (90/10 market)
pub const DEFAULT_SKEW_REF_BPS: u16 = 4_000;

/// Asymmetric surcharge at full skew (0.20%)
pub const DEFAULT_ASYMMETRIC_FEE_BPS: u16 = 20;

/// Hard ceiling on the summed fee (3%)
pub const DEFAULT_FEE_CAP_BPS: u16 = 300;

/// Bootstrap decay window (2 days)
pub const DEFAULT_BOOTSTRAP_WINDOW_SECS: i64 = 2 * 24 * 3_600;

/// Close window before market close (1 hour)
pub const DEFAULT_CLOSE_WINDOW_SECS: i64 = 3_600;

/// Fixed fee charged in close-window mode 1 (0.50%)
pub const DEFAULT_CLOSE_WINDOW_FEE_BPS: u16 = 50;

/// Volatility window (1 hour)
pub const DEFAULT_VOLATILITY_WINDOW_SECS: i64 = 3_600;

/// Returned in place of a fee when trading is halted
pub const FEE_HALTED_SENTINEL: u16 = 10_001;

// ============================================================================
// Router Defaults
// ============================================================================

/// External venue price-impact bound (12%)
pub const DEFAULT_MAX_PRICE_IMPACT_BPS: u16 = 1_200;

/// Share of the opposite-side inventory one OTC fill may move (30%)
pub const DEFAULT_OTC_DEPLETION_CAP_BPS: u16 = 3_000;

/// Absolute OTC spread floor (0.10% of a unit price)
pub const DEFAULT_MIN_SPREAD_BPS: u16 = 10;

/// Relative OTC spread: price / 50 (2%)
pub const DEFAULT_SPREAD_DIVISOR: u64 = 50;

/// Binary-search steps when sizing a venue fill under the impact bound
pub const DEFAULT_IMPACT_SEARCH_ITERATIONS: u32 = 64;

// ============================================================================
// Oracle and Vault Defaults
// ============================================================================

/// Minimum spacing between TWAP observations (5 minutes)
pub const DEFAULT_MIN_OBSERVATION_INTERVAL_SECS: i64 = 300;

/// TWAP/spot deviation above which the reference price is stale (5%)
pub const DEFAULT_MAX_TWAP_DEVIATION_BPS: u16 = 500;

/// Deposit-to-withdraw cooldown (6 hours)
pub const DEFAULT_WITHDRAW_COOLDOWN_SECS: i64 = 6 * 3_600;

/// Price-history ring capacity
pub const PRICE_HISTORY_CAPACITY: usize = 32;

/// Samples required before a volatility fee is charged
pub const MIN_VOLATILITY_SAMPLES: usize = 3;

/// Coefficient of variation that earns the full volatility fee (10%)
pub const DEFAULT_VOLATILITY_REFERENCE_BPS: u16 = 1_000;
