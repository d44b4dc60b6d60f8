//! # Fee Configuration
//!
//! Process-wide default fee parameters with per-market overrides. Every write
//! goes through `FeeConfig::validate`, so a stored config always satisfies
//! `fee_cap >= max_fee + max_skew_fee + asymmetric_fee + volatility_fee`.

use crate::constants::*;
use crate::errors::{CoreError, CoreResult};
use crate::types::{MarketId, Side};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shape of the base-fee decay across the bootstrap window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "anchor", derive(anchor_lang::AnchorSerialize, anchor_lang::AnchorDeserialize))]
pub enum DecayCurve {
    #[default]
    Linear,
    Exponential,
    SquareRoot,
    Logarithmic,
}

/// Shape of the skew surcharge as a function of skew ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "anchor", derive(anchor_lang::AnchorSerialize, anchor_lang::AnchorDeserialize))]
pub enum SkewCurve {
    Linear,
    #[default]
    Quadratic,
    Cubic,
    Quartic,
}

impl SkewCurve {
    pub fn exponent(self) -> u32 {
        match self {
            SkewCurve::Linear => 1,
            SkewCurve::Quadratic => 2,
            SkewCurve::Cubic => 3,
            SkewCurve::Quartic => 4,
        }
    }
}

/// Trading policy inside the close window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "anchor", derive(anchor_lang::AnchorSerialize, anchor_lang::AnchorDeserialize))]
pub enum CloseWindowMode {
    /// Mode 0: all trading blocked
    Halt,
    /// Mode 1: flat `close_window_fee_bps`, clamped to the cap
    #[default]
    FixedFee,
    /// Mode 2: `min_fee_bps`
    MinFee,
    /// Mode 3: dynamic computation continues
    Dynamic,
}

macro_rules! impl_selector {
    ($ty:ident, $what:literal, [$($raw:literal => $variant:ident),+ $(,)?]) => {
        impl TryFrom<u8> for $ty {
            type Error = CoreError;

            fn try_from(raw: u8) -> CoreResult<Self> {
                match raw {
                    $($raw => Ok($ty::$variant),)+
                    _ => Err(CoreError::InvalidFeeConfig($what)),
                }
            }
        }

        impl From<$ty> for u8 {
            fn from(value: $ty) -> u8 {
                match value {
                    $($ty::$variant => $raw,)+
                }
            }
        }
    };
}

impl_selector!(DecayCurve, "decay curve selector out of range", [
    0 => Linear, 1 => Exponential, 2 => SquareRoot, 3 => Logarithmic,
]);
impl_selector!(SkewCurve, "skew curve selector out of range", [
    0 => Linear, 1 => Quadratic, 2 => Cubic, 3 => Quartic,
]);
impl_selector!(CloseWindowMode, "close window mode out of range", [
    0 => Halt, 1 => FixedFee, 2 => MinFee, 3 => Dynamic,
]);

/// Fee parameters for one market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "anchor", derive(anchor_lang::AnchorSerialize, anchor_lang::AnchorDeserialize))]
pub struct FeeConfig {
    pub min_fee_bps: u16,
    pub max_fee_bps: u16,
    pub bootstrap_window_secs: i64,
    pub decay_curve: DecayCurve,

    pub max_skew_fee_bps: u16,
    /// Probability deviation from 50% that earns the full skew fee
    pub skew_ref_bps: u16,
    pub skew_curve: SkewCurve,

    pub asymmetric_fee_bps: u16,
    /// Side whose dominance triggers the asymmetric fee; `None` charges either way
    pub asymmetric_side: Option<Side>,

    pub volatility_fee_bps: u16,
    pub volatility_window_secs: i64,

    pub close_window_secs: i64,
    pub close_window_fee_bps: u16,
    pub close_window_mode: CloseWindowMode,

    pub fee_cap_bps: u16,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            min_fee_bps: DEFAULT_MIN_FEE_BPS,
            max_fee_bps: DEFAULT_MAX_FEE_BPS,
            bootstrap_window_secs: DEFAULT_BOOTSTRAP_WINDOW_SECS,
            decay_curve: DecayCurve::Linear,
            max_skew_fee_bps: DEFAULT_MAX_SKEW_FEE_BPS,
            skew_ref_bps: DEFAULT_SKEW_REF_BPS,
            skew_curve: SkewCurve::Quadratic,
            asymmetric_fee_bps: DEFAULT_ASYMMETRIC_FEE_BPS,
            asymmetric_side: None,
            volatility_fee_bps: 0,
            volatility_window_secs: DEFAULT_VOLATILITY_WINDOW_SECS,
            close_window_secs: DEFAULT_CLOSE_WINDOW_SECS,
            close_window_fee_bps: DEFAULT_CLOSE_WINDOW_FEE_BPS,
            close_window_mode: CloseWindowMode::FixedFee,
            fee_cap_bps: DEFAULT_FEE_CAP_BPS,
        }
    }
}

impl FeeConfig {
    /// Check the write-time invariants
    pub fn validate(&self) -> CoreResult<()> {
        if self.min_fee_bps > self.max_fee_bps {
            return Err(CoreError::InvalidFeeConfig("min fee exceeds max fee"));
        }
        if u128::from(self.fee_cap_bps) > BPS_DENOMINATOR {
            return Err(CoreError::InvalidFeeConfig("fee cap above 100%"));
        }
        let components = u32::from(self.max_fee_bps)
            + u32::from(self.max_skew_fee_bps)
            + u32::from(self.asymmetric_fee_bps)
            + u32::from(self.volatility_fee_bps);
        if u32::from(self.fee_cap_bps) < components {
            return Err(CoreError::InvalidFeeConfig("fee cap below the sum of fee components"));
        }
        if self.skew_ref_bps == 0 || u128::from(self.skew_ref_bps) > HALF_BPS {
            return Err(CoreError::InvalidFeeConfig("skew reference must be in (0, 5000]"));
        }
        if self.bootstrap_window_secs < 0 || self.close_window_secs < 0 {
            return Err(CoreError::InvalidFeeConfig("negative window duration"));
        }
        if self.volatility_fee_bps > 0 && self.volatility_window_secs <= 0 {
            return Err(CoreError::InvalidFeeConfig("volatility fee needs a positive window"));
        }
        if u128::from(self.close_window_fee_bps) > BPS_DENOMINATOR {
            return Err(CoreError::InvalidFeeConfig("close window fee above 100%"));
        }
        Ok(())
    }
}

/// Per-market entry. `has_override` distinguishes "unset" from a config that
/// happens to hold zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeConfigOverride {
    pub has_override: bool,
    pub config: FeeConfig,
}

/// Two-tier fee configuration lookup
#[derive(Debug, Clone, Default)]
pub struct FeeConfigStore {
    default: FeeConfig,
    overrides: BTreeMap<MarketId, FeeConfigOverride>,
}

impl FeeConfigStore {
    pub fn new(default: FeeConfig) -> CoreResult<Self> {
        default.validate()?;
        Ok(Self { default, overrides: BTreeMap::new() })
    }

    pub fn default_config(&self) -> &FeeConfig {
        &self.default
    }

    pub fn set_default(&mut self, config: FeeConfig) -> CoreResult<()> {
        config.validate()?;
        self.default = config;
        Ok(())
    }

    /// Effective config for a market
    pub fn resolve(&self, market: MarketId) -> &FeeConfig {
        match self.overrides.get(&market) {
            Some(entry) if entry.has_override => &entry.config,
            _ => &self.default,
        }
    }

    pub fn set_override(&mut self, market: MarketId, config: FeeConfig) -> CoreResult<()> {
        config.validate()?;
        self.overrides.insert(market, FeeConfigOverride { has_override: true, config });
        Ok(())
    }

    /// Returns whether an override was present
    pub fn clear_override(&mut self, market: MarketId) -> bool {
        match self.overrides.get_mut(&market) {
            Some(entry) if entry.has_override => {
                entry.has_override = false;
                true
            }
            _ => false,
        }
    }

    pub fn has_override(&self, market: MarketId) -> bool {
        self.overrides.get(&market).map(|entry| entry.has_override).unwrap_or(false)
    }
}
