//! Engine configuration loaded from TOML

use crate::constants::*;
use crate::errors::{CoreError, CoreResult};
use crate::fees::FeeConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Process-wide default fee parameters
    pub fees: FeeConfig,

    pub router: RouterConfig,

    pub oracle: OracleConfig,

    pub vault: VaultConfig,

    pub price_history: PriceHistoryConfig,
}

/// Venue sequencing and OTC pricing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Largest allowed move of the external pool price in one request
    pub max_price_impact_bps: u16,

    /// Share of the opposite-side inventory one OTC fill may consume
    pub otc_depletion_cap_bps: u16,

    /// Absolute spread floor, in bps of a unit price
    pub min_spread_bps: u16,

    /// Relative spread is `price / spread_divisor`
    pub spread_divisor: u64,

    /// Binary-search steps when sizing an impact-bounded venue fill
    pub impact_search_iterations: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OracleConfig {
    pub min_observation_interval_secs: i64,
    /// TWAP/spot deviation above which the reference price is stale
    pub max_deviation_bps: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct VaultConfig {
    pub withdraw_cooldown_secs: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PriceHistoryConfig {
    /// Coefficient of variation that earns the full volatility fee
    pub volatility_reference_bps: u16,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_price_impact_bps: DEFAULT_MAX_PRICE_IMPACT_BPS,
            otc_depletion_cap_bps: DEFAULT_OTC_DEPLETION_CAP_BPS,
            min_spread_bps: DEFAULT_MIN_SPREAD_BPS,
            spread_divisor: DEFAULT_SPREAD_DIVISOR,
            impact_search_iterations: DEFAULT_IMPACT_SEARCH_ITERATIONS,
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            min_observation_interval_secs: DEFAULT_MIN_OBSERVATION_INTERVAL_SECS,
            max_deviation_bps: DEFAULT_MAX_TWAP_DEVIATION_BPS,
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self { withdraw_cooldown_secs: DEFAULT_WITHDRAW_COOLDOWN_SECS }
    }
}

impl Default for PriceHistoryConfig {
    fn default() -> Self {
        Self { volatility_reference_bps: DEFAULT_VOLATILITY_REFERENCE_BPS }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> CoreResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CoreError::Config(format!("failed to serialize config: {}", e)))
    }

    pub fn validate(&self) -> CoreResult<()> {
        self.fees.validate()?;
        self.router.validate()?;
        self.oracle.validate()?;
        self.vault.validate()?;
        self.price_history.validate()
    }
}

impl RouterConfig {
    fn validate(&self) -> CoreResult<()> {
        if self.max_price_impact_bps == 0 || u128::from(self.max_price_impact_bps) > BPS_DENOMINATOR {
            return Err(CoreError::Config("max_price_impact_bps must be in 1..=10000".into()));
        }
        if self.otc_depletion_cap_bps == 0 || u128::from(self.otc_depletion_cap_bps) > BPS_DENOMINATOR {
            return Err(CoreError::Config("otc_depletion_cap_bps must be in 1..=10000".into()));
        }
        if u128::from(self.min_spread_bps) >= BPS_DENOMINATOR {
            return Err(CoreError::Config("min_spread_bps must be below 10000".into()));
        }
        if self.spread_divisor == 0 {
            return Err(CoreError::Config("spread_divisor must be greater than 0".into()));
        }
        if self.impact_search_iterations == 0 || self.impact_search_iterations > 128 {
            return Err(CoreError::Config("impact_search_iterations must be in 1..=128".into()));
        }
        Ok(())
    }
}

impl OracleConfig {
    fn validate(&self) -> CoreResult<()> {
        if self.min_observation_interval_secs <= 0 {
            return Err(CoreError::Config("min_observation_interval_secs must be greater than 0".into()));
        }
        if self.max_deviation_bps == 0 {
            return Err(CoreError::Config("max_deviation_bps must be greater than 0".into()));
        }
        Ok(())
    }
}

impl VaultConfig {
    fn validate(&self) -> CoreResult<()> {
        if self.withdraw_cooldown_secs < 0 {
            return Err(CoreError::Config("withdraw_cooldown_secs must not be negative".into()));
        }
        Ok(())
    }
}

impl PriceHistoryConfig {
    fn validate(&self) -> CoreResult<()> {
        if self.volatility_reference_bps == 0 {
            return Err(CoreError::Config("volatility_reference_bps must be greater than 0".into()));
        }
        Ok(())
    }
}
