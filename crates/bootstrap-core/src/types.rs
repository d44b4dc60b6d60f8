//! # Core Types
//!
//! Identifiers, outcome sides, and the clock snapshot every operation is
//! evaluated against.

use crate::constants::{BPS_DENOMINATOR, PRICE_SCALE};
use crate::errors::CoreResult;
use bootstrap_math::{mul_div, safe_add_u128};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome side of a binary claim market
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "anchor", derive(anchor_lang::AnchorSerialize, anchor_lang::AnchorDeserialize))]
pub enum Side {
    Yes,
    No,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Yes, Side::No];

    pub fn opposite(self) -> Side {
        match self {
            Side::Yes => Side::No,
            Side::No => Side::Yes,
        }
    }

    /// Slot index for per-side arrays
    pub fn index(self) -> usize {
        match self {
            Side::Yes => 0,
            Side::No => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Yes => write!(f, "YES"),
            Side::No => write!(f, "NO"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "anchor", derive(anchor_lang::AnchorSerialize, anchor_lang::AnchorDeserialize))]
pub struct MarketId(pub u64);

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "market-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "anchor", derive(anchor_lang::AnchorSerialize, anchor_lang::AnchorDeserialize))]
pub struct PoolId(pub u64);

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool-{}", self.0)
    }
}

/// 32-byte account key (depositor, resolver, admin, collateral mint)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "anchor", derive(anchor_lang::AnchorSerialize, anchor_lang::AnchorDeserialize))]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    /// Key with every byte set to `byte`, handy for fixtures
    pub const fn repeat(byte: u8) -> Self {
        AccountId([byte; 32])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..4] {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, "..")
    }
}

/// Collateral backing a market's paired claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "anchor", derive(anchor_lang::AnchorSerialize, anchor_lang::AnchorDeserialize))]
pub enum CollateralAsset {
    /// Chain-native asset, paid with the request value
    Native,
    /// Fungible token identified by its mint
    Token(AccountId),
}

impl CollateralAsset {
    pub fn is_native(&self) -> bool {
        matches!(self, CollateralAsset::Native)
    }
}

/// Outcome reserves of a constant-product venue pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "anchor", derive(anchor_lang::AnchorSerialize, anchor_lang::AnchorDeserialize))]
pub struct PoolReserves {
    pub yes: u128,
    pub no: u128,
}

impl PoolReserves {
    pub fn new(yes: u128, no: u128) -> Self {
        Self { yes, no }
    }

    pub fn get(&self, side: Side) -> u128 {
        match side {
            Side::Yes => self.yes,
            Side::No => self.no,
        }
    }

    /// P(YES) = no / (yes + no), scaled by `PRICE_SCALE`. An empty pool is 50/50.
    pub fn price_yes(&self) -> CoreResult<u128> {
        let total = safe_add_u128(self.yes, self.no)?;
        if total == 0 {
            return Ok(PRICE_SCALE / 2);
        }
        Ok(mul_div(self.no, PRICE_SCALE, total)?)
    }

    /// Price of `side`, scaled by `PRICE_SCALE`
    pub fn price(&self, side: Side) -> CoreResult<u128> {
        let p_yes = self.price_yes()?;
        Ok(match side {
            Side::Yes => p_yes,
            Side::No => PRICE_SCALE - p_yes,
        })
    }

    /// P(YES) in basis points, rounded down
    pub fn price_yes_bps(&self) -> CoreResult<u128> {
        Ok(mul_div(self.price_yes()?, BPS_DENOMINATOR, PRICE_SCALE)?)
    }
}

/// Block height and wall-clock time at which a request executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "anchor", derive(anchor_lang::AnchorSerialize, anchor_lang::AnchorDeserialize))]
pub struct ClockSnapshot {
    pub slot: u64,
    pub unix_timestamp: i64,
}

impl ClockSnapshot {
    pub fn new(slot: u64, unix_timestamp: i64) -> Self {
        Self { slot, unix_timestamp }
    }

    /// Advance by `secs` seconds and `slots` blocks
    pub fn advanced(&self, secs: i64, slots: u64) -> Self {
        Self {
            slot: self.slot.saturating_add(slots),
            unix_timestamp: self.unix_timestamp.saturating_add(secs),
        }
    }
}

/// Read-only view of a market owned by the claim registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketInfo {
    pub id: MarketId,
    pub description: String,
    pub resolver: AccountId,
    pub collateral: CollateralAsset,
    pub close_time: i64,
    pub resolved: bool,
    pub winning_side: Option<Side>,
}

impl MarketInfo {
    /// Closed for trading: resolved or past the scheduled close
    pub fn is_closed(&self, now: i64) -> bool {
        self.resolved || now >= self.close_time
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    Buy,
    Sell,
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeDirection::Buy => write!(f, "buy"),
            TradeDirection::Sell => write!(f, "sell"),
        }
    }
}
