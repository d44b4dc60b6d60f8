/// Mathematical utilities for the bootstrap router
///
/// This crate provides the full-precision multiply-divide primitive every
/// share/collateral conversion depends on, checked arithmetic helpers, and
/// the integer curve shapes used by the dynamic fee schedule.

pub mod curves;
pub mod error;
pub mod full_math;
pub mod safe;

// Re-export commonly used functions
pub use curves::*;
pub use error::{MathError, MathResult};
pub use full_math::*;
pub use safe::*;

/// Basis points denominator (10,000 = 100%)
pub const BPS_DENOMINATOR: u128 = 10_000;

/// 18-decimal fixed-point unit
pub const WAD: u128 = 1_000_000_000_000_000_000;
