//! # Core Error Types
//!
//! Every failure rejects the whole request; nothing is retried internally.
//! Variants are grouped by the layer that detects them.

use bootstrap_math::MathError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    // ========================================================================
    // Validation Errors
    // ========================================================================

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Deposit mints zero shares")]
    ZeroShares,

    #[error("Vault share amount must be greater than zero")]
    ZeroVaultShares,

    #[error("Native payment does not match the market collateral")]
    NativePaymentMismatch,

    #[error("Native payment exhausted: needed {needed}, provided {provided}")]
    InsufficientNativePayment { needed: u128, provided: u128 },

    #[error("Invalid fee configuration: {0}")]
    InvalidFeeConfig(&'static str),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Timing Errors
    // ========================================================================

    #[error("Deadline expired")]
    DeadlineExpired,

    #[error("Trading halted")]
    TradingHalted,

    #[error("Close window: no eligible venue")]
    CloseWindowNoVenue,

    #[error("Withdrawal too soon: available at {available_at}")]
    WithdrawalTooSoon { available_at: i64 },

    // ========================================================================
    // State Errors
    // ========================================================================

    #[error("Market not found")]
    MarketNotFound,

    #[error("Market closed or resolved")]
    MarketClosed,

    #[error("Vault side depleted")]
    VaultDepleted,

    #[error("Insufficient vault shares: requested {requested}, balance {balance}")]
    InsufficientVaultShares { requested: u128, balance: u128 },

    #[error("Position not found")]
    PositionNotFound,

    #[error("Duplicate registration")]
    DuplicateRegistration,

    #[error("Pool not found")]
    PoolNotFound,

    #[error("Insufficient liquidity")]
    InsufficientLiquidity,

    // ========================================================================
    // Economic Errors
    // ========================================================================

    #[error("Slippage exceeded: output {output}, minimum {minimum}")]
    SlippageExceeded { output: u128, minimum: u128 },

    #[error("Price impact exceeded")]
    PriceImpactExceeded,

    #[error("Computation overflow")]
    ComputationOverflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Math underflow")]
    MathUnderflow,

    // ========================================================================
    // Authorization Errors
    // ========================================================================

    #[error("Unauthorized")]
    Unauthorized,
}

/// Result type using core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl From<MathError> for CoreError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::DivisionByZero => CoreError::DivisionByZero,
            MathError::ComputationOverflow => CoreError::ComputationOverflow,
            MathError::MathUnderflow => CoreError::MathUnderflow,
        }
    }
}

impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        CoreError::Config(err.to_string())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Config(err.to_string())
    }
}

impl CoreError {
    /// Stable numeric code, offset like Anchor custom errors
    pub fn code(&self) -> u32 {
        let index = match self {
            CoreError::ZeroAmount => 0,
            CoreError::ZeroShares => 1,
            CoreError::ZeroVaultShares => 2,
            CoreError::NativePaymentMismatch => 3,
            CoreError::InsufficientNativePayment { .. } => 4,
            CoreError::InvalidFeeConfig(_) => 5,
            CoreError::InvalidParameter(_) => 6,
            CoreError::Config(_) => 7,
            CoreError::DeadlineExpired => 100,
            CoreError::TradingHalted => 101,
            CoreError::CloseWindowNoVenue => 102,
            CoreError::WithdrawalTooSoon { .. } => 103,
            CoreError::MarketNotFound => 200,
            CoreError::MarketClosed => 201,
            CoreError::VaultDepleted => 202,
            CoreError::InsufficientVaultShares { .. } => 203,
            CoreError::PositionNotFound => 204,
            CoreError::DuplicateRegistration => 205,
            CoreError::PoolNotFound => 206,
            CoreError::InsufficientLiquidity => 207,
            CoreError::SlippageExceeded { .. } => 300,
            CoreError::PriceImpactExceeded => 301,
            CoreError::ComputationOverflow => 302,
            CoreError::DivisionByZero => 303,
            CoreError::MathUnderflow => 304,
            CoreError::Unauthorized => 400,
        };
        6000 + index
    }
}

// Conversion for on-chain use
#[cfg(feature = "anchor")]
impl From<CoreError> for anchor_lang::prelude::ProgramError {
    fn from(err: CoreError) -> Self {
        anchor_lang::prelude::ProgramError::Custom(err.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::SlippageExceeded { output: 90, minimum: 100 };
        assert_eq!(format!("{}", err), "Slippage exceeded: output 90, minimum 100");

        let err = CoreError::WithdrawalTooSoon { available_at: 21_600 };
        assert_eq!(format!("{}", err), "Withdrawal too soon: available at 21600");
    }

    #[test]
    fn test_math_error_conversion() {
        assert_eq!(CoreError::from(MathError::ComputationOverflow), CoreError::ComputationOverflow);
        assert_eq!(CoreError::from(MathError::DivisionByZero).code(), 6303);
    }
}
