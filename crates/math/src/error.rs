//! Error types for fixed-point arithmetic

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("Division by zero")]
    DivisionByZero,

    /// Result does not fit in the native word
    #[error("Computation overflow")]
    ComputationOverflow,

    #[error("Math underflow")]
    MathUnderflow,
}

pub type MathResult<T> = Result<T, MathError>;
