/// Safe arithmetic operations with overflow protection
///
/// All operations return errors instead of panicking, providing
/// comprehensive protection against arithmetic errors.

use crate::error::{MathError, MathResult};
use crate::full_math::{mul_div, mul_div_up};
use crate::BPS_DENOMINATOR;

/// Macro to generate safe arithmetic functions
macro_rules! safe_arith {
    ($fn_name:ident, $type:ty, $checked_method:ident, $error:expr) => {
        pub fn $fn_name(a: $type, b: $type) -> MathResult<$type> {
            a.$checked_method(b).ok_or($error)
        }
    };

    (div, $fn_name:ident, $type:ty) => {
        pub fn $fn_name(a: $type, b: $type) -> MathResult<$type> {
            if b == 0 {
                return Err(MathError::DivisionByZero);
            }
            Ok(a / b)
        }
    };
}

// ============================================================================
// Safe Basic Arithmetic
// ============================================================================

safe_arith!(safe_add_u128, u128, checked_add, MathError::ComputationOverflow);
safe_arith!(safe_sub_u128, u128, checked_sub, MathError::MathUnderflow);
safe_arith!(safe_mul_u128, u128, checked_mul, MathError::ComputationOverflow);
safe_arith!(div, safe_div_u128, u128);

safe_arith!(safe_add_i64, i64, checked_add, MathError::ComputationOverflow);
safe_arith!(safe_sub_i64, i64, checked_sub, MathError::MathUnderflow);

// ============================================================================
// Basis Point Helpers
// ============================================================================

/// `amount * bps / 10_000`, rounded down
pub fn bps_of(amount: u128, bps: u128) -> MathResult<u128> {
    mul_div(amount, bps, BPS_DENOMINATOR)
}

/// `amount * bps / 10_000`, rounded up
pub fn bps_of_up(amount: u128, bps: u128) -> MathResult<u128> {
    mul_div_up(amount, bps, BPS_DENOMINATOR)
}

/// Express `part / whole` in basis points, rounded down
pub fn ratio_bps(part: u128, whole: u128) -> MathResult<u128> {
    mul_div(part, BPS_DENOMINATOR, whole)
}

/// Absolute difference of two unsigned values
pub const fn abs_diff(a: u128, b: u128) -> u128 {
    if a > b {
        a - b
    } else {
        b - a
    }
}
