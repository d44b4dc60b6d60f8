//! Integer curve shapes over a basis-point domain.
//!
//! Every function maps an input in `[0, 10_000]` bps to an output in the same
//! range, so callers can scale any fee span by the result.

use integer_sqrt::IntegerSquareRoot;

use crate::error::MathResult;
use crate::full_math::mul_div;
use crate::BPS_DENOMINATOR;

const Q64: u128 = 1u128 << 64;

/// Fractional bits resolved by `log2_one_plus_bps`
const LOG2_PRECISION_BITS: u32 = 20;

/// `x^exponent` with `x` in bps, result in bps
pub fn pow_bps(x_bps: u128, exponent: u32) -> u128 {
    let x = x_bps.min(BPS_DENOMINATOR);
    let mut result = BPS_DENOMINATOR;
    for _ in 0..exponent {
        result = result * x / BPS_DENOMINATOR;
    }
    result
}

/// `sqrt(x)` with `x` in bps, result in bps
pub fn sqrt_bps(x_bps: u128) -> u128 {
    (x_bps.min(BPS_DENOMINATOR) * BPS_DENOMINATOR).integer_sqrt()
}

/// Integer square root
pub fn isqrt(value: u128) -> u128 {
    value.integer_sqrt()
}

/// `log2(1 + x)` with `x` in bps, result in bps.
///
/// Binary expansion by repeated squaring of `1 + x` in Q64.
pub fn log2_one_plus_bps(x_bps: u128) -> MathResult<u128> {
    if x_bps >= BPS_DENOMINATOR {
        return Ok(BPS_DENOMINATOR);
    }

    let mut value = Q64 + mul_div(x_bps, Q64, BPS_DENOMINATOR)?;
    let mut fraction: u128 = 0;

    for bit in (0..LOG2_PRECISION_BITS).rev() {
        value = mul_div(value, value, Q64)?;
        if value >= 2 * Q64 {
            value >>= 1;
            fraction |= 1 << bit;
        }
    }

    Ok(fraction * BPS_DENOMINATOR >> LOG2_PRECISION_BITS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pow_bps() {
        assert_eq!(pow_bps(5_000, 1), 5_000);
        assert_eq!(pow_bps(5_000, 2), 2_500);
        assert_eq!(pow_bps(5_000, 3), 1_250);
        assert_eq!(pow_bps(10_000, 4), 10_000);
        assert_eq!(pow_bps(0, 2), 0);
        assert_eq!(pow_bps(20_000, 2), 10_000);
    }

    #[test]
    fn test_sqrt_bps() {
        assert_eq!(sqrt_bps(2_500), 5_000);
        assert_eq!(sqrt_bps(10_000), 10_000);
        assert_eq!(sqrt_bps(0), 0);
        assert_eq!(isqrt(1_000_000), 1_000);
    }

    #[test]
    fn test_log2_endpoints() {
        assert_eq!(log2_one_plus_bps(0), Ok(0));
        assert_eq!(log2_one_plus_bps(10_000), Ok(10_000));
        // log2(1.5) = 0.58496...
        let half = log2_one_plus_bps(5_000).unwrap();
        assert!((5_848..=5_850).contains(&half), "log2(1.5) = {}", half);
    }

    #[test]
    fn test_log2_monotonic() {
        let mut previous = 0;
        for x in (0..=10_000).step_by(250) {
            let value = log2_one_plus_bps(x).unwrap();
            assert!(value >= previous);
            previous = value;
        }
    }
}
