//! Full-precision multiply-divide.
//!
//! `mul_div` computes `floor(x * y / d)` for `u128` operands while keeping the
//! whole 256-bit intermediate product. When the product fits in a single word
//! it is a plain division; otherwise the quotient is recovered with the
//! exact-division trick: subtract the remainder, strip the power-of-two factor
//! of `d`, and multiply by the modular inverse of the odd part (Newton
//! iteration modulo 2^128).

use crate::error::{MathError, MathResult};

const LOW_MASK: u128 = u64::MAX as u128;

/// Full 256-bit product `x * y`, returned as `(hi, lo)` words.
pub const fn full_mul(x: u128, y: u128) -> (u128, u128) {
    let (x_lo, x_hi) = (x & LOW_MASK, x >> 64);
    let (y_lo, y_hi) = (y & LOW_MASK, y >> 64);

    let ll = x_lo * y_lo;
    let lh = x_lo * y_hi;
    let hl = x_hi * y_lo;
    let hh = x_hi * y_hi;

    // Middle column: three 64-bit terms, cannot overflow u128
    let mid = (ll >> 64) + (lh & LOW_MASK) + (hl & LOW_MASK);

    let lo = (ll & LOW_MASK) | (mid << 64);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (hi, lo)
}

/// `(hi * 2^128 + lo) mod d`, requires `hi < d`.
fn wide_rem(hi: u128, lo: u128, d: u128) -> u128 {
    debug_assert!(hi < d);
    let mut rem = hi;
    for bit in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> bit) & 1);
        // True value is < 2d, so a single subtraction normalizes it
        if carry == 1 || rem >= d {
            rem = rem.wrapping_sub(d);
        }
    }
    rem
}

/// Compute `floor(x * y / d)` without intermediate overflow.
///
/// Fails with `DivisionByZero` when `d == 0` and with `ComputationOverflow`
/// when the quotient does not fit in a `u128`.
pub fn mul_div(x: u128, y: u128, d: u128) -> MathResult<u128> {
    if d == 0 {
        return Err(MathError::DivisionByZero);
    }

    let (prod1, prod0) = full_mul(x, y);

    // Product fits in one word
    if prod1 == 0 {
        return Ok(prod0 / d);
    }

    // Quotient must fit in one word
    if d <= prod1 {
        return Err(MathError::ComputationOverflow);
    }

    // Subtract the remainder so the 256-bit division is exact
    let remainder = wide_rem(prod1, prod0, d);
    let prod1 = prod1 - (remainder > prod0) as u128;
    let prod0 = prod0.wrapping_sub(remainder);

    // Factor the largest power of two out of d
    let twos = d & d.wrapping_neg();
    let d = d / twos;
    let mut prod0 = prod0 / twos;

    // Shift the high word in: twos becomes 2^128 / twos (0 when twos == 1)
    let flip = (0u128.wrapping_sub(twos) / twos).wrapping_add(1);
    prod0 |= prod1.wrapping_mul(flip);

    // Inverse of the odd part modulo 2^128, seed is exact to 4 bits
    let mut inverse = d.wrapping_mul(3) ^ 2;
    for _ in 0..5 {
        inverse = inverse.wrapping_mul(2u128.wrapping_sub(d.wrapping_mul(inverse)));
    }

    Ok(prod0.wrapping_mul(inverse))
}

/// Compute `ceil(x * y / d)` without intermediate overflow.
pub fn mul_div_up(x: u128, y: u128, d: u128) -> MathResult<u128> {
    let quotient = mul_div(x, y, d)?;
    let (hi, lo) = full_mul(x, y);
    let remainder = if hi == 0 { lo % d } else { wide_rem(hi, lo, d) };

    if remainder == 0 {
        Ok(quotient)
    } else {
        quotient.checked_add(1).ok_or(MathError::ComputationOverflow)
    }
}
