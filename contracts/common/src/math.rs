//! Mathematical Utilities for the rpool Engine
//!
//! Checked integer operations. Products that can exceed 128 bits go through
//! [`FixedPointDecimal`] at precision 0, so only the final narrowing back to
//! `u128` can overflow.

use crate::constants::oracle::BPS_DENOMINATOR;
use crate::decimal::FixedPointDecimal;
use crate::errors::{PoolError, PoolResult};

/// `floor(a * b / c)` without intermediate overflow
///
/// # Errors
/// - `DivisionByZero` if `c == 0`
/// - `Overflow` if the quotient does not fit in `u128`
pub fn mul_div_floor(a: u128, b: u128, c: u128) -> PoolResult<u128> {
    if c == 0 {
        return Err(PoolError::DivisionByZero);
    }

    // Fast path: the product fits
    if let Some(product) = a.checked_mul(b) {
        return Ok(product / c);
    }

    FixedPointDecimal::from(a)
        .mul(&FixedPointDecimal::from(b))
        .checked_div(&FixedPointDecimal::from(c))?
        .to_u128()
}

/// Safe addition with overflow check
pub fn safe_add(a: u128, b: u128) -> PoolResult<u128> {
    a.checked_add(b).ok_or(PoolError::Overflow)
}

/// Safe subtraction with underflow check
pub fn safe_sub(a: u128, b: u128) -> PoolResult<u128> {
    a.checked_sub(b).ok_or(PoolError::Underflow)
}

/// Safe multiplication with overflow check
pub fn safe_mul(a: u128, b: u128) -> PoolResult<u128> {
    a.checked_mul(b).ok_or(PoolError::Overflow)
}

/// Relative change from `old` to `new` in basis points
///
/// 100 bps = 1%, 10000 bps = 100%. A move away from zero counts as 100%.
pub fn deviation_bps(old: u128, new: u128) -> u64 {
    if old == 0 {
        return if new == 0 { 0 } else { BPS_DENOMINATOR };
    }

    let diff = old.abs_diff(new);

    // Saturate: anything wider than u64 is far beyond any configured bound
    mul_div_floor(diff, BPS_DENOMINATOR as u128, old)
        .map(|bps| bps.min(u64::MAX as u128) as u64)
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::units::ONE;

    #[test]
    fn test_mul_div_floor_small() {
        assert_eq!(mul_div_floor(10, 3, 4).unwrap(), 7);
        assert_eq!(mul_div_floor(0, 3, 4).unwrap(), 0);
        assert_eq!(mul_div_floor(32, 32, 33).unwrap(), 31);
    }

    #[test]
    fn test_mul_div_floor_wide_intermediate() {
        // u128::MAX * 3 overflows, the quotient does not
        let result = mul_div_floor(u128::MAX, 3, 6).unwrap();
        assert_eq!(result, u128::MAX / 2);

        let big = 1_000_000_000 * ONE;
        assert_eq!(mul_div_floor(big, big, big).unwrap(), big);
    }

    #[test]
    fn test_mul_div_floor_errors() {
        assert_eq!(mul_div_floor(1, 1, 0), Err(PoolError::DivisionByZero));
        assert_eq!(mul_div_floor(u128::MAX, 2, 1), Err(PoolError::Overflow));
    }

    #[test]
    fn test_safe_ops() {
        assert_eq!(safe_add(1, 2).unwrap(), 3);
        assert_eq!(safe_add(u128::MAX, 1), Err(PoolError::Overflow));
        assert_eq!(safe_sub(1, 2), Err(PoolError::Underflow));
        assert_eq!(safe_mul(u128::MAX, 2), Err(PoolError::Overflow));
    }

    #[test]
    fn test_deviation_bps() {
        assert_eq!(deviation_bps(100_000, 100_000), 0);
        assert_eq!(deviation_bps(100_000, 101_000), 100);
        assert_eq!(deviation_bps(100_000, 95_000), 500);
        assert_eq!(deviation_bps(100_000, 110_000), 1000);
        assert_eq!(deviation_bps(0, 0), 0);
        assert_eq!(deviation_bps(0, 5), 10_000);
    }
}
