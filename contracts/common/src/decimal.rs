//! Fixed-Point Decimal
//!
//! `FixedPointDecimal` represents `scaled_value / 10^precision` exactly, on
//! top of an arbitrary-precision signed integer. Every conversion that loses
//! digits truncates toward zero; the only rounding operation is the explicit
//! [`FixedPointDecimal::to_rounded`] rendering.
//!
//! ## Wire Format
//!
//! ```text
//! { "kind": "Decimal", "value": "-12.3400" }
//! ```
//!
//! The fractional part is present iff precision > 0, and its length is the
//! precision. Deserialization infers the precision from that length.

use core::cmp::Ordering;
use core::fmt;
use core::ops::{Add, Mul, Neg, Sub};
use core::str::FromStr;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::precision::MAX_PRECISION;
use crate::errors::{PoolError, PoolResult};

/// Wire-format discriminator
pub const DECIMAL_KIND: &str = "Decimal";

/// Returns `10^exp`, cached per exponent
fn power_of_ten(exp: u32) -> BigInt {
    static CACHE: OnceLock<RwLock<BTreeMap<u32, BigInt>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| RwLock::new(BTreeMap::new()));

    if let Some(value) = cache.read().get(&exp) {
        return value.clone();
    }

    let value = num_traits::pow(BigInt::from(10u8), exp as usize);
    cache.write().entry(exp).or_insert(value).clone()
}

/// Move `scaled` from precision `from` to precision `to`
fn rescale_scaled(scaled: &BigInt, from: u32, to: u32) -> BigInt {
    match from.cmp(&to) {
        Ordering::Equal => scaled.clone(),
        // BigInt division truncates toward zero
        Ordering::Greater => scaled / power_of_ten(from - to),
        Ordering::Less => scaled * power_of_ten(to - from),
    }
}

/// Rejects precisions above [`MAX_PRECISION`]
fn check_precision(precision: u32, input: impl FnOnce() -> String) -> PoolResult<()> {
    if precision > MAX_PRECISION {
        return Err(PoolError::InvalidDecimal {
            input: input(),
            reason: "precision too large",
        });
    }
    Ok(())
}

/// Exact decimal number with an explicit number of fractional digits
#[derive(Debug, Clone)]
pub struct FixedPointDecimal {
    scaled: BigInt,
    precision: u32,
}

impl FixedPointDecimal {
    /// Zero at the given precision
    pub fn zero(precision: u32) -> Self {
        Self { scaled: BigInt::zero(), precision }
    }

    /// Build directly from a scaled integer: the value is `scaled / 10^precision`
    pub fn from_scaled_integer(scaled: impl Into<BigInt>, precision: u32) -> Self {
        Self { scaled: scaled.into(), precision }
    }

    /// Build from a whole number, padding `precision` zero digits
    pub fn from_integer(value: impl Into<BigInt>, precision: u32) -> PoolResult<Self> {
        let value: BigInt = value.into();
        check_precision(precision, || value.to_string())?;
        Ok(Self {
            scaled: value * power_of_ten(precision),
            precision,
        })
    }

    /// Parse decimal text at a fixed precision
    ///
    /// Fractional digits beyond `precision` are discarded, never rounded:
    /// `"1.239999"` at precision 2 is `1.23`.
    pub fn parse(text: &str, precision: u32) -> PoolResult<Self> {
        let invalid = |reason: &'static str| PoolError::InvalidDecimal {
            input: text.to_string(),
            reason,
        };

        check_precision(precision, || text.to_string())?;

        let trimmed = text.trim();
        let (negative, unsigned) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            Some(_) => (false, trimmed),
            None => return Err(invalid("empty input")),
        };

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (unsigned, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("no digits"));
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("unexpected character"));
        }

        let whole = if int_part.is_empty() {
            BigInt::zero()
        } else {
            int_part
                .parse::<BigInt>()
                .map_err(|_| invalid("unparseable integer part"))?
        };

        let kept = &frac_part[..frac_part.len().min(precision as usize)];
        let mut fraction = if kept.is_empty() {
            BigInt::zero()
        } else {
            kept.parse::<BigInt>()
                .map_err(|_| invalid("unparseable fractional part"))?
        };
        fraction *= power_of_ten(precision - kept.len() as u32);

        let mut scaled = whole * power_of_ten(precision) + fraction;
        if negative {
            scaled = -scaled;
        }

        Ok(Self { scaled, precision })
    }

    /// Number of fractional digits
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// The underlying scaled integer
    pub fn scaled_value(&self) -> &BigInt {
        &self.scaled
    }

    /// Scaled integer of this value at `precision` (truncating when narrowing)
    pub fn to_scaled_integer(&self, precision: u32) -> BigInt {
        rescale_scaled(&self.scaled, self.precision, precision)
    }

    /// Same value at another precision (truncating when narrowing)
    pub fn rescale(&self, precision: u32) -> Self {
        Self {
            scaled: self.to_scaled_integer(precision),
            precision,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.scaled.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.scaled.is_negative()
    }

    pub fn is_positive(&self) -> bool {
        self.scaled.is_positive()
    }

    pub fn abs(&self) -> Self {
        Self {
            scaled: self.scaled.abs(),
            precision: self.precision,
        }
    }

    /// `self + other`, at `self`'s precision
    pub fn add(&self, other: &Self) -> Self {
        Self {
            scaled: &self.scaled + other.to_scaled_integer(self.precision),
            precision: self.precision,
        }
    }

    /// `self - other`, at `self`'s precision
    pub fn sub(&self, other: &Self) -> Self {
        Self {
            scaled: &self.scaled - other.to_scaled_integer(self.precision),
            precision: self.precision,
        }
    }

    /// `(a * b) / 10^precision`, truncating toward zero
    pub fn mul(&self, other: &Self) -> Self {
        let product = &self.scaled * other.to_scaled_integer(self.precision);
        Self {
            scaled: product / power_of_ten(self.precision),
            precision: self.precision,
        }
    }

    /// `(a * 10^precision) / b`, truncating toward zero
    pub fn checked_div(&self, other: &Self) -> PoolResult<Self> {
        let divisor = other.to_scaled_integer(self.precision);
        if divisor.is_zero() {
            return Err(PoolError::DivisionByZero);
        }
        Ok(Self {
            scaled: (&self.scaled * power_of_ten(self.precision)) / divisor,
            precision: self.precision,
        })
    }

    pub fn gt(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Greater
    }

    pub fn lt(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Less
    }

    pub fn gte(&self, other: &Self) -> bool {
        self.cmp(other) != Ordering::Less
    }

    pub fn lte(&self, other: &Self) -> bool {
        self.cmp(other) != Ordering::Greater
    }

    pub fn equals(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }

    /// Render with `digits` fractional digits, dropping the rest
    pub fn to_truncated(&self, digits: u32) -> String {
        render(&self.to_scaled_integer(digits), digits)
    }

    /// Render with `digits` fractional digits, rounding half away from zero
    pub fn to_rounded(&self, digits: u32) -> String {
        if digits >= self.precision {
            return self.to_truncated(digits);
        }

        let divisor = power_of_ten(self.precision - digits);
        let (mut quotient, remainder) = self.scaled.div_rem(&divisor);
        if remainder.abs() * 2u8 >= divisor {
            if self.scaled.is_negative() {
                quotient -= BigInt::one();
            } else {
                quotient += BigInt::one();
            }
        }
        render(&quotient, digits)
    }

    /// Whole part as `u128`, fractional digits truncated
    pub fn to_u128(&self) -> PoolResult<u128> {
        let whole = self.to_scaled_integer(0);
        if whole.is_negative() {
            return Err(PoolError::Underflow);
        }
        whole.to_u128().ok_or(PoolError::Overflow)
    }
}

/// Render a scaled integer, keeping the sign apart from the magnitude digits
fn render(scaled: &BigInt, precision: u32) -> String {
    let digits = scaled.magnitude().to_string();
    let sign = if scaled.is_negative() { "-" } else { "" };

    if precision == 0 {
        return format!("{sign}{digits}");
    }

    let width = precision as usize + 1;
    let padded = if digits.len() < width {
        format!("{}{}", "0".repeat(width - digits.len()), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - precision as usize);
    format!("{sign}{int_part}.{frac_part}")
}

impl fmt::Display for FixedPointDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.scaled, self.precision))
    }
}

impl FromStr for FixedPointDecimal {
    type Err = PoolError;

    /// Parses at the precision the text carries (`"1.50"` has precision 2)
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let precision = match text.trim().split_once('.') {
            Some((_, frac)) => frac.len(),
            None => 0,
        };
        if precision > MAX_PRECISION as usize {
            return Err(PoolError::InvalidDecimal {
                input: text.to_string(),
                reason: "too many fractional digits",
            });
        }
        Self::parse(text, precision as u32)
    }
}

impl PartialEq for FixedPointDecimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FixedPointDecimal {}

impl PartialOrd for FixedPointDecimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FixedPointDecimal {
    /// Exact comparison at the wider of the two precisions
    fn cmp(&self, other: &Self) -> Ordering {
        let common = self.precision.max(other.precision);
        self.to_scaled_integer(common)
            .cmp(&other.to_scaled_integer(common))
    }
}

impl From<u128> for FixedPointDecimal {
    fn from(value: u128) -> Self {
        Self::from_scaled_integer(value, 0)
    }
}

impl From<u64> for FixedPointDecimal {
    fn from(value: u64) -> Self {
        Self::from_scaled_integer(value, 0)
    }
}

impl From<i128> for FixedPointDecimal {
    fn from(value: i128) -> Self {
        Self::from_scaled_integer(value, 0)
    }
}

impl Neg for FixedPointDecimal {
    type Output = FixedPointDecimal;

    fn neg(self) -> Self::Output {
        Self {
            scaled: -self.scaled,
            precision: self.precision,
        }
    }
}

macro_rules! forward_binop {
    ($trait:ident, $method:ident) => {
        impl $trait<&FixedPointDecimal> for &FixedPointDecimal {
            type Output = FixedPointDecimal;

            fn $method(self, rhs: &FixedPointDecimal) -> FixedPointDecimal {
                FixedPointDecimal::$method(self, rhs)
            }
        }

        impl $trait for FixedPointDecimal {
            type Output = FixedPointDecimal;

            fn $method(self, rhs: FixedPointDecimal) -> FixedPointDecimal {
                FixedPointDecimal::$method(&self, &rhs)
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Sub, sub);
forward_binop!(Mul, mul);

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DecimalRepr {
    kind: String,
    value: String,
}

impl Serialize for FixedPointDecimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DecimalRepr {
            kind: DECIMAL_KIND.to_string(),
            value: self.to_string(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FixedPointDecimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = DecimalRepr::deserialize(deserializer)?;
        if repr.kind != DECIMAL_KIND {
            return Err(serde::de::Error::custom(format!(
                "expected kind {DECIMAL_KIND:?}, found {:?}",
                repr.kind
            )));
        }
        repr.value.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(text: &str, precision: u32) -> FixedPointDecimal {
        FixedPointDecimal::parse(text, precision).unwrap()
    }

    #[test]
    fn test_parse_truncates() {
        assert_eq!(dec("1.239999", 2).to_string(), "1.23");
        assert_eq!(dec("-1.239999", 2).to_string(), "-1.23");
        assert_eq!(dec("7", 3).to_string(), "7.000");
        assert_eq!(dec(".5", 1).to_string(), "0.5");
    }

    #[test]
    fn test_precision_zero_discards_fraction() {
        assert_eq!(dec("9.99", 0).to_string(), "9");
        assert_eq!(dec("-9.99", 0).to_string(), "-9");
        assert_eq!(dec("0.5", 0).to_string(), "0");
    }

    #[test]
    fn test_precision_bound() {
        assert!(matches!(
            FixedPointDecimal::parse("1", u32::MAX),
            Err(PoolError::InvalidDecimal { reason: "precision too large", .. })
        ));
        assert!(matches!(
            FixedPointDecimal::from_integer(1u8, MAX_PRECISION + 1),
            Err(PoolError::InvalidDecimal { .. })
        ));
        assert_eq!(dec("1", MAX_PRECISION).precision(), MAX_PRECISION);
        assert_eq!(
            FixedPointDecimal::from_integer(3u8, 2).unwrap().to_string(),
            "3.00"
        );
    }

    #[test]
    fn test_rounded_vs_truncated() {
        let value = dec("1.239999", 6);
        assert_eq!(value.to_truncated(2), "1.23");
        assert_eq!(value.to_rounded(2), "1.24");

        // Half away from zero, both signs
        assert_eq!(dec("2.345", 3).to_rounded(2), "2.35");
        assert_eq!(dec("-2.345", 3).to_rounded(2), "-2.35");
        assert_eq!(dec("2.344", 3).to_rounded(2), "2.34");
        assert_eq!(dec("0.5", 1).to_rounded(0), "1");
        assert_eq!(dec("-0.5", 1).to_rounded(0), "-1");

        // Widening just pads
        assert_eq!(dec("1.5", 1).to_rounded(3), "1.500");
    }

    #[test]
    fn test_negative_rendering() {
        assert_eq!(dec("-0.05", 2).to_string(), "-0.05");
        assert_eq!(dec("-12.3400", 4).to_string(), "-12.3400");
        // Negative values that truncate to zero render without a sign
        assert_eq!(dec("-0.001", 2).to_string(), "0.00");
    }

    #[test]
    fn test_invalid_text() {
        for input in ["", "-", ".", "1.2.3", "abc", "1e5", " - 1"] {
            assert!(
                matches!(
                    FixedPointDecimal::parse(input, 2),
                    Err(PoolError::InvalidDecimal { .. })
                ),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rescale() {
        let value = dec("3.14159", 5);
        assert_eq!(value.rescale(2).to_string(), "3.14");
        assert_eq!(value.rescale(7).to_string(), "3.1415900");
        assert_eq!(dec("-3.149", 3).rescale(1).to_string(), "-3.1");
    }

    #[test]
    fn test_add_sub_use_left_precision() {
        let a = dec("1.50", 2);
        let b = dec("0.259", 3);
        assert_eq!(FixedPointDecimal::add(&a, &b).to_string(), "1.75");
        assert_eq!(FixedPointDecimal::sub(&a, &b).to_string(), "1.25");
        assert_eq!((&b + &a).to_string(), "1.759");
    }

    #[test]
    fn test_mul_div_truncate() {
        let a = dec("1.23", 2);
        let b = dec("4.56", 2);
        // 1.23 * 4.56 = 5.6088
        assert_eq!(FixedPointDecimal::mul(&a, &b).to_string(), "5.60");
        // 1.23 / 4.56 = 0.2697...
        assert_eq!(a.checked_div(&b).unwrap().to_string(), "0.26");
        assert_eq!(dec("-1", 2).checked_div(&dec("3", 2)).unwrap().to_string(), "-0.33");
    }

    #[test]
    fn test_div_by_zero() {
        let a = dec("1", 2);
        assert_eq!(a.checked_div(&FixedPointDecimal::zero(2)), Err(PoolError::DivisionByZero));
        // A divisor that truncates to zero at the result precision is zero
        assert_eq!(a.checked_div(&dec("0.001", 3)), Err(PoolError::DivisionByZero));
    }

    #[test]
    fn test_comparisons() {
        let a = dec("1.23", 2);
        let b = dec("1.230", 3);
        let c = dec("1.231", 3);
        assert!(a.equals(&b));
        assert_eq!(a, b);
        assert!(c.gt(&a));
        assert!(a.lt(&c));
        assert!(a.gte(&b) && a.lte(&b));
        assert!(dec("-2", 0).lt(&dec("-1.5", 1)));
        assert_eq!(dec("-4.5", 1).abs(), dec("4.5", 1));
    }

    #[test]
    fn test_scaled_round_trip() {
        for (x, p) in [(0i64, 0u32), (1, 0), (-1, 3), (123_456_789, 18), (i64::MAX, 7)] {
            let value = FixedPointDecimal::from_scaled_integer(x, p);
            assert_eq!(value.to_scaled_integer(p), BigInt::from(x));
        }
    }

    #[test]
    fn test_to_u128() {
        assert_eq!(dec("42.99", 2).to_u128(), Ok(42));
        assert_eq!(dec("-0.5", 1).to_u128(), Ok(0));
        assert_eq!(dec("-1", 0).to_u128(), Err(PoolError::Underflow));

        let too_wide = FixedPointDecimal::from(u128::MAX) + FixedPointDecimal::from(1u128);
        assert_eq!(too_wide.to_u128(), Err(PoolError::Overflow));
    }

    #[test]
    fn test_wire_format() {
        let value = dec("-12.34", 2);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"kind":"Decimal","value":"-12.34"}"#);

        let back: FixedPointDecimal = serde_json::from_str(&json).unwrap();
        assert_eq!(back.precision(), 2);
        assert_eq!(back, value);

        let whole = serde_json::to_value(FixedPointDecimal::from(32u128)).unwrap();
        assert_eq!(whole, serde_json::json!({ "kind": "Decimal", "value": "32" }));
    }

    #[test]
    fn test_wire_format_rejects_wrong_kind() {
        let result: Result<FixedPointDecimal, _> =
            serde_json::from_str(r#"{"kind":"Integer","value":"1"}"#);
        assert!(result.is_err());

        let result: Result<FixedPointDecimal, _> =
            serde_json::from_str(r#"{"kind":"Decimal","value":"1.x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_power_of_ten_cache_is_consistent() {
        assert_eq!(power_of_ten(0), BigInt::one());
        assert_eq!(power_of_ten(3), BigInt::from(1_000));
        assert_eq!(power_of_ten(3), BigInt::from(1_000));
        assert_eq!(power_of_ten(20).to_string(), format!("1{}", "0".repeat(20)));
    }
}
