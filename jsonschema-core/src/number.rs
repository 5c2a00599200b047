//! Arbitrary-precision number comparisons (spec.md §4.2/§9): instance
//! numbers are never normalized through `f64` before being compared,
//! ordered, or tested for divisibility.
use std::cmp::Ordering;

use fraction::{BigFraction, BigUint};
use serde_json::Number as JsonNumber;

/// A JSON number represented exactly as a `BigFraction`, built from its
/// decimal text rather than from `f64`, so values outside `f64`'s integral
/// range or with more significant digits than it can hold compare
/// correctly.
#[derive(Debug, Clone)]
pub struct Number(BigFraction);

impl Number {
    #[must_use]
    pub fn from_json(value: &JsonNumber) -> Self {
        if let Some(i) = value.as_i64() {
            return Number(exact_from_i64(i));
        }
        if let Some(u) = value.as_u64() {
            return Number(BigFraction::new(BigUint::from(u), BigUint::from(1_u8)));
        }
        Number(parse_decimal_exact(&value.to_string()))
    }

    /// True if this number's exact value has no fractional part.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(self.0.denom(), Some(denom) if denom == &BigUint::from(1_u8))
    }

    /// True if `self` is an exact integer multiple of `divisor`. A zero
    /// divisor never divides anything.
    #[must_use]
    pub fn is_multiple_of(&self, divisor: &Number) -> bool {
        if divisor.0 == BigFraction::from(0_u8) {
            return false;
        }
        let ratio = self.0.clone() / divisor.0.clone();
        matches!(ratio.denom(), Some(denom) if denom == &BigUint::from(1_u8))
    }

    #[must_use]
    pub fn cmp_exact(&self, other: &Number) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp_exact(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_exact(other)
    }
}

fn exact_from_i64(value: i64) -> BigFraction {
    if value < 0 {
        BigFraction::new_neg(BigUint::from(value.unsigned_abs()), BigUint::from(1_u8))
    } else {
        BigFraction::new(BigUint::from(value as u64), BigUint::from(1_u8))
    }
}

/// Parses a JSON number's canonical decimal text (`-?digits(.digits)?([eE][+-]?digits)?`)
/// into an exact `BigFraction`, never routing through `f64`.
fn parse_decimal_exact(text: &str) -> BigFraction {
    let negative = text.starts_with('-');
    let unsigned = text.trim_start_matches(['-', '+']);
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((mantissa, exp)) => (mantissa, exp.parse::<i64>().unwrap_or(0)),
        None => (unsigned, 0),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (mantissa, ""),
    };
    let digits = format!("{int_part}{frac_part}");
    let numerator = BigUint::parse_bytes(digits.as_bytes(), 10).unwrap_or_default();
    let shift = exponent - frac_part.len() as i64;
    let (numerator, denominator) = if shift >= 0 {
        (numerator * BigUint::from(10_u8).pow(shift as u32), BigUint::from(1_u8))
    } else {
        (numerator, BigUint::from(10_u8).pow((-shift) as u32))
    };
    if negative {
        BigFraction::new_neg(numerator, denominator)
    } else {
        BigFraction::new(numerator, denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn number(value: serde_json::Value) -> Number {
        Number::from_json(value.as_number().unwrap())
    }

    #[test_case(json!(4), true)]
    #[test_case(json!(4.0), true)]
    #[test_case(json!(4.5), false)]
    fn is_integer(value: serde_json::Value, expected: bool) {
        assert_eq!(number(value).is_integer(), expected);
    }

    #[test_case(json!(4), json!(2), true)]
    #[test_case(json!(4.5), json!(1.5), true)]
    #[test_case(json!(4.5), json!(1.0), false)]
    #[test_case(json!(0), json!(0), false)]
    fn is_multiple_of(value: serde_json::Value, divisor: serde_json::Value, expected: bool) {
        assert_eq!(number(value).is_multiple_of(&number(divisor)), expected);
    }

    #[test]
    fn large_integer_compares_exactly() {
        let a = number(json!(9_007_199_254_740_993_u64));
        let b = number(json!(9_007_199_254_740_992_u64));
        assert!(a > b);
    }

    #[test]
    fn equal_values_in_different_representations_compare_equal() {
        assert_eq!(number(json!(1.0)), number(json!(1)));
    }
}
