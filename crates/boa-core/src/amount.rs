//! Exact fixed-point monetary amounts.
//!
//! An [`Amount`] is a non-negative count of the smallest BOA unit
//! (1 BOA = 10^7 units). Every arithmetic operation is checked: an
//! operation that would go negative or overflow returns an
//! [`AmountError`] instead of wrapping or clamping. Division is integer
//! floor division, which is what fee scaling relies on.
//!
//! Floating point never enters the selection or fee path. [`Amount::from_boa`]
//! and [`Amount::to_boa_f64`] exist for UI input and display only.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::{BOA_DECIMALS, UNITS_PER_BOA};
use crate::error::AmountError;

/// A non-negative amount in the smallest currency unit.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
    bincode::Encode, bincode::Decode,
)]
pub struct Amount(u64);

impl Amount {
    /// Zero units.
    pub const ZERO: Self = Self(0);

    /// Create an amount from a count of units.
    pub const fn new(units: u64) -> Self {
        Self(units)
    }

    /// Create an amount from a whole number of BOA.
    pub fn from_whole_boa(boa: u64) -> Result<Self, AmountError> {
        boa.checked_mul(UNITS_PER_BOA)
            .map(Self)
            .ok_or(AmountError::Overflow)
    }

    /// Parse a decimal BOA string such as `"12.5"` into an exact amount.
    ///
    /// Rejects negative values, malformed input and fractional digits
    /// beyond the unit's precision unless those extra digits are zero.
    pub fn from_boa_str(value: &str) -> Result<Self, AmountError> {
        let s = value.trim();
        if s.starts_with('-') {
            return Err(AmountError::Negative(value.to_string()));
        }

        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };

        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::Malformed(value.to_string()));
        }
        if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::Malformed(value.to_string()));
        }
        if s.ends_with('.') {
            return Err(AmountError::Malformed(value.to_string()));
        }

        let decimals = BOA_DECIMALS as usize;
        let frac = if frac_part.len() > decimals {
            let (kept, rest) = frac_part.split_at(decimals);
            if rest.bytes().any(|b| b != b'0') {
                return Err(AmountError::TooPrecise(value.to_string()));
            }
            kept.to_string()
        } else {
            format!("{frac_part:0<decimals$}")
        };

        let whole: u64 = int_part.parse().map_err(|_| AmountError::Overflow)?;
        let fraction: u64 = if frac.is_empty() {
            0
        } else {
            frac.parse().map_err(|_| AmountError::Malformed(value.to_string()))?
        };

        Self::from_whole_boa(whole)?.checked_add(Self(fraction))
    }

    /// Convert a floating-point BOA value through its shortest decimal form.
    ///
    /// `0.001` becomes exactly 10,000 units. Values that need more than
    /// seven fractional digits are rejected rather than rounded.
    pub fn from_boa(value: f64) -> Result<Self, AmountError> {
        if !value.is_finite() {
            return Err(AmountError::Malformed(value.to_string()));
        }
        if value < 0.0 {
            return Err(AmountError::Negative(value.to_string()));
        }
        Self::from_boa_str(&value.to_string())
    }

    /// Number of units in this amount.
    pub const fn units(&self) -> u64 {
        self.0
    }

    /// Whether this amount is zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `self + rhs`, failing on overflow.
    pub fn checked_add(self, rhs: Self) -> Result<Self, AmountError> {
        self.0.checked_add(rhs.0).map(Self).ok_or(AmountError::Overflow)
    }

    /// `self - rhs`, failing when the result would be negative.
    pub fn checked_sub(self, rhs: Self) -> Result<Self, AmountError> {
        self.0.checked_sub(rhs.0).map(Self).ok_or(AmountError::Underflow {
            lhs: self.0,
            rhs: rhs.0,
        })
    }

    /// `self * factor`, failing on overflow.
    pub fn checked_mul(self, factor: u64) -> Result<Self, AmountError> {
        self.0.checked_mul(factor).map(Self).ok_or(AmountError::Overflow)
    }

    /// `self / divisor` rounded toward zero. The remainder is discarded.
    pub fn checked_div(self, divisor: u64) -> Result<Self, AmountError> {
        if divisor == 0 {
            return Err(AmountError::DivisionByZero);
        }
        Ok(Self(self.0 / divisor))
    }

    /// Sum a sequence of amounts, failing on overflow.
    pub fn sum<I: IntoIterator<Item = Self>>(amounts: I) -> Result<Self, AmountError> {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |acc, a| acc.checked_add(a))
    }

    /// Decimal BOA representation, e.g. `"12.5"` (trailing zeros dropped).
    pub fn to_boa_string(&self) -> String {
        let whole = self.0 / UNITS_PER_BOA;
        let frac = self.0 % UNITS_PER_BOA;
        if frac == 0 {
            return whole.to_string();
        }
        let width = BOA_DECIMALS as usize;
        let digits = format!("{frac:0width$}");
        format!("{whole}.{}", digits.trim_end_matches('0'))
    }

    /// Amount in BOA as a float (display helper, not for fee math).
    pub fn to_boa_f64(&self) -> f64 {
        self.0 as f64 / UNITS_PER_BOA as f64
    }
}

impl From<u64> for Amount {
    fn from(units: u64) -> Self {
        Self(units)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parse the integer unit form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if t.starts_with('-') {
            return Err(AmountError::Negative(s.to_string()));
        }
        if t.is_empty() || !t.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::Malformed(s.to_string()));
        }
        t.parse().map(Self).map_err(|_| AmountError::Overflow)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(u64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Repr::Number(n) => Ok(Self(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn from_boa_str_whole_and_fraction() {
        assert_eq!(Amount::from_boa_str("1").unwrap(), Amount::new(10_000_000));
        assert_eq!(Amount::from_boa_str("12.5").unwrap(), Amount::new(125_000_000));
        assert_eq!(Amount::from_boa_str("0.0000001").unwrap(), Amount::new(1));
        assert_eq!(Amount::from_boa_str(" 3.25 ").unwrap(), Amount::new(32_500_000));
    }

    #[test]
    fn from_boa_str_accepts_trailing_zero_digits() {
        assert_eq!(
            Amount::from_boa_str("1.000000000").unwrap(),
            Amount::new(10_000_000)
        );
    }

    #[test]
    fn from_boa_str_rejects_rounding() {
        let err = Amount::from_boa_str("0.00000001").unwrap_err();
        assert!(matches!(err, AmountError::TooPrecise(_)));
    }

    #[test]
    fn from_boa_str_rejects_negative_and_garbage() {
        assert!(matches!(
            Amount::from_boa_str("-1").unwrap_err(),
            AmountError::Negative(_)
        ));
        for bad in ["", ".5", "1.", "1.2.3", "abc", "1e5", "+1"] {
            assert!(
                matches!(Amount::from_boa_str(bad), Err(AmountError::Malformed(_))),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn from_boa_float_is_exact() {
        assert_eq!(Amount::from_boa(0.001).unwrap(), Amount::new(10_000));
        assert_eq!(Amount::from_boa(10.25).unwrap(), Amount::new(102_500_000));
        assert!(Amount::from_boa(-0.5).is_err());
        assert!(Amount::from_boa(f64::NAN).is_err());
    }

    #[test]
    fn subtraction_underflow_fails() {
        let err = Amount::new(5).checked_sub(Amount::new(6)).unwrap_err();
        assert_eq!(err, AmountError::Underflow { lhs: 5, rhs: 6 });
        assert_eq!(
            Amount::new(6).checked_sub(Amount::new(6)).unwrap(),
            Amount::ZERO
        );
    }

    #[test]
    fn addition_overflow_fails() {
        let err = Amount::new(u64::MAX).checked_add(Amount::new(1)).unwrap_err();
        assert_eq!(err, AmountError::Overflow);
    }

    #[test]
    fn multiply_and_floor_divide() {
        let a = Amount::new(1_001);
        assert_eq!(a.checked_mul(120).unwrap(), Amount::new(120_120));
        assert_eq!(a.checked_div(10).unwrap(), Amount::new(100));
        assert_eq!(
            a.checked_mul(120).unwrap().checked_div(100).unwrap(),
            Amount::new(1_201)
        );
        assert_eq!(a.checked_div(0).unwrap_err(), AmountError::DivisionByZero);
    }

    #[test]
    fn sum_of_amounts() {
        let total = Amount::sum([Amount::new(1), Amount::new(2), Amount::new(3)]).unwrap();
        assert_eq!(total, Amount::new(6));
        assert!(Amount::sum([Amount::new(u64::MAX), Amount::new(1)]).is_err());
    }

    #[test]
    fn display_round_trips_integer() {
        let a = Amount::new(24_400_000_000_000);
        assert_eq!(a.to_string(), "24400000000000");
        assert_eq!(a.to_string().parse::<Amount>().unwrap(), a);
        assert!("-3".parse::<Amount>().is_err());
    }

    #[test]
    fn to_boa_string_trims_fraction() {
        assert_eq!(Amount::new(125_000_000).to_boa_string(), "12.5");
        assert_eq!(Amount::new(10_000_000).to_boa_string(), "1");
        assert_eq!(Amount::new(1).to_boa_string(), "0.0000001");
    }

    #[test]
    fn serde_as_string_accepts_number() {
        let json = serde_json::to_string(&Amount::new(500_000)).unwrap();
        assert_eq!(json, "\"500000\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Amount::new(500_000));
        let from_number: Amount = serde_json::from_str("42").unwrap();
        assert_eq!(from_number, Amount::new(42));
    }

    #[test]
    fn ordering() {
        assert!(Amount::new(2) > Amount::new(1));
        assert!(Amount::new(2) >= Amount::new(2));
        assert_eq!(Amount::new(7).max(Amount::new(3)), Amount::new(7));
    }

    // --- proptest ---

    proptest! {
        #[test]
        fn add_then_sub_is_identity(a in 0u64..u64::MAX / 2, b in 0u64..u64::MAX / 2) {
            let sum = Amount::new(a).checked_add(Amount::new(b)).unwrap();
            prop_assert_eq!(sum.checked_sub(Amount::new(b)).unwrap(), Amount::new(a));
        }

        #[test]
        fn sub_fails_exactly_when_negative(a in any::<u64>(), b in any::<u64>()) {
            prop_assert_eq!(Amount::new(a).checked_sub(Amount::new(b)).is_err(), b > a);
        }

        #[test]
        fn boa_string_parses_back(units in 0u64..u64::MAX / 10) {
            let a = Amount::new(units);
            prop_assert_eq!(Amount::from_boa_str(&a.to_boa_string()).unwrap(), a);
        }
    }
}
