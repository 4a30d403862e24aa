//! Fixed-point money amounts with two fractional digits.
//!
//! Amounts are held as integer minor units (halalas, cents) so pricing never
//! touches floating point. The canonical text form is `"123.45"`, which is
//! also what the payment provider expects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Failure parsing a decimal amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyParseError {
    /// Input was empty after trimming.
    #[error("amount must not be empty")]
    Empty,
    /// Input was not a non-negative decimal number.
    #[error("amount must be a non-negative decimal number: {value}")]
    Malformed {
        /// Rejected input.
        value: String,
    },
    /// More than two fractional digits were supplied.
    #[error("amount must have at most two decimal places: {value}")]
    TooPrecise {
        /// Rejected input.
        value: String,
    },
    /// Amount does not fit the supported range.
    #[error("amount is too large: {value}")]
    Overflow {
        /// Rejected input.
        value: String,
    },
}

/// Non-negative amount in minor units.
///
/// # Examples
/// ```
/// use backend::domain::Money;
///
/// let price: Money = "49.5".parse().expect("valid amount");
/// assert_eq!(price.minor_units(), 4950);
/// assert_eq!(price.to_string(), "49.50");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Build an amount from minor units, rejecting negative values.
    pub const fn from_minor_units(minor: i64) -> Option<Self> {
        if minor < 0 { None } else { Some(Self(minor)) }
    }

    /// Build an amount from whole major units.
    pub const fn from_major_units(major: i64) -> Option<Self> {
        match major.checked_mul(100) {
            Some(minor) => Self::from_minor_units(minor),
            None => None,
        }
    }

    /// Amount in minor units.
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// Multiply by a whole block count, saturating at the maximum amount.
    pub const fn times(self, count: u32) -> Self {
        Self(self.0.saturating_mul(count as i64))
    }

    /// Add two amounts, saturating at the maximum amount.
    pub const fn plus(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Whether the amount is zero.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Money {
    type Err = MoneyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.is_empty() {
            return Err(MoneyParseError::Empty);
        }
        let malformed = || MoneyParseError::Malformed {
            value: value.to_owned(),
        };
        let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        if fraction.len() > 2 {
            return Err(MoneyParseError::TooPrecise {
                value: value.to_owned(),
            });
        }
        let overflow = || MoneyParseError::Overflow {
            value: value.to_owned(),
        };
        let major: i64 = whole.parse().map_err(|_| overflow())?;
        let minor = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| malformed())? * 10,
            _ => fraction.parse::<i64>().map_err(|_| malformed())?,
        };
        major
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(minor))
            .map(Self)
            .ok_or_else(overflow)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text,
            Raw::Number(number) => number.to_string(),
        };
        text.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("50", 5000)]
    #[case("50.5", 5050)]
    #[case("50.05", 5005)]
    #[case(" 0.99 ", 99)]
    #[case("0", 0)]
    fn parses_decimal_text(#[case] input: &str, #[case] minor: i64) {
        let money: Money = input.parse().expect("valid amount");
        assert_eq!(money.minor_units(), minor);
    }

    #[rstest]
    #[case("")]
    #[case("-1")]
    #[case("1.2.3")]
    #[case("abc")]
    #[case(".50")]
    #[case("1.234")]
    fn rejects_invalid_text(#[case] input: &str) {
        assert!(input.parse::<Money>().is_err());
    }

    #[rstest]
    fn formats_with_two_decimals() {
        let money = Money::from_minor_units(10_007).expect("non-negative");
        assert_eq!(money.to_string(), "100.07");
    }

    #[rstest]
    fn multiplies_by_block_count() {
        let price = Money::from_major_units(50).expect("valid");
        assert_eq!(price.times(2), Money::from_major_units(100).expect("valid"));
    }

    #[rstest]
    fn deserialises_from_number_or_string() {
        let from_number: Money = serde_json::from_str("12.5").expect("number amount");
        let from_text: Money = serde_json::from_str("\"12.50\"").expect("text amount");
        assert_eq!(from_number, from_text);
        assert_eq!(
            serde_json::to_value(from_text).expect("serialise"),
            serde_json::json!("12.50")
        );
    }
}
