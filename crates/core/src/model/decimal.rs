//! Fixed-point decimal quantities with two decimal places.
//!
//! Progress, currency amounts and scores are stored as integer hundredths so
//! comparisons against thresholds (e.g. 75.00) are exact.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecimalError {
    #[error("not a decimal number: {0:?}")]
    Invalid(String),

    #[error("at most two decimal places are allowed: {0:?}")]
    TooPrecise(String),

    #[error("value must not be negative")]
    Negative,

    #[error("progress must be between 0 and 100")]
    ProgressOutOfRange,

    #[error("value is too large")]
    Overflow,
}

/// Parses `"12"`, `"12.5"` or `"-12.34"` into hundredths.
fn parse_hundredths(raw: &str) -> Result<i64, DecimalError> {
    let trimmed = raw.trim();
    let invalid = || DecimalError::Invalid(raw.to_owned());

    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let (whole, frac) = match digits.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (digits, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > 2 {
        return Err(DecimalError::TooPrecise(raw.to_owned()));
    }

    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| DecimalError::Overflow)?
    };
    let frac_value: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => frac.parse().map_err(|_| invalid())?,
    };

    let magnitude = whole_value
        .checked_mul(100)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or(DecimalError::Overflow)?;
    Ok(if negative { -magnitude } else { magnitude })
}

fn fmt_hundredths(value: i64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
}

fn non_negative(value: i64) -> Result<u64, DecimalError> {
    u64::try_from(value).map_err(|_| DecimalError::Negative)
}

macro_rules! decimal_serde {
    ($name:ident) => {
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// Course progress as a percentage between 0.00 and 100.00.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Progress(u16);

impl Progress {
    pub const ZERO: Progress = Progress(0);
    pub const COMPLETE: Progress = Progress(10_000);

    /// Creates a progress value from hundredths of a percent (`7550` = 75.50%).
    ///
    /// # Errors
    ///
    /// Returns `DecimalError::ProgressOutOfRange` above 100.00.
    pub fn from_hundredths(hundredths: u32) -> Result<Self, DecimalError> {
        if hundredths > 10_000 {
            return Err(DecimalError::ProgressOutOfRange);
        }
        u16::try_from(hundredths)
            .map(Self)
            .map_err(|_| DecimalError::ProgressOutOfRange)
    }

    #[must_use]
    pub fn hundredths(self) -> u32 {
        u32::from(self.0)
    }

    /// Rounded (half-up) mean of `count` values whose hundredths sum to `sum`.
    ///
    /// Returns zero when `count` is zero.
    #[must_use]
    pub fn mean(sum: u64, count: u64) -> Self {
        if count == 0 {
            return Self::ZERO;
        }
        let rounded = (sum.saturating_mul(2) + count) / count.saturating_mul(2);
        Self(u16::try_from(rounded.min(10_000)).unwrap_or(10_000))
    }

    #[must_use]
    pub fn is_complete(self) -> bool {
        self == Self::COMPLETE
    }
}

impl FromStr for Progress {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = parse_hundredths(s)?;
        if value < 0 {
            return Err(DecimalError::ProgressOutOfRange);
        }
        let value = u32::try_from(value).map_err(|_| DecimalError::ProgressOutOfRange)?;
        Self::from_hundredths(value)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_hundredths(i64::from(self.0), f)
    }
}

decimal_serde!(Progress);

//
// ─── MONEY ─────────────────────────────────────────────────────────────────────
//

/// A non-negative currency amount in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    #[must_use]
    pub fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub fn cents(self) -> u64 {
        self.0
    }

    /// # Errors
    ///
    /// Returns `DecimalError::Overflow` if the sum does not fit.
    pub fn checked_add(self, other: Money) -> Result<Money, DecimalError> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or(DecimalError::Overflow)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl FromStr for Money {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hundredths(s).and_then(non_negative).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

decimal_serde!(Money);

//
// ─── SCORE ─────────────────────────────────────────────────────────────────────
//

/// A non-negative assessment score with two decimal places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Score(u32);

impl Score {
    #[must_use]
    pub fn from_hundredths(hundredths: u32) -> Self {
        Self(hundredths)
    }

    #[must_use]
    pub fn whole(points: u32) -> Self {
        Self(points.saturating_mul(100))
    }

    #[must_use]
    pub fn hundredths(self) -> u32 {
        self.0
    }

    /// True when this score is strictly greater than `max_score` whole points.
    #[must_use]
    pub fn exceeds(self, max_score: u32) -> bool {
        u64::from(self.0) > u64::from(max_score) * 100
    }
}

impl FromStr for Score {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = parse_hundredths(s).and_then(non_negative)?;
        u32::try_from(value)
            .map(Score)
            .map_err(|_| DecimalError::Overflow)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_hundredths(i64::from(self.0), f)
    }
}

decimal_serde!(Score);

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_fractional_values() {
        assert_eq!(parse_hundredths("80").unwrap(), 8_000);
        assert_eq!(parse_hundredths("56.67").unwrap(), 5_667);
        assert_eq!(parse_hundredths("0.5").unwrap(), 50);
        assert_eq!(parse_hundredths(".25").unwrap(), 25);
        assert_eq!(parse_hundredths(" 12. ").unwrap(), 1_200);
        assert_eq!(parse_hundredths("-3.10").unwrap(), -310);
    }

    #[test]
    fn rejects_garbage_and_extra_precision() {
        assert!(matches!(parse_hundredths("abc"), Err(DecimalError::Invalid(_))));
        assert!(matches!(parse_hundredths("."), Err(DecimalError::Invalid(_))));
        assert!(matches!(parse_hundredths("1.2.3"), Err(DecimalError::Invalid(_))));
        assert!(matches!(
            parse_hundredths("1.234"),
            Err(DecimalError::TooPrecise(_))
        ));
    }

    #[test]
    fn progress_bounds() {
        assert_eq!("100".parse::<Progress>().unwrap(), Progress::COMPLETE);
        assert_eq!(
            "100.01".parse::<Progress>().unwrap_err(),
            DecimalError::ProgressOutOfRange
        );
        assert_eq!(
            "-1".parse::<Progress>().unwrap_err(),
            DecimalError::ProgressOutOfRange
        );
        assert_eq!(
            Progress::from_hundredths(10_001).unwrap_err(),
            DecimalError::ProgressOutOfRange
        );
    }

    #[test]
    fn progress_mean_rounds_half_up() {
        // (80 + 30 + 60) / 3 = 56.666..
        assert_eq!(Progress::mean(17_000, 3).to_string(), "56.67");
        assert_eq!(Progress::mean(1, 2).hundredths(), 1);
        assert_eq!(Progress::mean(0, 0), Progress::ZERO);
    }

    #[test]
    fn money_rejects_negative_and_sums() {
        assert_eq!("-5".parse::<Money>().unwrap_err(), DecimalError::Negative);
        let total: Money = ["10.50", "0.75", "4"]
            .iter()
            .map(|s| s.parse::<Money>().unwrap())
            .sum();
        assert_eq!(total.to_string(), "15.25");
    }

    #[test]
    fn score_exceeds_is_strict() {
        assert!(!Score::whole(10).exceeds(10));
        assert!("10.01".parse::<Score>().unwrap().exceeds(10));
        assert!(!"9.99".parse::<Score>().unwrap().exceeds(10));
    }

    #[test]
    fn decimals_serialize_as_strings() {
        let json = serde_json::to_string(&"7.5".parse::<Progress>().unwrap()).unwrap();
        assert_eq!(json, "\"7.50\"");
        let back: Money = serde_json::from_str("\"12.30\"").unwrap();
        assert_eq!(back.cents(), 1_230);
    }
}
