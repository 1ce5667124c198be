//! Leave unit conversion and minimum-unit rounding.
//!
//! User-entered leave quantities arrive in days, half-days, or hours and are
//! normalized to a canonical hour value, then rounded to the smallest unit
//! the policy allows.
//!
//! CRITICAL: Rounding strategy for leave hours:
//! - Round to the nearest multiple of the policy minimum unit
//! - Use banker's rounding (round half to even multiple), the same strategy
//!   the rest of the ledger uses for money-like values
//! - Never round during normalization, only at the final step

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(test)]
mod props;

/// Unit in which a leave request line is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveUnit {
    /// One hour.
    Hour,
    /// Half a working day.
    Half,
    /// One full working day.
    Day,
}

impl std::str::FromStr for LeaveUnit {
    type Err = RoundingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(Self::Hour),
            "half" => Ok(Self::Half),
            "day" => Ok(Self::Day),
            other => Err(RoundingError::InvalidUnit(other.to_string())),
        }
    }
}

/// Smallest quantity of leave a policy allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinUnit {
    /// One hour.
    #[serde(rename = "1h")]
    OneHour,
    /// Half a working day.
    #[serde(rename = "0.5d")]
    HalfDay,
    /// One full working day.
    #[serde(rename = "1d")]
    FullDay,
}

impl MinUnit {
    /// Returns the rounding step in hours for the given working-day length.
    #[must_use]
    pub fn step_hours(self, hours_per_day: Decimal) -> Decimal {
        match self {
            Self::OneHour => Decimal::ONE,
            Self::HalfDay => hours_per_day / Decimal::TWO,
            Self::FullDay => hours_per_day,
        }
    }
}

impl std::str::FromStr for MinUnit {
    type Err = RoundingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(Self::OneHour),
            "0.5d" => Ok(Self::HalfDay),
            "1d" => Ok(Self::FullDay),
            other => Err(RoundingError::InvalidUnit(other.to_string())),
        }
    }
}

impl std::fmt::Display for MinUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::OneHour => "1h",
            Self::HalfDay => "0.5d",
            Self::FullDay => "1d",
        };
        write!(f, "{s}")
    }
}

/// Errors from unit parsing and request-line rounding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoundingError {
    /// The unit string is not one of the recognized values.
    #[error("Invalid leave unit: {0}")]
    InvalidUnit(String),

    /// A request line rounds to zero or negative hours.
    #[error("Request line {line} rounds to a zero duration")]
    ZeroDurationLine {
        /// Zero-based index of the offending line.
        line: usize,
    },
}

/// One line of a leave request as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLine {
    /// The date the leave is taken on.
    pub date: NaiveDate,
    /// The unit the quantity is expressed in.
    pub unit: LeaveUnit,
    /// The quantity in the given unit.
    pub quantity: Decimal,
}

/// A request line normalized and rounded to hours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundedLine {
    /// The date the leave is taken on.
    pub date: NaiveDate,
    /// The rounded hour value for this line.
    pub hours: Decimal,
}

/// Converts a user-entered quantity to hours. No rounding at this stage.
#[must_use]
pub fn normalize_to_hours(unit: LeaveUnit, quantity: Decimal, hours_per_day: Decimal) -> Decimal {
    match unit {
        LeaveUnit::Hour => quantity,
        LeaveUnit::Half => hours_per_day / Decimal::TWO * quantity,
        LeaveUnit::Day => hours_per_day * quantity,
    }
}

/// Rounds an hour value to the nearest multiple of the policy minimum unit.
///
/// Ties round to the even multiple (banker's rounding): `4.5h` at a `1h`
/// minimum unit rounds to `4`, `5.5h` rounds to `6`.
#[must_use]
pub fn round_to_min_unit_hours(
    hours: Decimal,
    min_unit: MinUnit,
    hours_per_day: Decimal,
) -> Decimal {
    let step = min_unit.step_hours(hours_per_day);
    let multiples =
        (hours / step).round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
    (multiples * step).normalize()
}

/// Normalizes and rounds every line of a request.
///
/// Any line that rounds to `<= 0` hours rejects the whole request.
///
/// # Errors
///
/// Returns `ZeroDurationLine` naming the first offending line.
pub fn round_request_lines(
    lines: &[RequestLine],
    min_unit: MinUnit,
    hours_per_day: Decimal,
) -> Result<Vec<RoundedLine>, RoundingError> {
    let mut rounded = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        let hours = round_to_min_unit_hours(
            normalize_to_hours(line.unit, line.quantity, hours_per_day),
            min_unit,
            hours_per_day,
        );
        if hours <= Decimal::ZERO {
            return Err(RoundingError::ZeroDurationLine { line: index });
        }
        rounded.push(RoundedLine {
            date: line.date,
            hours,
        });
    }
    Ok(rounded)
}

/// Total required hours for a request: the sum of its rounded lines.
///
/// # Errors
///
/// Returns `ZeroDurationLine` if any line rounds to `<= 0`.
pub fn total_required_hours(
    lines: &[RequestLine],
    min_unit: MinUnit,
    hours_per_day: Decimal,
) -> Result<Decimal, RoundingError> {
    Ok(round_request_lines(lines, min_unit, hours_per_day)?
        .iter()
        .map(|l| l.hours)
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_normalize_half_day() {
        // normalize_to_hours('half', 1, 8) -> 4
        assert_eq!(normalize_to_hours(LeaveUnit::Half, dec!(1), dec!(8)), dec!(4));
    }

    #[test]
    fn test_normalize_day_and_hour() {
        assert_eq!(normalize_to_hours(LeaveUnit::Day, dec!(2), dec!(8)), dec!(16));
        assert_eq!(normalize_to_hours(LeaveUnit::Hour, dec!(3), dec!(8)), dec!(3));
    }

    #[rstest]
    #[case(dec!(4.3), MinUnit::OneHour, dec!(8), dec!(4))]
    #[case(dec!(4.3), MinUnit::HalfDay, dec!(8), dec!(4))]
    #[case(dec!(4.3), MinUnit::FullDay, dec!(8), dec!(8))]
    #[case(dec!(6.1), MinUnit::HalfDay, dec!(8), dec!(8))]
    #[case(dec!(7.9), MinUnit::OneHour, dec!(8), dec!(8))]
    fn test_round_to_min_unit(
        #[case] hours: Decimal,
        #[case] min_unit: MinUnit,
        #[case] hours_per_day: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(round_to_min_unit_hours(hours, min_unit, hours_per_day), expected);
    }

    #[test]
    fn test_tie_rounds_to_even_multiple() {
        // Banker's rounding at the midpoint: 4.5 -> 4, 5.5 -> 6, 3.5 -> 4
        assert_eq!(round_to_min_unit_hours(dec!(4.5), MinUnit::OneHour, dec!(8)), dec!(4));
        assert_eq!(round_to_min_unit_hours(dec!(5.5), MinUnit::OneHour, dec!(8)), dec!(6));
        assert_eq!(round_to_min_unit_hours(dec!(3.5), MinUnit::OneHour, dec!(8)), dec!(4));

        // Half-day step of 4h: 6h is the midpoint between 4 and 8 -> 8 (even multiple = 2 steps)
        assert_eq!(round_to_min_unit_hours(dec!(6), MinUnit::HalfDay, dec!(8)), dec!(8));
        // 2h is the midpoint between 0 and 4 -> 0 (even multiple = 0 steps)
        assert_eq!(round_to_min_unit_hours(dec!(2), MinUnit::HalfDay, dec!(8)), dec!(0));
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!(LeaveUnit::from_str("hour").unwrap(), LeaveUnit::Hour);
        assert_eq!(LeaveUnit::from_str("half").unwrap(), LeaveUnit::Half);
        assert_eq!(LeaveUnit::from_str("day").unwrap(), LeaveUnit::Day);
        assert_eq!(MinUnit::from_str("1h").unwrap(), MinUnit::OneHour);
        assert_eq!(MinUnit::from_str("0.5d").unwrap(), MinUnit::HalfDay);
        assert_eq!(MinUnit::from_str("1d").unwrap(), MinUnit::FullDay);
    }

    #[test]
    fn test_unrecognized_unit_fails() {
        assert_eq!(
            MinUnit::from_str("2h"),
            Err(RoundingError::InvalidUnit("2h".to_string()))
        );
        assert_eq!(
            LeaveUnit::from_str("week"),
            Err(RoundingError::InvalidUnit("week".to_string()))
        );
    }

    #[test]
    fn test_round_request_lines_sums() {
        let lines = vec![
            RequestLine {
                date: date(2025, 3, 10),
                unit: LeaveUnit::Day,
                quantity: dec!(1),
            },
            RequestLine {
                date: date(2025, 3, 11),
                unit: LeaveUnit::Half,
                quantity: dec!(1),
            },
        ];
        let total = total_required_hours(&lines, MinUnit::OneHour, dec!(8)).unwrap();
        assert_eq!(total, dec!(12));
    }

    #[test]
    fn test_zero_duration_line_rejects_whole_request() {
        let lines = vec![
            RequestLine {
                date: date(2025, 3, 10),
                unit: LeaveUnit::Day,
                quantity: dec!(1),
            },
            // 0.2h rounds to 0 at a 1h minimum unit
            RequestLine {
                date: date(2025, 3, 11),
                unit: LeaveUnit::Hour,
                quantity: dec!(0.2),
            },
        ];
        assert_eq!(
            total_required_hours(&lines, MinUnit::OneHour, dec!(8)),
            Err(RoundingError::ZeroDurationLine { line: 1 })
        );
    }

    #[test]
    fn test_min_unit_display_round_trips() {
        for unit in [MinUnit::OneHour, MinUnit::HalfDay, MinUnit::FullDay] {
            assert_eq!(MinUnit::from_str(&unit.to_string()).unwrap(), unit);
        }
    }
}
