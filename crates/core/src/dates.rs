//! Calendar parsing and arithmetic shared by the status, recurrence, and
//! distribution modules.
//!
//! Month arithmetic clamps to the last valid day of the target month:
//! 2024-01-31 plus one month is 2024-02-29, never 2024-03-02.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Date;

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Parse a `YYYY-MM-DD` date.
///
/// Stored dates sometimes carry an ISO time suffix (`2025-06-30T00:00:00Z`);
/// the time part is ignored.
pub fn parse_date(value: &str) -> Result<Date, CoreError> {
    let day_part = value.trim().split('T').next().unwrap_or_default();
    NaiveDate::parse_from_str(day_part, "%Y-%m-%d").map_err(|e| {
        CoreError::InvalidInput(format!("Invalid date '{value}': expected YYYY-MM-DD ({e})"))
    })
}

/// Add `months` calendar months, clamping the day to the end of the
/// resulting month.
pub fn add_months_clamped(date: Date, months: u32) -> Result<Date, CoreError> {
    date.checked_add_months(Months::new(months)).ok_or_else(|| {
        CoreError::InvalidInput(format!("Adding {months} months to {date} overflows"))
    })
}

/// Whole calendar days from `from` to `to`. Negative when `to` is earlier.
pub fn days_between(from: Date, to: Date) -> i64 {
    (to - from).num_days()
}

// ---------------------------------------------------------------------------
// YearMonth
// ---------------------------------------------------------------------------

/// A calendar month in `YYYY-MM` form, the unit distributions are run for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, CoreError> {
        if !(1..=12).contains(&month) {
            return Err(CoreError::InvalidInput(format!(
                "Month must be between 1 and 12, got {month}"
            )));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(CoreError::InvalidInput(format!("Year {year} is out of range")));
        }
        Ok(Self { year, month })
    }

    /// The month containing `date`.
    pub fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn first_day(self) -> Date {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(self) -> Date {
        let first = self.first_day();
        first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(first)
    }
}

impl FromStr for YearMonth {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidInput(format!("Invalid month '{s}': expected YYYY-MM"));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // -- parse_date ------------------------------------------------------

    #[test]
    fn parses_plain_date() {
        assert_eq!(parse_date("2025-06-30").unwrap(), d(2025, 6, 30));
    }

    #[test]
    fn ignores_time_suffix() {
        assert_eq!(parse_date("2025-06-30T13:45:00.000Z").unwrap(), d(2025, 6, 30));
    }

    #[test]
    fn rejects_garbage() {
        assert_matches!(parse_date("30/06/2025"), Err(CoreError::InvalidInput(_)));
        assert_matches!(parse_date(""), Err(CoreError::InvalidInput(_)));
        assert_matches!(parse_date("2025-02-30"), Err(CoreError::InvalidInput(_)));
    }

    // -- add_months_clamped ----------------------------------------------

    #[test]
    fn jan_31_plus_one_month_clamps_to_leap_day() {
        assert_eq!(add_months_clamped(d(2024, 1, 31), 1).unwrap(), d(2024, 2, 29));
    }

    #[test]
    fn jan_31_plus_one_month_non_leap_year() {
        assert_eq!(add_months_clamped(d(2025, 1, 31), 1).unwrap(), d(2025, 2, 28));
    }

    #[test]
    fn month_addition_crosses_year() {
        assert_eq!(add_months_clamped(d(2024, 11, 15), 3).unwrap(), d(2025, 2, 15));
    }

    // -- days_between ----------------------------------------------------

    #[test]
    fn days_between_is_signed() {
        assert_eq!(days_between(d(2025, 1, 1), d(2025, 1, 11)), 10);
        assert_eq!(days_between(d(2025, 1, 11), d(2025, 1, 1)), -10);
        assert_eq!(days_between(d(2025, 1, 1), d(2025, 1, 1)), 0);
    }

    // -- YearMonth -------------------------------------------------------

    #[test]
    fn year_month_parses_and_displays() {
        let ym: YearMonth = "2024-03".parse().unwrap();
        assert_eq!(ym.year(), 2024);
        assert_eq!(ym.month(), 3);
        assert_eq!(ym.to_string(), "2024-03");
    }

    #[test]
    fn year_month_rejects_bad_input() {
        assert_matches!("2024-13".parse::<YearMonth>(), Err(CoreError::InvalidInput(_)));
        assert_matches!("2024-3".parse::<YearMonth>(), Err(CoreError::InvalidInput(_)));
        assert_matches!("March 2024".parse::<YearMonth>(), Err(CoreError::InvalidInput(_)));
    }

    #[test]
    fn year_month_bounds() {
        let ym = YearMonth::new(2024, 2).unwrap();
        assert_eq!(ym.first_day(), d(2024, 2, 1));
        assert_eq!(ym.last_day(), d(2024, 2, 29));
        assert_eq!(YearMonth::new(2024, 12).unwrap().last_day(), d(2024, 12, 31));
    }

    #[test]
    fn year_month_serde_uses_string_form() {
        let ym = YearMonth::new(2025, 7).unwrap();
        let json = serde_json::to_string(&ym).unwrap();
        assert_eq!(json, "\"2025-07\"");
        let back: YearMonth = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ym);
        assert!(serde_json::from_str::<YearMonth>("\"2025-00\"").is_err());
    }
}
