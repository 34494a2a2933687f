//! # Filing Periods
//!
//! A `Period` is the closed date interval one tax return covers: a
//! calendar month for monthly withholding filings (1601-C family) or a
//! calendar quarter for quarterly VAT filings (2550Q family).
//!
//! Periods render and parse as `YYYY-MM` / `YYYY-Qn` strings, which is
//! also their serde representation — pack files and transaction feeds
//! name periods the way preparers do.

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors constructing or parsing a filing period.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PeriodError {
    /// Month outside 1..=12.
    #[error("invalid month {0}; expected 1..=12")]
    InvalidMonth(u32),

    /// Quarter outside 1..=4.
    #[error("invalid quarter {0}; expected 1..=4")]
    InvalidQuarter(u32),

    /// String did not match `YYYY-MM` or `YYYY-Qn`.
    #[error("unparseable period {0:?}; expected YYYY-MM or YYYY-Qn")]
    Unparseable(String),
}

/// A filing period: one calendar month or one calendar quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Period {
    /// Monthly filing period (e.g. `2025-07`).
    Monthly {
        /// Calendar year.
        year: i32,
        /// Calendar month, 1..=12.
        month: u32,
    },
    /// Quarterly filing period (e.g. `2025-Q3`).
    Quarterly {
        /// Calendar year.
        year: i32,
        /// Calendar quarter, 1..=4.
        quarter: u32,
    },
}

impl Period {
    /// Construct a monthly period, validating the month.
    pub fn monthly(year: i32, month: u32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::InvalidMonth(month));
        }
        Ok(Self::Monthly { year, month })
    }

    /// Construct a quarterly period, validating the quarter.
    pub fn quarterly(year: i32, quarter: u32) -> Result<Self, PeriodError> {
        if !(1..=4).contains(&quarter) {
            return Err(PeriodError::InvalidQuarter(quarter));
        }
        Ok(Self::Quarterly { year, quarter })
    }

    /// The quarterly period containing a date.
    pub fn quarter_of(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self::Quarterly {
            year: date.year(),
            quarter: (date.month0() / 3) + 1,
        }
    }

    /// First day of the period.
    pub fn start(&self) -> NaiveDate {
        let (year, month) = match *self {
            Self::Monthly { year, month } => (year, month),
            Self::Quarterly { year, quarter } => (year, (quarter - 1) * 3 + 1),
        };
        // Month is validated at construction, so this cannot fail.
        NaiveDate::from_ymd_opt(year, month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the period (inclusive).
    pub fn end(&self) -> NaiveDate {
        let (year, month) = match *self {
            Self::Monthly { year, month } => (year, month),
            Self::Quarterly { year, quarter } => (year, quarter * 3),
        };
        last_day_of_month(year, month)
    }

    /// Whether a document date falls inside the period.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start() && date <= self.end()
    }

    /// The immediately preceding period of the same granularity.
    pub fn preceding(&self) -> Self {
        match *self {
            Self::Monthly { year, month: 1 } => Self::Monthly {
                year: year - 1,
                month: 12,
            },
            Self::Monthly { year, month } => Self::Monthly {
                year,
                month: month - 1,
            },
            Self::Quarterly { year, quarter: 1 } => Self::Quarterly {
                year: year - 1,
                quarter: 4,
            },
            Self::Quarterly { year, quarter } => Self::Quarterly {
                year,
                quarter: quarter - 1,
            },
        }
    }

    /// Parse a `YYYY-MM` or `YYYY-Qn` string.
    pub fn parse(s: &str) -> Result<Self, PeriodError> {
        let unparseable = || PeriodError::Unparseable(s.to_string());
        let (year_part, rest) = s.split_once('-').ok_or_else(unparseable)?;
        let year: i32 = year_part.parse().map_err(|_| unparseable())?;

        if let Some(quarter_part) = rest.strip_prefix('Q') {
            let quarter: u32 = quarter_part.parse().map_err(|_| unparseable())?;
            Self::quarterly(year, quarter)
        } else {
            let month: u32 = rest.parse().map_err(|_| unparseable())?;
            Self::monthly(year, month)
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Monthly { year, month } => write!(f, "{year:04}-{month:02}"),
            Self::Quarterly { year, quarter } => write!(f, "{year:04}-Q{quarter}"),
        }
    }
}

impl std::str::FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}

/// Last calendar day of a month.
fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_bounds() {
        let p = Period::monthly(2025, 7).unwrap();
        assert_eq!(p.start(), date(2025, 7, 1));
        assert_eq!(p.end(), date(2025, 7, 31));
    }

    #[test]
    fn test_quarterly_bounds() {
        let p = Period::quarterly(2025, 3).unwrap();
        assert_eq!(p.start(), date(2025, 7, 1));
        assert_eq!(p.end(), date(2025, 9, 30));
    }

    #[test]
    fn test_december_and_q4_cross_year_end() {
        assert_eq!(Period::monthly(2025, 12).unwrap().end(), date(2025, 12, 31));
        assert_eq!(Period::quarterly(2025, 4).unwrap().end(), date(2025, 12, 31));
    }

    #[test]
    fn test_february_leap_year() {
        assert_eq!(Period::monthly(2024, 2).unwrap().end(), date(2024, 2, 29));
        assert_eq!(Period::monthly(2025, 2).unwrap().end(), date(2025, 2, 28));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let p = Period::quarterly(2025, 3).unwrap();
        assert!(p.contains(date(2025, 7, 1)));
        assert!(p.contains(date(2025, 9, 30)));
        assert!(!p.contains(date(2025, 6, 30)));
        assert!(!p.contains(date(2025, 10, 1)));
    }

    #[test]
    fn test_quarter_of() {
        assert_eq!(
            Period::quarter_of(date(2025, 8, 15)),
            Period::quarterly(2025, 3).unwrap()
        );
        assert_eq!(
            Period::quarter_of(date(2025, 1, 1)),
            Period::quarterly(2025, 1).unwrap()
        );
    }

    #[test]
    fn test_preceding_crosses_year_boundary() {
        assert_eq!(
            Period::monthly(2025, 1).unwrap().preceding(),
            Period::monthly(2024, 12).unwrap()
        );
        assert_eq!(
            Period::quarterly(2025, 1).unwrap().preceding(),
            Period::quarterly(2024, 4).unwrap()
        );
        assert_eq!(
            Period::quarterly(2025, 3).unwrap().preceding(),
            Period::quarterly(2025, 2).unwrap()
        );
    }

    #[test]
    fn test_display_and_parse_roundtrip() {
        for s in ["2025-07", "2025-Q3", "2024-12", "2024-Q1"] {
            let p = Period::parse(s).unwrap();
            assert_eq!(p.to_string(), s);
        }
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Period::parse("2025").is_err());
        assert!(Period::parse("2025-13").is_err());
        assert!(Period::parse("2025-Q5").is_err());
        assert!(Period::parse("Q3-2025").is_err());
        assert!(Period::parse("").is_err());
    }

    #[test]
    fn test_serde_uses_display_form() {
        let p = Period::quarterly(2025, 3).unwrap();
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"2025-Q3\"");
        let parsed: Period = serde_json::from_str("\"2025-07\"").unwrap();
        assert_eq!(parsed, Period::monthly(2025, 7).unwrap());
    }
}
