//! Monthly arrival records and calendar helpers

use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar month, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    /// 1..=12
    pub month: u32,
}

/// Korean tourism seasons used for keyword search and growth tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

/// Observed monthly arrivals for one country
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorRecord {
    pub country: String,
    pub year: i32,
    pub month: u32,
    pub count: u64,
}

/// Model-produced monthly arrivals for one country
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub country: String,
    pub year: i32,
    pub month: u32,
    pub count: u64,
}

impl YearMonth {
    /// Create a new year-month; callers validate the month range
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Validating constructor for user input
    pub fn try_new(year: i32, month: u32) -> crate::Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(crate::InboundAiError::validation(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        Ok(Self { year, month })
    }

    /// Months since year 0, used for arithmetic
    #[must_use]
    pub fn index(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    #[must_use]
    pub fn from_index(index: i64) -> Self {
        let year = index.div_euclid(12);
        let month = index.rem_euclid(12) + 1;
        Self {
            year: i32::try_from(year).unwrap_or(i32::MAX),
            month: u32::try_from(month).unwrap_or(1),
        }
    }

    /// Shift by a (possibly negative) number of months
    #[must_use]
    pub fn offset(&self, months: i32) -> Self {
        Self::from_index(self.index() + i64::from(months))
    }

    #[must_use]
    pub fn next(&self) -> Self {
        self.offset(1)
    }

    #[must_use]
    pub fn previous(&self) -> Self {
        self.offset(-1)
    }

    /// Fractional year, e.g. 2024-07 -> 2024.5
    #[must_use]
    pub fn as_fractional_year(&self) -> f64 {
        f64::from(self.year) + f64::from(self.month.saturating_sub(1)) / 12.0
    }

    #[must_use]
    pub fn season(&self) -> Season {
        Season::from_month(self.month)
    }

    /// `YYYYMM01`, the tourism API's event start date format
    #[must_use]
    pub fn first_day_compact(&self) -> String {
        format!("{:04}{:02}01", self.year, self.month)
    }

    /// Inclusive month range
    pub fn range_inclusive(from: YearMonth, to: YearMonth) -> impl Iterator<Item = YearMonth> {
        (from.index()..=to.index()).map(YearMonth::from_index)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Season {
    #[must_use]
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    /// Korean season name, also the tourism keyword search term
    #[must_use]
    pub fn korean(&self) -> &'static str {
        match self {
            Season::Spring => "봄",
            Season::Summer => "여름",
            Season::Autumn => "가을",
            Season::Winter => "겨울",
        }
    }
}

impl VisitorRecord {
    #[must_use]
    pub fn period(&self) -> YearMonth {
        YearMonth::new(self.year, self.month)
    }
}

impl ForecastRecord {
    #[must_use]
    pub fn new(country: &str, period: YearMonth, count: u64) -> Self {
        Self {
            country: country.to_string(),
            year: period.year,
            month: period.month,
            count,
        }
    }

    #[must_use]
    pub fn period(&self) -> YearMonth {
        YearMonth::new(self.year, self.month)
    }
}

impl From<ForecastRecord> for VisitorRecord {
    fn from(record: ForecastRecord) -> Self {
        Self {
            country: record.country,
            year: record.year,
            month: record.month,
            count: record.count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_fractional_year() {
        assert!((YearMonth::new(2024, 7).as_fractional_year() - 2024.5).abs() < 1e-9);
        assert!((YearMonth::new(2024, 0).as_fractional_year() - 2024.0).abs() < 1e-9);
    }

    #[test]
    fn test_offset_crosses_year_boundary() {
        let jan = YearMonth::new(2025, 1);
        assert_eq!(jan.previous(), YearMonth::new(2024, 12));
        assert_eq!(jan.offset(-3), YearMonth::new(2024, 10));
        assert_eq!(YearMonth::new(2025, 11).offset(3), YearMonth::new(2026, 2));
    }

    #[test]
    fn test_range_inclusive() {
        let months: Vec<_> =
            YearMonth::range_inclusive(YearMonth::new(2024, 11), YearMonth::new(2025, 2)).collect();
        assert_eq!(months.len(), 4);
        assert_eq!(months[2], YearMonth::new(2025, 1));
    }

    #[test]
    fn test_display_and_compact() {
        let april = YearMonth::new(2025, 4);
        assert_eq!(april.to_string(), "2025-04");
        assert_eq!(april.first_day_compact(), "20250401");
    }

    #[test]
    fn test_try_new_rejects_invalid_month() {
        assert!(YearMonth::try_new(2025, 13).is_err());
        assert!(YearMonth::try_new(2025, 0).is_err());
        assert!(YearMonth::try_new(2025, 12).is_ok());
    }

    #[rstest]
    #[case(1, Season::Winter)]
    #[case(2, Season::Winter)]
    #[case(3, Season::Spring)]
    #[case(5, Season::Spring)]
    #[case(8, Season::Summer)]
    #[case(9, Season::Autumn)]
    #[case(12, Season::Winter)]
    fn test_season_from_month(#[case] month: u32, #[case] expected: Season) {
        assert_eq!(Season::from_month(month), expected);
    }

    #[test]
    fn test_korean_season_names() {
        assert_eq!(YearMonth::new(2025, 10).season().korean(), "가을");
    }
}
