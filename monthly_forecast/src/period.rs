//! Calendar month periods

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Days, Months, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// One calendar month, labelled `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthPeriod {
    /// First day of the month
    start: NaiveDate,
}

impl MonthPeriod {
    /// The month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            start: date - Days::new(u64::from(date.day0())),
        }
    }

    /// Build a period from a year and a 1-based month.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|start| Self { start })
            .ok_or_else(|| {
                ForecastError::Configuration(format!("Invalid month {}-{:02}", year, month))
            })
    }

    pub fn year(&self) -> i32 {
        self.start.year()
    }

    pub fn month(&self) -> u32 {
        self.start.month()
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    /// Last calendar day of the month.
    pub fn end_date(&self) -> NaiveDate {
        self.succ().start - Days::new(1)
    }

    /// The following month.
    pub fn succ(&self) -> Self {
        Self {
            start: self.start + Months::new(1),
        }
    }

    /// The month `n` months after this one.
    pub fn plus_months(&self, n: u32) -> Self {
        Self {
            start: self.start + Months::new(n),
        }
    }

    /// Signed number of months from `self` to `later`.
    pub fn months_until(&self, later: &MonthPeriod) -> i64 {
        i64::from(later.year() - self.year()) * 12 + i64::from(later.month())
            - i64::from(self.month())
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for MonthPeriod {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
            .map(|start| Self { start })
            .map_err(|_| ForecastError::Configuration(format!("Invalid month label '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn from_date_truncates_to_month() {
        let period = MonthPeriod::from_date(date(2024, 2, 29));
        assert_eq!(period.year(), 2024);
        assert_eq!(period.month(), 2);
        assert_eq!(period.start_date(), date(2024, 2, 1));
    }

    #[rstest]
    #[case(2024, 2, date(2024, 2, 29))]
    #[case(2023, 2, date(2023, 2, 28))]
    #[case(2023, 12, date(2023, 12, 31))]
    #[case(2023, 4, date(2023, 4, 30))]
    fn end_date_is_last_calendar_day(
        #[case] year: i32,
        #[case] month: u32,
        #[case] expected: NaiveDate,
    ) {
        assert_eq!(MonthPeriod::new(year, month).unwrap().end_date(), expected);
    }

    #[test]
    fn succ_rolls_over_year() {
        let december = MonthPeriod::new(2023, 12).unwrap();
        assert_eq!(december.succ(), MonthPeriod::new(2024, 1).unwrap());
        assert_eq!(december.plus_months(14).to_string(), "2025-02");
    }

    #[test]
    fn months_until_counts_across_years() {
        let a = MonthPeriod::new(2022, 11).unwrap();
        let b = MonthPeriod::new(2024, 2).unwrap();
        assert_eq!(a.months_until(&b), 15);
        assert_eq!(b.months_until(&a), -15);
        assert_eq!(a.months_until(&a), 0);
    }

    #[test]
    fn label_round_trips() {
        let period: MonthPeriod = "2008-01".parse().unwrap();
        assert_eq!(period, MonthPeriod::new(2008, 1).unwrap());
        assert_eq!(period.to_string(), "2008-01");
        assert!("2008-13".parse::<MonthPeriod>().is_err());
        assert!(MonthPeriod::new(2008, 0).is_err());
    }
}
