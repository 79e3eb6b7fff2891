//! Quarterly disclosure periods.
//!
//! Funds publish their top holdings once per quarter, and the report for a
//! quarter only becomes available during the following one. A period is
//! therefore always resolved relative to "today" as the most recently
//! completed quarter.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A fiscal quarter identified by its year and quarter-end month (3, 6, 9 or 12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct DisclosurePeriod {
    year: i32,
    quarter_end_month: u32,
}

impl DisclosurePeriod {
    /// Builds a period, returning `None` unless `quarter_end_month` is a quarter end.
    pub fn new(year: i32, quarter_end_month: u32) -> Option<Self> {
        matches!(quarter_end_month, 3 | 6 | 9 | 12).then_some(Self {
            year,
            quarter_end_month,
        })
    }

    /// The most recently completed quarter as of `date`.
    pub fn latest_completed(date: NaiveDate) -> Self {
        let year = date.year();
        match date.month() {
            1..=3 => Self {
                year: year - 1,
                quarter_end_month: 12,
            },
            4..=6 => Self {
                year,
                quarter_end_month: 3,
            },
            7..=9 => Self {
                year,
                quarter_end_month: 6,
            },
            _ => Self {
                year,
                quarter_end_month: 9,
            },
        }
    }

    /// The quarter immediately before this one.
    pub fn previous(&self) -> Self {
        let month = self.quarter_end_month as i32 - 3;
        if month <= 0 {
            Self {
                year: self.year - 1,
                quarter_end_month: 12,
            }
        } else {
            Self {
                year: self.year,
                quarter_end_month: month as u32,
            }
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn quarter_end_month(&self) -> u32 {
        self.quarter_end_month
    }
}

impl Display for DisclosurePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.quarter_end_month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, 15).unwrap()
    }

    #[test]
    fn test_latest_completed_for_every_month() {
        let expected = [
            (1, 2024, 12),
            (2, 2024, 12),
            (3, 2024, 12),
            (4, 2025, 3),
            (5, 2025, 3),
            (6, 2025, 3),
            (7, 2025, 6),
            (8, 2025, 6),
            (9, 2025, 6),
            (10, 2025, 9),
            (11, 2025, 9),
            (12, 2025, 9),
        ];

        for (month, year, quarter_end_month) in expected {
            let period = DisclosurePeriod::latest_completed(date(2025, month));
            assert_eq!(
                (period.year(), period.quarter_end_month()),
                (year, quarter_end_month),
                "month {month}"
            );
        }
    }

    #[test]
    fn test_latest_completed_on_quarter_boundaries() {
        let first_day = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(
            DisclosurePeriod::latest_completed(first_day),
            DisclosurePeriod::new(2025, 12).unwrap()
        );

        let last_day = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        assert_eq!(
            DisclosurePeriod::latest_completed(last_day),
            DisclosurePeriod::new(2026, 3).unwrap()
        );
    }

    #[test]
    fn test_previous_rolls_year_back_from_march() {
        let period = DisclosurePeriod::new(2025, 3).unwrap();
        assert_eq!(period.previous(), DisclosurePeriod::new(2024, 12).unwrap());
    }

    #[test]
    fn test_previous_within_year() {
        let period = DisclosurePeriod::new(2025, 12).unwrap();
        assert_eq!(period.previous(), DisclosurePeriod::new(2025, 9).unwrap());
        assert_eq!(
            period.previous().previous(),
            DisclosurePeriod::new(2025, 6).unwrap()
        );
    }

    #[test]
    fn test_new_rejects_non_quarter_months() {
        assert!(DisclosurePeriod::new(2025, 4).is_none());
        assert!(DisclosurePeriod::new(2025, 0).is_none());
        assert!(DisclosurePeriod::new(2025, 9).is_some());
    }

    #[test]
    fn test_display() {
        assert_eq!(DisclosurePeriod::new(2025, 3).unwrap().to_string(), "2025-03");
    }
}
