//! Date-range predicate builder for business-date filtered queries.
//!
//! Turns an optional `(start_date, end_date)` pair into a concrete filter.
//! When neither bound is given the filter defaults to the last
//! [`DEFAULT_WINDOW_DAYS`] days relative to the caller-supplied `today`,
//! so tests can pin the clock.

use chrono::{Duration, NaiveDate};

/// Window applied when a price query carries no explicit date bounds.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// A resolved business-date predicate. All bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    /// `start <= biz_date <= end`
    Between(NaiveDate, NaiveDate),
    /// `biz_date >= start`, unbounded above
    From(NaiveDate),
    /// `biz_date <= end`, unbounded below
    Until(NaiveDate),
}

impl DateFilter {
    /// Resolve optional bounds into a concrete filter, in priority order:
    /// both, start only, end only, neither (default window ending `today`).
    pub fn resolve(
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Self {
        match (start_date, end_date) {
            (Some(start), Some(end)) => DateFilter::Between(start, end),
            (Some(start), None) => DateFilter::From(start),
            (None, Some(end)) => DateFilter::Until(end),
            (None, None) => DateFilter::From(today - Duration::days(DEFAULT_WINDOW_DAYS)),
        }
    }

    /// Evaluate the predicate against a single date.
    pub fn matches(&self, date: NaiveDate) -> bool {
        match *self {
            DateFilter::Between(start, end) => date >= start && date <= end,
            DateFilter::From(start) => date >= start,
            DateFilter::Until(end) => date <= end,
        }
    }

    /// Render the predicate as a SQL fragment with `$n` placeholders
    /// starting at `first_param`, plus the bind values in placeholder
    /// order. Values are always bound, never spliced into the text.
    pub fn to_sql(&self, column: &str, first_param: usize) -> (String, Vec<NaiveDate>) {
        match *self {
            DateFilter::Between(start, end) => (
                format!(
                    "{column} BETWEEN ${} AND ${}",
                    first_param,
                    first_param + 1
                ),
                vec![start, end],
            ),
            DateFilter::From(start) => (format!("{column} >= ${first_param}"), vec![start]),
            DateFilter::Until(end) => (format!("{column} <= ${first_param}"), vec![end]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_both_bounds_inclusive_range() {
        let filter = DateFilter::resolve(Some(d(2024, 1, 1)), Some(d(2024, 1, 31)), d(2024, 6, 1));
        assert_eq!(filter, DateFilter::Between(d(2024, 1, 1), d(2024, 1, 31)));
        assert!(filter.matches(d(2024, 1, 1)));
        assert!(filter.matches(d(2024, 1, 31)));
        assert!(!filter.matches(d(2023, 12, 31)));
        assert!(!filter.matches(d(2024, 2, 1)));
    }

    #[test]
    fn test_start_only_unbounded_above() {
        let filter = DateFilter::resolve(Some(d(2024, 3, 15)), None, d(2024, 6, 1));
        assert_eq!(filter, DateFilter::From(d(2024, 3, 15)));
        assert!(filter.matches(d(2024, 3, 15)));
        assert!(filter.matches(d(2099, 1, 1)));
        assert!(!filter.matches(d(2024, 3, 14)));
    }

    #[test]
    fn test_end_only_unbounded_below() {
        let filter = DateFilter::resolve(None, Some(d(2024, 3, 15)), d(2024, 6, 1));
        assert_eq!(filter, DateFilter::Until(d(2024, 3, 15)));
        assert!(filter.matches(d(1990, 1, 1)));
        assert!(filter.matches(d(2024, 3, 15)));
        assert!(!filter.matches(d(2024, 3, 16)));
    }

    #[test]
    fn test_neither_defaults_to_last_30_days() {
        let filter = DateFilter::resolve(None, None, d(2024, 6, 15));
        assert_eq!(filter, DateFilter::From(d(2024, 5, 16)));
        assert!(filter.matches(d(2024, 5, 16)));
        assert!(filter.matches(d(2024, 6, 15)));
        assert!(!filter.matches(d(2024, 5, 15)));
    }

    #[test]
    fn test_sql_rendering_between() {
        let filter = DateFilter::Between(d(2024, 1, 1), d(2024, 1, 31));
        let (sql, binds) = filter.to_sql("biz_date", 2);
        assert_eq!(sql, "biz_date BETWEEN $2 AND $3");
        assert_eq!(binds, vec![d(2024, 1, 1), d(2024, 1, 31)]);
    }

    #[test]
    fn test_sql_rendering_single_bound() {
        let (sql, binds) = DateFilter::From(d(2024, 1, 1)).to_sql("biz_date", 4);
        assert_eq!(sql, "biz_date >= $4");
        assert_eq!(binds, vec![d(2024, 1, 1)]);

        let (sql, binds) = DateFilter::Until(d(2024, 1, 1)).to_sql("biz_date", 1);
        assert_eq!(sql, "biz_date <= $1");
        assert_eq!(binds, vec![d(2024, 1, 1)]);
    }
}
