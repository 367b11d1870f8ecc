//! Injected source of "today" so the default 30-day price window can be
//! pinned in tests instead of reading the wall clock.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

#[derive(Clone)]
pub struct Clock(Arc<dyn Fn() -> NaiveDate + Send + Sync>);

impl Clock {
    /// Wall-clock calendar date (UTC).
    pub fn system() -> Self {
        Clock(Arc::new(|| Utc::now().date_naive()))
    }

    /// Always returns `today`; test use.
    pub fn fixed(today: NaiveDate) -> Self {
        Clock(Arc::new(move || today))
    }

    pub fn today(&self) -> NaiveDate {
        (self.0)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_is_stable() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let clock = Clock::fixed(date);
        assert_eq!(clock.today(), date);
        assert_eq!(clock.today(), date);
    }
}
