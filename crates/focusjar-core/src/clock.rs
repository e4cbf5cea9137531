//! Clock Source.
//!
//! The only source of truth for elapsed and remaining time. Everything that
//! reads "now" goes through a [`Clock`] so recovery and pause math can be
//! driven by a [`ManualClock`] in tests.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar day of `now()` in the user's local time.
    fn local_date(&self) -> NaiveDate {
        self.now().with_timezone(&Local).date_naive()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock. Clones share the same instant, so a test can keep a
/// handle while the orchestrator owns another. Its calendar is UTC.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.now.set(at);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn local_date(&self) -> NaiveDate {
        self.now.get().date_naive()
    }
}

/// Milliseconds since the Unix epoch.
pub fn epoch_ms(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manual_clock_clones_share_time() {
        let start = Utc.with_ymd_and_hms(2024, 1, 7, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let handle = clock.clone();
        handle.advance_secs(90);
        assert_eq!(clock.now(), start + Duration::seconds(90));
    }

    #[test]
    fn manual_clock_calendar_is_utc() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 6, 23, 59, 59).unwrap());
        assert_eq!(clock.local_date(), NaiveDate::from_ymd_opt(2024, 1, 6).unwrap());
        clock.advance_secs(1);
        assert_eq!(clock.local_date(), NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
    }
}
