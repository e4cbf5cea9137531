//! Weekly Rollover Manager.
//!
//! Weeks begin on Sunday in local time. A week is identified by the date of
//! that Sunday (`YYYY-MM-DD`). At process start the current week is compared
//! with the last week the app is known to have run in; when a later week has
//! begun, the outgoing week's completed count is archived (if non-zero) and
//! the caller clears its completed list.
//!
//! The check only runs at startup. An app left open across a week boundary
//! keeps the old week until it is restarted.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Wire format of week identifiers.
pub const WEEK_FORMAT: &str = "%Y-%m-%d";

/// The Sunday that begins the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_sunday();
    date - Duration::days(i64::from(offset))
}

pub fn week_id(week: NaiveDate) -> String {
    week.format(WEEK_FORMAT).to_string()
}

pub fn parse_week_id(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), WEEK_FORMAT).ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyRecord {
    #[serde(rename = "weekOf", with = "week_date")]
    pub week_start: NaiveDate,
    #[serde(rename = "count")]
    pub completed_count: u64,
}

/// What [`WeeklyLedger::evaluate`] decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloverOutcome {
    /// No week was stored yet; the current one was recorded.
    FirstRun,
    /// Still the stored week (or the clock went backwards).
    SameWeek,
    /// A later week began. The completed list must be cleared.
    RolledOver {
        from: NaiveDate,
        to: NaiveDate,
        archived: Option<WeeklyRecord>,
    },
}

/// Owns the weekly history and the last-known week.
#[derive(Debug, Clone, Default)]
pub struct WeeklyLedger {
    history: Vec<WeeklyRecord>,
    last_week: Option<NaiveDate>,
}

impl WeeklyLedger {
    pub fn new(history: Vec<WeeklyRecord>, last_week: Option<NaiveDate>) -> Self {
        Self { history, last_week }
    }

    pub fn history(&self) -> &[WeeklyRecord] {
        &self.history
    }

    pub fn last_week(&self) -> Option<NaiveDate> {
        self.last_week
    }

    /// Compare `current` (any date inside the current week) against the
    /// last-known week. `completed_count` is the size of the completed list
    /// as it stands before clearing.
    pub fn evaluate(&mut self, today: NaiveDate, completed_count: usize) -> RolloverOutcome {
        let current = week_start(today);
        let Some(last) = self.last_week else {
            self.last_week = Some(current);
            return RolloverOutcome::FirstRun;
        };

        if current <= last {
            return RolloverOutcome::SameWeek;
        }

        let archived = (completed_count > 0).then(|| WeeklyRecord {
            week_start: last,
            completed_count: completed_count as u64,
        });
        if let Some(record) = &archived {
            self.history.push(record.clone());
        }
        self.last_week = Some(current);

        RolloverOutcome::RolledOver {
            from: last,
            to: current,
            archived,
        }
    }
}

mod week_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::week_id(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_week_id(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid week '{raw}'")))
    }
}
