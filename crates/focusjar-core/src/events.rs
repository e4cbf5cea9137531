use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::rollover::WeeklyRecord;
use crate::task::Task;
use crate::timer::TimerState;

/// Every state change in the system produces an Event.
/// Commands return `None` instead when the transition is not valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        task: Task,
        duration_secs: u64,
        end_time: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    SessionPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        remaining_secs: u64,
        end_time: DateTime<Utc>,
        total_paused_ms: i64,
        at: DateTime<Utc>,
    },
    SessionCancelled {
        task: Task,
        at: DateTime<Utc>,
    },
    /// The session ran out. `recovered` is set when this was discovered at
    /// startup rather than by a tick.
    SessionCompleted {
        task: Task,
        recovered: bool,
        at: DateTime<Utc>,
    },
    /// A running or paused session was brought back after a restart.
    SessionRestored {
        task: Task,
        state: TimerState,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TaskSold {
        task: Task,
        balance: u64,
        at: DateTime<Utc>,
    },
    WeekRolledOver {
        from: NaiveDate,
        to: NaiveDate,
        archived: Option<WeeklyRecord>,
        at: DateTime<Utc>,
    },
    SyncImported {
        planned: usize,
        completed: usize,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        active_task: Option<Task>,
        remaining_secs: u64,
        total_secs: u64,
        end_time: Option<DateTime<Utc>>,
        planned: usize,
        completed: usize,
        balance: u64,
        at: DateTime<Utc>,
    },
}
