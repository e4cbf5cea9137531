//! Persisted session blob and the startup recovery decision.
//!
//! The blob is written after every transition and every tick while a session
//! is live, and deleted when the engine returns to Idle. On startup
//! [`classify`] decides what the blob means against the current wall clock;
//! the wall-clock `endTime` is authoritative, not the last counter value.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::engine::{ActiveTask, SessionClock, TimerEngine, TimerState};

/// Longest session a blob may describe, in hours.
pub const MAX_SESSION_HOURS: i64 = 24;

/// Wire format of the timer session blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub timer_state: TimerState,
    pub time_remaining: u64,
    #[serde(default)]
    pub active_task: Option<ActiveTask>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Epoch milliseconds.
    #[serde(default)]
    pub pause_start_time: Option<i64>,
    #[serde(rename = "totalPausedDuration", default)]
    pub total_paused_ms: i64,
}

impl PersistedSession {
    /// `None` while the engine is Idle: idle is never written.
    pub fn capture(engine: &TimerEngine) -> Option<Self> {
        let task = engine.active_task()?;
        let clock = engine.session_clock()?;
        Some(Self {
            timer_state: engine.state(),
            time_remaining: engine.remaining_secs(),
            active_task: Some(task.clone()),
            start_time: Some(clock.start_time),
            end_time: Some(clock.end_time),
            pause_start_time: clock.pause_start_time.map(|t| t.timestamp_millis()),
            total_paused_ms: clock.total_paused_ms,
        })
    }
}

/// What a persisted blob means at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum Recovery {
    /// No blob, or an idle one.
    Empty,
    /// Unparseable or inconsistent. Discard and start idle.
    Corrupt(String),
    /// A running session whose end time already passed.
    Finished(ActiveTask),
    /// Put the session back as it was.
    Restore {
        state: TimerState,
        task: ActiveTask,
        clock: SessionClock,
        remaining_secs: u64,
    },
}

pub fn classify(raw: Option<&str>, now: DateTime<Utc>) -> Recovery {
    let Some(raw) = raw else {
        return Recovery::Empty;
    };
    let blob: PersistedSession = match serde_json::from_str(raw) {
        Ok(blob) => blob,
        Err(e) => return Recovery::Corrupt(e.to_string()),
    };
    if blob.timer_state == TimerState::Idle {
        return Recovery::Empty;
    }
    match reconcile(blob, now) {
        Ok(recovery) => recovery,
        Err(reason) => Recovery::Corrupt(reason.to_string()),
    }
}

fn reconcile(blob: PersistedSession, now: DateTime<Utc>) -> Result<Recovery, &'static str> {
    let task = blob.active_task.ok_or("missing activeTask")?;
    let start_time = blob.start_time.ok_or("missing startTime")?;
    let end_time = blob.end_time.ok_or("missing endTime")?;
    if blob.total_paused_ms < 0 {
        return Err("negative totalPausedDuration");
    }

    let pause_start_time = match blob.pause_start_time {
        Some(ms) => Some(DateTime::from_timestamp_millis(ms).ok_or("pauseStartTime out of range")?),
        None => None,
    };

    // The blob has no length field; it is whatever the pauses don't explain.
    let length = Duration::try_milliseconds(blob.total_paused_ms)
        .and_then(|paused| (end_time - start_time).checked_sub(&paused))
        .ok_or("totalPausedDuration out of range")?;
    if length <= Duration::zero() || length > Duration::hours(MAX_SESSION_HOURS) {
        return Err("endTime - startTime - totalPausedDuration is not a session length");
    }

    let clock = SessionClock {
        start_time,
        end_time,
        length,
        pause_start_time,
        total_paused_ms: blob.total_paused_ms,
    };

    match blob.timer_state {
        TimerState::Running if end_time < now => Ok(Recovery::Finished(task)),
        TimerState::Running => Ok(Recovery::Restore {
            state: TimerState::Running,
            task,
            remaining_secs: clock.remaining_secs_at(now),
            clock,
        }),
        TimerState::Paused => {
            if pause_start_time.is_none() {
                return Err("paused without pauseStartTime");
            }
            Ok(Recovery::Restore {
                state: TimerState::Paused,
                task,
                clock,
                remaining_secs: blob.time_remaining,
            })
        }
        TimerState::Idle => Ok(Recovery::Empty),
    }
}
