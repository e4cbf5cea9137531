//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine for a single focus
//! session. It does not use internal threads and never reads the clock
//! itself: every command takes `now`, and the caller is responsible for
//! calling `tick()` once per [`TICK_PERIOD`] while a [`TickHandle`] is live.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! Running | Paused -> Idle   (cancel)
//! Running -> Idle            (remaining time reaches zero)
//! ```
//!
//! ## Pause accounting
//!
//! `end_time` is always `start_time + length + total_paused_ms`, where
//! `length` is fixed when the session starts; a later change to the
//! configured length only affects the next session. Pausing only records
//! when the pause began; resuming folds the pause into `total_paused_ms` and
//! recomputes `end_time`.
//!
//! ## Ticks
//!
//! The counter never runs ahead of the wall clock: a tick takes it to
//! `min(counter - 1, seconds until end_time)`, so a ticker that stalled
//! (host suspend) catches up on its next tick.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::task::{Task, TaskKind};

/// The fixed tick period.
pub const TICK_PERIOD: std::time::Duration = std::time::Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

/// Snapshot of a planned task taken when its session started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTask {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub text: String,
}

impl From<&Task> for ActiveTask {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            kind: task.kind,
            text: task.text.clone(),
        }
    }
}

impl From<ActiveTask> for Task {
    fn from(active: ActiveTask) -> Self {
        Task {
            id: active.id,
            kind: active.kind,
            text: active.text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClock {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Length the session was started with.
    pub length: Duration,
    pub pause_start_time: Option<DateTime<Utc>>,
    /// Sum of completed pause intervals. Only ever grows.
    pub total_paused_ms: i64,
}

impl SessionClock {
    fn begin(now: DateTime<Utc>, length: Duration) -> Self {
        Self {
            start_time: now,
            end_time: now + length,
            length,
            pause_start_time: None,
            total_paused_ms: 0,
        }
    }

    /// Whole seconds left until `end_time`, rounded, never negative.
    pub fn remaining_secs_at(&self, now: DateTime<Utc>) -> u64 {
        let ms = (self.end_time - now).num_milliseconds();
        if ms <= 0 {
            0
        } else {
            ((ms + 500) / 1000) as u64
        }
    }
}

/// Live periodic tick. Exists exactly while the engine is Running; leaving
/// Running by any path drops it, and `tick()` without one does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickHandle {
    id: u64,
}

impl TickHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn period(&self) -> std::time::Duration {
        TICK_PERIOD
    }
}

#[derive(Debug, Clone)]
struct Session {
    task: ActiveTask,
    clock: SessionClock,
}

/// Core timer engine.
///
/// Exactly one active task and session clock exist iff the state is not
/// `Idle`.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    session_length: Duration,
    state: TimerState,
    session: Option<Session>,
    remaining_secs: u64,
    tick: Option<TickHandle>,
    next_tick_id: u64,
}

impl TimerEngine {
    /// Create an idle engine whose sessions last `session_length`.
    pub fn new(session_length: Duration) -> Self {
        Self {
            session_length,
            state: TimerState::Idle,
            session: None,
            remaining_secs: session_length.num_seconds().max(0) as u64,
            tick: None,
            next_tick_id: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// Length of the live session, or of the next one when Idle.
    pub fn total_secs(&self) -> u64 {
        let length = self
            .session
            .as_ref()
            .map_or(self.session_length, |s| s.clock.length);
        length.num_seconds().max(0) as u64
    }

    pub fn session_length(&self) -> Duration {
        self.session_length
    }

    pub fn active_task(&self) -> Option<&ActiveTask> {
        self.session.as_ref().map(|s| &s.task)
    }

    pub fn session_clock(&self) -> Option<&SessionClock> {
        self.session.as_ref().map(|s| &s.clock)
    }

    pub fn tick_handle(&self) -> Option<TickHandle> {
        self.tick
    }

    /// Remaining time derived from `end_time` instead of the tick counter.
    /// Only meaningful while Running.
    pub fn remaining_from_clock(&self, now: DateTime<Utc>) -> Option<u64> {
        match (self.state, &self.session) {
            (TimerState::Running, Some(session)) => Some(session.clock.remaining_secs_at(now)),
            _ => None,
        }
    }

    /// 0.0 .. 1.0 progress through the session.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 || self.state == TimerState::Idle {
            return 0.0;
        }
        1.0 - (self.remaining_secs as f64 / total as f64)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, task: ActiveTask, now: DateTime<Utc>) -> Option<Event> {
        if self.state != TimerState::Idle {
            return None;
        }
        let clock = SessionClock::begin(now, self.session_length);
        self.session = Some(Session {
            task: task.clone(),
            clock,
        });
        self.state = TimerState::Running;
        self.remaining_secs = self.total_secs();
        self.arm_tick();
        tracing::debug!(task_id = task.id, end_time = %clock.end_time, "session started");
        Some(Event::SessionStarted {
            task: task.into(),
            duration_secs: self.total_secs(),
            end_time: clock.end_time,
            at: now,
        })
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        let session = self.session.as_mut()?;
        session.clock.pause_start_time = Some(now);
        self.state = TimerState::Paused;
        self.tick = None;
        tracing::debug!(remaining_secs = self.remaining_secs, "session paused");
        Some(Event::SessionPaused {
            remaining_secs: self.remaining_secs,
            at: now,
        })
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != TimerState::Paused {
            return None;
        }
        let session = self.session.as_mut()?;
        let clock = &mut session.clock;
        let paused_at = clock.pause_start_time?;

        let pause_ms = (now - paused_at).num_milliseconds().max(0);
        let Some((end_time, total_paused_ms)) = extend_end_time(clock, pause_ms) else {
            tracing::warn!(pause_ms, "pause accounting out of range, staying paused");
            return None;
        };
        clock.total_paused_ms = total_paused_ms;
        clock.end_time = end_time;
        clock.pause_start_time = None;

        self.state = TimerState::Running;
        self.arm_tick();
        tracing::debug!(pause_ms, %end_time, "session resumed");
        Some(Event::SessionResumed {
            remaining_secs: self.remaining_secs,
            end_time,
            total_paused_ms,
            at: now,
        })
    }

    /// Abandon the session. The task stays planned.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state == TimerState::Idle {
            return None;
        }
        let session = self.session.take()?;
        self.state = TimerState::Idle;
        self.tick = None;
        self.remaining_secs = self.total_secs();
        tracing::debug!(task_id = session.task.id, "session cancelled");
        Some(Event::SessionCancelled {
            task: session.task.into(),
            at: now,
        })
    }

    /// Call once per [`TICK_PERIOD`]. Returns `Some(Event::SessionCompleted)`
    /// from the tick that takes the counter to zero; the engine is Idle
    /// afterwards with `remaining_secs() == 0`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != TimerState::Running || self.tick.is_none() {
            return None;
        }
        let until_end = self.session.as_ref()?.clock.remaining_secs_at(now);
        let next = self.remaining_secs.saturating_sub(1).min(until_end);
        if next > 0 {
            self.remaining_secs = next;
            return None;
        }
        self.remaining_secs = 0;
        self.finish(now)
    }

    // ── Rehydration ──────────────────────────────────────────────────

    /// Put a persisted running or paused session back in place.
    pub(crate) fn restore(
        &mut self,
        state: TimerState,
        task: ActiveTask,
        clock: SessionClock,
        remaining_secs: u64,
    ) {
        if state == TimerState::Idle {
            return;
        }
        self.session = Some(Session { task, clock });
        self.state = state;
        self.remaining_secs = remaining_secs;
        self.tick = None;
        if state == TimerState::Running {
            self.arm_tick();
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let session = self.session.take()?;
        self.state = TimerState::Idle;
        self.tick = None;
        tracing::debug!(task_id = session.task.id, "session completed");
        Some(Event::SessionCompleted {
            task: session.task.into(),
            recovered: false,
            at: now,
        })
    }

    fn arm_tick(&mut self) {
        self.next_tick_id += 1;
        self.tick = Some(TickHandle {
            id: self.next_tick_id,
        });
    }
}

/// New `(end_time, total_paused_ms)` after a pause of `pause_ms`, or
/// `None` when the sum leaves the representable range.
fn extend_end_time(clock: &SessionClock, pause_ms: i64) -> Option<(DateTime<Utc>, i64)> {
    let total_paused_ms = clock.total_paused_ms.checked_add(pause_ms)?;
    let end_time = clock
        .start_time
        .checked_add_signed(clock.length)?
        .checked_add_signed(Duration::try_milliseconds(total_paused_ms)?)?;
    Some((end_time, total_paused_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const LENGTH_SECS: i64 = 30 * 60;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap()
    }

    fn task() -> ActiveTask {
        ActiveTask {
            id: 1,
            kind: TaskKind::Consume,
            text: "read chapter 3".into(),
        }
    }

    fn engine() -> TimerEngine {
        TimerEngine::new(Duration::seconds(LENGTH_SECS))
    }

    fn run_ticks(engine: &mut TimerEngine, from: DateTime<Utc>, n: i64) -> Option<Event> {
        let mut last = None;
        for i in 1..=n {
            last = engine.tick(from + Duration::seconds(i));
        }
        last
    }

    #[test]
    fn start_pause_resume() {
        let mut engine = engine();
        assert_eq!(engine.state(), TimerState::Idle);

        assert!(engine.start(task(), t0()).is_some());
        assert_eq!(engine.state(), TimerState::Running);
        assert_eq!(engine.remaining_secs(), 1800);

        assert!(engine.pause(t0()).is_some());
        assert_eq!(engine.state(), TimerState::Paused);

        assert!(engine.resume(t0()).is_some());
        assert_eq!(engine.state(), TimerState::Running);
    }

    #[test]
    fn invalid_transitions_are_noops() {
        let mut engine = engine();
        assert!(engine.pause(t0()).is_none());
        assert!(engine.resume(t0()).is_none());
        assert!(engine.cancel(t0()).is_none());
        assert!(engine.tick(t0()).is_none());
        assert_eq!(engine.state(), TimerState::Idle);

        engine.start(task(), t0()).unwrap();
        assert!(engine.start(task(), t0()).is_none());
        assert!(engine.resume(t0()).is_none());

        engine.pause(t0()).unwrap();
        assert!(engine.pause(t0()).is_none());
        assert!(engine.start(task(), t0()).is_none());
    }

    #[test]
    fn pause_does_not_count_against_session() {
        let mut engine = engine();
        engine.start(task(), t0()).unwrap();
        run_ticks(&mut engine, t0(), 600);
        assert_eq!(engine.remaining_secs(), 1200);

        let paused_at = t0() + Duration::minutes(10);
        engine.pause(paused_at).unwrap();
        let resumed_at = paused_at + Duration::minutes(5);
        engine.resume(resumed_at).unwrap();

        assert_eq!(engine.remaining_secs(), 1200);
        assert_eq!(engine.remaining_from_clock(resumed_at), Some(1200));
        let clock = engine.session_clock().unwrap();
        assert_eq!(clock.total_paused_ms, 5 * 60 * 1000);
        assert_eq!(
            clock.end_time - clock.start_time - Duration::milliseconds(clock.total_paused_ms),
            Duration::seconds(LENGTH_SECS)
        );
    }

    #[test]
    fn counter_and_clock_agree_while_ticking() {
        let mut engine = engine();
        engine.start(task(), t0()).unwrap();
        for i in 1..LENGTH_SECS {
            let now = t0() + Duration::seconds(i);
            engine.tick(now);
            let derived = engine.remaining_from_clock(now).unwrap();
            let diff = engine.remaining_secs() as i64 - derived as i64;
            assert!(diff.abs() <= 1, "tick {i}: counter {} vs clock {derived}", engine.remaining_secs());
        }
    }

    #[test]
    fn final_tick_completes_synchronously() {
        let mut engine = engine();
        engine.start(task(), t0()).unwrap();
        assert!(run_ticks(&mut engine, t0(), LENGTH_SECS - 2).is_none());
        assert_eq!(engine.remaining_secs(), 2);

        assert!(engine.tick(t0() + Duration::seconds(LENGTH_SECS - 1)).is_none());
        assert_eq!(engine.remaining_secs(), 1);

        let event = engine.tick(t0() + Duration::seconds(LENGTH_SECS)).unwrap();
        match event {
            Event::SessionCompleted { task: done, recovered, .. } => {
                assert_eq!(done.id, 1);
                assert!(!recovered);
            }
            other => panic!("expected SessionCompleted, got {other:?}"),
        }
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.remaining_secs(), 0);
        assert!(engine.active_task().is_none());
        assert!(engine.session_clock().is_none());
    }

    #[test]
    fn tick_handle_only_lives_while_running() {
        let mut engine = engine();
        assert!(engine.tick_handle().is_none());

        engine.start(task(), t0()).unwrap();
        let first = engine.tick_handle().unwrap();
        assert_eq!(first.period(), TICK_PERIOD);

        engine.pause(t0()).unwrap();
        assert!(engine.tick_handle().is_none());
        let remaining = engine.remaining_secs();
        assert!(engine.tick(t0() + Duration::seconds(5)).is_none());
        assert_eq!(engine.remaining_secs(), remaining);

        engine.resume(t0()).unwrap();
        let second = engine.tick_handle().unwrap();
        assert_ne!(first.id(), second.id());

        engine.cancel(t0()).unwrap();
        assert!(engine.tick_handle().is_none());

        engine.start(task(), t0()).unwrap();
        run_ticks(&mut engine, t0(), LENGTH_SECS);
        assert_eq!(engine.state(), TimerState::Idle);
        assert!(engine.tick_handle().is_none());
    }

    #[test]
    fn cancel_resets_remaining_time() {
        let mut engine = engine();
        engine.start(task(), t0()).unwrap();
        run_ticks(&mut engine, t0(), 30);
        let event = engine.cancel(t0() + Duration::seconds(30)).unwrap();
        assert!(matches!(event, Event::SessionCancelled { .. }));
        assert_eq!(engine.remaining_secs(), 1800);
        assert!(engine.active_task().is_none());
    }

    #[test]
    fn stalled_ticker_catches_up_with_the_clock() {
        let mut engine = engine();
        engine.start(task(), t0()).unwrap();

        assert!(engine.tick(t0() + Duration::minutes(10)).is_none());
        assert_eq!(engine.remaining_secs(), 1200);

        // Host slept past the end time: the next tick finishes the session.
        let event = engine.tick(t0() + Duration::minutes(31));
        assert!(matches!(event, Some(Event::SessionCompleted { recovered: false, .. })));
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.remaining_secs(), 0);
    }

    #[test]
    fn ticks_before_the_clock_still_count_down() {
        let mut engine = engine();
        engine.start(task(), t0()).unwrap();
        for _ in 0..3 {
            engine.tick(t0());
        }
        assert_eq!(engine.remaining_secs(), 1797);
    }

    #[test]
    fn session_keeps_its_own_length() {
        let mut engine = TimerEngine::new(Duration::minutes(25));
        let clock = SessionClock {
            start_time: t0(),
            end_time: t0() + Duration::minutes(30),
            length: Duration::minutes(30),
            pause_start_time: Some(t0() + Duration::minutes(10)),
            total_paused_ms: 0,
        };
        engine.restore(TimerState::Paused, task(), clock, 1200);
        assert_eq!(engine.total_secs(), 1800);

        let resumed_at = t0() + Duration::minutes(40);
        engine.resume(resumed_at).unwrap();
        let clock = engine.session_clock().unwrap();
        assert_eq!(clock.end_time, t0() + Duration::minutes(60));
        assert_eq!(engine.remaining_from_clock(resumed_at), Some(1200));
        assert_eq!(engine.remaining_secs(), 1200);
        assert!((engine.progress() - 1.0 / 3.0).abs() < 1e-9);

        engine.cancel(resumed_at).unwrap();
        assert_eq!(engine.total_secs(), 1500);
    }

    #[test]
    fn resume_out_of_range_stays_paused() {
        let mut engine = engine();
        let clock = SessionClock {
            start_time: t0(),
            end_time: t0() + Duration::minutes(30),
            length: Duration::minutes(30),
            pause_start_time: Some(t0()),
            total_paused_ms: i64::MAX - 1_000,
        };
        engine.restore(TimerState::Paused, task(), clock, 600);

        assert!(engine.resume(t0() + Duration::minutes(5)).is_none());
        assert_eq!(engine.state(), TimerState::Paused);
        assert!(engine.tick_handle().is_none());
        assert_eq!(engine.session_clock().unwrap().total_paused_ms, i64::MAX - 1_000);
    }

    #[test]
    fn remaining_rounds_to_nearest_second() {
        let clock = SessionClock::begin(t0(), Duration::seconds(10));
        assert_eq!(clock.remaining_secs_at(t0() + Duration::milliseconds(400)), 10);
        assert_eq!(clock.remaining_secs_at(t0() + Duration::milliseconds(600)), 9);
        assert_eq!(clock.remaining_secs_at(t0() + Duration::seconds(11)), 0);
    }
}
