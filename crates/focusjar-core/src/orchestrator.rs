//! Session Orchestrator.
//!
//! Owns the timer engine, the task queue and the weekly ledger, and is the
//! only thing that talks to the store. Every command applies one transition
//! and then persists what it changed; there are no observers.
//!
//! ## Startup
//!
//! [`Orchestrator::open`] loads every blob (corrupt ones become defaults),
//! reconciles the persisted session against the clock, then runs the weekly
//! rollover check. Whatever happened is available from
//! [`Orchestrator::startup_events`].

use chrono::NaiveDate;

use crate::clock::{epoch_ms, Clock};
use crate::error::SyncError;
use crate::events::Event;
use crate::rollover::{self, RolloverOutcome, WeeklyLedger, WeeklyRecord};
use crate::shapes::{self, PlantStyle, ShapeIndices};
use crate::storage::{self, keys, KvStore, SessionConfig};
use crate::sync::SyncPayload;
use crate::task::{PlanEntry, Task, TaskKind, TaskQueue};
use crate::timer::{self, ActiveTask, PersistedSession, Recovery, TimerEngine, TimerState};

pub struct Orchestrator<S: KvStore, C: Clock> {
    store: S,
    clock: C,
    engine: TimerEngine,
    queue: TaskQueue,
    ledger: WeeklyLedger,
    main_task: String,
    startup_events: Vec<Event>,
}

impl<S: KvStore, C: Clock> Orchestrator<S, C> {
    /// Rehydrate from `store`. Never fails: anything unreadable is reset.
    pub fn open(store: S, clock: C, session: &SessionConfig) -> Self {
        let planned: Vec<Task> = storage::load_json(&store, keys::PLANNED_TASKS);
        let completed: Vec<Task> = storage::load_json(&store, keys::COMPLETED_TASKS);
        let balance: u64 = storage::load_json(&store, keys::MONEY);
        let main_task: String = storage::load_json(&store, keys::MAIN_TASK);
        let history: Vec<WeeklyRecord> = storage::load_json(&store, keys::WEEKLY_HISTORY);
        let last_week = load_last_week(&store);

        let mut orchestrator = Self {
            store,
            clock,
            engine: TimerEngine::new(session.length()),
            queue: TaskQueue::from_parts(planned, completed, balance),
            ledger: WeeklyLedger::new(history, last_week),
            main_task,
            startup_events: Vec::new(),
        };
        orchestrator.rehydrate_session();
        orchestrator.check_rollover();
        orchestrator
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn state(&self) -> TimerState {
        self.engine.state()
    }

    pub fn planned(&self) -> &[Task] {
        self.queue.planned()
    }

    pub fn completed(&self) -> &[Task] {
        self.queue.completed()
    }

    pub fn balance(&self) -> u64 {
        self.queue.balance()
    }

    pub fn completed_count(&self, kind: TaskKind) -> usize {
        self.queue.completed_count(kind)
    }

    pub fn main_task(&self) -> &str {
        &self.main_task
    }

    pub fn history(&self) -> &[WeeklyRecord] {
        self.ledger.history()
    }

    pub fn startup_events(&self) -> &[Event] {
        &self.startup_events
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// The Sunday beginning the week the app currently runs in.
    pub fn current_week(&self) -> NaiveDate {
        self.ledger
            .last_week()
            .unwrap_or_else(|| rollover::week_start(self.clock.local_date()))
    }

    pub fn shape_indices(&self) -> ShapeIndices {
        shapes::generate_shape_indices(&rollover::week_id(self.current_week()))
    }

    pub fn plant_style(&self) -> PlantStyle {
        self.shape_indices().into()
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.engine.state(),
            active_task: self.engine.active_task().cloned().map(Task::from),
            remaining_secs: self.engine.remaining_secs(),
            total_secs: self.engine.total_secs(),
            end_time: self.engine.session_clock().map(|c| c.end_time),
            planned: self.queue.planned().len(),
            completed: self.queue.completed().len(),
            balance: self.queue.balance(),
            at: self.clock.now(),
        }
    }

    // ── Plan ─────────────────────────────────────────────────────────

    pub fn add_planned(&mut self, text: &str) -> Option<Task> {
        let task = self.queue.add_planned(text, epoch_ms(self.clock.now()))?;
        self.persist_plan();
        Some(task)
    }

    pub fn remove_planned(&mut self, id: i64) -> Option<Task> {
        let task = self.queue.remove_planned(id)?;
        self.persist_plan();
        Some(task)
    }

    pub fn replace_plan(&mut self, entries: Vec<PlanEntry>) {
        self.queue.replace_plan(entries, epoch_ms(self.clock.now()));
        self.persist_plan();
    }

    pub fn set_main_task(&mut self, text: &str) {
        self.main_task = text.to_string();
        storage::save_json(&self.store, keys::MAIN_TASK, &self.main_task);
    }

    // ── Timer ────────────────────────────────────────────────────────

    /// Start a session on the first planned task.
    pub fn start(&mut self) -> Option<Event> {
        if self.engine.state() != TimerState::Idle {
            return None;
        }
        let task = ActiveTask::from(self.queue.next_up()?);
        let event = self.engine.start(task, self.clock.now())?;
        self.persist_session();
        Some(event)
    }

    pub fn pause(&mut self) -> Option<Event> {
        let event = self.engine.pause(self.clock.now())?;
        self.persist_session();
        Some(event)
    }

    pub fn resume(&mut self) -> Option<Event> {
        let event = self.engine.resume(self.clock.now())?;
        self.persist_session();
        Some(event)
    }

    pub fn cancel(&mut self) -> Option<Event> {
        let event = self.engine.cancel(self.clock.now())?;
        self.persist_session();
        Some(event)
    }

    /// One tick of the live session. Returns the completion event from the
    /// tick that finishes the session.
    pub fn tick(&mut self) -> Option<Event> {
        let event = self.engine.tick(self.clock.now());
        if let Some(Event::SessionCompleted { task, .. }) = &event {
            self.queue.complete_active(task.clone());
            self.persist_plan();
            self.persist_completed();
        }
        if self.engine.state() != TimerState::Idle || event.is_some() {
            self.persist_session();
        }
        event
    }

    /// Tick in real time until the engine leaves Running. Returns the
    /// completion event, or `None` if the tick handle went away first.
    pub async fn drive<F>(&mut self, mut on_tick: F) -> Option<Event>
    where
        F: FnMut(&Self, Option<&Event>),
    {
        let handle = self.engine.tick_handle()?;
        let period = handle.period();
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            interval.tick().await;
            if self.engine.tick_handle() != Some(handle) {
                return None;
            }
            let event = self.tick();
            on_tick(self, event.as_ref());
            if event.is_some() {
                return event;
            }
        }
    }

    // ── Jar ──────────────────────────────────────────────────────────

    pub fn sell_one(&mut self) -> Option<Event> {
        let task = self.queue.sell_one()?;
        self.persist_completed();
        storage::save_json(&self.store, keys::MONEY, &self.queue.balance());
        Some(Event::TaskSold {
            task,
            balance: self.queue.balance(),
            at: self.clock.now(),
        })
    }

    // ── Sync ─────────────────────────────────────────────────────────

    pub fn export_sync(&self) -> SyncPayload {
        SyncPayload {
            main_task: self.main_task.clone(),
            completed_tasks: self.queue.completed().to_vec(),
            planned_tasks: self.queue.planned().to_vec(),
        }
    }

    /// Overwrite local goal and task lists with `payload`.
    ///
    /// # Errors
    /// Returns [`SyncError::NotConfirmed`] unless the user confirmed.
    pub fn import_sync(&mut self, payload: SyncPayload, confirmed: bool) -> Result<Event, SyncError> {
        if !confirmed {
            return Err(SyncError::NotConfirmed);
        }
        let planned = payload.planned_tasks.len();
        let completed = payload.completed_tasks.len();

        self.set_main_task(&payload.main_task);
        self.queue.replace_completed(payload.completed_tasks);
        self.queue.replace_plan(
            payload.planned_tasks.into_iter().map(PlanEntry::from).collect(),
            epoch_ms(self.clock.now()),
        );
        self.persist_plan();
        self.persist_completed();
        tracing::info!(planned, completed, "sync payload imported");

        Ok(Event::SyncImported {
            planned,
            completed,
            at: self.clock.now(),
        })
    }

    // ── Startup ──────────────────────────────────────────────────────

    fn rehydrate_session(&mut self) {
        let now = self.clock.now();
        let raw = self.store.get(keys::TIMER_STATE).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read session state");
            None
        });

        match timer::classify(raw.as_deref(), now) {
            Recovery::Empty => {
                if raw.is_some() {
                    storage::delete_logged(&self.store, keys::TIMER_STATE);
                }
            }
            Recovery::Corrupt(reason) => {
                tracing::warn!(%reason, "discarding corrupt session state");
                storage::delete_logged(&self.store, keys::TIMER_STATE);
            }
            Recovery::Finished(active) => {
                tracing::info!(task_id = active.id, "session finished while closed");
                let task = Task::from(active);
                self.queue.complete_active(task.clone());
                self.persist_plan();
                self.persist_completed();
                storage::delete_logged(&self.store, keys::TIMER_STATE);
                self.startup_events.push(Event::SessionCompleted {
                    task,
                    recovered: true,
                    at: now,
                });
            }
            Recovery::Restore {
                state,
                task,
                clock,
                remaining_secs,
            } => {
                tracing::info!(task_id = task.id, ?state, remaining_secs, "session restored");
                self.engine.restore(state, task.clone(), clock, remaining_secs);
                self.persist_session();
                self.startup_events.push(Event::SessionRestored {
                    task: task.into(),
                    state,
                    remaining_secs,
                    at: now,
                });
            }
        }
    }

    fn check_rollover(&mut self) {
        let today = self.clock.local_date();
        match self.ledger.evaluate(today, self.queue.completed().len()) {
            RolloverOutcome::SameWeek => {}
            RolloverOutcome::FirstRun => self.persist_last_week(),
            RolloverOutcome::RolledOver { from, to, archived } => {
                tracing::info!(%from, %to, archived = archived.is_some(), "new week");
                if archived.is_some() {
                    storage::save_json(&self.store, keys::WEEKLY_HISTORY, self.ledger.history());
                }
                self.queue.clear_completed();
                self.persist_completed();
                self.persist_last_week();
                self.startup_events.push(Event::WeekRolledOver {
                    from,
                    to,
                    archived,
                    at: self.clock.now(),
                });
            }
        }
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Write the live session, or delete the blob when Idle.
    fn persist_session(&self) {
        match PersistedSession::capture(&self.engine) {
            Some(blob) => {
                storage::save_json(&self.store, keys::TIMER_STATE, &blob);
            }
            None => storage::delete_logged(&self.store, keys::TIMER_STATE),
        }
    }

    fn persist_plan(&self) {
        storage::save_json(&self.store, keys::PLANNED_TASKS, self.queue.planned());
    }

    fn persist_completed(&self) {
        storage::save_json(&self.store, keys::COMPLETED_TASKS, self.queue.completed());
    }

    fn persist_last_week(&self) {
        if let Some(week) = self.ledger.last_week() {
            storage::set_logged(&self.store, keys::LAST_WEEK_START, &rollover::week_id(week));
        }
    }
}

fn load_last_week<S: KvStore + ?Sized>(store: &S) -> Option<NaiveDate> {
    let raw = match store.get(keys::LAST_WEEK_START) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(error = %e, "could not read last week start");
            return None;
        }
    };
    let week = rollover::parse_week_id(&raw);
    if week.is_none() {
        tracing::warn!(%raw, "discarding unparseable last week start");
        storage::delete_logged(store, keys::LAST_WEEK_START);
    }
    week
}
