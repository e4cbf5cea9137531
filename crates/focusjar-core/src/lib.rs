//! # Focus Jar Core Library
//!
//! This library provides the core logic for Focus Jar, a focus-session
//! tracker. The `focusjar` CLI is a thin layer over it.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine for one focus session;
//!   the caller invokes `tick()` once per second while it runs
//! - **Task Queue**: Planned tasks alternate Consume/Produce; finished sessions
//!   move into a completed list that can be sold for reward units
//! - **Weekly Rollover**: Archives the week's completed count when a new
//!   Sunday-based week begins
//! - **Storage**: A key/value store of JSON blobs (SQLite on disk, in-memory for
//!   tests) and TOML configuration
//! - **Orchestrator**: Rehydrates everything at startup, including a session
//!   that was running when the process died
//!
//! ## Key Components
//!
//! - [`Orchestrator`]: Entry point that owns the engine, queue, and store
//! - [`TimerEngine`]: Core timer state machine
//! - [`Database`]: SQLite key/value persistence
//! - [`Config`]: Application configuration management

pub mod advisor;
pub mod clock;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod rollover;
pub mod shapes;
pub mod storage;
pub mod sync;
pub mod task;
pub mod timer;

pub use advisor::{AdvisorClient, AdvisorRequest, AdvisorResponse};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AdvisorError, ConfigError, CoreError, StorageError, SyncError};
pub use events::Event;
pub use orchestrator::Orchestrator;
pub use rollover::{WeeklyLedger, WeeklyRecord};
pub use shapes::{generate_plant_style, generate_shape_indices, PlantStyle, ShapeIndices};
pub use storage::{Config, Database, KvStore, MemoryStore};
pub use sync::SyncPayload;
pub use task::{PlanEntry, Task, TaskKind, TaskQueue};
pub use timer::{TimerEngine, TimerState};
