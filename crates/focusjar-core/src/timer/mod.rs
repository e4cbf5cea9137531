mod engine;
mod snapshot;

pub use engine::{ActiveTask, SessionClock, TickHandle, TimerEngine, TimerState, TICK_PERIOD};
pub use snapshot::{classify, PersistedSession, Recovery, MAX_SESSION_HOURS};
