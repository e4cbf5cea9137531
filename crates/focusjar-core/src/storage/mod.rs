//! Persistent Store.
//!
//! A string key-value store that survives restarts, injected as a
//! [`KvStore`] capability. Values are JSON blobs under fixed keys (see
//! [`keys`]). Reads go through [`load_json`] and writes through
//! [`save_json`], which apply the recovery policy in one place:
//!
//! - a blob that is missing or fails to parse becomes the type's default,
//!   and a corrupt blob is deleted;
//! - a failed write is logged and otherwise ignored, the in-memory state
//!   stays authoritative.
//!
//! Two processes sharing one store are not coordinated: the last writer wins.

mod config;
pub mod database;
pub mod memory;

pub use config::{AdvisorConfig, Config, LoggingConfig, SessionConfig};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

pub mod keys {
    pub const PLANNED_TASKS: &str = "focusJarPlannedTasks";
    pub const COMPLETED_TASKS: &str = "focusJarCompletedTasks";
    pub const TIMER_STATE: &str = "focusJarTimerState";
    pub const MAIN_TASK: &str = "focusJarMainTask";
    pub const MONEY: &str = "focusJarMoney";
    pub const WEEKLY_HISTORY: &str = "focusJarWeeklyHistory";
    /// Bare `YYYY-MM-DD`, not JSON.
    pub const LAST_WEEK_START: &str = "focusJarLastWeekStart";
}

pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and parse a blob. Never fails: missing, unreadable, or corrupt
/// blobs yield `T::default()`, and corrupt ones are removed.
pub fn load_json<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: KvStore + ?Sized,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read blob, using default");
            return T::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding corrupt blob");
            delete_logged(store, key);
            T::default()
        }
    }
}

/// Serialize and write a blob, logging instead of failing.
/// Returns whether the write landed.
pub fn save_json<T, S>(store: &S, key: &str, value: &T) -> bool
where
    T: Serialize + ?Sized,
    S: KvStore + ?Sized,
{
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to serialize blob");
            return false;
        }
    };
    set_logged(store, key, &json)
}

pub fn set_logged<S: KvStore + ?Sized>(store: &S, key: &str, value: &str) -> bool {
    match store.set(key, value) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to persist, keeping in-memory state");
            false
        }
    }
}

pub fn delete_logged<S: KvStore + ?Sized>(store: &S, key: &str) {
    if let Err(e) = store.delete(key) {
        tracing::warn!(key, error = %e, "failed to delete blob");
    }
}

/// Returns the data directory, creating it if needed.
///
/// `FOCUSJAR_DATA_DIR` overrides everything. Otherwise
/// `~/.config/focusjar`, or `~/.config/focusjar-dev` with `FOCUSJAR_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("FOCUSJAR_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSJAR_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusjar-dev")
            } else {
                base_dir.join("focusjar")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
