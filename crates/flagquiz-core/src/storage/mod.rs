mod config;
pub mod database;

pub use config::Config;
pub use database::SqliteStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::StoreError;

/// Returns the data directory, creating it if needed.
///
/// `FLAGQUIZ_DATA_DIR` wins when set. Otherwise `~/.config/flagquiz[-dev]/`,
/// with `FLAGQUIZ_ENV=dev` selecting the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("FLAGQUIZ_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FLAGQUIZ_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("flagquiz-dev")
            } else {
                base_dir.join("flagquiz")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// The one persisted session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedState {
    pub current_question: usize,
    pub time_remaining: u32,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub score: u32,
}

/// Durable single-slot record of the live session.
///
/// Each save replaces the previous record. The scheduler treats every
/// failure as non-fatal.
pub trait StateStore: Send {
    fn save(&mut self, state: &SavedState) -> Result<(), StoreError>;
    fn load(&self) -> Result<Option<SavedState>, StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct MemorySlot {
    state: Option<SavedState>,
    failing: bool,
    saves: usize,
}

/// In-memory store. Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<MemorySlot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: SavedState) -> Self {
        let store = Self::default();
        store.lock().state = Some(state);
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemorySlot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make every subsequent operation fail with [`StoreError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Current record, bypassing failure injection.
    pub fn peek(&self) -> Option<SavedState> {
        self.lock().state
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }
}

impl StateStore for MemoryStore {
    fn save(&mut self, state: &SavedState) -> Result<(), StoreError> {
        let mut slot = self.lock();
        if slot.failing {
            return Err(StoreError::Unavailable);
        }
        slot.state = Some(*state);
        slot.saves += 1;
        Ok(())
    }

    fn load(&self) -> Result<Option<SavedState>, StoreError> {
        let slot = self.lock();
        if slot.failing {
            return Err(StoreError::Unavailable);
        }
        Ok(slot.state)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        let mut slot = self.lock();
        if slot.failing {
            return Err(StoreError::Unavailable);
        }
        slot.state = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(score: u32) -> SavedState {
        SavedState {
            current_question: 3,
            time_remaining: 12,
            scheduled_time: Some(Utc::now()),
            score,
        }
    }

    #[test]
    fn memory_store_keeps_single_slot() {
        let mut store = MemoryStore::new();
        store.save(&record(1)).unwrap();
        store.save(&record(2)).unwrap();
        assert_eq!(store.load().unwrap().unwrap().score, 2);
        assert_eq!(store.save_count(), 2);

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn memory_store_failure_injection() {
        let mut store = MemoryStore::with_state(record(4));
        store.set_failing(true);
        assert!(matches!(store.save(&record(5)), Err(StoreError::Unavailable)));
        assert!(store.load().is_err());
        assert_eq!(store.peek().unwrap().score, 4);
    }

    #[test]
    fn clones_share_the_slot() {
        let store = MemoryStore::new();
        let mut writer = store.clone();
        writer.save(&record(7)).unwrap();
        assert_eq!(store.peek().unwrap().score, 7);
    }
}
