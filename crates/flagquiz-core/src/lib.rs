//! # FlagQuiz Core Library
//!
//! Core logic for a timed flag quiz. Sessions are scheduled for a wall-clock
//! start instant and then run through a fixed sequence of timed phases:
//! countdown, question, break, question, ... finished.
//!
//! ## Architecture
//!
//! - **Session Scheduler**: phase state machine driven by player commands and
//!   timer callbacks; rebuilds the live phase on cold start purely from the
//!   scheduled start and the current time
//! - **Session Runtime**: single tokio task owning a scheduler, fed by a
//!   command channel and tokio-backed timers
//! - **Question Bank**: validated, read-only question list loaded at startup
//! - **Storage**: single-slot SQLite state store and TOML configuration
//!
//! ## Key Components
//!
//! - [`SessionScheduler`]: core state machine
//! - [`SessionRuntime`]: live async driver
//! - [`QuestionBank`]: question source
//! - [`SqliteStore`]: saved session persistence
//! - [`Config`]: application configuration

pub mod error;
pub mod events;
pub mod quiz;
pub mod session;
pub mod storage;

pub use error::{ConfigError, CoreError, QuestionError, Result, StoreError};
pub use events::Event;
pub use quiz::{Country, FlagCatalog, Question, QuestionBank};
pub use session::{
    locate, Clock, ManualTimers, Phase, Position, SessionRuntime, SessionScheduler,
    SessionTiming, SystemClock, TimerDriver, TimerHandle,
};
pub use storage::{Config, MemoryStore, SavedState, SqliteStore, StateStore};
