pub mod config;
pub mod flag;
pub mod play;
pub mod questions;
pub mod session;

use chrono::{DateTime, Duration, Utc};
use flagquiz_core::{Config, CoreError, QuestionBank, SessionTiming, SqliteStore};

/// What a session needs from disk.
pub(crate) struct SessionSetup {
    pub questions: QuestionBank,
    pub timing: SessionTiming,
    pub store: SqliteStore,
}

pub(crate) fn load_setup() -> flagquiz_core::Result<SessionSetup> {
    let config = Config::load_or_default();
    Ok(SessionSetup {
        questions: config.question_bank()?,
        timing: config.timing()?,
        store: SqliteStore::open()?,
    })
}

/// Turn a core error into the CLI's message. Unusable question data is the
/// inert "cannot play" state.
pub(crate) fn report(err: CoreError) -> Box<dyn std::error::Error> {
    match err {
        CoreError::Question(e) => format!("quiz unavailable: {e}").into(),
        other => other.into(),
    }
}

pub(crate) fn playable_bank(config: &Config) -> Result<QuestionBank, Box<dyn std::error::Error>> {
    config.question_bank().map_err(|e| report(e.into()))
}

/// The instant `secs` seconds from now, or an error when it cannot be
/// represented.
pub(crate) fn start_after(secs: i64) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    Duration::try_seconds(secs)
        .and_then(|delay| Utc::now().checked_add_signed(delay))
        .ok_or_else(|| "start time out of range".into())
}
