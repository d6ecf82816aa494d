use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::Phase;

/// Every session transition produces an Event.
/// Presentation layers render from `StateSnapshot` and react to the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionScheduled {
        start_time: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// Pre-roll before the first question.
    CountdownStarted {
        countdown_secs: u32,
        at: DateTime<Utc>,
    },
    QuestionStarted {
        question_index: usize,
        time_remaining: u32,
        at: DateTime<Utc>,
    },
    /// Answer locked in, or time ran out (`selected` is `None`).
    AnswerRevealed {
        question_index: usize,
        selected: Option<u32>,
        correct_answer: u32,
        is_correct: bool,
        score: u32,
        at: DateTime<Utc>,
    },
    BreakStarted {
        next_question_index: usize,
        countdown_secs: u32,
        at: DateTime<Utc>,
    },
    SessionFinished {
        score: u32,
        total_questions: usize,
        at: DateTime<Utc>,
    },
    SessionReset {
        at: DateTime<Utc>,
    },
    /// Cold start rebuilt the session from its saved record.
    SessionRestored {
        phase: Phase,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        question_index: usize,
        total_questions: usize,
        time_remaining: u32,
        score: u32,
        selected_answer: Option<u32>,
        show_result: bool,
        is_correct: bool,
        scheduled_start: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
}
