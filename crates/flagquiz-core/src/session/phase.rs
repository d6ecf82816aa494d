use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The single active stage of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    Scheduled { start_time: DateTime<Utc> },
    StartingSoon { countdown: u32 },
    InProgress { question_index: usize },
    BetweenQuestions { countdown: u32 },
    Finished { score: u32 },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::NotStarted => "not_started",
            Phase::Scheduled { .. } => "scheduled",
            Phase::StartingSoon { .. } => "starting_soon",
            Phase::InProgress { .. } => "in_progress",
            Phase::BetweenQuestions { .. } => "between_questions",
            Phase::Finished { .. } => "finished",
        }
    }
}

/// Time budgets, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTiming {
    #[serde(default = "default_question_secs")]
    pub question_secs: u32,
    #[serde(default = "default_break_secs")]
    pub break_secs: u32,
    /// The start countdown begins once this many seconds remain.
    #[serde(default = "default_preroll_secs")]
    pub preroll_secs: u32,
    /// Pause after an answer is locked in, before advancing.
    #[serde(default = "default_reveal_secs")]
    pub reveal_secs: u32,
}

fn default_question_secs() -> u32 {
    30
}
fn default_break_secs() -> u32 {
    10
}
fn default_preroll_secs() -> u32 {
    20
}
fn default_reveal_secs() -> u32 {
    2
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            question_secs: default_question_secs(),
            break_secs: default_break_secs(),
            preroll_secs: default_preroll_secs(),
            reveal_secs: default_reveal_secs(),
        }
    }
}

impl SessionTiming {
    /// Question time plus the breaks between questions. There is no break
    /// after the last question.
    pub fn total_game_secs(&self, total_questions: usize) -> i64 {
        if total_questions == 0 {
            return 0;
        }
        let n = total_questions as i64;
        n * i64::from(self.question_secs) + (n - 1) * i64::from(self.break_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_game_time_for_fifteen_questions() {
        assert_eq!(SessionTiming::default().total_game_secs(15), 590);
        assert_eq!(SessionTiming::default().total_game_secs(1), 30);
        assert_eq!(SessionTiming::default().total_game_secs(0), 0);
    }

    #[test]
    fn phase_serializes_with_tag() {
        let json = serde_json::to_value(Phase::InProgress { question_index: 3 }).unwrap();
        assert_eq!(json["phase"], "in_progress");
        assert_eq!(json["question_index"], 3);
    }
}
