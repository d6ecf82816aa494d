//! Cold-start reconstruction.
//!
//! A session that has already started is laid out as fixed blocks:
//!
//! ```text
//! | Q0 (30s) | B (10s) | Q1 (30s) | B (10s) | ... | Q(N-1) (30s) |
//! ```
//!
//! Given the seconds elapsed since the scheduled start, walking those blocks
//! tells which phase is live and how much of it is left. Nothing about the
//! previous process is needed beyond the start instant.

use serde::{Deserialize, Serialize};

use super::phase::SessionTiming;

/// Where a started session stands after `elapsed` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "at", rename_all = "snake_case")]
pub enum Position {
    Question { index: usize, time_remaining: u32 },
    /// Break before `next_index`.
    Break { next_index: usize, countdown: u32 },
    Finished,
}

/// Locate `elapsed_secs` on the session timeline.
pub fn locate(elapsed_secs: u64, total_questions: usize, timing: &SessionTiming) -> Position {
    let total = timing.total_game_secs(total_questions);
    if total <= 0 || elapsed_secs >= total as u64 {
        return Position::Finished;
    }

    let question = u64::from(timing.question_secs);
    let pause = u64::from(timing.break_secs);
    let mut remaining = elapsed_secs;
    let mut index = 0;

    while index < total_questions {
        if remaining < question {
            return Position::Question {
                index,
                time_remaining: (question - remaining) as u32,
            };
        }
        remaining -= question;

        if index + 1 < total_questions {
            if remaining < pause {
                return Position::Break {
                    next_index: index + 1,
                    countdown: (pause - remaining) as u32,
                };
            }
            remaining -= pause;
        }
        index += 1;
    }

    Position::Finished
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const N: usize = 15;

    /// Same answer by division instead of walking.
    fn by_arithmetic(elapsed: u64, n: usize, timing: &SessionTiming) -> Position {
        if elapsed >= timing.total_game_secs(n) as u64 {
            return Position::Finished;
        }
        let q = u64::from(timing.question_secs);
        let b = u64::from(timing.break_secs);
        let block = elapsed / (q + b);
        let offset = elapsed % (q + b);
        if offset < q {
            Position::Question {
                index: block as usize,
                time_remaining: (q - offset) as u32,
            }
        } else {
            Position::Break {
                next_index: block as usize + 1,
                countdown: (q + b - offset) as u32,
            }
        }
    }

    #[test]
    fn boundary_points() {
        let t = SessionTiming::default();
        assert_eq!(locate(0, N, &t), Position::Question { index: 0, time_remaining: 30 });
        assert_eq!(locate(29, N, &t), Position::Question { index: 0, time_remaining: 1 });
        assert_eq!(locate(30, N, &t), Position::Break { next_index: 1, countdown: 10 });
        assert_eq!(locate(39, N, &t), Position::Break { next_index: 1, countdown: 1 });
        assert_eq!(locate(40, N, &t), Position::Question { index: 1, time_remaining: 30 });
        assert_eq!(locate(299, N, &t), Position::Question { index: 7, time_remaining: 11 });
        assert_eq!(locate(300, N, &t), Position::Question { index: 7, time_remaining: 10 });
        assert_eq!(locate(310, N, &t), Position::Break { next_index: 8, countdown: 10 });
        assert_eq!(locate(589, N, &t), Position::Question { index: 14, time_remaining: 1 });
        assert_eq!(locate(590, N, &t), Position::Finished);
        assert_eq!(locate(1000, N, &t), Position::Finished);
    }

    #[test]
    fn last_question_has_no_trailing_break() {
        let t = SessionTiming::default();
        // Q14 starts at 14 * 40 = 560.
        assert_eq!(locate(560, N, &t), Position::Question { index: 14, time_remaining: 30 });
        for elapsed in 560..590 {
            assert!(matches!(locate(elapsed, N, &t), Position::Question { index: 14, .. }));
        }
    }

    #[test]
    fn single_question_session() {
        let t = SessionTiming::default();
        assert_eq!(locate(10, 1, &t), Position::Question { index: 0, time_remaining: 20 });
        assert_eq!(locate(30, 1, &t), Position::Finished);
    }

    #[test]
    fn empty_session_is_finished() {
        assert_eq!(locate(0, 0, &SessionTiming::default()), Position::Finished);
    }

    #[test]
    fn walk_matches_arithmetic_at_listed_points() {
        let t = SessionTiming::default();
        let total = t.total_game_secs(N) as u64;
        for elapsed in [0, 29, 30, 39, 40, 299, 300, total - 1, total] {
            assert_eq!(locate(elapsed, N, &t), by_arithmetic(elapsed, N, &t), "elapsed={elapsed}");
        }
    }

    proptest! {
        #[test]
        fn walk_matches_arithmetic(elapsed in 0u64..2_000, n in 1usize..30) {
            let t = SessionTiming::default();
            prop_assert_eq!(locate(elapsed, n, &t), by_arithmetic(elapsed, n, &t));
        }

        #[test]
        fn walk_matches_arithmetic_for_custom_budgets(
            elapsed in 0u64..5_000,
            n in 1usize..20,
            question_secs in 1u32..90,
            break_secs in 1u32..30,
        ) {
            let t = SessionTiming { question_secs, break_secs, ..SessionTiming::default() };
            prop_assert_eq!(locate(elapsed, n, &t), by_arithmetic(elapsed, n, &t));
        }

        #[test]
        fn countdowns_stay_within_budget(elapsed in 0u64..1_000) {
            let t = SessionTiming::default();
            match locate(elapsed, N, &t) {
                Position::Question { index, time_remaining } => {
                    prop_assert!(index < N);
                    prop_assert!((1..=30).contains(&time_remaining));
                }
                Position::Break { next_index, countdown } => {
                    prop_assert!((1..N).contains(&next_index));
                    prop_assert!((1..=10).contains(&countdown));
                }
                Position::Finished => prop_assert!(elapsed >= 590),
            }
        }
    }
}
