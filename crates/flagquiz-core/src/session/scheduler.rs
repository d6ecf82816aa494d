//! Session scheduler.
//!
//! A wall-clock-driven state machine over a fixed question bank. All
//! mutation goes through the named operations below; timers are armed on an
//! injected [`TimerDriver`] and their handles come back through
//! [`SessionScheduler::on_timer`].
//!
//! ## State Transitions
//!
//! ```text
//! NotStarted --schedule--> Scheduled | StartingSoon
//! Scheduled --tick, <= preroll left--> StartingSoon
//! StartingSoon --tick, 0--> InProgress(0)
//! InProgress(i) --answer | expiry, reveal delay--> BetweenQuestions | Finished
//! BetweenQuestions --tick, 0--> InProgress(i + 1)
//! any --reset--> NotStarted
//! ```
//!
//! At most one timer is armed at a time. Arming always cancels the previous
//! one first, and a fired handle that is no longer armed is ignored.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use super::phase::{Phase, SessionTiming};
use super::timeline::{locate, Position};
use super::timers::{Clock, TimerDriver, TimerHandle};
use crate::events::Event;
use crate::quiz::{Question, QuestionBank};
use crate::storage::{SavedState, StateStore};

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    /// Recurring one-second tick for the active phase.
    Tick,
    /// One-shot delay between locking an answer and advancing.
    Reveal,
}

#[derive(Debug, Clone, Copy)]
struct ArmedTimer {
    handle: TimerHandle,
    kind: TimerKind,
}

pub struct SessionScheduler {
    questions: QuestionBank,
    timing: SessionTiming,
    store: Box<dyn StateStore>,
    timers: Box<dyn TimerDriver>,
    clock: Arc<dyn Clock>,

    phase: Phase,
    current_question_index: usize,
    score: u32,
    time_remaining: u32,
    selected_answer: Option<u32>,
    show_result: bool,
    is_correct: bool,
    scheduled_start: Option<DateTime<Utc>>,
    /// Questions below this index were played before a cold start; they run
    /// their clock but cannot be answered again.
    answered_before: usize,
    armed: Option<ArmedTimer>,
}

impl std::fmt::Debug for SessionScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionScheduler")
            .field("phase", &self.phase)
            .field("current_question_index", &self.current_question_index)
            .field("score", &self.score)
            .field("time_remaining", &self.time_remaining)
            .field("armed", &self.armed)
            .finish_non_exhaustive()
    }
}

impl SessionScheduler {
    /// Create a fresh scheduler in `NotStarted`.
    pub fn new(
        questions: QuestionBank,
        store: Box<dyn StateStore>,
        timers: Box<dyn TimerDriver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let timing = SessionTiming::default();
        Self {
            questions,
            timing,
            store,
            timers,
            clock,
            phase: Phase::NotStarted,
            current_question_index: 0,
            score: 0,
            time_remaining: timing.question_secs,
            selected_answer: None,
            show_result: false,
            is_correct: false,
            scheduled_start: None,
            answered_before: 0,
            armed: None,
        }
    }

    pub fn with_timing(mut self, timing: SessionTiming) -> Self {
        self.timing = timing;
        if self.phase == Phase::NotStarted {
            self.time_remaining = timing.question_secs;
        }
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn questions(&self) -> &QuestionBank {
        &self.questions
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn selected_answer(&self) -> Option<u32> {
        self.selected_answer
    }

    pub fn show_result(&self) -> bool {
        self.show_result
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    pub fn scheduled_start(&self) -> Option<DateTime<Utc>> {
        self.scheduled_start
    }

    pub fn timing(&self) -> &SessionTiming {
        &self.timing
    }

    pub fn has_armed_timer(&self) -> bool {
        self.armed.is_some()
    }

    /// Whether `handle` is the timer currently armed.
    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.armed.is_some_and(|a| a.handle == handle)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            question_index: self.current_question_index,
            total_questions: self.questions.len(),
            time_remaining: self.time_remaining,
            score: self.score,
            selected_answer: self.selected_answer,
            show_result: self.show_result,
            is_correct: self.is_correct,
            scheduled_start: self.scheduled_start,
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Schedule a session to start at `start_time`.
    ///
    /// Any live session is abandoned. Enters `StartingSoon` right away when
    /// the start is within the pre-roll window, `Scheduled` otherwise.
    pub fn schedule_session(&mut self, start_time: DateTime<Utc>) -> Event {
        self.disarm();
        self.scheduled_start = Some(start_time);
        self.current_question_index = 0;
        self.answered_before = 0;
        self.score = 0;
        self.time_remaining = 0;
        self.clear_answer();
        self.persist();

        self.enter_before_start(start_time);
        Event::SessionScheduled {
            start_time,
            at: self.clock.now(),
        }
    }

    /// One second of the active phase.
    ///
    /// Countdowns saturate at zero; reaching zero runs the phase's exit
    /// action and returns the resulting event.
    pub fn tick(&mut self) -> Option<Event> {
        match self.phase {
            Phase::Scheduled { start_time } => {
                let until = self.secs_until(start_time);
                if until <= i64::from(self.timing.preroll_secs) {
                    Some(self.enter_countdown(until))
                } else {
                    None
                }
            }
            Phase::StartingSoon { .. } => {
                self.time_remaining = self.time_remaining.saturating_sub(1);
                self.set_phase(Phase::StartingSoon {
                    countdown: self.time_remaining,
                });
                self.persist();
                if self.time_remaining == 0 {
                    Some(self.start_game())
                } else {
                    None
                }
            }
            Phase::InProgress { .. } if !self.show_result || self.is_replayed() => {
                self.time_remaining = self.time_remaining.saturating_sub(1);
                if self.time_remaining == 0 && self.is_replayed() {
                    Some(self.advance())
                } else if self.time_remaining == 0 {
                    Some(self.expire_question())
                } else {
                    self.persist();
                    None
                }
            }
            Phase::BetweenQuestions { .. } => {
                self.time_remaining = self.time_remaining.saturating_sub(1);
                self.set_phase(Phase::BetweenQuestions {
                    countdown: self.time_remaining,
                });
                if self.time_remaining == 0 {
                    Some(self.start_question(self.current_question_index, self.timing.question_secs))
                } else {
                    self.persist();
                    None
                }
            }
            Phase::InProgress { .. } | Phase::NotStarted | Phase::Finished { .. } => None,
        }
    }

    /// Lock in an answer for the current question.
    ///
    /// Ignored unless a question is live and still unanswered, so duplicate
    /// UI events are harmless.
    pub fn select_answer(&mut self, answer_id: u32) -> Option<Event> {
        if !matches!(self.phase, Phase::InProgress { .. })
            || self.selected_answer.is_some()
            || self.show_result
        {
            debug!(answer_id, phase = self.phase.name(), "ignoring answer");
            return None;
        }
        let question = self.questions.get(self.current_question_index)?;
        let correct_answer = question.answer_id;
        let is_correct = question.is_correct(answer_id);

        self.disarm();
        self.selected_answer = Some(answer_id);
        self.is_correct = is_correct;
        if is_correct {
            self.score += 1;
        }
        self.show_result = true;
        self.persist();
        self.arm(TimerKind::Reveal);

        Some(Event::AnswerRevealed {
            question_index: self.current_question_index,
            selected: Some(answer_id),
            correct_answer,
            is_correct,
            score: self.score,
            at: self.clock.now(),
        })
    }

    /// Cancel every timer, forget the session and clear the store.
    pub fn reset_session(&mut self) -> Event {
        self.timers.cancel_all();
        self.armed = None;
        self.scheduled_start = None;
        self.current_question_index = 0;
        self.answered_before = 0;
        self.score = 0;
        self.time_remaining = self.timing.question_secs;
        self.clear_answer();
        self.set_phase(Phase::NotStarted);
        self.clear_store();
        Event::SessionReset {
            at: self.clock.now(),
        }
    }

    /// Load the saved record, if any, and rebuild the session from it.
    ///
    /// A store that cannot be read counts as having no saved session.
    pub fn restore_from_store(&mut self) -> Option<Event> {
        match self.store.load() {
            Ok(Some(saved)) => Some(self.restore_from_saved_state(saved)),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "failed to load saved session; starting fresh");
                None
            }
        }
    }

    /// Cold-start reconstruction from a saved record.
    ///
    /// The live phase and its countdown are derived from how much wall-clock
    /// time has passed. The score is carried over, and questions the record
    /// marks as played stay locked so none can score twice.
    pub fn restore_from_saved_state(&mut self, saved: SavedState) -> Event {
        self.disarm();
        self.score = saved.score;
        self.scheduled_start = saved.scheduled_time;
        self.current_question_index = 0;
        self.answered_before = 0;
        self.time_remaining = 0;
        self.clear_answer();

        match saved.scheduled_time {
            None => {
                self.score = 0;
                self.time_remaining = self.timing.question_secs;
                self.set_phase(Phase::NotStarted);
                self.clear_store();
            }
            Some(start) if start > self.clock.now() => self.enter_before_start(start),
            Some(start) => {
                self.answered_before = saved.current_question;
                let elapsed = (self.clock.now() - start).num_seconds().max(0) as u64;
                match locate(elapsed, self.questions.len(), &self.timing) {
                    Position::Finished => {
                        self.finish();
                    }
                    Position::Question {
                        index,
                        time_remaining,
                    } => {
                        self.start_question(index, time_remaining);
                    }
                    Position::Break {
                        next_index,
                        countdown,
                    } => {
                        self.current_question_index = next_index;
                        self.start_break(countdown);
                    }
                }
            }
        }

        info!(phase = self.phase.name(), "session restored");
        Event::SessionRestored {
            phase: self.phase,
            at: self.clock.now(),
        }
    }

    /// Deliver a fired timer. Handles that are no longer armed are stale and
    /// ignored.
    pub fn on_timer(&mut self, handle: TimerHandle) -> Option<Event> {
        match self.armed {
            Some(armed) if armed.handle == handle => match armed.kind {
                TimerKind::Tick => self.tick(),
                TimerKind::Reveal => {
                    self.disarm();
                    Some(self.advance())
                }
            },
            _ => {
                trace!(handle = handle.0, "ignoring stale timer");
                None
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn enter_before_start(&mut self, start_time: DateTime<Utc>) {
        let until = self.secs_until(start_time);
        if until <= i64::from(self.timing.preroll_secs) {
            self.enter_countdown(until);
        } else {
            self.set_phase(Phase::Scheduled { start_time });
            self.arm(TimerKind::Tick);
        }
    }

    fn enter_countdown(&mut self, secs: i64) -> Event {
        self.disarm();
        let countdown = secs.max(0) as u32;
        self.time_remaining = countdown;
        self.set_phase(Phase::StartingSoon { countdown });
        self.persist();
        self.arm(TimerKind::Tick);
        Event::CountdownStarted {
            countdown_secs: countdown,
            at: self.clock.now(),
        }
    }

    fn start_game(&mut self) -> Event {
        self.current_question_index = 0;
        self.answered_before = 0;
        self.score = 0;
        self.start_question(0, self.timing.question_secs)
    }

    fn start_question(&mut self, index: usize, time_remaining: u32) -> Event {
        self.disarm();
        self.current_question_index = index;
        self.time_remaining = time_remaining;
        self.clear_answer();
        if self.is_replayed() {
            debug!(question_index = index, "question already played; locked");
            self.show_result = true;
        }
        self.set_phase(Phase::InProgress {
            question_index: index,
        });
        self.persist();
        self.arm(TimerKind::Tick);
        Event::QuestionStarted {
            question_index: index,
            time_remaining,
            at: self.clock.now(),
        }
    }

    fn expire_question(&mut self) -> Event {
        self.disarm();
        self.time_remaining = 0;
        self.show_result = true;
        self.is_correct = false;
        self.persist();
        self.arm(TimerKind::Reveal);
        Event::AnswerRevealed {
            question_index: self.current_question_index,
            selected: None,
            correct_answer: self
                .current_question()
                .map(|q| q.answer_id)
                .unwrap_or_default(),
            is_correct: false,
            score: self.score,
            at: self.clock.now(),
        }
    }

    /// After the reveal delay: a break before the next question, or the end.
    fn advance(&mut self) -> Event {
        if self.current_question_index < self.questions.last_index() {
            self.current_question_index += 1;
            self.start_break(self.timing.break_secs)
        } else {
            self.finish()
        }
    }

    fn start_break(&mut self, countdown: u32) -> Event {
        self.disarm();
        self.time_remaining = countdown;
        self.set_phase(Phase::BetweenQuestions { countdown });
        self.persist();
        self.arm(TimerKind::Tick);
        Event::BreakStarted {
            next_question_index: self.current_question_index,
            countdown_secs: countdown,
            at: self.clock.now(),
        }
    }

    fn finish(&mut self) -> Event {
        self.disarm();
        self.scheduled_start = None;
        self.set_phase(Phase::Finished { score: self.score });
        self.clear_store();
        Event::SessionFinished {
            score: self.score,
            total_questions: self.questions.len(),
            at: self.clock.now(),
        }
    }

    fn is_replayed(&self) -> bool {
        self.current_question_index < self.answered_before
    }

    fn clear_answer(&mut self) {
        self.selected_answer = None;
        self.show_result = false;
        self.is_correct = false;
    }

    fn set_phase(&mut self, phase: Phase) {
        if phase.name() != self.phase.name() {
            debug!(from = self.phase.name(), to = phase.name(), "phase transition");
        }
        self.phase = phase;
    }

    fn secs_until(&self, start_time: DateTime<Utc>) -> i64 {
        (start_time - self.clock.now()).num_seconds()
    }

    fn arm(&mut self, kind: TimerKind) {
        self.disarm();
        let handle = match kind {
            TimerKind::Tick => self.timers.every(TICK),
            TimerKind::Reveal => self
                .timers
                .after(Duration::from_secs(u64::from(self.timing.reveal_secs))),
        };
        self.armed = Some(ArmedTimer { handle, kind });
    }

    fn disarm(&mut self) {
        if let Some(armed) = self.armed.take() {
            self.timers.cancel(armed.handle);
        }
    }

    /// Save the record. `current_question` is the first question not yet
    /// played, so a shown result already points past its question.
    fn persist(&mut self) {
        let played = matches!(self.phase, Phase::InProgress { .. }) && self.show_result;
        let first_unplayed = self.current_question_index + usize::from(played);
        let state = SavedState {
            current_question: first_unplayed.max(self.answered_before),
            time_remaining: self.time_remaining,
            scheduled_time: self.scheduled_start,
            score: self.score,
        };
        if let Err(e) = self.store.save(&state) {
            warn!(error = %e, "failed to persist session state");
        }
    }

    fn clear_store(&mut self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear saved session state");
        }
    }
}
