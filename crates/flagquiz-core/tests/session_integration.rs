//! Integration tests for the session scheduler.
//!
//! Drives whole sessions through the public API with the deterministic
//! timer driver, including cold starts over a SQLite store on disk.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use flagquiz_core::{
    Event, ManualTimers, MemoryStore, Phase, QuestionBank, SavedState, SessionScheduler,
    SqliteStore, StateStore,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 19, 18, 0, 0).unwrap()
}

fn build(store: Box<dyn StateStore>, timers: &ManualTimers) -> SessionScheduler {
    SessionScheduler::new(
        QuestionBank::bundled().unwrap(),
        store,
        Box::new(timers.clone()),
        Arc::new(timers.clone()),
    )
}

/// Step the manual clock `seconds` times, feeding every fired handle back.
fn run(s: &mut SessionScheduler, timers: &ManualTimers, seconds: u32) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..seconds {
        for handle in timers.step() {
            events.extend(s.on_timer(handle));
        }
    }
    events
}

fn correct_answer(s: &SessionScheduler) -> u32 {
    s.current_question().unwrap().answer_id
}

fn wrong_answer(s: &SessionScheduler) -> u32 {
    let q = s.current_question().unwrap();
    q.countries.iter().find(|c| c.id != q.answer_id).unwrap().id
}

#[test]
fn test_full_session_all_correct() {
    let timers = ManualTimers::new(t0());
    let store = MemoryStore::new();
    let mut s = build(Box::new(store.clone()), &timers);

    s.schedule_session(t0() + Duration::seconds(5));
    run(&mut s, &timers, 5);
    assert_eq!(s.phase(), Phase::InProgress { question_index: 0 });

    let total = s.total_questions();
    for index in 0..total {
        assert_eq!(s.current_question_index(), index);
        let revealed = s.select_answer(correct_answer(&s)).unwrap();
        assert!(matches!(revealed, Event::AnswerRevealed { is_correct: true, .. }));

        let events = run(&mut s, &timers, 2);
        if index + 1 < total {
            assert!(matches!(
                events[..],
                [Event::BreakStarted { countdown_secs: 10, .. }]
            ));
            let events = run(&mut s, &timers, 10);
            assert!(matches!(
                events[..],
                [Event::QuestionStarted { time_remaining: 30, .. }]
            ));
        } else {
            assert!(matches!(
                events[..],
                [Event::SessionFinished { score: 15, total_questions: 15, .. }]
            ));
        }
    }

    assert_eq!(s.phase(), Phase::Finished { score: 15 });
    assert!(!s.has_armed_timer());
    assert_eq!(timers.armed_count(), 0);
    assert!(store.peek().is_none());
}

#[test]
fn test_wrong_answer_mid_question_then_break() {
    let timers = ManualTimers::new(t0());
    let mut s = build(Box::new(MemoryStore::new()), &timers);
    s.schedule_session(t0() + Duration::seconds(5));
    run(&mut s, &timers, 5);

    run(&mut s, &timers, 10);
    assert_eq!(s.time_remaining(), 20);

    let event = s.select_answer(wrong_answer(&s)).unwrap();
    assert!(matches!(event, Event::AnswerRevealed { is_correct: false, score: 0, .. }));
    assert!(!s.is_correct());
    assert_eq!(s.score(), 0);

    assert!(run(&mut s, &timers, 1).is_empty());
    run(&mut s, &timers, 1);
    assert_eq!(s.phase(), Phase::BetweenQuestions { countdown: 10 });
    assert_eq!(s.current_question_index(), 1);
}

#[test]
fn test_unanswered_questions_expire_through_the_whole_session() {
    let timers = ManualTimers::new(t0());
    let mut s = build(Box::new(MemoryStore::new()), &timers);
    s.schedule_session(t0() + Duration::seconds(1));

    // Countdown, then 15 x (30 question + 2 reveal) plus 14 x 10 break.
    let events = run(&mut s, &timers, 1 + 15 * 32 + 14 * 10);
    let expired = events
        .iter()
        .filter(|e| matches!(e, Event::AnswerRevealed { selected: None, .. }))
        .count();
    assert_eq!(expired, 15);
    assert!(matches!(events.last(), Some(Event::SessionFinished { score: 0, .. })));
    assert_eq!(s.phase(), Phase::Finished { score: 0 });
}

#[test]
fn test_restart_mid_question_resumes_from_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flagquiz.db");
    let start = t0() + Duration::seconds(5);

    {
        let timers = ManualTimers::new(t0());
        let mut s = build(Box::new(SqliteStore::open_at(&path).unwrap()), &timers);
        s.schedule_session(start);
        run(&mut s, &timers, 5);
        s.select_answer(correct_answer(&s)).unwrap();
        assert_eq!(s.score(), 1);
    }

    // The process comes back 45 seconds into the game: inside question 1.
    let timers = ManualTimers::new(start + Duration::seconds(45));
    let mut s = build(Box::new(SqliteStore::open_at(&path).unwrap()), &timers);
    let event = s.restore_from_store().unwrap();
    assert!(matches!(
        event,
        Event::SessionRestored { phase: Phase::InProgress { question_index: 1 }, .. }
    ));
    assert_eq!(s.time_remaining(), 25);
    assert_eq!(s.score(), 1);
    assert_eq!(s.scheduled_start(), Some(start));

    let saved = SqliteStore::open_at(&path).unwrap().load().unwrap().unwrap();
    assert_eq!(
        saved,
        SavedState {
            current_question: 1,
            time_remaining: 25,
            scheduled_time: Some(start),
            score: 1,
        }
    );
}

#[test]
fn test_restart_during_break_finishes_the_break() {
    let start = t0();
    let store = MemoryStore::with_state(SavedState {
        current_question: 0,
        time_remaining: 12,
        scheduled_time: Some(start),
        score: 0,
    });
    let timers = ManualTimers::new(start + Duration::seconds(35));
    let mut s = build(Box::new(store), &timers);

    s.restore_from_store().unwrap();
    assert_eq!(s.phase(), Phase::BetweenQuestions { countdown: 5 });
    assert_eq!(s.current_question_index(), 1);

    let events = run(&mut s, &timers, 5);
    assert!(matches!(
        events[..],
        [Event::QuestionStarted { question_index: 1, time_remaining: 30, .. }]
    ));
}

#[test]
fn test_restart_long_after_the_game_finishes_it() {
    let store = MemoryStore::with_state(SavedState {
        current_question: 6,
        time_remaining: 3,
        scheduled_time: Some(t0() - Duration::seconds(1000)),
        score: 4,
    });
    let timers = ManualTimers::new(t0());
    let mut s = build(Box::new(store.clone()), &timers);

    s.restore_from_store().unwrap();
    assert_eq!(s.phase(), Phase::Finished { score: 4 });
    assert!(!s.has_armed_timer());
    assert!(store.peek().is_none());
}

#[test]
fn test_restart_before_start_keeps_waiting() {
    let start = t0() + Duration::seconds(300);
    let store = MemoryStore::with_state(SavedState {
        current_question: 0,
        time_remaining: 0,
        scheduled_time: Some(start),
        score: 0,
    });
    let timers = ManualTimers::new(t0());
    let mut s = build(Box::new(store), &timers);

    s.restore_from_store().unwrap();
    assert_eq!(s.phase(), Phase::Scheduled { start_time: start });

    run(&mut s, &timers, 280);
    assert_eq!(s.phase(), Phase::StartingSoon { countdown: 20 });
    run(&mut s, &timers, 20);
    assert_eq!(s.phase(), Phase::InProgress { question_index: 0 });
}

#[test]
fn test_reset_from_every_phase_silences_timers() {
    // Seconds after scheduling at +25: Scheduled, StartingSoon, InProgress,
    // reveal window, BetweenQuestions.
    for offset in [0, 10, 30, 55, 60] {
        let timers = ManualTimers::new(t0());
        let store = MemoryStore::new();
        let mut s = build(Box::new(store.clone()), &timers);
        s.schedule_session(t0() + Duration::seconds(25));
        run(&mut s, &timers, offset);

        let event = s.reset_session();
        assert!(matches!(event, Event::SessionReset { .. }));
        assert_eq!(s.phase(), Phase::NotStarted, "offset {offset}");
        assert_eq!(timers.armed_count(), 0, "offset {offset}");
        assert!(store.peek().is_none());
        assert!(run(&mut s, &timers, 60).is_empty());
    }
}

#[test]
fn test_persistence_outage_does_not_stop_play() {
    let timers = ManualTimers::new(t0());
    let store = MemoryStore::new();
    store.set_failing(true);
    let mut s = build(Box::new(store.clone()), &timers);

    s.schedule_session(t0() + Duration::seconds(2));
    run(&mut s, &timers, 2);
    s.select_answer(correct_answer(&s)).unwrap();
    run(&mut s, &timers, 12);

    assert_eq!(s.phase(), Phase::InProgress { question_index: 1 });
    assert_eq!(s.score(), 1);
    assert!(store.peek().is_none());
}

#[test]
fn test_restart_after_answering_ahead_of_the_clock_never_rescores() {
    let start = t0() + Duration::seconds(5);
    let store = MemoryStore::new();

    let timers = ManualTimers::new(t0());
    let mut s = build(Box::new(store.clone()), &timers);
    s.schedule_session(start);
    run(&mut s, &timers, 5);

    // Answer at once: 2s reveal + 10s break per question instead of 40s.
    for _ in 0..10 {
        s.select_answer(correct_answer(&s)).unwrap();
        run(&mut s, &timers, 12);
    }
    assert_eq!(s.current_question_index(), 10);
    assert_eq!(s.score(), 10);
    drop(s);

    // 120s after the start the wall clock says question 3.
    let timers = ManualTimers::new(start + Duration::seconds(120));
    let mut s = build(Box::new(store.clone()), &timers);
    s.restore_from_store().unwrap();
    assert_eq!(s.phase(), Phase::InProgress { question_index: 3 });
    assert_eq!(s.score(), 10);
    assert!(s.select_answer(correct_answer(&s)).is_none());

    let mut revealed = Vec::new();
    for _ in 0..1000 {
        if matches!(s.phase(), Phase::Finished { .. }) {
            break;
        }
        if matches!(s.phase(), Phase::InProgress { .. }) && !s.show_result() {
            revealed.extend(s.select_answer(correct_answer(&s)));
        }
        run(&mut s, &timers, 1);
    }

    let answered: Vec<usize> = revealed
        .iter()
        .filter_map(|e| match e {
            Event::AnswerRevealed { question_index, .. } => Some(*question_index),
            _ => None,
        })
        .collect();
    assert_eq!(answered, vec![10, 11, 12, 13, 14]);
    assert_eq!(s.phase(), Phase::Finished { score: 15 });
}
