//! Live terminal session.
//!
//! Events are printed to stdout as JSON lines. Answers are read from stdin,
//! one choice id per line; the current question is echoed to stderr.

use std::sync::Arc;

use flagquiz_core::{Event, Phase, QuestionBank, SessionRuntime, SystemClock};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use super::{load_setup, report, start_after, SessionSetup};

pub fn run(start_in: Option<i64>, ticks: bool) -> Result<(), Box<dyn std::error::Error>> {
    let SessionSetup {
        questions,
        timing,
        store,
    } = load_setup().map_err(report)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async move {
        let session = SessionRuntime::spawn(
            questions.clone(),
            Box::new(store),
            Arc::new(SystemClock),
            timing,
        );
        let result = play(&session, &questions, start_in, ticks).await;
        session.shutdown().await;
        result
    })
}

async fn play(
    session: &SessionRuntime,
    questions: &QuestionBank,
    start_in: Option<i64>,
    ticks: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut events = session.subscribe();

    match start_in {
        Some(secs) => {
            session.schedule(start_after(secs)?).await?;
        }
        None => match session.restore().await? {
            None => {
                return Err("no saved session; pass --in <SECS> or run `flagquiz session schedule`".into())
            }
            Some(event @ Event::SessionRestored { phase: Phase::NotStarted | Phase::Finished { .. }, .. }) => {
                print_line(&event)?;
                return Ok(());
            }
            Some(_) => {}
        },
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    if matches!(event, Event::StateSnapshot { .. }) && !ticks {
                        continue;
                    }
                    print_line(&event)?;
                    match &event {
                        Event::QuestionStarted { question_index, .. } => {
                            prompt(questions, *question_index);
                        }
                        Event::SessionRestored { phase: Phase::InProgress { question_index }, .. } => {
                            prompt(questions, *question_index);
                        }
                        Event::SessionFinished { .. } => break,
                        _ => {}
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match line.parse::<u32>() {
                        Ok(answer_id) => {
                            if session.select_answer(answer_id).await?.is_none() {
                                debug!(answer_id, "answer not accepted");
                            }
                        }
                        Err(_) => eprintln!("not a choice id: {line}"),
                    }
                }
                None => stdin_open = false,
            },
        }
    }
    Ok(())
}

fn print_line(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

fn prompt(questions: &QuestionBank, index: usize) {
    let Some(question) = questions.get(index) else {
        return;
    };
    eprintln!(
        "Question {}/{}: which country's flag is {}?",
        index + 1,
        questions.len(),
        question.country_code
    );
    for country in &question.countries {
        eprintln!("  {:>4}  {}", country.id, country.country_name);
    }
}
