use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{ArgGroup, Subcommand};
use flagquiz_core::{Event, ManualTimers, SessionScheduler};

use super::{load_setup, report, start_after, SessionSetup};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Rebuild the saved session at the current time and print it as JSON
    Status,
    /// Schedule a new session, replacing any saved one
    #[command(group(ArgGroup::new("start").required(true).args(["start_in", "at"])))]
    Schedule {
        /// Start this many seconds from now
        #[arg(long = "in", value_name = "SECS")]
        start_in: Option<i64>,
        /// Start at an RFC 3339 instant (e.g. 2025-07-19T18:00:00Z)
        #[arg(long, value_name = "TIME")]
        at: Option<DateTime<Utc>>,
    },
    /// Forget the saved session
    Reset,
}

/// Scheduler over the saved session, restored as of now.
///
/// One-shot commands never let time pass, so a manual clock pinned at the
/// current instant serves as both clock and timer driver.
fn load_scheduler() -> Result<SessionScheduler, Box<dyn std::error::Error>> {
    let SessionSetup {
        questions,
        timing,
        store,
    } = load_setup().map_err(report)?;
    let timers = ManualTimers::new(Utc::now());

    let mut scheduler = SessionScheduler::new(
        questions,
        Box::new(store),
        Box::new(timers.clone()),
        Arc::new(timers),
    )
    .with_timing(timing);
    scheduler.restore_from_store();
    Ok(scheduler)
}

fn print(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut scheduler = load_scheduler()?;

    match action {
        SessionAction::Status => {
            print(&scheduler.snapshot())?;
        }
        SessionAction::Schedule { start_in, at } => {
            let start_time = match (start_in, at) {
                (_, Some(at)) => at,
                (Some(secs), None) => start_after(secs)?,
                (None, None) => return Err("either --in or --at is required".into()),
            };
            scheduler.schedule_session(start_time);
            print(&scheduler.snapshot())?;
        }
        SessionAction::Reset => {
            print(&scheduler.reset_session())?;
        }
    }
    Ok(())
}
