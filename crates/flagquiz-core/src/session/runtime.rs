//! Live session runtime.
//!
//! One tokio task owns the [`SessionScheduler`]. Player commands and fired
//! timers both arrive as messages into that task's `select!` loop, so every
//! transition runs serialized and no lock guards the session state.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use super::phase::SessionTiming;
use super::scheduler::SessionScheduler;
use super::timers::{Clock, TimerDriver, TimerHandle};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::quiz::QuestionBank;
use crate::storage::StateStore;

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 128;

/// Timer driver backed by tokio tasks.
///
/// Each armed timer is a spawned task that sends its handle on the fired
/// channel; cancelling aborts the task. Must be used inside a tokio runtime.
pub struct TokioTimers {
    fired: mpsc::UnboundedSender<TimerHandle>,
    tasks: HashMap<TimerHandle, JoinHandle<()>>,
    next_id: u64,
}

impl TokioTimers {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerHandle>) {
        let (fired, rx) = mpsc::unbounded_channel();
        let timers = Self {
            fired,
            tasks: HashMap::new(),
            next_id: 1,
        };
        (timers, rx)
    }

    fn next_handle(&mut self) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        handle
    }
}

impl TimerDriver for TokioTimers {
    fn after(&mut self, delay: Duration) -> TimerHandle {
        let handle = self.next_handle();
        let tx = self.fired.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(handle);
        });
        self.tasks.insert(handle, task);
        handle
    }

    fn every(&mut self, interval: Duration) -> TimerHandle {
        let handle = self.next_handle();
        let tx = self.fired.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(handle).is_err() {
                    break;
                }
            }
        });
        self.tasks.insert(handle, task);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
        }
    }

    fn cancel_all(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

enum Command {
    Restore(oneshot::Sender<Option<Event>>),
    Schedule(DateTime<Utc>, oneshot::Sender<Event>),
    SelectAnswer(u32, oneshot::Sender<Option<Event>>),
    Reset(oneshot::Sender<Event>),
    Snapshot(oneshot::Sender<Event>),
}

/// Handle to a running session task.
///
/// Dropping the handle stops the task and cancels its timers.
pub struct SessionRuntime {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<Event>,
    task: JoinHandle<()>,
}

impl SessionRuntime {
    /// Spawn the session task on the current tokio runtime.
    pub fn spawn(
        questions: QuestionBank,
        store: Box<dyn StateStore>,
        clock: Arc<dyn Clock>,
        timing: SessionTiming,
    ) -> Self {
        let (timers, fired) = TokioTimers::new();
        let scheduler =
            SessionScheduler::new(questions, store, Box::new(timers), clock).with_timing(timing);

        let (commands, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let task = tokio::spawn(run(scheduler, command_rx, fired, events.clone()));

        Self {
            commands,
            events,
            task,
        }
    }

    /// Receive every event the session publishes from now on, including a
    /// snapshot after each countdown tick.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub async fn restore(&self) -> Result<Option<Event>> {
        self.request(Command::Restore).await
    }

    pub async fn schedule(&self, start_time: DateTime<Utc>) -> Result<Event> {
        self.request(|reply| Command::Schedule(start_time, reply)).await
    }

    pub async fn select_answer(&self, answer_id: u32) -> Result<Option<Event>> {
        self.request(|reply| Command::SelectAnswer(answer_id, reply))
            .await
    }

    pub async fn reset(&self) -> Result<Event> {
        self.request(Command::Reset).await
    }

    pub async fn snapshot(&self) -> Result<Event> {
        self.request(Command::Snapshot).await
    }

    /// Stop the session task and wait for it to exit.
    pub async fn shutdown(self) {
        let Self { commands, task, .. } = self;
        drop(commands);
        let _ = task.await;
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| CoreError::RuntimeStopped)?;
        rx.await.map_err(|_| CoreError::RuntimeStopped)
    }
}

async fn run(
    mut scheduler: SessionScheduler,
    mut commands: mpsc::Receiver<Command>,
    mut fired: mpsc::UnboundedReceiver<TimerHandle>,
    events: broadcast::Sender<Event>,
) {
    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                handle_command(&mut scheduler, command, &events);
            }
            Some(handle) = fired.recv() => {
                let live = scheduler.is_armed(handle);
                match scheduler.on_timer(handle) {
                    Some(event) => {
                        let _ = events.send(event);
                    }
                    None if live => {
                        let _ = events.send(scheduler.snapshot());
                    }
                    None => {}
                }
            }
        }
    }
    debug!("session runtime stopped");
}

fn handle_command(
    scheduler: &mut SessionScheduler,
    command: Command,
    events: &broadcast::Sender<Event>,
) {
    let publish = |event: &Event| {
        let _ = events.send(event.clone());
    };
    match command {
        Command::Restore(reply) => {
            let event = scheduler.restore_from_store();
            if let Some(event) = &event {
                publish(event);
            }
            let _ = reply.send(event);
        }
        Command::Schedule(start_time, reply) => {
            let event = scheduler.schedule_session(start_time);
            publish(&event);
            let _ = reply.send(event);
        }
        Command::SelectAnswer(answer_id, reply) => {
            let event = scheduler.select_answer(answer_id);
            if let Some(event) = &event {
                publish(event);
            }
            let _ = reply.send(event);
        }
        Command::Reset(reply) => {
            let event = scheduler.reset_session();
            publish(&event);
            let _ = reply.send(event);
        }
        Command::Snapshot(reply) => {
            let _ = reply.send(scheduler.snapshot());
        }
    }
}
