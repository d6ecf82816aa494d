mod phase;
mod runtime;
mod scheduler;
mod timeline;
mod timers;

pub use phase::{Phase, SessionTiming};
pub use runtime::{SessionRuntime, TokioTimers};
pub use scheduler::SessionScheduler;
pub use timeline::{locate, Position};
pub use timers::{Clock, ManualTimers, SystemClock, TimerDriver, TimerHandle};
