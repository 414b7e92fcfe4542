// Timer module - countdown state machine and its tick loop

pub mod clock;
pub mod engine;
pub mod session;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use engine::{CountdownEngine, POLL_SLICE, SHUTDOWN_TIMEOUT, SessionTones};
pub use session::{AtomicPhase, Phase, Session};

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CountdownError {
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Cannot {command} while {phase:?}")]
    InvalidCommand { command: &'static str, phase: Phase },

    #[error("Command queue full, {0} dropped")]
    CommandQueueFull(&'static str),

    #[error("Tick loop did not stop within {0:?}")]
    EngineShutdownTimeout(Duration),

    #[error("Failed to spawn tick loop: {0}")]
    Spawn(String),
}

pub type CountdownResult<T> = Result<T, CountdownError>;
