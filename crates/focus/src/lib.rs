//! Focus mode: a countdown bound to a single task.

use thiserror::Error;

mod controller;
mod timer;

pub use controller::{format_remaining, FocusController};
pub use timer::{FocusPhase, FocusSession, FocusSnapshot, FocusTimer, DEFAULT_FOCUS_SECONDS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FocusError {
    #[error("already focusing on a task")]
    AlreadyFocused,
    #[error("not in focus mode")]
    NotFocused,
    #[error("focus session already completed")]
    AlreadyCompleted,
    #[error("timer is not running")]
    NotRunning,
}
