//! Per-user task storage.
//!
//! Every operation takes the [`UserIdentity`](tasklane_auth::UserIdentity)
//! resolved by the session guard. A task owned by someone else is reported
//! exactly like a task that does not exist.

use thiserror::Error;

mod model;
mod store;
pub mod view;

pub use model::{NewTask, Task, TaskPatch, TaskPriority, TaskStatus};
pub use store::TaskStore;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("task not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored task is unreadable: {0}")]
    Corrupt(String),
}
