//! Presentation rules shared by clients rendering a task list.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::{Task, TaskStatus};

/// A task is overdue when its due date lies strictly before `today` and it
/// has not been completed. Undated tasks are never overdue.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    match task.due_date {
        Some(due) => due < today && task.status != TaskStatus::Completed,
        None => false,
    }
}

/// Dated tasks first in ascending due-date order, undated tasks last.
/// Stable, so ties keep their incoming order.
pub fn sort_for_display(tasks: &mut [Task]) {
    tasks.sort_by_key(|task| (task.due_date.is_none(), task.due_date));
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TaskStatus),
}

impl StatusFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => task.status == status,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(status) => status.fmt(f),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == "all" {
            return Ok(Self::All);
        }
        value.parse().map(Self::Only)
    }
}

/// Filter then sort, the order a dashboard renders in.
pub fn prepare_for_display(tasks: Vec<Task>, filter: StatusFilter) -> Vec<Task> {
    let mut visible: Vec<Task> = tasks.into_iter().filter(|task| filter.matches(task)).collect();
    sort_for_display(&mut visible);
    visible
}
