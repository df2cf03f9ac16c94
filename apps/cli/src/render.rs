use chrono::NaiveDate;
use colored::{ColoredString, Colorize};
use tasklane_client::Theme;
use tasklane_focus::{format_remaining, FocusPhase, FocusSnapshot};
use tasklane_tasks::{view::is_overdue, Task, TaskPriority, TaskStatus};

/// Colours for the terminal, chosen per theme.
pub struct Palette {
    theme: Theme,
}

impl Palette {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    fn status(&self, status: TaskStatus) -> ColoredString {
        let label = status.as_str();
        match (status, self.theme) {
            (TaskStatus::Completed, Theme::Dark) => label.bright_green(),
            (TaskStatus::Completed, Theme::Light) => label.green(),
            (TaskStatus::InProgress, Theme::Dark) => label.bright_yellow(),
            (TaskStatus::InProgress, Theme::Light) => label.yellow(),
            (TaskStatus::Pending, Theme::Dark) => label.bright_white(),
            (TaskStatus::Pending, Theme::Light) => label.normal(),
        }
    }

    fn priority(&self, priority: TaskPriority) -> ColoredString {
        let label = format!("{:<6}", priority.as_str());
        match priority {
            TaskPriority::High => label.red(),
            TaskPriority::Medium => label.normal(),
            TaskPriority::Low => label.dimmed(),
        }
    }

    fn warning(&self, text: &str) -> ColoredString {
        match self.theme {
            Theme::Dark => text.bright_red().bold(),
            Theme::Light => text.red().bold(),
        }
    }
}

pub fn task_line(task: &Task, today: NaiveDate, palette: &Palette) -> String {
    let mut line = format!(
        "{}  [{}] {} {}",
        task.id,
        palette.status(task.status),
        palette.priority(task.priority),
        task.title
    );

    if let Some(due) = task.due_date {
        line.push_str(&format!("  due {due}"));
    }
    if is_overdue(task, today) {
        line.push_str(&format!("  {}", palette.warning("OVERDUE")));
    }
    if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
        line.push_str(&format!("\n    {description}"));
    }

    line
}

pub fn focus_line(title: &str, snapshot: &FocusSnapshot) -> String {
    let state = match snapshot.phase {
        FocusPhase::Idle => "idle",
        FocusPhase::Paused => "paused",
        FocusPhase::Running => "running",
        FocusPhase::Completed => "done",
    };
    format!(
        "{title}  {}  ({state})",
        format_remaining(snapshot.remaining)
    )
}
