use crate::FocusError;

/// Default length of a focus session: 25 minutes.
pub const DEFAULT_FOCUS_SECONDS: u32 = 25 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPhase {
    Idle,
    Paused,
    Running,
    Completed,
}

impl FocusPhase {
    pub fn is_focused(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// The task being focused on and how far the countdown has progressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusSession {
    pub task_id: String,
    pub remaining: u32,
    pub running: bool,
}

/// Point-in-time view of a timer, suitable for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusSnapshot {
    pub phase: FocusPhase,
    pub task_id: Option<String>,
    pub remaining: u32,
    pub duration: u32,
}

/// Countdown state machine. It holds no clock; callers deliver one
/// [`tick`](Self::tick) per elapsed second.
///
/// Remaining time always stays within `0..=duration`.
#[derive(Debug, Clone)]
pub struct FocusTimer {
    duration: u32,
    phase: FocusPhase,
    task_id: Option<String>,
    remaining: u32,
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusTimer {
    pub fn new() -> Self {
        Self::with_duration(DEFAULT_FOCUS_SECONDS)
    }

    /// A timer counting down from `seconds` (at least one).
    pub fn with_duration(seconds: u32) -> Self {
        Self {
            duration: seconds.max(1),
            phase: FocusPhase::Idle,
            task_id: None,
            remaining: 0,
        }
    }

    pub fn phase(&self) -> FocusPhase {
        self.phase
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.phase == FocusPhase::Running
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn session(&self) -> Option<FocusSession> {
        self.task_id.as_ref().map(|task_id| FocusSession {
            task_id: task_id.clone(),
            remaining: self.remaining,
            running: self.is_running(),
        })
    }

    pub fn snapshot(&self) -> FocusSnapshot {
        FocusSnapshot {
            phase: self.phase,
            task_id: self.task_id.clone(),
            remaining: self.remaining,
            duration: self.duration,
        }
    }

    pub fn enter_focus(&mut self, task_id: impl Into<String>) -> Result<(), FocusError> {
        if self.phase.is_focused() {
            return Err(FocusError::AlreadyFocused);
        }

        self.task_id = Some(task_id.into());
        self.remaining = self.duration;
        self.phase = FocusPhase::Paused;
        Ok(())
    }

    /// Start or pause the countdown; returns the new phase.
    pub fn toggle(&mut self) -> Result<FocusPhase, FocusError> {
        self.phase = match self.phase {
            FocusPhase::Idle => return Err(FocusError::NotFocused),
            FocusPhase::Completed => return Err(FocusError::AlreadyCompleted),
            FocusPhase::Paused => FocusPhase::Running,
            FocusPhase::Running => FocusPhase::Paused,
        };
        Ok(self.phase)
    }

    /// Consume one second. Only valid while running.
    pub fn tick(&mut self) -> Result<FocusPhase, FocusError> {
        if self.phase != FocusPhase::Running {
            return Err(FocusError::NotRunning);
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.phase = FocusPhase::Completed;
        }
        Ok(self.phase)
    }

    pub fn reset(&mut self) -> Result<(), FocusError> {
        if !self.phase.is_focused() {
            return Err(FocusError::NotFocused);
        }

        self.remaining = self.duration;
        self.phase = FocusPhase::Paused;
        Ok(())
    }

    /// Leave focus mode, returning the abandoned session if there was one.
    pub fn exit(&mut self) -> Option<FocusSession> {
        let session = self.session();
        self.task_id = None;
        self.remaining = 0;
        self.phase = FocusPhase::Idle;
        session
    }
}
