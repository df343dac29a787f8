//! Submission lifecycle as shown to the user.
//!
//! The service answers a generation with a single blocking response, so the
//! intermediate stages are a client-side narrative: the submission starts at
//! [`Stage::Script`] and may be advanced on a timer, but only the response
//! decides between [`ProgressState::Complete`] and [`ProgressState::Error`].
//! All transitions go through [`ProgressState::apply`]; per-step display
//! status is derived from the state and never stored.

use crate::result::GenerationResult;

/// Shown when a failure carries no message of its own.
pub const FALLBACK_ERROR_MESSAGE: &str = "Failed to generate video. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Script,
    Audio,
    Video,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Script, Stage::Audio, Stage::Video];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Script => "generating-script",
            Self::Audio => "generating-audio",
            Self::Video => "assembling-video",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Script => "Generating script",
            Self::Audio => "Generating audio",
            Self::Video => "Assembling video",
        }
    }

    pub fn next(&self) -> Option<Stage> {
        match self {
            Self::Script => Some(Self::Audio),
            Self::Audio => Some(Self::Video),
            Self::Video => None,
        }
    }

    fn ordinal(&self) -> u64 {
        match self {
            Self::Script => 1,
            Self::Audio => 2,
            Self::Video => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ProgressState {
    #[default]
    Idle,
    InProgress(Stage),
    Complete(GenerationResult),
    Error { message: String, reached: Stage },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Submitted,
    /// Elapsed-time hint that a later stage is probably running
    Advanced(Stage),
    Succeeded(GenerationResult),
    Failed(String),
    Cleared,
}

impl ProgressState {
    /// Returns the state after `event`. Events that make no sense in the
    /// current state leave it unchanged.
    pub fn apply(self, event: ProgressEvent) -> ProgressState {
        match (self, event) {
            (state, ProgressEvent::Submitted) if state.is_busy() => state,
            (_, ProgressEvent::Submitted) => Self::InProgress(Stage::Script),
            (Self::InProgress(current), ProgressEvent::Advanced(next)) if next > current => {
                Self::InProgress(next)
            }
            (Self::InProgress(_), ProgressEvent::Succeeded(result)) => Self::Complete(result),
            (Self::InProgress(reached), ProgressEvent::Failed(message)) => {
                let message = if message.trim().is_empty() {
                    FALLBACK_ERROR_MESSAGE.to_string()
                } else {
                    message
                };
                Self::Error { message, reached }
            }
            (state, ProgressEvent::Cleared) if !state.is_busy() => Self::Idle,
            (state, _) => state,
        }
    }

    /// A request is outstanding; submission controls stay disabled.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::InProgress(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Error { .. })
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::InProgress(stage) => stage.key(),
            Self::Complete(_) => "complete",
            Self::Error { .. } => "error",
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::InProgress(_) => "Creating your video...",
            Self::Complete(_) => "Video created successfully!",
            Self::Error { .. } => "An error occurred",
        }
    }

    /// Progress-bar position out of [`ProgressState::LENGTH`]
    pub fn position(&self) -> u64 {
        match self {
            Self::Idle => 0,
            Self::InProgress(stage) => stage.ordinal(),
            Self::Complete(_) => Self::LENGTH,
            Self::Error { reached, .. } => reached.ordinal(),
        }
    }

    pub const LENGTH: u64 = 4;

    pub fn result(&self) -> Option<&GenerationResult> {
        match self {
            Self::Complete(result) => Some(result),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Current,
    Complete,
    Error,
}

impl StepStatus {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Pending => "○",
            Self::Current => "◌",
            Self::Complete => "✅",
            Self::Error => "❌",
        }
    }
}

/// Display status of one step, derived from the global state alone.
pub fn step_status(state: &ProgressState, step: Stage) -> StepStatus {
    match state {
        ProgressState::Idle => StepStatus::Pending,
        ProgressState::Complete(_) => StepStatus::Complete,
        ProgressState::InProgress(current) => relative(step, *current, StepStatus::Current),
        ProgressState::Error { reached, .. } => relative(step, *reached, StepStatus::Error),
    }
}

fn relative(step: Stage, pivot: Stage, at_pivot: StepStatus) -> StepStatus {
    if step < pivot {
        StepStatus::Complete
    } else if step == pivot {
        at_pivot
    } else {
        StepStatus::Pending
    }
}

pub fn step_board(state: &ProgressState, steps: &[Stage]) -> Vec<(Stage, StepStatus)> {
    steps.iter().map(|step| (*step, step_status(state, *step))).collect()
}
