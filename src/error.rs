//! # Error Types
//!
//! Structured error handling for the lesson runner using thiserror. Every
//! fatal error carries enough step context for the caller to report the
//! offending `step_id` and a readable message.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Structural contract violation in a lesson document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Offending field name (`lesson_id`, `steps`, `command`, ...)
    pub field: String,
    /// Index of the offending step, `None` for lesson-level violations
    pub step_index: Option<usize>,
    pub detail: String,
}

impl ValidationError {
    pub fn lesson(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            step_index: None,
            detail: detail.into(),
        }
    }

    pub fn step(index: usize, field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            step_index: Some(index),
            detail: detail.into(),
        }
    }

    /// Path-like location such as `steps[2].command`
    pub fn location(&self) -> String {
        match self.step_index {
            Some(index) if self.field.is_empty() => format!("steps[{index}]"),
            Some(index) => format!("steps[{index}].{}", self.field),
            None if self.field.is_empty() => "lesson".to_string(),
            None => self.field.clone(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation error at {}: {}", self.location(), self.detail)
    }
}

impl std::error::Error for ValidationError {}

/// Failure raised by a command handler
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HandlerError {
    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument { argument: String, reason: String },

    #[error("Host invocation of operator '{operator}' failed: {reason}")]
    HostInvocation { operator: String, reason: String },

    #[error("Handler failed: {0}")]
    Failed(String),
}

impl HandlerError {
    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by a lesson run
#[derive(Error, Debug)]
pub enum LessonError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Command not allowed: {command} (step {step_id})")]
    Dispatch {
        command: String,
        step_id: String,
        step_index: usize,
    },

    #[error("Step {step_id} ({command}) failed: {source}")]
    Handler {
        step_id: String,
        step_index: usize,
        command: String,
        #[source]
        source: HandlerError,
    },

    #[error("Lesson document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read lesson file {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LessonError {
    /// Step identifier attached to dispatch and handler failures
    pub fn step_id(&self) -> Option<&str> {
        match self {
            Self::Dispatch { step_id, .. } | Self::Handler { step_id, .. } => Some(step_id),
            _ => None,
        }
    }

    /// Index of the step the run stopped at, when one is known
    pub fn step_index(&self) -> Option<usize> {
        match self {
            Self::Dispatch { step_index, .. } | Self::Handler { step_index, .. } => {
                Some(*step_index)
            }
            Self::Validation(err) => err.step_index,
            _ => None,
        }
    }
}

/// Errors raised while handing a request to the announcement worker
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnouncementError {
    #[error("Failed to spawn announcement worker: {0}")]
    WorkerSpawn(String),

    #[error("Announcement queue is closed")]
    QueueClosed,
}

/// Playback failure reported by a speech engine; never leaves the worker
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    #[error("Speech engine '{engine}' is unavailable: {reason}")]
    Unavailable { engine: String, reason: String },

    #[error("Speech engine '{engine}' failed: {reason}")]
    PlaybackFailed { engine: String, reason: String },

    #[error("Speech engine '{engine}' timed out after {timeout_ms}ms")]
    TimedOut { engine: String, timeout_ms: u64 },
}

/// Explicit configuration loading failures
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

pub type Result<T> = std::result::Result<T, LessonError>;
