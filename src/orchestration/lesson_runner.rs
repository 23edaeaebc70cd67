//! # Lesson Runner
//!
//! The step dispatcher. Validates a lesson once, then visits its steps strictly
//! in order, resolving each command and invoking its handler synchronously.
//!
//! ## State machine
//!
//! ```text
//! NotStarted ─► Validating ─┬─► Executing(0) ─► ... ─► Executing(n-1) ─► Completed
//!                           │          │
//!                           └──────────┴──────────────────────────────► Failed
//! ```
//!
//! The run is fail-fast: the first validation, dispatch or handler error
//! moves to `Failed` and no later step executes. Side effects of earlier
//! steps (a queued announcement, a forwarded operator) are not undone.

use super::builtin_handlers::BuiltinHandlers;
use super::host::HostCapabilities;
use crate::constants::commands;
use crate::error::{LessonError, Result};
use crate::logging::{log_error, log_step_operation};
use crate::models::{HandlerResult, LessonDefinition, Step};
use crate::registry::{CommandHandler, CommandRegistry, SharedHandler};
use crate::validation;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Lifecycle of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "step_index")]
pub enum RunState {
    NotStarted,
    Validating,
    Executing(usize),
    Completed,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Validating => write!(f, "validating"),
            Self::Executing(index) => write!(f, "executing({index})"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Result of one executed step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub step_index: usize,
    pub step_id: String,
    pub command: String,
    pub result: HandlerResult,
    pub duration: Duration,
}

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub lesson_id: String,
    pub state: RunState,
    pub outcomes: Vec<StepOutcome>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn steps_executed(&self) -> usize {
        self.outcomes.len()
    }
}

/// Handler resolved for a command, either advisory built-in or registry entry
enum Resolved<'a> {
    Builtin(&'a dyn CommandHandler),
    Registered(SharedHandler),
}

impl Resolved<'_> {
    fn handler(&self) -> &dyn CommandHandler {
        match self {
            Self::Builtin(handler) => *handler,
            Self::Registered(handler) => handler.as_ref(),
        }
    }
}

/// Tracks the state transitions of one run for logging
struct RunTracker {
    run_id: Uuid,
    state: RunState,
}

impl RunTracker {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: RunState::NotStarted,
        }
    }

    fn transition(&mut self, next: RunState) {
        debug!(run_id = %self.run_id, from = %self.state, to = %next, "Run state transition");
        self.state = next;
    }

    fn fail(&mut self, error: LessonError) -> LessonError {
        self.transition(RunState::Failed);
        error
    }
}

/// Sequential, fail-fast lesson dispatcher
#[derive(Clone)]
pub struct LessonRunner {
    registry: Arc<CommandRegistry>,
    builtins: Arc<BuiltinHandlers>,
}

impl LessonRunner {
    pub fn new(registry: Arc<CommandRegistry>, host: HostCapabilities) -> Self {
        Self {
            registry,
            builtins: Arc::new(BuiltinHandlers::new(host)),
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Validate an untyped lesson document, then run it
    pub fn run_document(&self, document: &Value) -> Result<RunReport> {
        let mut tracker = RunTracker::new();
        tracker.transition(RunState::Validating);

        if let Err(e) = validation::validate_lesson(document) {
            log_error("lesson_runner", "validate", &e.to_string(), None);
            return Err(tracker.fail(e.into()));
        }
        let lesson = LessonDefinition::deserialize(document)
            .map_err(|e| tracker.fail(LessonError::Parse(e)))?;

        self.execute(&lesson, tracker)
    }

    /// Run a typed lesson
    pub fn run(&self, lesson: &LessonDefinition) -> Result<RunReport> {
        let mut tracker = RunTracker::new();
        tracker.transition(RunState::Validating);

        if let Err(e) = validation::validate_definition(lesson) {
            log_error("lesson_runner", "validate", &e.to_string(), None);
            return Err(tracker.fail(e.into()));
        }

        self.execute(lesson, tracker)
    }

    #[instrument(skip_all, fields(run_id = %tracker.run_id, lesson_id = %lesson.lesson_id))]
    fn execute(&self, lesson: &LessonDefinition, mut tracker: RunTracker) -> Result<RunReport> {
        let started = Instant::now();
        let run_id = tracker.run_id.to_string();
        let mut resolved: HashMap<&str, Resolved<'_>> = HashMap::new();
        let mut outcomes = Vec::with_capacity(lesson.steps.len());

        info!(steps = lesson.step_count(), title = %lesson.title, "Starting lesson run");

        for (index, step) in lesson.steps.iter().enumerate() {
            tracker.transition(RunState::Executing(index));

            // One handler instance per command name for the whole run
            let handler = match resolved.entry(step.command.as_str()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => match self.resolve(&step.command) {
                    Some(handler) => entry.insert(handler),
                    None => {
                        log_step_operation(
                            "dispatch",
                            &run_id,
                            &step.step_id,
                            &step.command,
                            "rejected",
                            Some("command not allowed"),
                        );
                        return Err(tracker.fail(LessonError::Dispatch {
                            command: step.command.clone(),
                            step_id: step.step_id.clone(),
                            step_index: index,
                        }));
                    }
                },
            };

            let outcome = self
                .invoke(handler.handler(), index, step, &run_id)
                .map_err(|e| tracker.fail(e))?;
            outcomes.push(outcome);
        }

        tracker.transition(RunState::Completed);
        let elapsed = started.elapsed();
        info!(
            steps_executed = outcomes.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Lesson run completed"
        );

        Ok(RunReport {
            run_id: tracker.run_id,
            lesson_id: lesson.lesson_id.clone(),
            state: tracker.state,
            outcomes,
            elapsed,
        })
    }

    /// Advisory built-ins first, then the registry
    fn resolve(&self, command: &str) -> Option<Resolved<'_>> {
        if commands::is_advisory(command) {
            return self.builtins.resolve(command).map(Resolved::Builtin);
        }
        self.registry.get(command).map(Resolved::Registered)
    }

    fn invoke(
        &self,
        handler: &dyn CommandHandler,
        index: usize,
        step: &Step,
        run_id: &str,
    ) -> Result<StepOutcome> {
        let started = Instant::now();
        match handler.handle(&step.args) {
            Ok(result) => {
                log_step_operation(
                    "execute",
                    run_id,
                    &step.step_id,
                    &step.command,
                    &result.status.to_string(),
                    None,
                );
                Ok(StepOutcome {
                    step_index: index,
                    step_id: step.step_id.clone(),
                    command: step.command.clone(),
                    result,
                    duration: started.elapsed(),
                })
            }
            Err(source) => {
                let context = format!("step_id={} command={}", step.step_id, step.command);
                log_error("lesson_runner", "execute", &source.to_string(), Some(&context));
                Err(LessonError::Handler {
                    step_id: step.step_id.clone(),
                    step_index: index,
                    command: step.command.clone(),
                    source,
                })
            }
        }
    }
}

impl fmt::Debug for LessonRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LessonRunner")
            .field("registry", &self.registry)
            .field("advisory", &commands::ADVISORY)
            .finish()
    }
}
