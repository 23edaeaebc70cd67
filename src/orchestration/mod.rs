//! # Orchestration
//!
//! Step dispatch for lessons.
//!
//! ## Core Components
//!
//! - **LessonRunner**: validates once, then executes steps in order, fail-fast
//! - **BuiltinHandlers**: `WAIT`, `UI_HIGHLIGHT` and `RUN_OPERATOR`, resolved before the registry
//! - **SpeakHandler**: registry entry for `SPEAK`, feeding the announcement worker
//! - **Host capabilities**: operator invocation and UI highlight seams owned by the host
//! - **LessonEngineBuilder**: composition root wiring worker, registry and runner together

pub mod bootstrap;
pub mod builtin_handlers;
pub mod host;
pub mod lesson_runner;

pub use bootstrap::{EngineStatus, LessonEngine, LessonEngineBuilder};
pub use builtin_handlers::{BuiltinHandlers, SpeakHandler, WaitHandler};
pub use host::{HostCapabilities, LoggingHost, OperatorInvoker, UiHighlighter};
pub use lesson_runner::{LessonRunner, RunReport, RunState, StepOutcome};
