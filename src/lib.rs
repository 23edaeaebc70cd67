#![allow(clippy::doc_markdown)] // Allow technical terms like TTS, espeak-ng in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Lesson Runner
//!
//! Deterministic executor for guided-procedure lessons.
//!
//! ## Overview
//!
//! A lesson is an ordered list of instruction steps. Each step names a
//! whitelisted command and carries command-specific arguments. The runner
//! validates the document once, then dispatches every step in order to its
//! handler, stopping at the first failure.
//!
//! ## Architecture
//!
//! - **Lesson Validator**: structural contract check, first violation wins
//! - **Command Registry**: command name to handler, merged from optional extension sources
//! - **Step Dispatcher**: fail-fast sequential execution with step context on every error
//! - **Announcement Worker**: single background consumer that serializes speech playback
//! - **Gating Resolver**: persisted preference, session flag, environment default; silent unless opted in
//!
//! ## Module Organization
//!
//! - [`models`] - Lesson documents and handler results
//! - [`validation`] - Lesson structure validation
//! - [`registry`] - Command handler registration and extension sources
//! - [`orchestration`] - Step dispatch, built-in handlers and the composition root
//! - [`announcement`] - Queued speech playback
//! - [`config`] - Engine configuration and speech gating
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lesson_runner::config::EngineConfig;
//! use lesson_runner::orchestration::LessonEngine;
//! use lesson_runner::models::LessonDefinition;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = LessonEngine::builder(EngineConfig::load(None)?).build();
//! let lesson = LessonDefinition::from_json_str(
//!     r#"{"lesson_id": "l1", "title": "Intro", "steps": [
//!         {"step_id": "s1", "instruction_text": "say hi", "command": "SPEAK", "args": {"text": "hi"}},
//!         {"step_id": "s2", "instruction_text": "pause", "command": "WAIT", "args": {"seconds": 0.1}}
//!     ]}"#,
//! )?;
//!
//! let report = engine.run(&lesson)?;
//! println!("{} steps in {:?}", report.steps_executed(), report.elapsed);
//! # Ok(())
//! # }
//! ```

pub mod announcement;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod registry;
pub mod validation;

pub use config::{EngineConfig, GatingResolver, SessionFlag};
pub use error::{
    AnnouncementError, ConfigurationError, HandlerError, LessonError, Result, SpeechError,
    ValidationError,
};
pub use models::{load_lesson, HandlerArgs, HandlerResult, HandlerStatus, LessonDefinition, Step};
pub use orchestration::{LessonEngine, LessonEngineBuilder, LessonRunner, RunReport, RunState};
pub use registry::{CommandHandler, CommandRegistry, RegistryLoad, RegistrySource};
pub use validation::validate_lesson;
