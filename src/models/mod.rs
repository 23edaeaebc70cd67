//! # Lesson Models
//!
//! Typed lesson documents and the handler result mapping exchanged between
//! the dispatcher and command handlers.

pub mod lesson;

pub use lesson::{
    load_lesson, HandlerArgs, HandlerResult, HandlerStatus, LessonDefinition, Step,
};
