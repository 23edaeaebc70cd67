//! # Registry Infrastructure
//!
//! Command handler registration and discovery.
//!
//! ## Architecture
//!
//! ```text
//! CommandRegistry
//! ├── base handlers        (SPEAK, installed by the engine builder)
//! └── RegistrySource[]     (optional extensions, merged last-wins)
//! ```

pub mod command_registry;

pub use command_registry::{
    CommandHandler, CommandRegistry, FnSource, RegistryLoad, RegistrySource, SharedHandler,
    StaticSource,
};
