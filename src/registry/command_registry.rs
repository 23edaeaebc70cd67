//! # Command Registry
//!
//! Mapping from command name to handler, composed once at startup from a base
//! set plus any number of optional extension sources.
//!
//! ## Overview
//!
//! Extension sources are strictly additive. A source that cannot be loaded
//! reports [`RegistryLoad::Absent`] and contributes nothing; composition never
//! fails because of it. Later sources override earlier ones on name collision.
//!
//! ## Usage
//!
//! ```rust
//! use lesson_runner::registry::{CommandRegistry, FnSource, RegistryLoad, RegistrySource};
//! use std::sync::Arc;
//!
//! let base = CommandRegistry::new();
//! let extension: Arc<dyn RegistrySource> = Arc::new(FnSource::new("broken-extension", || {
//!     RegistryLoad::absent("module not installed")
//! }));
//! let registry = base.merge_sources(&[extension]);
//! assert!(registry.is_empty());
//! ```

use crate::error::HandlerError;
use crate::logging::log_registry_operation;
use crate::models::{HandlerArgs, HandlerResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Trait for command handlers
///
/// Handlers receive the step's argument mapping and return a result mapping
/// with a mandatory status. They must not keep state between invocations.
pub trait CommandHandler: Send + Sync {
    fn handle(&self, args: &HandlerArgs) -> Result<HandlerResult, HandlerError>;
}

impl<F> CommandHandler for F
where
    F: Fn(&HandlerArgs) -> Result<HandlerResult, HandlerError> + Send + Sync,
{
    fn handle(&self, args: &HandlerArgs) -> Result<HandlerResult, HandlerError> {
        self(args)
    }
}

/// Shared handle to a registered handler
pub type SharedHandler = Arc<dyn CommandHandler>;

/// Result of loading an extension source
pub enum RegistryLoad {
    Handlers(HashMap<String, SharedHandler>),
    Absent { reason: String },
}

impl RegistryLoad {
    pub fn absent(reason: impl Into<String>) -> Self {
        Self::Absent {
            reason: reason.into(),
        }
    }

    /// Handlers contributed by this load; `Absent` contributes none
    pub fn into_handlers(self) -> HashMap<String, SharedHandler> {
        match self {
            Self::Handlers(handlers) => handlers,
            Self::Absent { .. } => HashMap::new(),
        }
    }
}

impl fmt::Debug for RegistryLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handlers(handlers) => {
                let mut names: Vec<&String> = handlers.keys().collect();
                names.sort();
                f.debug_tuple("Handlers").field(&names).finish()
            }
            Self::Absent { reason } => f.debug_struct("Absent").field("reason", reason).finish(),
        }
    }
}

/// A provider of extra command handlers
pub trait RegistrySource: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    fn load(&self) -> RegistryLoad;
}

/// Registry source backed by a closure
pub struct FnSource<F> {
    name: String,
    loader: F,
}

impl<F> FnSource<F>
where
    F: Fn() -> RegistryLoad + Send + Sync,
{
    pub fn new(name: impl Into<String>, loader: F) -> Self {
        Self {
            name: name.into(),
            loader,
        }
    }
}

impl<F> RegistrySource for FnSource<F>
where
    F: Fn() -> RegistryLoad + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> RegistryLoad {
        (self.loader)()
    }
}

/// Registry source holding a fixed handler set
pub struct StaticSource {
    name: String,
    handlers: HashMap<String, SharedHandler>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: HashMap::new(),
        }
    }

    pub fn with_handler(mut self, command: impl Into<String>, handler: SharedHandler) -> Self {
        self.handlers.insert(command.into(), handler);
        self
    }
}

impl RegistrySource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> RegistryLoad {
        RegistryLoad::Handlers(self.handlers.clone())
    }
}

/// Immutable-after-composition mapping from command name to handler
#[derive(Clone, Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, SharedHandler>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any existing one for the same command
    pub fn register(&mut self, command: impl Into<String>, handler: SharedHandler) {
        let command = command.into();
        if self.handlers.insert(command.clone(), handler).is_some() {
            warn!(command = %command, "Replacing existing handler for command");
        } else {
            debug!(command = %command, "Registered command handler");
        }
    }

    pub fn with_handler(mut self, command: impl Into<String>, handler: SharedHandler) -> Self {
        self.register(command, handler);
        self
    }

    /// Merge another handler set into this one, last-wins on collision
    pub fn merge(mut self, handlers: HashMap<String, SharedHandler>) -> Self {
        for (command, handler) in handlers {
            self.register(command, handler);
        }
        self
    }

    /// Merge every source in order; absent sources contribute nothing
    pub fn merge_sources(self, sources: &[Arc<dyn RegistrySource>]) -> Self {
        sources.iter().fold(self, |registry, source| {
            let load = source.load();
            match &load {
                RegistryLoad::Handlers(handlers) => {
                    info!(
                        source = source.name(),
                        handlers = handlers.len(),
                        "Merging extension command handlers"
                    );
                    log_registry_operation(
                        "merge",
                        source.name(),
                        handlers.len(),
                        "loaded",
                        None,
                    );
                }
                RegistryLoad::Absent { reason } => {
                    warn!(
                        source = source.name(),
                        reason = %reason,
                        "Extension source unavailable, contributing no handlers"
                    );
                    log_registry_operation("merge", source.name(), 0, "absent", Some(reason.as_str()));
                }
            }
            registry.merge(load.into_handlers())
        })
    }

    pub fn get(&self, command: &str) -> Option<SharedHandler> {
        self.handlers.get(command).cloned()
    }

    pub fn contains(&self, command: &str) -> bool {
        self.handlers.contains_key(command)
    }

    /// Registered command names, sorted
    pub fn commands(&self) -> Vec<String> {
        let mut commands: Vec<String> = self.handlers.keys().cloned().collect();
        commands.sort();
        commands
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands())
            .finish()
    }
}
