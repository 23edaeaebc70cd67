//! # Speech Gating
//!
//! Tiered opt-in resolution for audible announcements. Providers are consulted
//! in a fixed priority order and the first one with an opinion wins; when none
//! has one, speech stays disabled.
//!
//! Provider failures (an unreadable preference file, a malformed environment
//! value) are never raised. They read as "no opinion" and resolution falls
//! through to the next tier.

use super::EngineConfig;
use crate::constants::{self, preferences};
use config::{Config, File};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A single configuration tier answering "is speech enabled?"
pub trait GatingProvider: Send + Sync {
    fn name(&self) -> &str;

    /// `None` when this tier has no opinion or cannot be read
    fn enabled(&self) -> Option<bool>;
}

/// Persisted user preference stored in a config file
#[derive(Debug, Clone)]
pub struct PersistedPreference {
    path: PathBuf,
}

impl PersistedPreference {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read on every call so edits take effect without a restart
    fn read(&self) -> Option<Config> {
        match Config::builder()
            .add_source(File::from(self.path.as_path()).required(true))
            .build()
        {
            Ok(config) => Some(config),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Preference store unreadable");
                None
            }
        }
    }

    /// Preferred voice, if one is stored
    pub fn voice(&self) -> Option<String> {
        self.read()?
            .get_string(preferences::TTS_VOICE)
            .ok()
            .filter(|voice| !voice.trim().is_empty())
    }
}

impl GatingProvider for PersistedPreference {
    fn name(&self) -> &str {
        "persisted_preference"
    }

    fn enabled(&self) -> Option<bool> {
        self.read()?.get_bool(preferences::TTS_ENABLED).ok()
    }
}

/// Transient session-scope toggle, shared between the host UI and the engine
#[derive(Debug, Clone, Default)]
pub struct SessionFlag {
    value: Arc<RwLock<Option<bool>>>,
}

impl SessionFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, enabled: bool) {
        *self.value.write() = Some(enabled);
    }

    pub fn clear(&self) {
        *self.value.write() = None;
    }

    pub fn get(&self) -> Option<bool> {
        *self.value.read()
    }
}

impl GatingProvider for SessionFlag {
    fn name(&self) -> &str {
        "session_flag"
    }

    fn enabled(&self) -> Option<bool> {
        self.get()
    }
}

/// Environment-variable default
#[derive(Debug, Clone)]
pub struct EnvironmentDefault {
    variable: String,
}

impl EnvironmentDefault {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl GatingProvider for EnvironmentDefault {
    fn name(&self) -> &str {
        "environment"
    }

    fn enabled(&self) -> Option<bool> {
        std::env::var(&self.variable)
            .ok()
            .and_then(|value| constants::parse_flag(&value))
    }
}

/// Outcome of a gating resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatingDecision {
    pub enabled: bool,
    /// Provider that decided, or `default` when none had an opinion
    pub source: String,
}

/// Ordered list of gating providers; first present answer wins
#[derive(Clone, Default)]
pub struct GatingResolver {
    providers: Vec<Arc<dyn GatingProvider>>,
}

impl GatingResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider at the next-lower priority
    pub fn with_provider(mut self, provider: Arc<dyn GatingProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Persisted preference, then session flag, then environment default
    pub fn standard(config: &EngineConfig, session: SessionFlag) -> Self {
        let mut resolver = Self::new();
        if let Some(path) = &config.preferences_path {
            resolver = resolver.with_provider(Arc::new(PersistedPreference::new(path.clone())));
        }
        resolver
            .with_provider(Arc::new(session))
            .with_provider(Arc::new(EnvironmentDefault::new(
                config.tts_enabled_env.clone(),
            )))
    }

    pub fn resolve(&self) -> GatingDecision {
        for provider in &self.providers {
            if let Some(enabled) = provider.enabled() {
                debug!(provider = provider.name(), enabled, "Speech gating resolved");
                return GatingDecision {
                    enabled,
                    source: provider.name().to_string(),
                };
            }
        }
        GatingDecision {
            enabled: false,
            source: "default".to_string(),
        }
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }
}

impl std::fmt::Debug for GatingResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatingResolver")
            .field("providers", &self.provider_names())
            .finish()
    }
}
