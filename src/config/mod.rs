//! # Lesson Runner Configuration
//!
//! Engine-wide configuration with layered loading: built-in defaults, an
//! optional configuration file, then `LESSON__*` environment overrides.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lesson_runner::config::EngineConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::load(None)?;
//! assert!(config.max_announcement_length > 0);
//! # Ok(())
//! # }
//! ```

pub mod gating;

use crate::constants::{self, env, DEFAULT_MAX_ANNOUNCEMENT_LENGTH, DEFAULT_TTS_TIMEOUT_MS};
use crate::error::ConfigurationError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub use gating::{
    EnvironmentDefault, GatingDecision, GatingProvider, GatingResolver, PersistedPreference,
    SessionFlag,
};

/// External text-to-speech program used as the primary playback engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEngineConfig {
    pub program: String,
    /// Flag preceding the voice name, e.g. `-v`
    #[serde(default)]
    pub voice_flag: Option<String>,
    /// Arguments placed before the voice flag and text
    #[serde(default)]
    pub args: Vec<String>,
    /// Playback is killed once it runs longer than this
    #[serde(default = "default_tts_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_tts_timeout_ms() -> u64 {
    DEFAULT_TTS_TIMEOUT_MS
}

impl CommandEngineConfig {
    pub fn espeak() -> Self {
        Self {
            program: "espeak-ng".to_string(),
            voice_flag: Some("-v".to_string()),
            args: Vec::new(),
            timeout_ms: DEFAULT_TTS_TIMEOUT_MS,
        }
    }
}

/// Root configuration for a lesson engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Longest accepted announcement text, in characters
    pub max_announcement_length: usize,

    /// Environment variable holding the lowest-priority speech opt-in
    pub tts_enabled_env: String,

    /// Environment variable opting in to the platform speech fallback
    pub platform_fallback_env: String,

    /// Whether the platform-specific secondary engine may be used
    pub allow_platform_fallback: bool,

    /// Persisted preference store (`tts_enabled`, `tts_voice`)
    pub preferences_path: Option<PathBuf>,

    pub primary_engine: Option<CommandEngineConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_announcement_length: DEFAULT_MAX_ANNOUNCEMENT_LENGTH,
            tts_enabled_env: env::TTS_ENABLED.to_string(),
            platform_fallback_env: env::TTS_PLATFORM_FALLBACK.to_string(),
            allow_platform_fallback: false,
            preferences_path: None,
            primary_engine: Some(CommandEngineConfig::espeak()),
        }
    }
}

impl EngineConfig {
    /// Load defaults, then `path` when given, then `LESSON__*` overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let defaults = Config::try_from(&Self::default())?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading engine configuration file");
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(
                Environment::with_prefix(env::CONFIG_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus the well-known environment variables only
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let config = Self::default().with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply the platform fallback opt-in from its environment variable
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(allow) = std::env::var(&self.platform_fallback_env)
            .ok()
            .and_then(|value| constants::parse_flag(&value))
        {
            self.allow_platform_fallback = allow;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_announcement_length == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "max_announcement_length".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if let Some(engine) = &self.primary_engine {
            if engine.program.trim().is_empty() {
                return Err(ConfigurationError::InvalidValue {
                    field: "primary_engine.program".to_string(),
                    reason: "program must not be empty".to_string(),
                });
            }
            if engine.timeout_ms == 0 {
                return Err(ConfigurationError::InvalidValue {
                    field: "primary_engine.timeout_ms".to_string(),
                    reason: "must be greater than 0".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_announcement_length, 2000);
        assert_eq!(config.tts_enabled_env, "LESSON_TTS_ENABLED");
        assert!(!config.allow_platform_fallback);
        assert!(config.preferences_path.is_none());
        assert_eq!(config.primary_engine.unwrap().program, "espeak-ng");
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "max_announcement_length = 120\npreferences_path = \"/tmp/prefs.toml\"\n\n[primary_engine]\nprogram = \"say\"\nvoice_flag = \"-v\""
        )
        .unwrap();

        let config = EngineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.max_announcement_length, 120);
        assert_eq!(config.preferences_path, Some(PathBuf::from("/tmp/prefs.toml")));
        let engine = config.primary_engine.unwrap();
        assert_eq!(engine.program, "say");
        assert!(engine.args.is_empty());
        assert_eq!(engine.timeout_ms, DEFAULT_TTS_TIMEOUT_MS);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = EngineConfig::load(Some(Path::new("/nonexistent/engine.toml")));
        assert!(matches!(result, Err(ConfigurationError::Load(_))));
    }

    #[test]
    fn test_zero_length_limit_is_rejected() {
        let config = EngineConfig {
            max_announcement_length: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_engine_timeout_is_rejected() {
        let config = EngineConfig {
            primary_engine: Some(CommandEngineConfig {
                timeout_ms: 0,
                ..CommandEngineConfig::espeak()
            }),
            ..EngineConfig::default()
        };
        match config.validate() {
            Err(ConfigurationError::InvalidValue { field, .. }) => {
                assert_eq!(field, "primary_engine.timeout_ms")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
