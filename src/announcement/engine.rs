//! Speech engines and the primary/secondary playback policy.
//!
//! Engines block until playback finishes; the worker relies on that to keep
//! exactly one announcement audible at a time.

use crate::config::{CommandEngineConfig, EngineConfig};
use crate::constants::DEFAULT_TTS_TIMEOUT_MS;
use crate::error::SpeechError;
use crate::logging::log_announcement_operation;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Capability that turns text into audible speech
pub trait SpeechEngine: Send + Sync {
    fn name(&self) -> &str;

    fn speak(&self, text: &str, voice: Option<&str>) -> Result<(), SpeechError>;
}

/// Speech engine that shells out to an external program and waits for it
#[derive(Debug, Clone)]
pub struct CommandEngine {
    config: CommandEngineConfig,
}

impl CommandEngine {
    pub fn new(config: CommandEngineConfig) -> Self {
        Self { config }
    }

    /// `espeak-ng`, the default primary engine
    pub fn espeak() -> Self {
        Self::new(CommandEngineConfig::espeak())
    }

    /// Platform-native speech mechanism, if this platform has one
    pub fn platform() -> Option<Self> {
        if cfg!(target_os = "macos") {
            Some(Self::new(CommandEngineConfig {
                program: "say".to_string(),
                voice_flag: Some("-v".to_string()),
                args: Vec::new(),
                timeout_ms: DEFAULT_TTS_TIMEOUT_MS,
            }))
        } else if cfg!(target_os = "linux") {
            Some(Self::new(CommandEngineConfig {
                program: "spd-say".to_string(),
                voice_flag: Some("-y".to_string()),
                args: vec!["--wait".to_string()],
                timeout_ms: DEFAULT_TTS_TIMEOUT_MS,
            }))
        } else {
            None
        }
    }

    /// Full argument vector for one invocation
    ///
    /// The text always follows `--` so lesson text is never parsed as an option.
    pub fn arguments(&self, text: &str, voice: Option<&str>) -> Vec<String> {
        let mut args = self.config.args.clone();
        if let (Some(flag), Some(voice)) = (&self.config.voice_flag, voice) {
            args.push(flag.clone());
            args.push(voice.to_string());
        }
        args.push("--".to_string());
        args.push(text.to_string());
        args
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }
}

impl SpeechEngine for CommandEngine {
    fn name(&self) -> &str {
        &self.config.program
    }

    fn speak(&self, text: &str, voice: Option<&str>) -> Result<(), SpeechError> {
        let engine = || self.config.program.clone();
        let mut child = Command::new(&self.config.program)
            .args(self.arguments(text, voice))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SpeechError::Unavailable {
                engine: engine(),
                reason: e.to_string(),
            })?;

        let waited = child
            .wait_timeout(self.timeout())
            .map_err(|e| SpeechError::PlaybackFailed {
                engine: engine(),
                reason: e.to_string(),
            })?;
        let Some(status) = waited else {
            if let Err(e) = child.kill() {
                debug!(error = %e, "Failed to kill timed out speech process");
            }
            // Reap the killed process
            let _ = child.wait();
            return Err(SpeechError::TimedOut {
                engine: engine(),
                timeout_ms: self.config.timeout_ms,
            });
        };

        if status.success() {
            Ok(())
        } else {
            Err(SpeechError::PlaybackFailed {
                engine: self.config.program.clone(),
                reason: format!("exited with {status}"),
            })
        }
    }
}

/// Which engines the worker may use, and in which order
#[derive(Clone, Default)]
pub struct PlaybackPolicy {
    primary: Option<Arc<dyn SpeechEngine>>,
    secondary: Option<Arc<dyn SpeechEngine>>,
    allow_secondary: bool,
}

/// Outcome of one playback attempt chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Played by the named engine
    Played(String),
    /// No engine could play the request; it was dropped
    Dropped(String),
}

impl PlaybackPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primary(mut self, engine: Arc<dyn SpeechEngine>) -> Self {
        self.primary = Some(engine);
        self
    }

    /// Secondary engine, consulted only when `allow` is set
    pub fn with_secondary(mut self, engine: Arc<dyn SpeechEngine>, allow: bool) -> Self {
        self.secondary = Some(engine);
        self.allow_secondary = allow;
        self
    }

    /// Policy described by the engine configuration
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut policy = Self::new();
        if let Some(primary) = &config.primary_engine {
            policy = policy.with_primary(Arc::new(CommandEngine::new(primary.clone())));
        }
        if let Some(platform) = CommandEngine::platform() {
            policy = policy.with_secondary(Arc::new(platform), config.allow_platform_fallback);
        }
        policy
    }

    pub fn secondary_allowed(&self) -> bool {
        self.allow_secondary && self.secondary.is_some()
    }

    /// Try the primary engine, then the secondary if permitted. No retries.
    pub fn play(&self, text: &str, voice: Option<&str>) -> PlaybackOutcome {
        let mut failures = Vec::new();

        match &self.primary {
            Some(engine) => match engine.speak(text, voice) {
                Ok(()) => return self.played(engine.as_ref(), text),
                Err(e) => {
                    debug!(error = %e, "Primary speech engine failed");
                    failures.push(e.to_string());
                }
            },
            None => failures.push("no primary engine configured".to_string()),
        }

        if let Some(engine) = self.secondary.as_ref().filter(|_| self.allow_secondary) {
            match engine.speak(text, voice) {
                Ok(()) => return self.played(engine.as_ref(), text),
                Err(e) => {
                    debug!(error = %e, "Secondary speech engine failed");
                    failures.push(e.to_string());
                }
            }
        }

        let reason = failures.join("; ");
        warn!(reason = %reason, "Announcement dropped: no speech engine succeeded");
        log_announcement_operation("play", None, text.chars().count(), "dropped", Some(&reason));
        PlaybackOutcome::Dropped(reason)
    }

    fn played(&self, engine: &dyn SpeechEngine, text: &str) -> PlaybackOutcome {
        log_announcement_operation(
            "play",
            Some(engine.name()),
            text.chars().count(),
            "played",
            None,
        );
        PlaybackOutcome::Played(engine.name().to_string())
    }
}

impl std::fmt::Debug for PlaybackPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackPolicy")
            .field("primary", &self.primary.as_ref().map(|e| e.name().to_string()))
            .field("secondary", &self.secondary.as_ref().map(|e| e.name().to_string()))
            .field("allow_secondary", &self.allow_secondary)
            .finish()
    }
}
