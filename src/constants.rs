//! # System Constants
//!
//! Command names, environment variable names and limits that define the
//! operational boundaries of the lesson runner.

/// Command names understood by the dispatcher without any extension registry
pub mod commands {
    pub const SPEAK: &str = "SPEAK";
    pub const WAIT: &str = "WAIT";
    pub const UI_HIGHLIGHT: &str = "UI_HIGHLIGHT";
    pub const RUN_OPERATOR: &str = "RUN_OPERATOR";

    /// Closed whitelist of built-in command names
    pub const BUILTIN: [&str; 4] = [SPEAK, WAIT, UI_HIGHLIGHT, RUN_OPERATOR];

    /// Built-ins executed directly by the dispatcher rather than through the registry
    pub const ADVISORY: [&str; 3] = [WAIT, UI_HIGHLIGHT, RUN_OPERATOR];

    pub fn is_builtin(command: &str) -> bool {
        BUILTIN.contains(&command)
    }

    pub fn is_advisory(command: &str) -> bool {
        ADVISORY.contains(&command)
    }
}

/// Lesson document field names
pub mod fields {
    pub const LESSON_ID: &str = "lesson_id";
    pub const TITLE: &str = "title";
    pub const STEPS: &str = "steps";
    pub const STEP_ID: &str = "step_id";
    pub const INSTRUCTION_TEXT: &str = "instruction_text";
    pub const COMMAND: &str = "command";
    pub const ARGS: &str = "args";

    pub const REQUIRED_LESSON_FIELDS: [&str; 3] = [LESSON_ID, TITLE, STEPS];
    pub const REQUIRED_STEP_FIELDS: [&str; 3] = [STEP_ID, INSTRUCTION_TEXT, COMMAND];
}

/// Environment variables consulted by the engine
pub mod env {
    /// Runtime environment name (development, test, production)
    pub const LESSON_ENV: &str = "LESSON_ENV";
    /// Console log format override (`json` for JSON lines)
    pub const LESSON_LOG_FORMAT: &str = "LESSON_LOG_FORMAT";
    /// Lowest-priority opt-in for speech announcements
    pub const TTS_ENABLED: &str = "LESSON_TTS_ENABLED";
    /// Opt-in for the platform-specific secondary speech mechanism
    pub const TTS_PLATFORM_FALLBACK: &str = "LESSON_TTS_PLATFORM_FALLBACK";
    /// Prefix for layered `EngineConfig` overrides (`LESSON__MAX_ANNOUNCEMENT_LENGTH`)
    pub const CONFIG_PREFIX: &str = "LESSON";
}

/// Persisted preference keys
pub mod preferences {
    pub const TTS_ENABLED: &str = "tts_enabled";
    pub const TTS_VOICE: &str = "tts_voice";
}

/// Default maximum announcement length in characters
pub const DEFAULT_MAX_ANNOUNCEMENT_LENGTH: usize = 2000;

/// Default upper bound on one external speech playback, in milliseconds
pub const DEFAULT_TTS_TIMEOUT_MS: u64 = 30_000;

/// Name given to the background announcement thread
pub const ANNOUNCEMENT_THREAD_NAME: &str = "announcement-worker";

/// Parse a loosely formatted boolean flag such as an environment variable value.
///
/// Unrecognised values are treated as absent rather than false.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
