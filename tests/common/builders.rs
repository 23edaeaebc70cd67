use lesson_runner::announcement::{AnnouncementWorker, PlaybackPolicy, SpeechEngine};
use lesson_runner::config::{EngineConfig, GatingResolver, SessionFlag};
use lesson_runner::models::{LessonDefinition, Step};
use lesson_runner::orchestration::{LessonEngine, LessonEngineBuilder};
use serde_json::{json, Value};
use std::sync::Arc;

/// Config whose environment gating variable is never set
pub fn isolated_config() -> EngineConfig {
    EngineConfig {
        tts_enabled_env: "LESSON_TEST_TTS_NEVER_SET".to_string(),
        platform_fallback_env: "LESSON_TEST_FALLBACK_NEVER_SET".to_string(),
        ..EngineConfig::default()
    }
}

pub fn enabled_gating() -> GatingResolver {
    let session = SessionFlag::new();
    session.set(true);
    GatingResolver::new().with_provider(Arc::new(session))
}

pub fn worker_with(engine: Arc<dyn SpeechEngine>, gating: GatingResolver) -> AnnouncementWorker {
    AnnouncementWorker::new(
        &isolated_config(),
        gating,
        PlaybackPolicy::new().with_primary(engine),
    )
}

/// Engine builder with a silent, enabled-by-session playback policy
pub fn engine_builder(engine: Arc<dyn SpeechEngine>) -> LessonEngineBuilder {
    LessonEngine::builder(isolated_config()).with_playback(PlaybackPolicy::new().with_primary(engine))
}

pub fn speak_step(step_id: &str, text: &str) -> Step {
    Step::new(step_id, format!("say {text}"), "SPEAK").with_args(json!({ "text": text }))
}

pub fn wait_step(step_id: &str, seconds: f64) -> Step {
    Step::new(step_id, "pause", "WAIT").with_args(json!({ "seconds": seconds }))
}

pub fn lesson(steps: Vec<Step>) -> LessonDefinition {
    LessonDefinition::new("test-lesson", "Test Lesson", steps)
}

/// The introductory two-step lesson document
pub fn intro_document() -> Value {
    json!({
        "lesson_id": "l1",
        "title": "Intro",
        "steps": [
            {"step_id": "s1", "instruction_text": "say hi", "command": "SPEAK", "args": {"text": "hi"}},
            {"step_id": "s2", "instruction_text": "pause", "command": "WAIT", "args": {"seconds": 0.1}}
        ]
    })
}
