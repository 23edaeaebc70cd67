//! # Lesson Engine Bootstrap
//!
//! Composition root for the lesson runner. Builds the single announcement
//! worker, the base registry holding `SPEAK`, merges any extension sources
//! and hands the result to a [`LessonRunner`].
//!
//! The worker is owned by the engine handle and injected into the `SPEAK`
//! handler; there is no hidden global instance. Engines built separately get
//! separate workers. To keep one serialized playback channel across several
//! engines, build the worker once and pass it to each builder through
//! [`LessonEngineBuilder::with_worker`].

use super::builtin_handlers::SpeakHandler;
use super::host::{HostCapabilities, OperatorInvoker, UiHighlighter};
use super::lesson_runner::{LessonRunner, RunReport};
use crate::announcement::{AnnouncementWorker, PlaybackPolicy};
use crate::config::{EngineConfig, GatingResolver, SessionFlag};
use crate::constants::commands;
use crate::error::Result;
use crate::models::LessonDefinition;
use crate::registry::{CommandRegistry, RegistrySource};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Builder for a [`LessonEngine`]
#[derive(Default)]
pub struct LessonEngineBuilder {
    config: EngineConfig,
    session: SessionFlag,
    playback: Option<PlaybackPolicy>,
    gating: Option<GatingResolver>,
    sources: Vec<Arc<dyn RegistrySource>>,
    host: HostCapabilities,
    worker: Option<Arc<AnnouncementWorker>>,
}

impl LessonEngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Share an existing session flag with the engine
    pub fn with_session(mut self, session: SessionFlag) -> Self {
        self.session = session;
        self
    }

    /// Replace the playback policy derived from the configuration
    pub fn with_playback(mut self, playback: PlaybackPolicy) -> Self {
        self.playback = Some(playback);
        self
    }

    /// Replace the standard persisted → session → environment gating order
    pub fn with_gating(mut self, gating: GatingResolver) -> Self {
        self.gating = Some(gating);
        self
    }

    /// Feed `SPEAK` into an existing worker instead of creating one
    ///
    /// The shared worker keeps its own gating and playback, so `with_gating`,
    /// `with_playback` and this engine's session flag do not apply to it.
    pub fn with_worker(mut self, worker: Arc<AnnouncementWorker>) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Append an extension registry source; later sources win on collision
    pub fn with_source(mut self, source: Arc<dyn RegistrySource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_operator_invoker(mut self, invoker: Arc<dyn OperatorInvoker>) -> Self {
        self.host.operators = invoker;
        self
    }

    pub fn with_highlighter(mut self, highlighter: Arc<dyn UiHighlighter>) -> Self {
        self.host.highlighter = highlighter;
        self
    }

    pub fn build(self) -> LessonEngine {
        let worker = match self.worker {
            Some(worker) => {
                debug!("Lesson engine joining a shared announcement worker");
                worker
            }
            None => {
                let gating = self
                    .gating
                    .unwrap_or_else(|| GatingResolver::standard(&self.config, self.session.clone()));
                let playback = self
                    .playback
                    .unwrap_or_else(|| PlaybackPolicy::from_config(&self.config));
                Arc::new(AnnouncementWorker::new(&self.config, gating, playback))
            }
        };

        let registry = CommandRegistry::new()
            .with_handler(
                commands::SPEAK,
                Arc::new(SpeakHandler::new(Arc::clone(&worker))),
            )
            .merge_sources(&self.sources);
        let registry = Arc::new(registry);

        info!(
            commands = ?registry.commands(),
            extension_sources = self.sources.len(),
            gating = ?worker.gating(),
            "Lesson engine composed"
        );

        LessonEngine {
            runner: LessonRunner::new(Arc::clone(&registry), self.host),
            worker,
            session: self.session,
            registry,
        }
    }
}

/// Composed lesson engine: runner, registry and the announcement worker it feeds
pub struct LessonEngine {
    runner: LessonRunner,
    worker: Arc<AnnouncementWorker>,
    session: SessionFlag,
    registry: Arc<CommandRegistry>,
}

/// Snapshot of engine state for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub commands: Vec<String>,
    pub speech_enabled: bool,
    pub speech_source: String,
    pub worker_running: bool,
    pub queue_depth: usize,
}

impl LessonEngine {
    pub fn builder(config: EngineConfig) -> LessonEngineBuilder {
        LessonEngineBuilder::new(config)
    }

    pub fn run(&self, lesson: &LessonDefinition) -> Result<RunReport> {
        self.runner.run(lesson)
    }

    pub fn run_document(&self, document: &Value) -> Result<RunReport> {
        self.runner.run_document(document)
    }

    pub fn runner(&self) -> &LessonRunner {
        &self.runner
    }

    pub fn worker(&self) -> &Arc<AnnouncementWorker> {
        &self.worker
    }

    /// Session-scope speech flag, settable while the engine is alive
    pub fn session(&self) -> &SessionFlag {
        &self.session
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Best-effort wait for queued announcements to finish
    pub fn drain(&self, timeout: Duration) -> bool {
        self.worker.wait_idle(timeout)
    }

    pub fn status(&self) -> EngineStatus {
        let gating = self.worker.gating().resolve();
        EngineStatus {
            commands: self.registry.commands(),
            speech_enabled: gating.enabled,
            speech_source: gating.source,
            worker_running: self.worker.is_running(),
            queue_depth: self.worker.queue_depth(),
        }
    }
}

impl std::fmt::Debug for LessonEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LessonEngine")
            .field("runner", &self.runner)
            .field("worker", &self.worker)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::models::{HandlerArgs, HandlerResult, HandlerStatus, Step};
    use crate::registry::{FnSource, RegistryLoad, StaticSource};
    use serde_json::json;

    fn silent_config() -> EngineConfig {
        EngineConfig {
            tts_enabled_env: "LESSON_TEST_BOOTSTRAP_UNSET".to_string(),
            ..EngineConfig::default()
        }
    }

    fn speak_lesson() -> LessonDefinition {
        LessonDefinition::new(
            "l1",
            "Intro",
            vec![Step::new("s1", "say hi", "SPEAK").with_args(json!({"text": "hi"}))],
        )
    }

    #[test]
    fn test_base_registry_contains_speak() {
        let engine = LessonEngine::builder(silent_config())
            .with_playback(PlaybackPolicy::new())
            .build();
        assert_eq!(engine.registry().commands(), vec!["SPEAK".to_string()]);
    }

    #[test]
    fn test_speak_disabled_by_default() {
        let engine = LessonEngine::builder(silent_config())
            .with_playback(PlaybackPolicy::new())
            .build();

        let report = engine.run(&speak_lesson()).unwrap();
        assert_eq!(report.outcomes[0].result.status, HandlerStatus::Disabled);
        assert!(!engine.status().worker_running);
    }

    #[test]
    fn test_session_flag_enables_speech() {
        let engine = LessonEngine::builder(silent_config())
            .with_playback(PlaybackPolicy::new())
            .build();
        engine.session().set(true);

        let report = engine.run(&speak_lesson()).unwrap();
        assert_eq!(report.outcomes[0].result.status, HandlerStatus::Queued);
        assert!(engine.drain(Duration::from_secs(5)));
        assert_eq!(engine.status().queue_depth, 0);
    }

    #[test]
    fn test_extension_source_overrides_speak() {
        let source = StaticSource::new("custom-speech").with_handler(
            "SPEAK",
            Arc::new(|_: &HandlerArgs| {
                Ok::<_, HandlerError>(HandlerResult::ok().with_detail("handler", "custom"))
            }),
        );
        let broken: Arc<dyn RegistrySource> =
            Arc::new(FnSource::new("broken", || RegistryLoad::absent("not installed")));

        let engine = LessonEngine::builder(silent_config())
            .with_playback(PlaybackPolicy::new())
            .with_source(broken)
            .with_source(Arc::new(source))
            .build();

        let report = engine.run(&speak_lesson()).unwrap();
        assert_eq!(report.outcomes[0].result.detail("handler"), Some(&json!("custom")));
    }

    #[test]
    fn test_with_worker_shares_one_queue() {
        let session = SessionFlag::new();
        session.set(true);
        let worker = Arc::new(AnnouncementWorker::new(
            &silent_config(),
            GatingResolver::new().with_provider(Arc::new(session)),
            PlaybackPolicy::new(),
        ));

        let first = LessonEngine::builder(silent_config())
            .with_worker(Arc::clone(&worker))
            .build();
        let second = LessonEngine::builder(silent_config())
            .with_worker(Arc::clone(&worker))
            .build();

        assert!(Arc::ptr_eq(first.worker(), second.worker()));
        assert_eq!(first.run(&speak_lesson()).unwrap().outcomes[0].result.status, HandlerStatus::Queued);
        assert!(worker.wait_idle(Duration::from_secs(5)));
    }
}
