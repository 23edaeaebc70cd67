#![allow(dead_code)]

pub mod builders;
pub mod strategies;

pub use builders::*;

use lesson_runner::announcement::SpeechEngine;
use lesson_runner::error::{HandlerError, SpeechError};
use lesson_runner::models::{HandlerArgs, HandlerResult};
use lesson_runner::registry::CommandHandler;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Handler that records every invocation and answers `ok`
#[derive(Default)]
pub struct RecordingHandler {
    pub calls: Mutex<Vec<HandlerArgs>>,
}

impl RecordingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl CommandHandler for RecordingHandler {
    fn handle(&self, args: &HandlerArgs) -> Result<HandlerResult, HandlerError> {
        self.calls.lock().push(args.clone());
        Ok(HandlerResult::ok())
    }
}

/// Handler that always fails
pub struct FailingHandler;

impl CommandHandler for FailingHandler {
    fn handle(&self, _args: &HandlerArgs) -> Result<HandlerResult, HandlerError> {
        Err(HandlerError::Failed("deliberate failure".to_string()))
    }
}

/// Speech engine that records playback and tracks overlapping calls
#[derive(Default)]
pub struct RecordingEngine {
    pub played: Mutex<Vec<String>>,
    pub voices: Mutex<Vec<Option<String>>>,
    active: AtomicUsize,
    pub max_concurrent: AtomicUsize,
    delay: Duration,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Engine whose playback takes `delay`
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Self::default()
        })
    }

    pub fn played(&self) -> Vec<String> {
        self.played.lock().clone()
    }
}

impl SpeechEngine for RecordingEngine {
    fn name(&self) -> &str {
        "recording"
    }

    fn speak(&self, text: &str, voice: Option<&str>) -> Result<(), SpeechError> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(now_active, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.played.lock().push(text.to_string());
        self.voices.lock().push(voice.map(str::to_string));
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Speech engine that blocks playback until released
#[derive(Default)]
pub struct GatedEngine {
    released: Mutex<bool>,
    release: Condvar,
    pub started: Mutex<Vec<String>>,
}

impl GatedEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn release(&self) {
        *self.released.lock() = true;
        self.release.notify_all();
    }

    /// Wait until playback of at least `count` requests has started
    pub fn wait_started(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.started.lock().len() >= count {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }
}

impl SpeechEngine for GatedEngine {
    fn name(&self) -> &str {
        "gated"
    }

    fn speak(&self, text: &str, _voice: Option<&str>) -> Result<(), SpeechError> {
        self.started.lock().push(text.to_string());
        let mut released = self.released.lock();
        while !*released {
            self.release.wait(&mut released);
        }
        Ok(())
    }
}

/// Speech engine that is never available
pub struct UnavailableEngine;

impl SpeechEngine for UnavailableEngine {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn speak(&self, _text: &str, _voice: Option<&str>) -> Result<(), SpeechError> {
        Err(SpeechError::Unavailable {
            engine: "unavailable".to_string(),
            reason: "not installed".to_string(),
        })
    }
}
