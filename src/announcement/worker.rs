//! # Announcement Worker
//!
//! Single-consumer background queue that keeps slow, audible speech off the
//! deterministic step timeline.
//!
//! ## Overview
//!
//! [`AnnouncementWorker::speak`] checks the text, resolves gating and then
//! enqueues without waiting for playback. A dedicated thread is spawned on the
//! first enqueue and drains the queue in FIFO order for the rest of the
//! process, one request at a time. Failures past the `queued` boundary are
//! logged and the request is dropped; nothing is reported back to the caller.
//!
//! There is no cancellation and no drain guarantee on shutdown: requests still
//! queued when the process exits are never played. [`AnnouncementWorker::wait_idle`]
//! gives callers a best-effort drain with a deadline.

use super::engine::PlaybackPolicy;
use crate::config::{EngineConfig, GatingResolver, PersistedPreference};
use crate::constants::ANNOUNCEMENT_THREAD_NAME;
use crate::error::AnnouncementError;
use crate::logging::{log_announcement_operation, log_error};
use crate::models::{HandlerResult, HandlerStatus};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// One queued announcement, consumed exactly once by the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AnnouncementRequest {
    pub text: String,
    pub voice: Option<String>,
}

/// Count of requests enqueued and not yet finished
#[derive(Default)]
struct PendingCounter {
    count: Mutex<usize>,
    idle: Condvar,
}

impl PendingCounter {
    fn increment(&self) {
        *self.count.lock() += 1;
    }

    fn complete(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn current(&self) -> usize {
        *self.count.lock()
    }

    fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut count = self.count.lock();
        while *count > 0 {
            match deadline {
                Some(deadline) => {
                    if self.idle.wait_until(&mut count, deadline).timed_out() {
                        return *count == 0;
                    }
                }
                // Deadline beyond what Instant can represent
                None => self.idle.wait(&mut count),
            }
        }
        true
    }
}

/// Owner of the announcement queue and its consumer thread
pub struct AnnouncementWorker {
    max_length: usize,
    gating: GatingResolver,
    voice_preference: Option<PersistedPreference>,
    playback: Arc<PlaybackPolicy>,
    sender: Mutex<Option<Sender<AnnouncementRequest>>>,
    pending: Arc<PendingCounter>,
}

impl AnnouncementWorker {
    pub fn new(config: &EngineConfig, gating: GatingResolver, playback: PlaybackPolicy) -> Self {
        Self {
            max_length: config.max_announcement_length,
            gating,
            voice_preference: config
                .preferences_path
                .as_ref()
                .map(|path| PersistedPreference::new(path.clone())),
            playback: Arc::new(playback),
            sender: Mutex::new(None),
            pending: Arc::new(PendingCounter::default()),
        }
    }

    /// Entry point for the SPEAK handler. Never blocks on playback.
    pub fn speak(&self, text: &str, voice: Option<&str>) -> HandlerResult {
        let length = text.chars().count();

        if length == 0 {
            warn!("SPEAK called without text");
            return HandlerResult::new(HandlerStatus::NoText);
        }

        if length > self.max_length {
            warn!(length, max = self.max_length, "SPEAK text too long");
            return HandlerResult::new(HandlerStatus::TooLong)
                .with_detail("length", length)
                .with_detail("max_length", self.max_length);
        }

        let decision = self.gating.resolve();
        if !decision.enabled {
            debug!(source = %decision.source, "Speech disabled, announcement skipped");
            return HandlerResult::new(HandlerStatus::Disabled).with_detail("source", decision.source);
        }

        let voice = voice
            .map(str::to_string)
            .or_else(|| self.voice_preference.as_ref().and_then(|pref| pref.voice()));
        let request = AnnouncementRequest {
            text: text.to_string(),
            voice,
        };

        match self.enqueue(request) {
            Ok(()) => {
                log_announcement_operation("enqueue", None, length, "queued", None);
                HandlerResult::new(HandlerStatus::Queued)
            }
            Err(e) => {
                log_error("announcement_worker", "enqueue", &e.to_string(), None);
                HandlerResult::new(HandlerStatus::Error).with_detail("error", e.to_string())
            }
        }
    }

    /// Queue a request, starting the consumer thread on first use.
    /// Only reachable through `speak`, after the length and gating checks.
    fn enqueue(&self, request: AnnouncementRequest) -> Result<(), AnnouncementError> {
        let mut sender = self.sender.lock();
        let tx = match sender.as_ref() {
            Some(tx) => tx.clone(),
            None => {
                let tx = self.spawn_consumer()?;
                *sender = Some(tx.clone());
                tx
            }
        };

        self.pending.increment();
        if tx.send(request).is_err() {
            // Consumer is gone; the next enqueue starts a fresh one.
            self.pending.complete();
            *sender = None;
            return Err(AnnouncementError::QueueClosed);
        }
        Ok(())
    }

    fn spawn_consumer(&self) -> Result<Sender<AnnouncementRequest>, AnnouncementError> {
        let (tx, rx) = channel::unbounded();
        let playback = Arc::clone(&self.playback);
        let pending = Arc::clone(&self.pending);

        thread::Builder::new()
            .name(ANNOUNCEMENT_THREAD_NAME.into())
            .spawn(move || consume(rx, playback, pending))
            .map_err(|e| AnnouncementError::WorkerSpawn(e.to_string()))?;

        info!(thread = ANNOUNCEMENT_THREAD_NAME, "Announcement worker started");
        Ok(tx)
    }

    /// Requests enqueued and not yet finished playing
    pub fn queue_depth(&self) -> usize {
        self.pending.current()
    }

    pub fn is_running(&self) -> bool {
        self.sender.lock().is_some()
    }

    /// Wait until the queue drains or `timeout` elapses; true when drained
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.pending.wait_idle(timeout)
    }

    pub fn gating(&self) -> &GatingResolver {
        &self.gating
    }
}

impl std::fmt::Debug for AnnouncementWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnouncementWorker")
            .field("max_length", &self.max_length)
            .field("gating", &self.gating)
            .field("playback", &self.playback)
            .field("running", &self.is_running())
            .field("queue_depth", &self.queue_depth())
            .finish()
    }
}

/// Consumer loop: one playback at a time, in enqueue order, until the queue closes
fn consume(
    rx: Receiver<AnnouncementRequest>,
    playback: Arc<PlaybackPolicy>,
    pending: Arc<PendingCounter>,
) {
    for request in rx.iter() {
        let played = panic::catch_unwind(AssertUnwindSafe(|| {
            playback.play(&request.text, request.voice.as_deref())
        }));
        if played.is_err() {
            log_error(
                "announcement_worker",
                "play",
                "speech engine panicked",
                Some("request dropped"),
            );
        }
        pending.complete();
    }
    debug!("Announcement queue closed, worker exiting");
}
