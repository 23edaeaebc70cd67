//! # Announcements
//!
//! Gated, serialized speech playback decoupled from lesson execution.
//!
//! ```text
//! SPEAK handler ──speak()──► length checks ─► GatingResolver ─► queue ──► worker thread
//!                                                                         └─► PlaybackPolicy
//!                                                                             ├─ primary engine
//!                                                                             └─ secondary (opt-in)
//! ```

pub mod engine;
pub mod worker;

pub use engine::{CommandEngine, PlaybackOutcome, PlaybackPolicy, SpeechEngine};
pub use worker::AnnouncementWorker;
