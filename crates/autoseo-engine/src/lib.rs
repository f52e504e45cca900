//! # autoseo-engine
//!
//! Autonomous content optimization engine.
//!
//! This crate provides:
//! - Urgency-ordered work queue with per-URL deduplication
//! - System-wide circuit breaker and jittered exponential backoff
//! - Scan, Score, Generate and Publish phase executors
//! - Engine controller with start/stop/pause/resume lifecycle
//! - Activity/history recorder, event stream and markdown journal
//! - Content stores for generated artifacts

pub mod backoff;
mod circuit_breaker;
mod collaborators;
mod engine;
mod events;
mod journal;
pub mod metrics;
mod pacing;
pub mod phases;
mod queue;
mod recorder;
pub mod schedule;
mod session;
mod state_machine;
mod store;
pub mod targeting;

pub use backoff::Backoff;
pub use circuit_breaker::{BreakerCheck, CircuitBreaker, CircuitState};
pub use collaborators::{
    Collaborators, ConfigSource, ContentGenerator, ContentStore, PageAnalyzer, ProgressCallback,
    Publisher, StaticConfigSource, UrlSource,
};
pub use engine::{Engine, StartOptions};
pub use events::{EngineChannels, EngineEvent, EngineSnapshot};
pub use journal::ActivityJournal;
pub use metrics::{QualitySummary, QualityTracker, QualityTrend};
pub use pacing::sleep_or_cancel;
pub use queue::{urgency, OptimizationQueue};
pub use recorder::Recorder;
pub use state_machine::{transition, Action, Event};
pub use store::{JsonlContentStore, MemoryContentStore};
