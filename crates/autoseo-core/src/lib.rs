//! # autoseo-core
//!
//! Shared building blocks for the AutoSEO optimization engine:
//!
//! - Queue, activity and history data model
//! - Collaborator payloads (analysis, generated content, publish requests)
//! - Unified error type
//! - TOML-backed engine configuration

pub mod config;
mod error;
pub mod fail_open;
mod types;

pub use config::{
    CircuitBreakerConfig, EngineConfig, PriorityUrl, PublishingConfig, QualityConfig,
    RecorderConfig, RetryConfig, ScheduleConfig, ScoringConfig, SiteConfig,
};
pub use error::{AutoSeoError, Result};
pub use types::*;
