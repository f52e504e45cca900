//! Unified error types for AutoSEO

use thiserror::Error;

/// Unified error type for all AutoSEO operations
#[derive(Error, Debug)]
pub enum AutoSeoError {
    // Startup errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid engine state: {0}")]
    InvalidState(String),

    // Collaborator errors
    #[error("Scan failed: {0}")]
    Scan(String),

    #[error("Page analysis failed: {0}")]
    Analyzer(String),

    #[error("Content generation failed: {0}")]
    Generator(String),

    #[error("Publishing failed: {0}")]
    Publisher(String),

    #[error("Content store error: {0}")]
    Store(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("HTTP error: {0}")]
    Http(String),

    // Engine-level failures
    #[error("Retries exhausted for {url} after {attempts} attempts: {last_error}")]
    ExhaustedRetries {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Circuit breaker open, {remaining_secs}s until generation resumes")]
    CircuitOpen { remaining_secs: u64 },

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

impl AutoSeoError {
    /// Whether the error came from an external collaborator call
    pub fn is_collaborator(&self) -> bool {
        matches!(
            self,
            Self::Scan(_)
                | Self::Analyzer(_)
                | Self::Generator(_)
                | Self::Publisher(_)
                | Self::Store(_)
                | Self::Auth(_)
                | Self::Http(_)
        )
    }
}

/// Result type alias using AutoSeoError
pub type Result<T> = std::result::Result<T, AutoSeoError>;
