//! Activity and history recorder
//!
//! Append-only logs of engine decisions (activity) and terminal outcomes
//! (history). The live views keep only the most recent entries; the journal
//! and the content store keep the full record downstream.

use crate::events::{EngineChannels, EngineEvent};
use crate::journal::ActivityJournal;
use autoseo_core::{ActivityKind, ActivityLogEntry, EngineStats, HistoryEntry};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Handle for appending to the activity log and outcome history
#[derive(Clone)]
pub struct Recorder {
    channels: Arc<EngineChannels>,
    activity_limit: usize,
    history_limit: usize,
    journal: Option<ActivityJournal>,
}

impl Recorder {
    pub fn new(channels: Arc<EngineChannels>, activity_limit: usize, history_limit: usize) -> Self {
        Self {
            channels,
            activity_limit: activity_limit.max(1),
            history_limit: history_limit.max(1),
            journal: None,
        }
    }

    /// Mirror entries into a markdown journal
    pub fn with_journal(mut self, journal: ActivityJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn journal(&self) -> Option<&ActivityJournal> {
        self.journal.as_ref()
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.log(ActivityLogEntry::new(ActivityKind::Info, message))
            .await;
    }

    pub async fn success(&self, message: impl Into<String>) {
        self.log(ActivityLogEntry::new(ActivityKind::Success, message))
            .await;
    }

    pub async fn warning(&self, message: impl Into<String>) {
        self.log(ActivityLogEntry::new(ActivityKind::Warning, message))
            .await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.log(ActivityLogEntry::new(ActivityKind::Error, message))
            .await;
    }

    /// Append an activity entry
    pub async fn log(&self, entry: ActivityLogEntry) {
        match entry.kind {
            ActivityKind::Info | ActivityKind::Success => info!("{}", entry.message),
            ActivityKind::Warning => warn!("{}", entry.message),
            ActivityKind::Error => error!("{}", entry.message),
        }

        let limit = self.activity_limit;
        self.channels.update(|s| {
            s.activity.push(entry.clone());
            if s.activity.len() > limit {
                let excess = s.activity.len() - limit;
                s.activity.drain(..excess);
            }
        });

        if let Some(journal) = &self.journal {
            journal.log_activity(&entry).await;
        }
        self.channels.emit(EngineEvent::Activity { entry });
    }

    /// Append a terminal outcome
    pub async fn record(&self, entry: HistoryEntry) {
        info!(url = %entry.url, action = %entry.action, "Recorded outcome");

        let limit = self.history_limit;
        self.channels.update(|s| {
            s.history.push(entry.clone());
            if s.history.len() > limit {
                let excess = s.history.len() - limit;
                s.history.drain(..excess);
            }
        });

        if let Some(journal) = &self.journal {
            journal.log_outcome(&entry).await;
        }
        self.channels.emit(EngineEvent::History { entry });
    }

    /// Close the journal section for a session
    pub async fn session_end(&self, stats: &EngineStats, reason: &str) {
        if let Some(journal) = &self.journal {
            journal.log_session_end(stats, reason).await;
        }
    }
}
