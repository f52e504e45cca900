//! Core type definitions for AutoSEO

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Urgency of a queued URL. Ordering is `Critical < High < Medium < Low`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical = 0,
    High = 1,
    #[default]
    Medium = 2,
    Low = 3,
}

impl Priority {
    /// Score-banded priority: lower health means more urgent
    pub fn from_health_score(score: u8) -> Self {
        match score {
            0..=29 => Self::Critical,
            30..=49 => Self::High,
            50..=69 => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" | "0" => Ok(Self::Critical),
            "high" | "1" => Ok(Self::High),
            "medium" | "2" => Ok(Self::Medium),
            "low" | "3" => Ok(Self::Low),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// Where a queue item came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueSource {
    #[default]
    Scan,
    Manual,
}

/// A URL waiting for optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: Uuid,
    pub url: String,
    pub priority: Priority,
    /// 0-100, lower is more urgent
    pub health_score: u8,
    pub added_at: DateTime<Utc>,
    pub source: QueueSource,
    pub retry_count: u32,
    pub last_error: Option<String>,
}

impl QueueItem {
    pub fn new(url: impl Into<String>, priority: Priority, health_score: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            priority,
            health_score: health_score.min(100),
            added_at: Utc::now(),
            source: QueueSource::Scan,
            retry_count: 0,
            last_error: None,
        }
    }

    pub fn with_source(mut self, source: QueueSource) -> Self {
        self.source = source;
        self
    }
}

/// Severity of an activity log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One engine decision or observation, shown live to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub message: String,
    pub details: Option<String>,
}

impl ActivityLogEntry {
    pub fn new(kind: ActivityKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Terminal outcome of a queue item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Generated,
    Published,
    Skipped,
    Error,
}

impl std::fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generated => write!(f, "generated"),
            Self::Published => write!(f, "published"),
            Self::Skipped => write!(f, "skipped"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Immutable record of what happened to a URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub action: HistoryAction,
    pub quality_score: Option<u8>,
    pub word_count: Option<u32>,
    pub processing_time_ms: Option<u64>,
    pub wordpress_url: Option<String>,
    pub error: Option<String>,
    pub generated_content_snapshot: Option<GeneratedContent>,
}

impl HistoryEntry {
    pub fn new(url: impl Into<String>, action: HistoryAction) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            url: url.into(),
            action,
            quality_score: None,
            word_count: None,
            processing_time_ms: None,
            wordpress_url: None,
            error: None,
            generated_content_snapshot: None,
        }
    }

    pub fn with_content(mut self, content: &GeneratedContent) -> Self {
        self.quality_score = Some(content.quality_score);
        self.word_count = Some(content.word_count);
        self.generated_content_snapshot = Some(content.clone());
        self
    }

    pub fn with_processing_time(mut self, ms: u64) -> Self {
        self.processing_time_ms = Some(ms);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.wordpress_url = Some(url.into());
        self
    }
}

/// Cumulative per-session counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    pub total_processed: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub avg_quality_score: f64,
    pub total_words_generated: u64,
    pub cycle_count: u64,
    pub last_scan_at: Option<DateTime<Utc>>,
    pub next_scan_at: Option<DateTime<Utc>>,
    pub session_started_at: Option<DateTime<Utc>>,
}

impl EngineStats {
    /// Fold a successful generation into the running averages
    pub fn record_success(&mut self, quality_score: u8, word_count: u32) {
        let previous = self.success_count as f64;
        self.success_count += 1;
        self.avg_quality_score =
            (self.avg_quality_score * previous + quality_score as f64) / self.success_count as f64;
        self.total_words_generated += word_count as u64;
    }
}

/// Lifecycle status of the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineStatus {
    #[default]
    Idle,
    Running,
    Paused,
    /// A phase failed; the loop is backing off and will continue
    Error,
}

impl std::fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Pipeline stage currently executing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnginePhase {
    Scanning,
    Scoring,
    Generating,
    Publishing,
    Waiting,
}

impl std::fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scanning => write!(f, "scanning"),
            Self::Scoring => write!(f, "scoring"),
            Self::Generating => write!(f, "generating"),
            Self::Publishing => write!(f, "publishing"),
            Self::Waiting => write!(f, "waiting"),
        }
    }
}

/// Page analyzer output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageAnalysis {
    pub url: String,
    /// 0-100, lower means the page needs work more urgently
    pub health_score: u8,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Finished content produced by the generator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub title: String,
    pub content: String,
    pub seo_title: String,
    pub meta_description: String,
    /// Overall quality, 0-100
    pub quality_score: u8,
    pub word_count: u32,
}

/// Remote post status requested from the publisher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Pending,
    Publish,
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Pending => write!(f, "pending"),
            Self::Publish => write!(f, "publish"),
        }
    }
}

/// Payload handed to the publisher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub title: String,
    pub content: String,
    pub status: PostStatus,
    pub seo_title: String,
    pub meta_description: String,
    pub source_url: String,
}

impl PublishRequest {
    pub fn from_content(content: &GeneratedContent, status: PostStatus, source_url: &str) -> Self {
        Self {
            title: content.title.clone(),
            content: content.content.clone(),
            status,
            seo_title: content.seo_title.clone(),
            meta_description: content.meta_description.clone(),
            source_url: source_url.to_string(),
        }
    }
}

/// Publisher response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishResult {
    pub remote_url: String,
    pub post_id: Option<u64>,
}

/// Credentials and model selection, pulled fresh for every generate/publish call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollaboratorSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub cms_url: Option<String>,
    pub cms_username: Option<String>,
    pub cms_app_password: Option<String>,
}

/// Lifecycle of a stored piece of generated content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    /// Below the publish threshold, waiting for a human
    PendingReview,
    /// Passed the threshold but auto-publish is off
    PendingPublish,
    Published,
    PublishFailed,
}

/// Generated content as recorded by the persistence store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub id: Uuid,
    pub url: String,
    pub keyword: String,
    pub content: GeneratedContent,
    pub status: ArtifactStatus,
    pub created_at: DateTime<Utc>,
    pub remote_url: Option<String>,
    pub note: Option<String>,
}

impl GeneratedArtifact {
    pub fn new(
        url: impl Into<String>,
        keyword: impl Into<String>,
        content: GeneratedContent,
        status: ArtifactStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            keyword: keyword.into(),
            content,
            status,
            created_at: Utc::now(),
            remote_url: None,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Critical < Priority::High);
        assert!(Priority::High < Priority::Medium);
        assert!(Priority::Medium < Priority::Low);
    }

    #[test]
    fn test_priority_from_health_score_bands() {
        assert_eq!(Priority::from_health_score(0), Priority::Critical);
        assert_eq!(Priority::from_health_score(29), Priority::Critical);
        assert_eq!(Priority::from_health_score(30), Priority::High);
        assert_eq!(Priority::from_health_score(49), Priority::High);
        assert_eq!(Priority::from_health_score(50), Priority::Medium);
        assert_eq!(Priority::from_health_score(69), Priority::Medium);
        assert_eq!(Priority::from_health_score(70), Priority::Low);
        assert_eq!(Priority::from_health_score(100), Priority::Low);
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!("critical".parse::<Priority>().unwrap(), Priority::Critical);
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("3".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_queue_item_clamps_health() {
        let item = QueueItem::new("https://example.com", Priority::High, 250);
        assert_eq!(item.health_score, 100);
        assert_eq!(item.retry_count, 0);
        assert_eq!(item.source, QueueSource::Scan);
    }

    #[test]
    fn test_activity_entry_serializes_kind_as_type() {
        let entry = ActivityLogEntry::new(ActivityKind::Warning, "slow analyzer");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "warning");
        assert_eq!(json["message"], "slow analyzer");
    }

    #[test]
    fn test_stats_running_average() {
        let mut stats = EngineStats::default();
        stats.record_success(80, 1000);
        stats.record_success(60, 500);
        assert_eq!(stats.success_count, 2);
        assert!((stats.avg_quality_score - 70.0).abs() < f64::EPSILON);
        assert_eq!(stats.total_words_generated, 1500);
    }

    #[test]
    fn test_history_entry_with_content() {
        let content = GeneratedContent {
            title: "Title".into(),
            quality_score: 88,
            word_count: 1200,
            ..Default::default()
        };
        let entry = HistoryEntry::new("https://example.com/a", HistoryAction::Generated)
            .with_content(&content);
        assert_eq!(entry.quality_score, Some(88));
        assert_eq!(entry.word_count, Some(1200));
        assert_eq!(entry.generated_content_snapshot.unwrap().title, "Title");
    }
}
