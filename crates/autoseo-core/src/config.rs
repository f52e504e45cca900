//! Configuration management for AutoSEO
//!
//! Engine settings live in `.autoseo/config.toml` in the project root. Every
//! section is optional; missing keys fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{AutoSeoError, Priority, PostStatus, Result};

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub quality: QualityConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub publishing: PublishingConfig,

    #[serde(default)]
    pub recorder: RecorderConfig,
}

/// Which site to optimize and which URLs to leave alone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Base URL of the site
    #[serde(default)]
    pub url: Option<String>,

    /// Sitemap location; defaults to `{url}/sitemap.xml`
    #[serde(default)]
    pub sitemap_url: Option<String>,

    /// URLs never queued
    #[serde(default)]
    pub excluded_urls: Vec<String>,

    /// Path segments (e.g. `tag`, `author`) whose pages are never queued
    #[serde(default)]
    pub excluded_categories: Vec<String>,

    /// Caller-supplied priority list, used by priority-only mode and as an override while scoring
    #[serde(default)]
    pub priority_urls: Vec<PriorityUrl>,
}

/// A URL pinned to an explicit priority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityUrl {
    pub url: String,
    #[serde(default)]
    pub priority: Priority,
}

/// When and how fast the engine works
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_scan_interval_hours")]
    pub scan_interval_hours: u64,

    /// Pause between processed items
    #[serde(default = "default_processing_interval_secs")]
    pub processing_interval_secs: u64,

    /// First active hour of the day (local time, inclusive)
    #[serde(default)]
    pub active_start_hour: u32,

    /// Last active hour of the day (local time, exclusive)
    #[serde(default = "default_active_end_hour")]
    pub active_end_hour: u32,

    #[serde(default)]
    pub exclude_weekends: bool,

    /// Items processed per calendar day; 0 disables the quota
    #[serde(default = "default_daily_quota")]
    pub daily_quota: u32,
}

/// Thresholds for analysis and generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Pages scoring below this health are queued
    #[serde(default = "default_min_health_score")]
    pub min_health_score: u8,

    /// User-set gate: content below this is held for review instead of published
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: u8,

    /// Internal target that ends the multi-pass loop early
    #[serde(default = "default_target_quality")]
    pub target_quality: u8,

    /// Generation passes in priority/manual mode (normal mode always uses one)
    #[serde(default = "default_max_passes")]
    pub max_passes: u32,

    #[serde(default = "default_pass_delay_ms")]
    pub pass_delay_ms: u64,
}

/// Per-item retry policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

/// System-wide generation suspension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive generation failures before tripping
    #[serde(default = "default_breaker_threshold")]
    pub threshold: u32,

    #[serde(default = "default_breaker_cooldown_secs")]
    pub cooldown_secs: u64,

    /// How long the loop sleeps while the breaker is open
    #[serde(default = "default_breaker_poll_secs")]
    pub poll_secs: u64,
}

/// Score phase batching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

/// Publish behavior
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishingConfig {
    #[serde(default)]
    pub auto_publish: bool,

    #[serde(default)]
    pub post_status: PostStatus,
}

/// Retention for the live activity/history views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecorderConfig {
    #[serde(default = "default_activity_limit")]
    pub activity_limit: usize,

    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Mirror activity into `.autoseo/activity.md`
    #[serde(default)]
    pub journal: bool,
}

/// Upper bound on the rescan interval (one year)
pub const MAX_SCAN_INTERVAL_HOURS: u64 = 24 * 366;

// Default value providers
fn default_scan_interval_hours() -> u64 {
    24
}

fn default_processing_interval_secs() -> u64 {
    300
}

fn default_active_end_hour() -> u32 {
    24
}

fn default_daily_quota() -> u32 {
    20
}

fn default_min_health_score() -> u8 {
    70
}

fn default_quality_threshold() -> u8 {
    75
}

fn default_target_quality() -> u8 {
    85
}

fn default_max_passes() -> u32 {
    3
}

fn default_pass_delay_ms() -> u64 {
    2_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    30_000
}

fn default_max_delay_ms() -> u64 {
    300_000
}

fn default_breaker_threshold() -> u32 {
    5
}

fn default_breaker_cooldown_secs() -> u64 {
    600
}

fn default_breaker_poll_secs() -> u64 {
    60
}

fn default_batch_size() -> usize {
    3
}

fn default_batch_delay_ms() -> u64 {
    1_500
}

fn default_activity_limit() -> usize {
    100
}

fn default_history_limit() -> usize {
    500
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            scan_interval_hours: default_scan_interval_hours(),
            processing_interval_secs: default_processing_interval_secs(),
            active_start_hour: 0,
            active_end_hour: default_active_end_hour(),
            exclude_weekends: false,
            daily_quota: default_daily_quota(),
        }
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_health_score: default_min_health_score(),
            quality_threshold: default_quality_threshold(),
            target_quality: default_target_quality(),
            max_passes: default_max_passes(),
            pass_delay_ms: default_pass_delay_ms(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            threshold: default_breaker_threshold(),
            cooldown_secs: default_breaker_cooldown_secs(),
            poll_secs: default_breaker_poll_secs(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            activity_limit: default_activity_limit(),
            history_limit: default_history_limit(),
            journal: false,
        }
    }
}

impl ScheduleConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_hours.saturating_mul(3600))
    }

    pub fn processing_interval(&self) -> Duration {
        Duration::from_secs(self.processing_interval_secs)
    }
}

impl SiteConfig {
    /// Explicit priority for a URL, if the caller pinned one
    pub fn priority_override(&self, url: &str) -> Option<Priority> {
        self.priority_urls
            .iter()
            .find(|p| p.url == url)
            .map(|p| p.priority)
    }

    /// Resolved sitemap location
    pub fn sitemap_location(&self) -> Option<String> {
        self.sitemap_url.clone().or_else(|| {
            self.url
                .as_ref()
                .map(|u| format!("{}/sitemap.xml", u.trim_end_matches('/')))
        })
    }
}

impl EngineConfig {
    /// Load configuration from `.autoseo/config.toml` or use defaults
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let config_path = root.join(".autoseo/config.toml");

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Self = toml::from_str(&content).map_err(|e| {
                AutoSeoError::Configuration(format!("Failed to parse config file: {}", e))
            })?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Write default configuration to `.autoseo/config.toml`
    pub fn write_default(root: &Path) -> Result<()> {
        let config_dir = root.join(".autoseo");
        std::fs::create_dir_all(&config_dir)?;

        let content = toml::to_string_pretty(&Self::default()).map_err(|e| {
            AutoSeoError::Configuration(format!("Failed to serialize config: {}", e))
        })?;
        std::fs::write(config_dir.join("config.toml"), content)?;
        Ok(())
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let s = &self.schedule;
        if s.scan_interval_hours == 0 || s.scan_interval_hours > MAX_SCAN_INTERVAL_HOURS {
            return Err(AutoSeoError::Configuration(format!(
                "schedule.scan_interval_hours must be between 1 and {} (got {})",
                MAX_SCAN_INTERVAL_HOURS, s.scan_interval_hours
            )));
        }
        if s.processing_interval_secs == 0 {
            return Err(AutoSeoError::Configuration(
                "schedule.processing_interval_secs must be at least 1".to_string(),
            ));
        }
        if s.active_end_hour > 24 || s.active_start_hour >= s.active_end_hour {
            return Err(AutoSeoError::Configuration(format!(
                "active hours must satisfy 0 <= start < end <= 24 (got {}..{})",
                s.active_start_hour, s.active_end_hour
            )));
        }
        if self.scoring.batch_size == 0 {
            return Err(AutoSeoError::Configuration(
                "scoring.batch_size must be at least 1".to_string(),
            ));
        }
        if self.quality.max_passes == 0 {
            return Err(AutoSeoError::Configuration(
                "quality.max_passes must be at least 1".to_string(),
            ));
        }
        if self.quality.quality_threshold > 100 || self.quality.target_quality > 100 {
            return Err(AutoSeoError::Configuration(
                "quality thresholds are percentages (0-100)".to_string(),
            ));
        }
        if self.circuit_breaker.threshold == 0 {
            return Err(AutoSeoError::Configuration(
                "circuit_breaker.threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.quality.target_quality, 85);
        assert!(!config.publishing.auto_publish);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [site]
            url = "https://example.com/"
            excluded_categories = ["tag"]

            [[site.priority_urls]]
            url = "https://example.com/pricing"
            priority = "critical"

            [quality]
            quality_threshold = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.quality.quality_threshold, 60);
        assert_eq!(config.quality.min_health_score, 70);
        assert_eq!(config.schedule.daily_quota, 20);
        assert_eq!(
            config.site.priority_override("https://example.com/pricing"),
            Some(Priority::Critical)
        );
        assert_eq!(
            config.site.sitemap_location().as_deref(),
            Some("https://example.com/sitemap.xml")
        );
    }

    #[test]
    fn test_invalid_active_hours() {
        let mut config = EngineConfig::default();
        config.schedule.active_start_hour = 18;
        config.schedule.active_end_hour = 9;
        assert!(matches!(
            config.validate(),
            Err(AutoSeoError::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_or_unbounded_intervals_rejected() {
        let mut config = EngineConfig::default();
        config.schedule.scan_interval_hours = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.schedule.scan_interval_hours = u64::MAX;
        assert!(config.validate().is_err());
        assert_eq!(
            config.schedule.scan_interval(),
            Duration::from_secs(u64::MAX)
        );

        let mut config = EngineConfig::default();
        config.schedule.processing_interval_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(AutoSeoError::Configuration(_))
        ));

        let mut config = EngineConfig::default();
        config.schedule.scan_interval_hours = MAX_SCAN_INTERVAL_HOURS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_write_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        EngineConfig::write_default(dir.path()).unwrap();
        assert!(dir.path().join(".autoseo/config.toml").exists());

        let loaded = EngineConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(loaded, EngineConfig::default());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let loaded = EngineConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(loaded.scoring.batch_size, 3);
    }
}
