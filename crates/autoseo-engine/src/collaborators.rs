//! Contracts the engine requires from the outside world
//!
//! The engine never talks HTTP itself. Discovery, analysis, generation,
//! publishing, persistence and credentials all sit behind these traits so the
//! loop can be driven by real clients or by test doubles.

use async_trait::async_trait;
use autoseo_core::{
    CollaboratorSettings, GeneratedArtifact, GeneratedContent, PageAnalysis, PublishRequest,
    PublishResult, Result,
};
use std::sync::Arc;

/// Progress callback handed to the generator for long-running calls
pub type ProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Discovers the candidate URL set (sitemap, crawl, CMS listing)
#[async_trait]
pub trait UrlSource: Send + Sync {
    async fn discover(&self) -> Result<Vec<String>>;
}

/// Scores a page's content health
#[async_trait]
pub trait PageAnalyzer: Send + Sync {
    async fn analyze(&self, url: &str) -> Result<PageAnalysis>;
}

/// Turns a keyword into finished content with a quality score
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Called once per session before the loop starts
    async fn initialize(&self, _settings: &CollaboratorSettings) -> Result<()> {
        Ok(())
    }

    async fn generate(
        &self,
        keyword: &str,
        settings: &CollaboratorSettings,
        progress: Option<ProgressCallback>,
    ) -> Result<GeneratedContent>;
}

/// Pushes finished content to the remote CMS
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(
        &self,
        request: &PublishRequest,
        settings: &CollaboratorSettings,
    ) -> Result<PublishResult>;
}

/// Durable record of generated artifacts
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn save(&self, artifact: &GeneratedArtifact) -> Result<()>;

    /// Most recent artifact stored for a URL
    async fn load(&self, url: &str) -> Result<Option<GeneratedArtifact>>;

    async fn load_all(&self) -> Result<Vec<GeneratedArtifact>>;
}

/// Read-only snapshot of credentials and model selection
///
/// Pulled on every generate/publish call so live edits take effect without a restart.
pub trait ConfigSource: Send + Sync {
    fn snapshot(&self) -> Result<CollaboratorSettings>;
}

/// A fixed settings snapshot
#[derive(Debug, Clone, Default)]
pub struct StaticConfigSource(pub CollaboratorSettings);

impl ConfigSource for StaticConfigSource {
    fn snapshot(&self) -> Result<CollaboratorSettings> {
        Ok(self.0.clone())
    }
}

/// Everything the engine calls out to
#[derive(Clone)]
pub struct Collaborators {
    pub source: Arc<dyn UrlSource>,
    pub analyzer: Arc<dyn PageAnalyzer>,
    pub generator: Arc<dyn ContentGenerator>,
    pub publisher: Arc<dyn Publisher>,
    pub store: Arc<dyn ContentStore>,
    pub settings: Arc<dyn ConfigSource>,
}
