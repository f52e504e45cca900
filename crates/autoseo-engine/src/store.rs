//! Content stores for generated artifacts

use crate::collaborators::ContentStore;
use async_trait::async_trait;
use autoseo_core::{AutoSeoError, GeneratedArtifact, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Append-only JSON lines file, one artifact per line
pub struct JsonlContentStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlContentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store under `<root>/.autoseo/content.jsonl`
    pub fn in_state_dir(root: &Path) -> Self {
        Self::new(root.join(".autoseo").join("content.jsonl"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<GeneratedArtifact>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| AutoSeoError::Store(format!("{}: {}", self.path.display(), e)))?;

        let mut artifacts = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<GeneratedArtifact>(line) {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) => debug!("Skipping unreadable artifact line: {}", e),
            }
        }
        Ok(artifacts)
    }
}

#[async_trait]
impl ContentStore for JsonlContentStore {
    async fn save(&self, artifact: &GeneratedArtifact) -> Result<()> {
        let line = serde_json::to_string(artifact)?;
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AutoSeoError::Store(format!("{}: {}", parent.display(), e)))?;
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| AutoSeoError::Store(format!("{}: {}", self.path.display(), e)))?;

        file.write_all(format!("{line}\n").as_bytes())
            .await
            .map_err(|e| AutoSeoError::Store(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| AutoSeoError::Store(e.to_string()))?;

        debug!(url = %artifact.url, status = ?artifact.status, "Stored artifact");
        Ok(())
    }

    async fn load(&self, url: &str) -> Result<Option<GeneratedArtifact>> {
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .filter(|a| a.url == url)
            .last())
    }

    async fn load_all(&self) -> Result<Vec<GeneratedArtifact>> {
        self.read_all().await
    }
}

/// In-process store
#[derive(Default)]
pub struct MemoryContentStore {
    artifacts: RwLock<Vec<GeneratedArtifact>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn save(&self, artifact: &GeneratedArtifact) -> Result<()> {
        self.artifacts.write().await.push(artifact.clone());
        Ok(())
    }

    async fn load(&self, url: &str) -> Result<Option<GeneratedArtifact>> {
        let artifacts = self.artifacts.read().await;
        Ok(artifacts.iter().rev().find(|a| a.url == url).cloned())
    }

    async fn load_all(&self) -> Result<Vec<GeneratedArtifact>> {
        Ok(self.artifacts.read().await.clone())
    }
}
