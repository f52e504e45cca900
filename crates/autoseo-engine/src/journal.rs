//! Activity journal - human-readable engine log in `.autoseo/activity.md`
//!
//! Mirrors the live activity feed and terminal outcomes to a markdown file
//! so a session can be reviewed after the fact.

use autoseo_core::fail_open::fail_open;
use autoseo_core::{ActivityLogEntry, EngineStats, HistoryEntry};
use chrono::Utc;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Maximum characters of generated content quoted per history entry
const JOURNAL_PREVIEW_CHARS: usize = 300;

/// Markdown journal of engine activity
#[derive(Debug, Clone)]
pub struct ActivityJournal {
    output_path: PathBuf,
}

impl ActivityJournal {
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            output_path: state_dir.join("activity.md"),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.output_path
    }

    /// Start a new session section (fail-open)
    pub async fn log_session_start(&self, priority_only: bool, queued: usize) {
        fail_open("activity_journal::log_session_start", || async {
            let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
            let mode = if priority_only { "priority-only" } else { "full" };
            let content = format!(
                "# AutoSEO Session\n\n**Started**: {}\n**Mode**: {}\n**Pre-queued**: {}\n\n---\n\n",
                timestamp, mode, queued
            );
            self.append_internal(&content).await
        })
        .await;
    }

    /// Append one activity line (fail-open)
    pub async fn log_activity(&self, entry: &ActivityLogEntry) {
        fail_open("activity_journal::log_activity", || async {
            let mut line = format!(
                "- `{}` **{}** {}\n",
                entry.timestamp.format("%H:%M:%S"),
                entry.kind,
                entry.message
            );
            if let Some(details) = &entry.details {
                line.push_str(&format!("  > {}\n", details.replace('\n', "\n  > ")));
            }
            self.append_internal(&line).await
        })
        .await;
    }

    /// Append a terminal outcome (fail-open)
    pub async fn log_outcome(&self, entry: &HistoryEntry) {
        fail_open("activity_journal::log_outcome", || async {
            let mut content = format!("### {}: {}\n\n", entry.action, entry.url);

            if let Some(score) = entry.quality_score {
                content.push_str(&format!("**Quality**: {}\n", score));
            }
            if let Some(words) = entry.word_count {
                content.push_str(&format!("**Words**: {}\n", words));
            }
            if let Some(ms) = entry.processing_time_ms {
                content.push_str(&format!("**Time**: {}ms\n", ms));
            }
            if let Some(remote) = &entry.wordpress_url {
                content.push_str(&format!("**Published**: {}\n", remote));
            }
            if let Some(error) = &entry.error {
                content.push_str(&format!("**Error**: {}\n", error));
            }

            if let Some(snapshot) = &entry.generated_content_snapshot {
                let preview = if snapshot.content.chars().count() > JOURNAL_PREVIEW_CHARS {
                    let truncated: String =
                        snapshot.content.chars().take(JOURNAL_PREVIEW_CHARS).collect();
                    format!("{truncated}...")
                } else {
                    snapshot.content.clone()
                };
                content.push_str(&format!("\n**{}**\n> ", snapshot.title));
                content.push_str(&preview.replace('\n', "\n> "));
                content.push('\n');
            }

            content.push_str("\n---\n\n");
            self.append_internal(&content).await
        })
        .await;
    }

    /// Session summary (fail-open)
    pub async fn log_session_end(&self, stats: &EngineStats, reason: &str) {
        fail_open("activity_journal::log_session_end", || async {
            let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
            let content = format!(
                "## Session Summary\n\n\
                **Ended**: {}\n\
                **Reason**: {}\n\
                **Cycles**: {}\n\
                **Processed**: {} ({} ok, {} failed)\n\
                **Average Quality**: {:.1}\n\
                **Words Generated**: {}\n\n",
                timestamp,
                reason,
                stats.cycle_count,
                stats.total_processed,
                stats.success_count,
                stats.error_count,
                stats.avg_quality_score,
                stats.total_words_generated
            );
            self.append_internal(&content).await
        })
        .await;
    }

    async fn append_internal(&self, content: &str) -> autoseo_core::Result<()> {
        if let Some(parent) = self.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output_path)
            .await?;

        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
