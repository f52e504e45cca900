//! Publish: push finished content to the CMS

use super::PhaseContext;
use autoseo_core::{
    EnginePhase, GeneratedContent, HistoryAction, HistoryEntry, PublishRequest,
};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published { remote_url: String },
    Failed { error: String },
}

/// Publish one piece of content and record the terminal history entry
pub async fn run(
    ctx: &PhaseContext,
    url: &str,
    content: &GeneratedContent,
    processing_time_ms: u64,
) -> PublishOutcome {
    ctx.enter(EnginePhase::Publishing, Some(url));

    let request = PublishRequest::from_content(content, ctx.config.publishing.post_status, url);
    let result = match ctx.settings() {
        Ok(settings) => {
            ctx.collaborators
                .publisher
                .publish(&request, &settings)
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(published) => {
            ctx.recorder
                .success(format!("Published {} as {}", url, published.remote_url))
                .await;
            ctx.recorder
                .record(
                    HistoryEntry::new(url, HistoryAction::Published)
                        .with_content(content)
                        .with_processing_time(processing_time_ms)
                        .with_remote_url(published.remote_url.clone()),
                )
                .await;
            PublishOutcome::Published {
                remote_url: published.remote_url,
            }
        }
        Err(e) => {
            warn!(url = %url, "Publish failed: {}", e);
            let error = format!("Content was generated but not published: {}", e);
            ctx.recorder.error(format!("{} ({})", error, url)).await;
            ctx.recorder
                .record(
                    HistoryEntry::new(url, HistoryAction::Error)
                        .with_content(content)
                        .with_processing_time(processing_time_ms)
                        .with_error(error.clone()),
                )
                .await;
            PublishOutcome::Failed { error }
        }
    }
}
