//! Generate: multi-pass content generation with a quality gate

use super::{publish, PhaseContext, PublishOutcome};
use crate::backoff::Backoff;
use crate::circuit_breaker::{BreakerCheck, CircuitBreaker};
use crate::collaborators::ProgressCallback;
use crate::events::EngineEvent;
use crate::metrics::{GenerationSample, QualityTracker};
use crate::pacing::sleep_or_cancel;
use crate::queue::OptimizationQueue;
use crate::state_machine::Event;
use crate::targeting::derive_keyword;
use autoseo_core::{
    ActivityKind, ActivityLogEntry, ArtifactStatus, AutoSeoError, EnginePhase, GeneratedArtifact,
    GeneratedContent, HistoryAction, HistoryEntry, QueueItem, QueueSource, Result,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// What happened to the popped item
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateOutcome {
    /// Nothing to do
    QueueEmpty,
    /// Generation is suspended system-wide
    CircuitOpen { remaining: Duration },
    /// Content was produced; `action` is the terminal history action recorded
    Completed {
        action: HistoryAction,
        content: GeneratedContent,
    },
    /// Generation failed and the item went back in the queue
    Requeued { retry_count: u32 },
    /// Generation failed with no retries left
    Dropped,
}

/// Mutable session state the phase works against
pub struct GenerateState<'a> {
    pub queue: &'a mut OptimizationQueue,
    pub breaker: &'a mut CircuitBreaker,
    pub backoff: &'a Backoff,
    pub quality: &'a mut QualityTracker,
}

/// Number of generation passes for an item
pub fn pass_budget(priority_only: bool, source: QueueSource, max_passes: u32) -> u32 {
    if priority_only || source == QueueSource::Manual {
        max_passes.max(1)
    } else {
        1
    }
}

pub async fn run(
    ctx: &PhaseContext,
    priority_only: bool,
    state: GenerateState<'_>,
) -> GenerateOutcome {
    let GenerateState {
        queue,
        breaker,
        backoff,
        quality,
    } = state;

    match breaker.check() {
        BreakerCheck::Blocked { remaining } => {
            ctx.enter(EnginePhase::Waiting, None);
            let poll = Duration::from_secs(ctx.config.circuit_breaker.poll_secs.max(1));
            debug!("Circuit open, {}s until generation resumes", remaining.as_secs());
            sleep_or_cancel(remaining.min(poll), &ctx.cancel).await;
            return GenerateOutcome::CircuitOpen { remaining };
        }
        BreakerCheck::Resumed => {
            sync_breaker(ctx, breaker);
            ctx.recorder
                .success("Circuit breaker cooldown elapsed; resuming generation")
                .await;
        }
        BreakerCheck::Allowed => {}
    }

    let Some(mut item) = queue.pop() else {
        return GenerateOutcome::QueueEmpty;
    };
    ctx.publish_queue(queue);
    ctx.enter(EnginePhase::Generating, Some(&item.url));

    let keyword = derive_keyword(&item.url);
    let passes = pass_budget(priority_only, item.source, ctx.config.quality.max_passes);
    ctx.recorder
        .info(format!(
            "Generating content for {} (keyword \"{}\", {} priority)",
            item.url, keyword, item.priority
        ))
        .await;

    let started = Instant::now();
    match generate_passes(ctx, &item, &keyword, passes).await {
        Ok((content, passes_used)) => {
            breaker.record_success();
            sync_breaker(ctx, breaker);
            // Clear a lingering error status before the inter-item pause
            ctx.lifecycle(Event::PhaseRecovered).await;

            let elapsed_ms = started.elapsed().as_millis() as u64;
            quality.record(GenerationSample {
                quality_score: content.quality_score,
                duration_ms: elapsed_ms,
                passes: passes_used,
            });

            let action = finish(ctx, &item, &keyword, &content, elapsed_ms).await;
            GenerateOutcome::Completed { action, content }
        }
        Err(e) => {
            if breaker.record_failure() {
                ctx.recorder
                    .error(format!(
                        "Circuit breaker tripped after {} consecutive failures; generation paused for {}s",
                        breaker.consecutive_failures(),
                        breaker.time_until_retry().as_secs()
                    ))
                    .await;
            }
            sync_breaker(ctx, breaker);
            retry_or_drop(ctx, queue, backoff, &mut item, e).await
        }
    }
}

/// Run up to `passes` generations, keeping the best-scoring draft
async fn generate_passes(
    ctx: &PhaseContext,
    item: &QueueItem,
    keyword: &str,
    passes: u32,
) -> Result<(GeneratedContent, u32)> {
    let target = ctx.config.quality.target_quality;
    let pass_delay = Duration::from_millis(ctx.config.quality.pass_delay_ms);
    let mut best: Option<GeneratedContent> = None;
    let mut passes_used = 0;

    for pass in 1..=passes {
        if pass > 1 && !sleep_or_cancel(pass_delay, &ctx.cancel).await {
            break;
        }

        let attempt = match ctx.settings() {
            Ok(settings) => {
                ctx.collaborators
                    .generator
                    .generate(keyword, &settings, Some(progress_callback(ctx, &item.url)))
                    .await
            }
            Err(e) => Err(e),
        };
        passes_used = pass;

        match attempt {
            Ok(content) => {
                let score = content.quality_score;
                if passes > 1 {
                    ctx.recorder
                        .info(format!("Pass {}/{} scored {} for {}", pass, passes, score, item.url))
                        .await;
                }
                if best.as_ref().map_or(true, |b| score > b.quality_score) {
                    best = Some(content);
                }
                if score >= target {
                    break;
                }
            }
            Err(e) => match best {
                Some(_) => {
                    warn!(url = %item.url, "Pass {} failed, keeping best draft: {}", pass, e);
                    break;
                }
                None => return Err(e),
            },
        }
    }

    best.map(|content| (content, passes_used)).ok_or_else(|| {
        AutoSeoError::Generator(format!("no draft produced for {}", item.url))
    })
}

/// Store the content and record the terminal outcome
async fn finish(
    ctx: &PhaseContext,
    item: &QueueItem,
    keyword: &str,
    content: &GeneratedContent,
    elapsed_ms: u64,
) -> HistoryAction {
    let threshold = ctx.config.quality.quality_threshold;

    if content.quality_score < threshold {
        let reason = format!(
            "Quality score {} is below the publish threshold {}; saved for manual review",
            content.quality_score, threshold
        );
        store(
            ctx,
            GeneratedArtifact::new(&item.url, keyword, content.clone(), ArtifactStatus::PendingReview)
                .with_note(reason.clone()),
        )
        .await;
        ctx.recorder
            .log(
                ActivityLogEntry::new(ActivityKind::Warning, format!("Skipped {}", item.url))
                    .with_details(reason.clone()),
            )
            .await;
        ctx.recorder
            .record(
                HistoryEntry::new(&item.url, HistoryAction::Skipped)
                    .with_content(content)
                    .with_processing_time(elapsed_ms)
                    .with_error(reason),
            )
            .await;
        throttle(ctx).await;
        return HistoryAction::Skipped;
    }

    if ctx.config.publishing.auto_publish && !ctx.is_cancelled() {
        return match publish::run(ctx, &item.url, content, elapsed_ms).await {
            PublishOutcome::Published { remote_url } => {
                store(
                    ctx,
                    GeneratedArtifact::new(&item.url, keyword, content.clone(), ArtifactStatus::Published)
                        .with_remote_url(remote_url),
                )
                .await;
                HistoryAction::Published
            }
            PublishOutcome::Failed { error } => {
                store(
                    ctx,
                    GeneratedArtifact::new(
                        &item.url,
                        keyword,
                        content.clone(),
                        ArtifactStatus::PublishFailed,
                    )
                    .with_note(error),
                )
                .await;
                HistoryAction::Error
            }
        };
    }

    store(
        ctx,
        GeneratedArtifact::new(&item.url, keyword, content.clone(), ArtifactStatus::PendingPublish),
    )
    .await;
    ctx.recorder
        .success(format!(
            "Generated {} words for {} (quality {})",
            content.word_count, item.url, content.quality_score
        ))
        .await;
    ctx.recorder
        .record(
            HistoryEntry::new(&item.url, HistoryAction::Generated)
                .with_content(content)
                .with_processing_time(elapsed_ms),
        )
        .await;
    throttle(ctx).await;
    HistoryAction::Generated
}

async fn retry_or_drop(
    ctx: &PhaseContext,
    queue: &mut OptimizationQueue,
    backoff: &Backoff,
    item: &mut QueueItem,
    error: AutoSeoError,
) -> GenerateOutcome {
    let max_retries = ctx.config.retry.max_retries;

    if item.retry_count >= max_retries {
        let exhausted = AutoSeoError::ExhaustedRetries {
            url: item.url.clone(),
            attempts: item.retry_count + 1,
            last_error: error.to_string(),
        };
        ctx.recorder.error(exhausted.to_string()).await;
        ctx.recorder
            .record(HistoryEntry::new(&item.url, HistoryAction::Error).with_error(exhausted.to_string()))
            .await;
        return GenerateOutcome::Dropped;
    }

    let delay = backoff.delay(item.retry_count);
    item.retry_count += 1;
    item.last_error = Some(error.to_string());
    ctx.recorder
        .log(
            ActivityLogEntry::new(
                ActivityKind::Warning,
                format!(
                    "Generation failed for {} (retry {}/{}), retrying in {}s",
                    item.url,
                    item.retry_count,
                    max_retries,
                    delay.as_secs()
                ),
            )
            .with_details(error.to_string()),
        )
        .await;

    ctx.enter(EnginePhase::Waiting, Some(&item.url));
    sleep_or_cancel(delay, &ctx.cancel).await;

    let retry_count = item.retry_count;
    queue.requeue(item.clone());
    ctx.publish_queue(queue);
    GenerateOutcome::Requeued { retry_count }
}

fn progress_callback(ctx: &PhaseContext, url: &str) -> ProgressCallback {
    let channels = ctx.channels.clone();
    let url = url.to_string();
    Arc::new(move |message: String| {
        channels.emit(EngineEvent::GenerationProgress {
            url: url.clone(),
            message,
        });
    })
}

async fn store(ctx: &PhaseContext, artifact: GeneratedArtifact) {
    if let Err(e) = ctx.collaborators.store.save(&artifact).await {
        ctx.recorder
            .log(
                ActivityLogEntry::new(
                    ActivityKind::Warning,
                    format!("Could not store generated content for {}", artifact.url),
                )
                .with_details(e.to_string()),
            )
            .await;
    }
}

fn sync_breaker(ctx: &PhaseContext, breaker: &CircuitBreaker) {
    let failures = breaker.consecutive_failures();
    let open = breaker.is_open();
    ctx.channels.update(|s| {
        s.consecutive_failures = failures;
        s.circuit_open = open;
    });
}

/// Inter-item pause after an outcome that did not go through publishing
async fn throttle(ctx: &PhaseContext) {
    let interval = ctx.config.schedule.processing_interval();
    if interval.is_zero() {
        return;
    }
    info!("Next item in {}s", interval.as_secs());
    ctx.enter(EnginePhase::Waiting, None);
    sleep_or_cancel(interval, &ctx.cancel).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_budget() {
        assert_eq!(pass_budget(false, QueueSource::Scan, 3), 1);
        assert_eq!(pass_budget(true, QueueSource::Scan, 3), 3);
        assert_eq!(pass_budget(false, QueueSource::Manual, 4), 4);
        assert_eq!(pass_budget(true, QueueSource::Manual, 0), 1);
    }
}
