//! Score: analyze candidates and queue the unhealthy ones

use super::PhaseContext;
use crate::pacing::sleep_or_cancel;
use crate::queue::OptimizationQueue;
use crate::targeting::is_excluded;
use autoseo_core::{ActivityKind, ActivityLogEntry, EnginePhase, Priority, QueueItem};
use futures::future::join_all;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreOutcome {
    pub evaluated: usize,
    pub queued: usize,
    /// URLs the analyzer could not handle, in scoring order
    pub failed: Vec<String>,
    pub excluded: usize,
}

pub async fn run(
    ctx: &PhaseContext,
    candidates: Vec<String>,
    queue: &mut OptimizationQueue,
) -> ScoreOutcome {
    ctx.enter(EnginePhase::Scoring, None);

    let site = &ctx.config.site;
    let scoring = &ctx.config.scoring;
    let min_health = ctx.config.quality.min_health_score;
    let mut outcome = ScoreOutcome::default();

    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for url in candidates {
        if !seen.insert(url.clone()) || queue.contains(&url) {
            continue;
        }
        if is_excluded(&url, site) {
            outcome.excluded += 1;
            continue;
        }
        targets.push(url);
    }

    let batch_delay = Duration::from_millis(scoring.batch_delay_ms);
    for (index, batch) in targets.chunks(scoring.batch_size.max(1)).enumerate() {
        if index > 0 && !sleep_or_cancel(batch_delay, &ctx.cancel).await {
            debug!("Scoring interrupted by stop");
            break;
        }

        let analyzer = &ctx.collaborators.analyzer;
        let results = join_all(
            batch
                .iter()
                .map(|url| async move { (url, analyzer.analyze(url).await) }),
        )
        .await;

        for (url, result) in results {
            match result {
                Ok(analysis) => {
                    outcome.evaluated += 1;
                    if analysis.health_score >= min_health {
                        continue;
                    }
                    let priority = site
                        .priority_override(url)
                        .unwrap_or_else(|| Priority::from_health_score(analysis.health_score));
                    if queue.insert(QueueItem::new(url.clone(), priority, analysis.health_score)) {
                        outcome.queued += 1;
                        debug!(url = %url, %priority, health = analysis.health_score, "Queued");
                    }
                }
                Err(e) => {
                    outcome.failed.push(url.clone());
                    ctx.recorder
                        .log(
                            ActivityLogEntry::new(
                                ActivityKind::Warning,
                                format!("Could not analyze {}, skipping for now", url),
                            )
                            .with_details(e.to_string()),
                        )
                        .await;
                }
            }
        }
    }

    queue.resort();
    ctx.publish_queue(queue);
    ctx.recorder
        .info(format!(
            "Scored {} pages, {} queued for optimization",
            outcome.evaluated, outcome.queued
        ))
        .await;

    outcome
}
