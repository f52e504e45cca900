//! Main optimization loop
//!
//! One session runs as a single task that owns the queue, stats, circuit
//! breaker and quota. Observers only ever see the snapshots it publishes.

use crate::backoff::Backoff;
use crate::circuit_breaker::CircuitBreaker;
use crate::metrics::QualityTracker;
use crate::pacing::sleep_or_cancel;
use crate::phases::generate::{self, GenerateState};
use crate::phases::{scan, score, GenerateOutcome, PhaseContext};
use crate::queue::OptimizationQueue;
use crate::schedule::{self, DailyQuota};
use crate::state_machine::Event;
use autoseo_core::{EnginePhase, EngineStats, EngineStatus, HistoryAction, Result};
use chrono::{Local, NaiveDate};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Poll interval while paused
pub const PAUSE_POLL: Duration = Duration::from_secs(1);

/// How a cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleControl {
    Continue,
    /// Priority-only session ran out of work
    Finished,
}

pub struct Session {
    ctx: PhaseContext,
    priority_only: bool,
    queue: OptimizationQueue,
    stats: EngineStats,
    breaker: CircuitBreaker,
    backoff: Backoff,
    quota: DailyQuota,
    quality: QualityTracker,
    candidates: Vec<String>,
    /// Failed analyses per URL since the last scan
    analysis_failures: HashMap<String, u32>,
    last_scan: Option<Instant>,
    quota_notice: Option<NaiveDate>,
}

impl Session {
    pub fn new(
        ctx: PhaseContext,
        priority_only: bool,
        queue: OptimizationQueue,
        stats: EngineStats,
    ) -> Self {
        let config = ctx.config.clone();
        Self {
            priority_only,
            queue,
            stats,
            breaker: CircuitBreaker::new(
                config.circuit_breaker.threshold,
                Duration::from_secs(config.circuit_breaker.cooldown_secs),
            ),
            backoff: Backoff::from_config(&config.retry),
            quota: DailyQuota::new(config.schedule.daily_quota),
            quality: QualityTracker::default(),
            candidates: Vec::new(),
            analysis_failures: HashMap::new(),
            last_scan: None,
            quota_notice: None,
            ctx,
        }
    }

    /// Run until stopped or, in priority-only mode, until the queue drains
    pub async fn run(mut self) {
        let cancel = self.ctx.cancel.clone();
        let mut reason = "stopped";

        while !cancel.is_cancelled() {
            if self.ctx.channels.status() == EngineStatus::Paused {
                if !sleep_or_cancel(PAUSE_POLL, &cancel).await {
                    break;
                }
                continue;
            }

            let now = Local::now();
            if !schedule::is_active(&self.ctx.config.schedule, &now) {
                self.ctx.enter(EnginePhase::Waiting, None);
                debug!("Outside active hours");
                if !sleep_or_cancel(schedule::off_hours_wait(&now), &cancel).await {
                    break;
                }
                continue;
            }

            let today = now.date_naive();
            if self.quota.is_exhausted(today) {
                if self.quota_notice != Some(today) {
                    self.quota_notice = Some(today);
                    self.ctx
                        .recorder
                        .info(format!(
                            "Daily quota of {} items reached; waiting for tomorrow",
                            self.ctx.config.schedule.daily_quota
                        ))
                        .await;
                }
                self.ctx.enter(EnginePhase::Waiting, None);
                if !sleep_or_cancel(schedule::quota_wait(&now), &cancel).await {
                    break;
                }
                continue;
            }

            self.stats.cycle_count += 1;
            match self.cycle().await {
                Ok(CycleControl::Continue) => {
                    self.ctx.lifecycle(Event::PhaseRecovered).await;
                }
                Ok(CycleControl::Finished) => {
                    reason = "priority list complete";
                    self.ctx.lifecycle(Event::SessionComplete).await;
                    break;
                }
                Err(e) => self.recover_from(e).await,
            }
        }

        info!(cycles = self.stats.cycle_count, "Optimization loop exited: {}", reason);
        self.ctx.recorder.session_end(&self.stats, reason).await;
    }

    async fn cycle(&mut self) -> Result<CycleControl> {
        if self.priority_only {
            if self.queue.is_empty() {
                return Ok(CycleControl::Finished);
            }
            self.generate().await;
            return Ok(CycleControl::Continue);
        }

        if self.scan_due() {
            let outcome = scan::run(&self.ctx, self.priority_only).await?;
            self.ctx.lifecycle(Event::PhaseRecovered).await;
            self.last_scan = Some(Instant::now());
            self.candidates = outcome.candidates;
            self.analysis_failures.clear();
            self.stats.last_scan_at = Some(outcome.scanned_at);
            self.stats.next_scan_at = Some(outcome.next_scan_at);
            self.ctx.channels.set_stats(&self.stats);
        }

        if self.queue.is_empty() && !self.candidates.is_empty() {
            let candidates = std::mem::take(&mut self.candidates);
            let outcome = score::run(&self.ctx, candidates, &mut self.queue).await;
            self.candidates = self.keep_for_retry(outcome.failed);
        }

        if !self.queue.is_empty() {
            self.generate().await;
        } else {
            self.ctx.enter(EnginePhase::Waiting, None);
            sleep_or_cancel(self.ctx.config.schedule.processing_interval(), &self.ctx.cancel)
                .await;
        }
        Ok(CycleControl::Continue)
    }

    fn scan_due(&self) -> bool {
        match self.last_scan {
            None => true,
            Some(at) => at.elapsed() >= self.ctx.config.schedule.scan_interval(),
        }
    }

    /// URLs whose analysis failed stay candidates until they use up `retry.max_retries`
    fn keep_for_retry(&mut self, failed: Vec<String>) -> Vec<String> {
        let limit = self.ctx.config.retry.max_retries;
        let failures = &mut self.analysis_failures;
        failed
            .into_iter()
            .filter(|url| {
                let attempts = failures.entry(url.clone()).or_insert(0);
                *attempts += 1;
                if *attempts > limit {
                    debug!(url = %url, "Giving up on analysis until the next scan");
                }
                *attempts <= limit
            })
            .collect()
    }

    async fn generate(&mut self) {
        let outcome = generate::run(
            &self.ctx,
            self.priority_only,
            GenerateState {
                queue: &mut self.queue,
                breaker: &mut self.breaker,
                backoff: &self.backoff,
                quality: &mut self.quality,
            },
        )
        .await;

        let today = Local::now().date_naive();
        match outcome {
            GenerateOutcome::Completed { action, content } => {
                self.stats.total_processed += 1;
                self.stats
                    .record_success(content.quality_score, content.word_count);
                if action == HistoryAction::Error {
                    self.stats.error_count += 1;
                }
                self.quota.record(today);
            }
            GenerateOutcome::Dropped => {
                self.stats.total_processed += 1;
                self.stats.error_count += 1;
                self.quota.record(today);
            }
            GenerateOutcome::Requeued { .. }
            | GenerateOutcome::CircuitOpen { .. }
            | GenerateOutcome::QueueEmpty => {}
        }
        let quality = self.quality.summary();
        self.ctx.channels.update(|s| s.quality = quality);
        self.ctx.channels.set_stats(&self.stats);
    }

    /// Log a failed cycle, surface the error state and back off
    async fn recover_from(&mut self, error: autoseo_core::AutoSeoError) {
        self.ctx
            .lifecycle(Event::PhaseFailed {
                message: format!("Cycle {} failed: {}", self.stats.cycle_count, error),
            })
            .await;

        let delay = self.backoff.cycle_delay(self.stats.cycle_count);
        self.ctx
            .recorder
            .info(format!("Retrying in {}s", delay.as_secs()))
            .await;
        self.ctx.enter(EnginePhase::Waiting, None);
        sleep_or_cancel(delay, &self.ctx.cancel).await;
    }
}
