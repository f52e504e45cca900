//! Scan: refresh the candidate URL set

use super::PhaseContext;
use autoseo_core::{AutoSeoError, EnginePhase, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub candidates: Vec<String>,
    pub scanned_at: DateTime<Utc>,
    pub next_scan_at: DateTime<Utc>,
}

pub async fn run(ctx: &PhaseContext, priority_only: bool) -> Result<ScanOutcome> {
    if priority_only {
        return Err(AutoSeoError::InvalidState(
            "scan requested while in priority-only mode".to_string(),
        ));
    }

    ctx.enter(EnginePhase::Scanning, None);
    ctx.recorder.info("Scanning site for candidate pages").await;

    let discovered = ctx.collaborators.source.discover().await?;

    let mut seen = HashSet::new();
    let candidates: Vec<String> = discovered
        .into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect();

    let scanned_at = Utc::now();
    let next_scan_at = chrono::Duration::from_std(ctx.config.schedule.scan_interval())
        .ok()
        .and_then(|interval| scanned_at.checked_add_signed(interval))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    ctx.recorder
        .info(format!("Scan found {} candidate pages", candidates.len()))
        .await;

    Ok(ScanOutcome {
        candidates,
        scanned_at,
        next_scan_at,
    })
}
