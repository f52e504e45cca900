//! Phase executors
//!
//! Each phase is a procedure over queue state and collaborator calls. Phases
//! never touch [`EngineStats`](autoseo_core::EngineStats); they return an
//! outcome and the session folds it into the counters at the phase boundary.

pub mod generate;
pub mod publish;
pub mod score;
pub mod scan;

use crate::collaborators::Collaborators;
use crate::events::EngineChannels;
use crate::queue::OptimizationQueue;
use crate::recorder::Recorder;
use crate::state_machine::{Action, Event};
use autoseo_core::{ActivityLogEntry, CollaboratorSettings, EngineConfig, EnginePhase, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub use generate::GenerateOutcome;
pub use publish::PublishOutcome;
pub use scan::ScanOutcome;
pub use score::ScoreOutcome;

/// Everything a phase needs from its session
#[derive(Clone)]
pub struct PhaseContext {
    pub config: Arc<EngineConfig>,
    pub collaborators: Collaborators,
    pub channels: Arc<EngineChannels>,
    pub recorder: Recorder,
    pub cancel: CancellationToken,
}

impl PhaseContext {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Publish the current phase; ignored once the session is stopped
    pub fn enter(&self, phase: EnginePhase, url: Option<&str>) {
        self.channels
            .set_phase_unless(Some(phase), url.map(str::to_string), Some(&self.cancel));
    }

    pub fn publish_queue(&self, queue: &OptimizationQueue) {
        self.channels.set_queue(queue.snapshot());
    }

    /// Fresh collaborator settings for one generate/publish call
    pub fn settings(&self) -> Result<CollaboratorSettings> {
        self.collaborators.settings.snapshot()
    }

    /// Drive the lifecycle from inside the session and log what it asks for
    pub async fn lifecycle(&self, event: Event) {
        let actions = self.channels.transition(event, Some(&self.cancel));
        apply_logs(&self.recorder, actions).await;
    }
}

/// Write the log actions a transition requested
pub(crate) async fn apply_logs(recorder: &Recorder, actions: Vec<Action>) {
    for action in actions {
        if let Action::Log { kind, message } = action {
            recorder.log(ActivityLogEntry::new(kind, message)).await;
        }
    }
}
