//! Observable engine state and the event stream pushed to hosts

use autoseo_core::{
    ActivityLogEntry, EnginePhase, EngineStats, EngineStatus, HistoryEntry, QueueItem,
};
use crate::metrics::QualitySummary;
use crate::state_machine::{self, Action, Event};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

/// Capacity of the broadcast event channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Point-in-time view of the engine for observers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub status: EngineStatus,
    pub current_phase: Option<EnginePhase>,
    pub current_url: Option<String>,
    pub queue: Vec<QueueItem>,
    pub stats: EngineStats,
    /// Most recent activity, oldest first
    pub activity: Vec<ActivityLogEntry>,
    /// Most recent terminal outcomes, oldest first
    pub history: Vec<HistoryEntry>,
    pub priority_only: bool,
    pub consecutive_failures: u32,
    pub circuit_open: bool,
    /// Rolling quality and timing of recent generations
    pub quality: QualitySummary,
}

/// Incremental updates pushed to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    StatusChanged {
        status: EngineStatus,
    },
    PhaseChanged {
        phase: Option<EnginePhase>,
        url: Option<String>,
    },
    QueueChanged {
        len: usize,
    },
    StatsUpdated {
        stats: EngineStats,
    },
    Activity {
        entry: ActivityLogEntry,
    },
    History {
        entry: HistoryEntry,
    },
    GenerationProgress {
        url: String,
        message: String,
    },
}

/// State-update and event sinks shared by the controller and its loop
#[derive(Debug)]
pub struct EngineChannels {
    state: watch::Sender<EngineSnapshot>,
    events: broadcast::Sender<EngineEvent>,
}

impl EngineChannels {
    pub fn new() -> Self {
        let (state, _) = watch::channel(EngineSnapshot::default());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { state, events }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> EngineStatus {
        self.state.borrow().status
    }

    pub fn watch(&self) -> watch::Receiver<EngineSnapshot> {
        self.state.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Mutate the snapshot in place and notify watchers
    pub fn update(&self, f: impl FnOnce(&mut EngineSnapshot)) {
        self.state.send_modify(f);
    }

    /// Push an event; having no subscribers is not an error
    pub fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }

    pub fn set_status(&self, status: EngineStatus) {
        let changed = self.state.send_if_modified(|s| {
            if s.status == status {
                false
            } else {
                s.status = status;
                true
            }
        });
        if changed {
            self.emit(EngineEvent::StatusChanged { status });
        }
    }

    /// Apply a lifecycle event to the current status.
    ///
    /// With a `guard`, nothing changes once the token is cancelled; the check
    /// happens under the watch lock so a concurrent stop always wins.
    pub fn transition(&self, event: Event, guard: Option<&CancellationToken>) -> Vec<Action> {
        let mut actions = Vec::new();
        let mut new_status = None;
        let mut cleared = false;

        self.state.send_if_modified(|s| {
            if guard.is_some_and(|token| token.is_cancelled()) {
                return false;
            }
            let (next, requested) = state_machine::transition(s.status, event);
            if next != s.status {
                s.status = next;
                new_status = Some(next);
            }
            if requested.contains(&Action::ClearObservables)
                && (s.current_phase.is_some() || s.current_url.is_some())
            {
                s.current_phase = None;
                s.current_url = None;
                cleared = true;
            }
            actions = requested;
            new_status.is_some() || cleared
        });

        if let Some(status) = new_status {
            self.emit(EngineEvent::StatusChanged { status });
        }
        if cleared {
            self.emit(EngineEvent::PhaseChanged {
                phase: None,
                url: None,
            });
        }
        actions
    }

    pub fn set_phase(&self, phase: Option<EnginePhase>, url: Option<String>) {
        self.set_phase_unless(phase, url, None);
    }

    /// Set the current phase unless `guard` has been cancelled
    pub fn set_phase_unless(
        &self,
        phase: Option<EnginePhase>,
        url: Option<String>,
        guard: Option<&CancellationToken>,
    ) {
        let applied = self.state.send_if_modified(|s| {
            if guard.is_some_and(|token| token.is_cancelled()) {
                return false;
            }
            s.current_phase = phase;
            s.current_url = url.clone();
            true
        });
        if applied {
            self.emit(EngineEvent::PhaseChanged { phase, url });
        }
    }

    pub fn set_stats(&self, stats: &EngineStats) {
        self.update(|s| s.stats = stats.clone());
        self.emit(EngineEvent::StatsUpdated {
            stats: stats.clone(),
        });
    }

    pub fn set_queue(&self, queue: Vec<QueueItem>) {
        let len = queue.len();
        self.update(|s| s.queue = queue);
        self.emit(EngineEvent::QueueChanged { len });
    }
}

impl Default for EngineChannels {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_status_change_emits_once() {
        let channels = EngineChannels::new();
        let mut rx = channels.subscribe();

        channels.set_status(EngineStatus::Running);
        channels.set_status(EngineStatus::Running);

        assert_eq!(
            rx.recv().await.unwrap(),
            EngineEvent::StatusChanged {
                status: EngineStatus::Running
            }
        );
        assert!(rx.try_recv().is_err());
        assert_eq!(channels.status(), EngineStatus::Running);
    }

    #[tokio::test]
    async fn test_watchers_see_phase() {
        let channels = EngineChannels::new();
        let mut watcher = channels.watch();

        channels.set_phase(Some(EnginePhase::Scoring), None);
        watcher.changed().await.unwrap();
        assert_eq!(
            watcher.borrow().current_phase,
            Some(EnginePhase::Scoring)
        );
    }

    #[tokio::test]
    async fn test_transition_clears_observables_on_stop() {
        let channels = EngineChannels::new();
        channels.transition(Event::Start, None);
        channels.set_phase(Some(EnginePhase::Generating), Some("https://a".into()));

        let actions = channels.transition(Event::Stop, None);
        assert!(actions.contains(&Action::CancelLoop));

        let snapshot = channels.snapshot();
        assert_eq!(snapshot.status, EngineStatus::Idle);
        assert_eq!(snapshot.current_phase, None);
        assert_eq!(snapshot.current_url, None);
    }

    #[test]
    fn test_cancelled_guard_blocks_updates() {
        let channels = EngineChannels::new();
        channels.transition(Event::Start, None);

        let token = CancellationToken::new();
        token.cancel();
        let actions = channels.transition(
            Event::PhaseFailed {
                message: "late".into(),
            },
            Some(&token),
        );
        channels.set_phase_unless(Some(EnginePhase::Scanning), None, Some(&token));

        assert!(actions.is_empty());
        let snapshot = channels.snapshot();
        assert_eq!(snapshot.status, EngineStatus::Running);
        assert_eq!(snapshot.current_phase, None);
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = EngineEvent::QueueChanged { len: 3 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "queue_changed");
        assert_eq!(json["len"], 3);
    }
}
