//! Engine controller: lifecycle and the public contract hosts drive

use crate::collaborators::Collaborators;
use crate::events::{EngineChannels, EngineEvent, EngineSnapshot};
use crate::journal::ActivityJournal;
use crate::phases::{apply_logs, PhaseContext};
use crate::queue::OptimizationQueue;
use crate::recorder::Recorder;
use crate::session::Session;
use crate::state_machine::{Action, Event};
use autoseo_core::{
    AutoSeoError, EngineConfig, EngineStats, EngineStatus, PriorityUrl, QueueItem, QueueSource,
    Result,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Options for one optimization session
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    /// Process only `priority_urls`, never scan, end when they are done
    pub priority_only: bool,
    /// Pinned URLs; queued up front in priority-only mode, score overrides otherwise
    pub priority_urls: Vec<PriorityUrl>,
}

impl StartOptions {
    pub fn full() -> Self {
        Self::default()
    }

    pub fn priority_only(priority_urls: Vec<PriorityUrl>) -> Self {
        Self {
            priority_only: true,
            priority_urls,
        }
    }
}

struct SessionHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// The autonomous optimization engine
pub struct Engine {
    config: Arc<EngineConfig>,
    collaborators: Collaborators,
    channels: Arc<EngineChannels>,
    recorder: Recorder,
    session: Mutex<Option<SessionHandle>>,
}

impl Engine {
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Self {
        let channels = Arc::new(EngineChannels::new());
        let recorder = Recorder::new(
            channels.clone(),
            config.recorder.activity_limit,
            config.recorder.history_limit,
        );
        Self {
            config: Arc::new(config),
            collaborators,
            channels,
            recorder,
            session: Mutex::new(None),
        }
    }

    /// Mirror activity and outcomes into a markdown journal
    pub fn with_journal(mut self, journal: ActivityJournal) -> Self {
        self.recorder = self.recorder.with_journal(journal);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current observable state
    pub fn state(&self) -> EngineSnapshot {
        self.channels.snapshot()
    }

    pub fn status(&self) -> EngineStatus {
        self.channels.status()
    }

    /// Receiver that always holds the latest snapshot
    pub fn watch(&self) -> watch::Receiver<EngineSnapshot> {
        self.channels.watch()
    }

    /// Stream of state changes, activity and history entries
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.channels.subscribe()
    }

    /// Start a session.
    ///
    /// Starting a running engine is a logged no-op. From idle, fails with a
    /// configuration error when priority-only mode has no URLs, the config
    /// does not validate, or the generator cannot initialize; the engine then
    /// stays idle.
    pub async fn start(&self, options: StartOptions) -> Result<()> {
        let mut session = self.session.lock().await;

        if self.channels.status() != EngineStatus::Idle {
            let actions = self.channels.transition(Event::Start, None);
            apply_logs(&self.recorder, actions).await;
            return Ok(());
        }

        if options.priority_only && options.priority_urls.is_empty() {
            return Err(AutoSeoError::Configuration(
                "priority-only mode requires at least one priority URL".to_string(),
            ));
        }
        self.config.validate()?;

        let settings = self.collaborators.settings.snapshot()?;
        if let Err(e) = self.collaborators.generator.initialize(&settings).await {
            self.recorder
                .error(format!("Content generator failed to initialize: {}", e))
                .await;
            return Err(e);
        }

        // A previous session may have finished on its own
        if let Some(previous) = session.take() {
            previous.cancel.cancel();
            let _ = previous.task.await;
        }

        let mut config = (*self.config).clone();
        let mut pinned = options.priority_urls.clone();
        pinned.extend(config.site.priority_urls.drain(..));
        config.site.priority_urls = pinned;

        let mut queue = OptimizationQueue::new();
        if options.priority_only {
            for pinned in &options.priority_urls {
                queue.insert(
                    QueueItem::new(pinned.url.clone(), pinned.priority, 0)
                        .with_source(QueueSource::Manual),
                );
            }
        }

        let stats = EngineStats {
            session_started_at: Some(Utc::now()),
            ..Default::default()
        };
        self.channels.update(|s| {
            s.stats = stats.clone();
            s.queue = queue.snapshot();
            s.priority_only = options.priority_only;
            s.consecutive_failures = 0;
            s.circuit_open = false;
            s.current_phase = None;
            s.current_url = None;
        });

        let actions = self.channels.transition(Event::Start, None);
        let launch = actions.contains(&Action::LaunchLoop);
        apply_logs(&self.recorder, actions).await;
        if !launch {
            return Ok(());
        }

        if let Some(journal) = self.recorder.journal() {
            journal
                .log_session_start(options.priority_only, queue.len())
                .await;
        }
        if options.priority_only {
            self.recorder
                .info(format!(
                    "Priority-only mode: {} URLs queued, site scan disabled",
                    queue.len()
                ))
                .await;
        }

        let cancel = CancellationToken::new();
        let ctx = PhaseContext {
            config: Arc::new(config),
            collaborators: self.collaborators.clone(),
            channels: self.channels.clone(),
            recorder: self.recorder.clone(),
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(Session::new(ctx, options.priority_only, queue, stats).run());
        *session = Some(SessionHandle { cancel, task });

        info!(priority_only = options.priority_only, "Engine started");
        Ok(())
    }

    /// Signal the session to stop and return to idle. Idempotent.
    ///
    /// In-flight collaborator calls finish; every sleep ends immediately.
    pub async fn stop(&self) {
        let session = self.session.lock().await;
        if let Some(handle) = session.as_ref() {
            handle.cancel.cancel();
        }
        let actions = self.channels.transition(Event::Stop, None);
        if actions.contains(&Action::CancelLoop) {
            debug!("Stop requested");
        }
        apply_logs(&self.recorder, actions).await;
    }

    /// Stop and wait for the session task to exit
    pub async fn shutdown(&self) {
        self.stop().await;
        let handle = self.session.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.task.await;
        }
    }

    /// Resolve once the engine is idle again, e.g. after a priority-only session
    pub async fn wait_idle(&self) {
        let mut state = self.channels.watch();
        let _ = state
            .wait_for(|snapshot| snapshot.status == EngineStatus::Idle)
            .await;
    }

    pub async fn pause(&self) {
        let actions = self.channels.transition(Event::Pause, None);
        apply_logs(&self.recorder, actions).await;
    }

    pub async fn resume(&self) {
        let actions = self.channels.transition(Event::Resume, None);
        apply_logs(&self.recorder, actions).await;
    }
}
