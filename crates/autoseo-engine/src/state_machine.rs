//! Pure lifecycle state machine for the engine controller
//!
//! `transition(status, event) -> (status, actions)` has no I/O; the
//! controller applies the returned actions. Requests that make no sense in
//! the current state leave it unchanged instead of failing.

use autoseo_core::{ActivityKind, EngineStatus};

/// Lifecycle events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start,
    Stop,
    Pause,
    Resume,
    /// A phase raised an error the loop caught
    PhaseFailed { message: String },
    /// The loop completed a cycle after an error
    PhaseRecovered,
    /// A finite (priority-only) session ran out of work
    SessionComplete,
}

/// Side effects requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Spawn the main loop
    LaunchLoop,
    /// Signal cancellation to the running loop
    CancelLoop,
    /// Reset current phase / current URL
    ClearObservables,
    /// Append to the activity log
    Log { kind: ActivityKind, message: String },
}

fn log(kind: ActivityKind, message: impl Into<String>) -> Action {
    Action::Log {
        kind,
        message: message.into(),
    }
}

/// Pure state transition function
pub fn transition(status: EngineStatus, event: Event) -> (EngineStatus, Vec<Action>) {
    use EngineStatus::*;

    match (status, event) {
        (Idle, Event::Start) => (
            Running,
            vec![
                log(ActivityKind::Info, "Optimization engine started"),
                Action::LaunchLoop,
            ],
        ),
        (current, Event::Start) => (
            current,
            vec![log(
                ActivityKind::Warning,
                "Engine is already running; start request ignored",
            )],
        ),

        (Idle, Event::Stop) => (Idle, Vec::new()),
        (_, Event::Stop) => (
            Idle,
            vec![
                Action::CancelLoop,
                Action::ClearObservables,
                log(ActivityKind::Info, "Optimization engine stopped"),
            ],
        ),

        (Running | Error, Event::Pause) => {
            (Paused, vec![log(ActivityKind::Info, "Engine paused")])
        }
        (Paused, Event::Resume) => (Running, vec![log(ActivityKind::Info, "Engine resumed")]),

        (Running, Event::PhaseFailed { message }) => {
            (Error, vec![log(ActivityKind::Error, message)])
        }
        (current @ (Error | Paused), Event::PhaseFailed { message }) => {
            (current, vec![log(ActivityKind::Error, message)])
        }
        (Error, Event::PhaseRecovered) => (Running, Vec::new()),

        (Running | Paused | Error, Event::SessionComplete) => (
            Idle,
            vec![
                Action::ClearObservables,
                log(
                    ActivityKind::Success,
                    "Priority list processed; session complete",
                ),
            ],
        ),

        (current, _) => (current, Vec::new()),
    }
}
