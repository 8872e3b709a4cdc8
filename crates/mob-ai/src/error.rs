//! Error types for the scheduling core.

use std::fmt;

use thiserror::Error;

use crate::activity::ActivityId;

/// Failure raised by a goal or behavior lifecycle callback.
///
/// The scheduler never recovers from a fault; it is wrapped in
/// [`AiError::Callback`] and returned to the caller of the tick.
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct Fault {
    reason: String,
}

impl Fault {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Result of `start`, `tick` and `stop` callbacks.
pub type CallbackResult = Result<(), Fault>;

/// Lifecycle callback that produced a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    Tick,
    Stop,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Start => "start",
            Phase::Tick => "tick",
            Phase::Stop => "stop",
        })
    }
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error("{kind} `{name}` failed during {phase}: {source}")]
    Callback {
        kind: &'static str,
        name: &'static str,
        phase: Phase,
        source: Fault,
    },

    #[error("goal tick interval must be at least 1")]
    ZeroTickInterval,

    #[error("activity `{0}` registered twice")]
    DuplicateActivity(ActivityId),

    #[error("unknown activity `{0}`")]
    UnknownActivity(ActivityId),

    #[error("activity `{activity}` references unknown behavior #{behavior}")]
    UnknownBehavior { activity: ActivityId, behavior: usize },

    #[error("sensor `{0}` has a zero scan interval")]
    ZeroSensorInterval(&'static str),

    #[error("memory `{0}` registered with two different value types")]
    MemoryTypeConflict(&'static str),

    #[error("the core activity is always active and cannot be selected")]
    CoreNotSelectable,
}

pub type AiResult<T> = Result<T, AiError>;

impl AiError {
    pub(crate) fn goal(name: &'static str, phase: Phase, source: Fault) -> Self {
        AiError::Callback {
            kind: "goal",
            name,
            phase,
            source,
        }
    }

    pub(crate) fn behavior(name: &'static str, phase: Phase, source: Fault) -> Self {
        AiError::Callback {
            kind: "behavior",
            name,
            phase,
            source,
        }
    }
}
