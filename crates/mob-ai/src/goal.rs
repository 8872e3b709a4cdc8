//! The `Goal` contract scheduled by a [`GoalSelector`](crate::GoalSelector).

use std::fmt;

use crate::error::CallbackResult;
use crate::flag::FlagSet;

/// Lifecycle state shared by goals and behaviors. There is no paused state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Stopped,
    Running,
}

impl RunState {
    pub fn is_running(self) -> bool {
        self == RunState::Running
    }
}

/// A prioritized, flag-scoped unit of actor behavior.
///
/// Predicates get a shared view of the host context and must not touch
/// resources other goals may hold. Lifecycle callbacks get the context
/// mutably and report failure through [`Fault`](crate::Fault).
pub trait Goal<C>: Send + Sync + fmt::Debug {
    /// Name used in logs and errors.
    fn name(&self) -> &'static str {
        crate::short_type_name::<Self>()
    }

    /// Control flags this goal claims while running. Read once when the goal
    /// is registered.
    fn flags(&self) -> FlagSet;

    /// Can this goal start right now?
    fn can_use(&mut self, ctx: &C) -> bool;

    /// Should this goal keep running? Only asked while running.
    fn can_continue_to_use(&mut self, ctx: &C) -> bool {
        self.can_use(ctx)
    }

    /// Whether a higher-priority goal may take this goal's flags.
    fn is_interruptable(&self) -> bool {
        true
    }

    /// If false, `tick()` is throttled to the selector's tick interval.
    fn requires_update_every_tick(&self) -> bool {
        false
    }

    fn start(&mut self, _ctx: &mut C) -> CallbackResult {
        Ok(())
    }

    fn tick(&mut self, _ctx: &mut C) -> CallbackResult {
        Ok(())
    }

    fn stop(&mut self, _ctx: &mut C) -> CallbackResult {
        Ok(())
    }
}
