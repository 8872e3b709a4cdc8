//! Scheduler tuning.

use serde::Deserialize;

use crate::error::{AiError, AiResult};

/// Default throttle for goals that do not need an update every tick.
pub const DEFAULT_GOAL_TICK_INTERVAL: u32 = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Goals whose `requires_update_every_tick()` is false get `tick()` once
    /// every this many selector ticks.
    #[serde(default = "default_goal_tick_interval")]
    pub goal_tick_interval: u32,
}

fn default_goal_tick_interval() -> u32 {
    DEFAULT_GOAL_TICK_INTERVAL
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            goal_tick_interval: default_goal_tick_interval(),
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> AiResult<()> {
        if self.goal_tick_interval == 0 {
            return Err(AiError::ZeroTickInterval);
        }
        Ok(())
    }
}
