//! Mob AI scheduling core.
//!
//! Two cooperating schedulers decide, every simulation tick, which behaviors
//! of an actor run:
//!
//! - [`GoalSelector`]: prioritized [`Goal`]s arbitrated by exclusive control
//!   [`Flag`]s (move, look, jump, target).
//! - [`Brain`]: a typed [`MemoryStore`] refreshed by periodic [`Sensor`]s, and
//!   [`Behavior`]s grouped into mutually exclusive [`Activity`] bundles gated
//!   by memory conditions.
//!
//! Both are generic over a host context type `C`. Predicates receive `&C`,
//! lifecycle callbacks receive `&mut C`, so the host decides what a goal may
//! read and where its actions are collected.

pub mod activity;
pub mod behavior;
pub mod brain;
pub mod config;
pub mod error;
pub mod flag;
pub mod goal;
pub mod goal_selector;
pub mod memory;
pub mod sensor;

pub use activity::{Activity, ActivityId};
pub use behavior::{Behavior, BehaviorId};
pub use brain::{Brain, BrainBuilder};
pub use config::SchedulerConfig;
pub use error::{AiError, AiResult, CallbackResult, Fault, Phase};
pub use flag::{Flag, FlagSet};
pub use goal::{Goal, RunState};
pub use goal_selector::{GoalId, GoalSelector};
pub use memory::{GameTime, MemoryCondition, MemoryKey, MemoryModuleType, MemoryStatus, MemoryStore};
pub use sensor::Sensor;

/// Last path segment of a type name, used as the default display name of
/// goals, behaviors and sensors.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
