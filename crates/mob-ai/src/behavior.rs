//! The `Behavior` contract scheduled by a [`Brain`](crate::Brain).

use std::fmt;

use crate::error::CallbackResult;
use crate::memory::{MemoryCondition, MemoryStore};

/// Handle to a behavior registered with a [`BrainBuilder`](crate::BrainBuilder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BehaviorId(pub(crate) usize);

impl BehaviorId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A brain-scheduled unit of actor behavior gated by memory.
///
/// The brain checks [`entry_conditions`](Behavior::entry_conditions) before
/// any other predicate and before every `tick()`, so a behavior never starts
/// or ticks while one of them is false.
pub trait Behavior<C>: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str {
        crate::short_type_name::<Self>()
    }

    /// Memory requirements. Read once when the brain is built.
    fn entry_conditions(&self) -> Vec<MemoryCondition> {
        Vec::new()
    }

    /// Extra start check, asked only once the entry conditions hold.
    fn check_extra_start_conditions(&mut self, _ctx: &C, _memory: &MemoryStore) -> bool {
        true
    }

    /// Keep running? Defaults to false: the behavior is stopped in the same
    /// tick it started.
    fn can_still_use(&mut self, _ctx: &C, _memory: &MemoryStore) -> bool {
        false
    }

    fn start(&mut self, _ctx: &mut C, _memory: &mut MemoryStore) -> CallbackResult {
        Ok(())
    }

    fn tick(&mut self, _ctx: &mut C, _memory: &mut MemoryStore) -> CallbackResult {
        Ok(())
    }

    fn stop(&mut self, _ctx: &mut C, _memory: &mut MemoryStore) -> CallbackResult {
        Ok(())
    }
}
