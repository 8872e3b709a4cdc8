//! Named bundles of behaviors. At most one non-core activity is active per
//! brain; the core activity always runs.

use std::fmt;

use crate::behavior::BehaviorId;
use crate::memory::{MemoryCondition, MemoryKey, MemoryModuleType, MemoryStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActivityId(&'static str);

impl ActivityId {
    pub const CORE: ActivityId = ActivityId("core");
    pub const IDLE: ActivityId = ActivityId("idle");
    pub const FIGHT: ActivityId = ActivityId("fight");
    pub const PANIC: ActivityId = ActivityId("panic");
    pub const REST: ActivityId = ActivityId("rest");
    pub const WORK: ActivityId = ActivityId("work");

    pub const fn new(name: &'static str) -> Self {
        ActivityId(name)
    }

    pub const fn name(self) -> &'static str {
        self.0
    }

    pub fn is_core(self) -> bool {
        self == ActivityId::CORE
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Member {
    pub(crate) behavior: BehaviorId,
    pub(crate) requires: Vec<MemoryCondition>,
}

/// An activity definition, handed to [`BrainBuilder::activity`](crate::BrainBuilder::activity).
#[derive(Debug, Clone)]
pub struct Activity {
    id: ActivityId,
    priority: u32,
    pub(crate) members: Vec<Member>,
    pub(crate) requirements: Vec<MemoryCondition>,
    pub(crate) erase_on_stop: Vec<MemoryKey>,
}

impl Activity {
    /// `priority` orders evaluation between the core activity and the active
    /// one; lower runs first.
    pub fn new(id: ActivityId, priority: u32) -> Self {
        Self {
            id,
            priority,
            members: Vec::new(),
            requirements: Vec::new(),
            erase_on_stop: Vec::new(),
        }
    }

    pub fn core(priority: u32) -> Self {
        Self::new(ActivityId::CORE, priority)
    }

    /// Add a behavior with no activity-level memory predicate.
    pub fn with(self, behavior: BehaviorId) -> Self {
        self.with_when(behavior, std::iter::empty())
    }

    /// Add a behavior together with the memory predicate it contributes to
    /// this activity's validity.
    pub fn with_when(
        mut self,
        behavior: BehaviorId,
        requires: impl IntoIterator<Item = MemoryCondition>,
    ) -> Self {
        self.members.push(Member {
            behavior,
            requires: requires.into_iter().collect(),
        });
        self
    }

    /// Activity-level requirement.
    pub fn requires(mut self, condition: MemoryCondition) -> Self {
        self.requirements.push(condition);
        self
    }

    /// Erase `ty` whenever this activity is switched off.
    pub fn erase_on_stop<T: 'static>(mut self, ty: &MemoryModuleType<T>) -> Self {
        self.erase_on_stop.push(ty.key());
        self
    }

    pub fn id(&self) -> ActivityId {
        self.id
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn behaviors(&self) -> impl Iterator<Item = BehaviorId> + '_ {
        self.members.iter().map(|m| m.behavior)
    }

    pub fn contains(&self, behavior: BehaviorId) -> bool {
        self.members.iter().any(|m| m.behavior == behavior)
    }

    /// Valid when the activity requirements and every member's predicate hold.
    pub fn is_valid(&self, memory: &MemoryStore) -> bool {
        MemoryCondition::all_met(&self.requirements, memory)
            && self
                .members
                .iter()
                .all(|m| MemoryCondition::all_met(&m.requires, memory))
    }

    /// Every memory slot this activity mentions.
    pub(crate) fn memory_keys(&self) -> impl Iterator<Item = MemoryKey> + '_ {
        self.requirements
            .iter()
            .chain(self.members.iter().flat_map(|m| m.requires.iter()))
            .map(MemoryCondition::key)
            .chain(self.erase_on_stop.iter().copied())
    }
}
