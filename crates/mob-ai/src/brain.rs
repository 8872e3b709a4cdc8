//! Memory, sensor and activity based scheduler.
//!
//! Each [`Brain::tick`] runs, in order:
//!
//! 1. advance the memory clock and forget expired entries;
//! 2. run every sensor whose salted scan interval is due;
//! 3. if a rotation is configured, switch to its first valid activity;
//! 4. start stopped behaviors of the core and active activities whose
//!    memory conditions, member predicates and extra start checks hold;
//! 5. tick running behaviors that can continue, stop the others.
//!
//! A member predicate given to [`Activity::with_when`] gates the member
//! itself as well as the activity's validity, so a behavior of an activity
//! entered without validation still waits for its memory.
//!
//! Steps 4 and 5 walk activities by priority and behaviors in registration
//! order; a behavior listed by both the core and the active activity is
//! visited once. A behavior started in step 4 is ticked in step 5 of the same
//! tick.

use std::fmt;

use tracing::{debug, trace};

use crate::activity::{Activity, ActivityId, Member};
use crate::behavior::{Behavior, BehaviorId};
use crate::error::{AiError, AiResult, Phase};
use crate::goal::RunState;
use crate::memory::{GameTime, MemoryCondition, MemoryKey, MemoryModuleType, MemoryStore};
use crate::sensor::{self, Sensor};

struct BehaviorSlot<C> {
    behavior: Box<dyn Behavior<C>>,
    conditions: Vec<MemoryCondition>,
    state: RunState,
}

/// Collects the static brain configuration of an actor.
pub struct BrainBuilder<C> {
    memories: Vec<MemoryKey>,
    sensors: Vec<Box<dyn Sensor<C>>>,
    behaviors: Vec<Box<dyn Behavior<C>>>,
    activities: Vec<Activity>,
    rotation: Vec<ActivityId>,
    default_activity: Option<ActivityId>,
}

impl<C> Default for BrainBuilder<C> {
    fn default() -> Self {
        Self {
            memories: Vec::new(),
            sensors: Vec::new(),
            behaviors: Vec::new(),
            activities: Vec::new(),
            rotation: Vec::new(),
            default_activity: None,
        }
    }
}

impl<C> BrainBuilder<C> {
    /// Register a memory slot that no sensor, behavior or activity mentions.
    pub fn memory<T: 'static>(&mut self, ty: &MemoryModuleType<T>) -> &mut Self {
        self.memories.push(ty.key());
        self
    }

    pub fn sensor(&mut self, sensor: Box<dyn Sensor<C>>) -> &mut Self {
        self.sensors.push(sensor);
        self
    }

    /// Register a behavior; reference the returned id from one or more
    /// activities.
    pub fn add_behavior(&mut self, behavior: Box<dyn Behavior<C>>) -> BehaviorId {
        self.behaviors.push(behavior);
        BehaviorId(self.behaviors.len() - 1)
    }

    pub fn activity(&mut self, activity: Activity) -> &mut Self {
        self.activities.push(activity);
        self
    }

    /// Activity active when the brain is created.
    pub fn default_activity(&mut self, id: ActivityId) -> &mut Self {
        self.default_activity = Some(id);
        self
    }

    /// Candidates, most important first, re-evaluated every tick.
    pub fn rotation(&mut self, ids: impl IntoIterator<Item = ActivityId>) -> &mut Self {
        self.rotation = ids.into_iter().collect();
        self
    }

    /// Validate the configuration and create the brain. `salt` staggers
    /// sensor scans between actors; the actor id is a good choice.
    pub fn build(self, salt: u64) -> AiResult<Brain<C>> {
        let mut memory = MemoryStore::new();
        for key in &self.memories {
            memory.register_key(*key)?;
        }

        for sensor in &self.sensors {
            if sensor.interval() == 0 {
                return Err(AiError::ZeroSensorInterval(sensor.name()));
            }
            for key in sensor.produces() {
                memory.register_key(key)?;
            }
        }

        let behaviors: Vec<BehaviorSlot<C>> = self
            .behaviors
            .into_iter()
            .map(|behavior| BehaviorSlot {
                conditions: behavior.entry_conditions(),
                behavior,
                state: RunState::Stopped,
            })
            .collect();
        for slot in &behaviors {
            for condition in &slot.conditions {
                memory.register_key(condition.key())?;
            }
        }

        let mut known: Vec<ActivityId> = Vec::with_capacity(self.activities.len());
        for activity in &self.activities {
            if known.contains(&activity.id()) {
                return Err(AiError::DuplicateActivity(activity.id()));
            }
            known.push(activity.id());
            if let Some(missing) = activity.behaviors().find(|b| b.0 >= behaviors.len()) {
                return Err(AiError::UnknownBehavior {
                    activity: activity.id(),
                    behavior: missing.0,
                });
            }
            for key in activity.memory_keys() {
                memory.register_key(key)?;
            }
        }

        for &id in self.rotation.iter().chain(&self.default_activity) {
            if id.is_core() {
                return Err(AiError::CoreNotSelectable);
            }
            if !known.contains(&id) {
                return Err(AiError::UnknownActivity(id));
            }
        }

        let mut activities = self.activities;
        activities.sort_by_key(Activity::priority);

        Ok(Brain {
            memory,
            sensors: self.sensors,
            behaviors,
            activities,
            active: self.default_activity,
            default_activity: self.default_activity,
            rotation: self.rotation,
            salt,
        })
    }
}

/// Brain of one actor.
pub struct Brain<C> {
    memory: MemoryStore,
    sensors: Vec<Box<dyn Sensor<C>>>,
    behaviors: Vec<BehaviorSlot<C>>,
    activities: Vec<Activity>,
    active: Option<ActivityId>,
    default_activity: Option<ActivityId>,
    rotation: Vec<ActivityId>,
    salt: u64,
}

impl<C> Brain<C> {
    pub fn builder() -> BrainBuilder<C> {
        BrainBuilder::default()
    }

    pub fn tick(&mut self, now: GameTime, ctx: &mut C) -> AiResult<()> {
        self.memory.set_now(now);
        self.memory.forget_expired();

        for sensor in self.sensors.iter_mut() {
            if sensor::is_due(self.salt, now, sensor.interval()) {
                trace!(sensor = sensor.name(), now, "sensor scan");
                sensor.sense(ctx, &mut self.memory);
            }
        }

        if !self.rotation.is_empty() {
            let rotation = std::mem::take(&mut self.rotation);
            let switched = self.set_active_activity_to_first_valid(&rotation, ctx);
            self.rotation = rotation;
            switched?;
        }

        let order = self.schedule();
        for member in &order {
            self.try_start(member, ctx)?;
        }
        self.tick_or_stop(&order, ctx)
    }

    /// Activate the first candidate whose requirements hold. Returns the
    /// activity now active, or `None` (and no change) if none is valid.
    pub fn set_active_activity_to_first_valid(
        &mut self,
        candidates: &[ActivityId],
        ctx: &mut C,
    ) -> AiResult<Option<ActivityId>> {
        let valid = candidates.iter().copied().find(|id| {
            !id.is_core()
                && self
                    .activity(*id)
                    .is_some_and(|a| a.is_valid(&self.memory))
        });
        let Some(id) = valid else {
            return Ok(None);
        };
        self.switch_to(id, ctx)?;
        Ok(Some(id))
    }

    /// Activate `id` if its requirements hold.
    pub fn set_active_activity_if_valid(&mut self, id: ActivityId, ctx: &mut C) -> AiResult<bool> {
        Ok(self.set_active_activity_to_first_valid(&[id], ctx)?.is_some())
    }

    /// Activate `id` unconditionally.
    pub fn set_active_activity(&mut self, id: ActivityId, ctx: &mut C) -> AiResult<()> {
        if id.is_core() {
            return Err(AiError::CoreNotSelectable);
        }
        if self.activity(id).is_none() {
            return Err(AiError::UnknownActivity(id));
        }
        self.switch_to(id, ctx)
    }

    /// Fall back to the default activity, if one was configured.
    pub fn use_default_activity(&mut self, ctx: &mut C) -> AiResult<()> {
        match self.default_activity {
            Some(id) => self.switch_to(id, ctx),
            None => Ok(()),
        }
    }

    /// Stop every running behavior, e.g. when the actor leaves the
    /// simulation. The first fault is returned after all are stopped.
    pub fn stop_all(&mut self, ctx: &mut C) -> AiResult<()> {
        let mut first_fault = None;
        for index in 0..self.behaviors.len() {
            if self.behaviors[index].state.is_running() {
                if let Err(e) = self.stop_behavior(BehaviorId(index), ctx) {
                    first_fault.get_or_insert(e);
                }
            }
        }
        first_fault.map_or(Ok(()), Err)
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut MemoryStore {
        &mut self.memory
    }

    /// The active non-core activity.
    pub fn active_activity(&self) -> Option<ActivityId> {
        self.active
    }

    /// The core activity counts as always active.
    pub fn is_active(&self, id: ActivityId) -> bool {
        id.is_core() || self.active == Some(id)
    }

    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter()
    }

    pub fn is_running(&self, id: BehaviorId) -> bool {
        self.behaviors
            .get(id.0)
            .is_some_and(|slot| slot.state.is_running())
    }

    pub fn running_behaviors(&self) -> impl Iterator<Item = (BehaviorId, &dyn Behavior<C>)> + '_ {
        self.behaviors
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.state.is_running())
            .map(|(index, slot)| (BehaviorId(index), slot.behavior.as_ref()))
    }

    pub fn salt(&self) -> u64 {
        self.salt
    }

    fn activity(&self, id: ActivityId) -> Option<&Activity> {
        self.activities.iter().find(|a| a.id() == id)
    }

    fn members_of(&self, id: ActivityId) -> Vec<Member> {
        self.activity(id)
            .map(|a| a.members.clone())
            .unwrap_or_default()
    }

    /// Members of the core and active activities, in evaluation order. A
    /// behavior listed twice keeps the membership of the first activity.
    fn schedule(&self) -> Vec<Member> {
        let mut order: Vec<Member> = Vec::new();
        for activity in &self.activities {
            if !self.is_active(activity.id()) {
                continue;
            }
            for member in &activity.members {
                if !lists(&order, member.behavior) {
                    order.push(member.clone());
                }
            }
        }
        order
    }

    fn switch_to(&mut self, new: ActivityId, ctx: &mut C) -> AiResult<()> {
        if self.active == Some(new) {
            return Ok(());
        }
        let core = self.members_of(ActivityId::CORE);
        let incoming = self.members_of(new);
        let outgoing = self
            .active
            .map(|old| self.members_of(old))
            .unwrap_or_default();

        for member in &outgoing {
            let id = member.behavior;
            if !lists(&incoming, id) && !lists(&core, id) && self.is_running(id) {
                self.stop_behavior(id, ctx)?;
            }
        }

        let erase: Vec<MemoryKey> = self
            .active
            .and_then(|old| self.activity(old))
            .map(|a| a.erase_on_stop.clone())
            .unwrap_or_default();
        for key in erase {
            self.memory.erase_key(key);
        }

        debug!(
            from = self.active.map(ActivityId::name),
            to = new.name(),
            "activity switched"
        );
        self.active = Some(new);

        for member in &incoming {
            let id = member.behavior;
            if !lists(&outgoing, id) && !lists(&core, id) {
                self.try_start(member, ctx)?;
            }
        }
        Ok(())
    }

    fn try_start(&mut self, member: &Member, ctx: &mut C) -> AiResult<bool> {
        let slot = &mut self.behaviors[member.behavior.0];
        if slot.state.is_running()
            || !MemoryCondition::all_met(&slot.conditions, &self.memory)
            || !MemoryCondition::all_met(&member.requires, &self.memory)
            || !slot.behavior.check_extra_start_conditions(ctx, &self.memory)
        {
            return Ok(false);
        }
        slot.state = RunState::Running;
        let name = slot.behavior.name();
        debug!(behavior = name, "behavior started");
        slot.behavior
            .start(ctx, &mut self.memory)
            .map_err(|e| AiError::behavior(name, Phase::Start, e))?;
        Ok(true)
    }

    fn stop_behavior(&mut self, id: BehaviorId, ctx: &mut C) -> AiResult<()> {
        let slot = &mut self.behaviors[id.0];
        slot.state = RunState::Stopped;
        let name = slot.behavior.name();
        debug!(behavior = name, "behavior stopped");
        slot.behavior
            .stop(ctx, &mut self.memory)
            .map_err(|e| AiError::behavior(name, Phase::Stop, e))
    }

    fn tick_or_stop(&mut self, order: &[Member], ctx: &mut C) -> AiResult<()> {
        for member in order {
            let id = member.behavior;
            let slot = &mut self.behaviors[id.0];
            if !slot.state.is_running() {
                continue;
            }
            let keep = MemoryCondition::all_met(&slot.conditions, &self.memory)
                && MemoryCondition::all_met(&member.requires, &self.memory)
                && slot.behavior.can_still_use(ctx, &self.memory);
            if keep {
                let name = slot.behavior.name();
                slot.behavior
                    .tick(ctx, &mut self.memory)
                    .map_err(|e| AiError::behavior(name, Phase::Tick, e))?;
            } else {
                self.stop_behavior(id, ctx)?;
            }
        }

        // Left over from an activity switch that faulted halfway.
        for index in 0..self.behaviors.len() {
            let id = BehaviorId(index);
            if self.is_running(id) && !lists(order, id) {
                self.stop_behavior(id, ctx)?;
            }
        }
        Ok(())
    }
}

fn lists(members: &[Member], id: BehaviorId) -> bool {
    members.iter().any(|m| m.behavior == id)
}

impl<C> fmt::Debug for Brain<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Brain")
            .field("active", &self.active)
            .field("sensor_count", &self.sensors.len())
            .field("behavior_count", &self.behaviors.len())
            .field(
                "running",
                &self
                    .running_behaviors()
                    .map(|(_, b)| b.name())
                    .collect::<Vec<_>>(),
            )
            .field("memory", &self.memory)
            .finish()
    }
}
