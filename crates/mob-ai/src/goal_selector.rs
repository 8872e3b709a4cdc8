//! Flag-arbitrated priority scheduler for goals.
//!
//! Goals are kept sorted by ascending priority number (lower runs first),
//! ties in registration order. Each [`GoalSelector::tick`]:
//!
//! 1. stops running goals that can no longer continue or that hold a
//!    disabled flag;
//! 2. walks the stopped goals in order and starts each one whose flags are
//!    free or held only by interruptable goals of a strictly larger priority
//!    number, stopping those holders first;
//! 3. ticks every running goal, throttled for goals that do not need an
//!    update every tick.
//!
//! A goal started during a tick also receives `tick()` in that same tick.

use std::fmt;

use tracing::debug;

use crate::config::SchedulerConfig;
use crate::error::{AiError, AiResult, Phase};
use crate::flag::{Flag, FlagSet};
use crate::goal::{Goal, RunState};

/// Handle to a goal registered in a [`GoalSelector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GoalId(u32);

struct WrappedGoal<C> {
    id: GoalId,
    priority: u32,
    flags: FlagSet,
    state: RunState,
    /// Selector ticks since the goal last started.
    running_ticks: u32,
    goal: Box<dyn Goal<C>>,
}

impl<C> WrappedGoal<C> {
    fn is_running(&self) -> bool {
        self.state.is_running()
    }

    fn can_be_replaced_by(&self, priority: u32) -> bool {
        self.goal.is_interruptable() && priority < self.priority
    }
}

/// Prioritized goals of one actor.
pub struct GoalSelector<C> {
    goals: Vec<WrappedGoal<C>>,
    /// Current holder of each flag, indexed by [`Flag::index`].
    locked: [Option<GoalId>; Flag::COUNT],
    disabled: FlagSet,
    tick_interval: u32,
    next_id: u32,
}

impl<C> Default for GoalSelector<C> {
    fn default() -> Self {
        Self::with_tick_interval(SchedulerConfig::default().goal_tick_interval)
    }
}

impl<C> GoalSelector<C> {
    pub fn new(config: &SchedulerConfig) -> AiResult<Self> {
        config.validate()?;
        Ok(Self::with_tick_interval(config.goal_tick_interval))
    }

    fn with_tick_interval(tick_interval: u32) -> Self {
        Self {
            goals: Vec::new(),
            locked: [None; Flag::COUNT],
            disabled: FlagSet::EMPTY,
            tick_interval,
            next_id: 0,
        }
    }

    /// Register a goal. Lower `priority` numbers win flag conflicts.
    pub fn add_goal(&mut self, priority: u32, goal: Box<dyn Goal<C>>) -> GoalId {
        let id = GoalId(self.next_id);
        self.next_id += 1;
        let flags = goal.flags();
        let at = self.goals.partition_point(|g| g.priority <= priority);
        self.goals.insert(
            at,
            WrappedGoal {
                id,
                priority,
                flags,
                state: RunState::Stopped,
                running_ticks: 0,
                goal,
            },
        );
        id
    }

    /// Remove a goal, stopping it first if it is running.
    ///
    /// Returns `Ok(false)` if no such goal is registered. The goal is removed
    /// even when its `stop()` faults.
    pub fn remove_goal(&mut self, id: GoalId, ctx: &mut C) -> AiResult<bool> {
        let Some(index) = self.index_of(id) else {
            return Ok(false);
        };
        let stopped = if self.goals[index].is_running() {
            self.stop_at(index, ctx)
        } else {
            Ok(())
        };
        self.goals.remove(index);
        stopped.map(|()| true)
    }

    /// Remove every goal matching `filter`. Returns how many were removed.
    pub fn remove_all_goals(
        &mut self,
        mut filter: impl FnMut(&dyn Goal<C>) -> bool,
        ctx: &mut C,
    ) -> AiResult<usize> {
        let ids: Vec<GoalId> = self
            .goals
            .iter()
            .filter(|g| filter(g.goal.as_ref()))
            .map(|g| g.id)
            .collect();
        let mut first_fault = None;
        for &id in &ids {
            if let Err(e) = self.remove_goal(id, ctx) {
                first_fault.get_or_insert(e);
            }
        }
        match first_fault {
            Some(e) => Err(e),
            None => Ok(ids.len()),
        }
    }

    pub fn disable_flag(&mut self, flag: Flag) {
        self.disabled.insert(flag);
    }

    pub fn enable_flag(&mut self, flag: Flag) {
        self.disabled.remove(flag);
    }

    pub fn set_flag(&mut self, flag: Flag, enabled: bool) {
        if enabled {
            self.enable_flag(flag);
        } else {
            self.disable_flag(flag);
        }
    }

    pub fn disabled_flags(&self) -> FlagSet {
        self.disabled
    }

    /// Run one selection pass, then tick the running goals.
    ///
    /// The first callback fault aborts the rest of the pass.
    pub fn tick(&mut self, ctx: &mut C) -> AiResult<()> {
        for index in 0..self.goals.len() {
            let disabled = self.disabled;
            let wrapped = &mut self.goals[index];
            if wrapped.is_running()
                && (wrapped.flags.intersects(disabled) || !wrapped.goal.can_continue_to_use(ctx))
            {
                self.stop_at(index, ctx)?;
            }
        }

        for index in 0..self.goals.len() {
            let candidate = &self.goals[index];
            if candidate.is_running()
                || candidate.flags.intersects(self.disabled)
                || !self.flags_available(candidate.flags, candidate.priority)
            {
                continue;
            }
            if !self.goals[index].goal.can_use(ctx) {
                continue;
            }
            self.preempt_holders(index, ctx)?;
            self.start_at(index, ctx)?;
        }

        self.tick_running(ctx)
    }

    /// Stop every running goal, e.g. when the actor leaves the simulation.
    /// All goals are stopped even if some `stop()` faults; the first fault is
    /// returned.
    pub fn stop_all(&mut self, ctx: &mut C) -> AiResult<()> {
        let mut first_fault = None;
        for index in 0..self.goals.len() {
            if self.goals[index].is_running() {
                if let Err(e) = self.stop_at(index, ctx) {
                    first_fault.get_or_insert(e);
                }
            }
        }
        first_fault.map_or(Ok(()), Err)
    }

    pub fn is_running(&self, id: GoalId) -> bool {
        self.index_of(id)
            .is_some_and(|index| self.goals[index].is_running())
    }

    /// Goal currently holding `flag`, if any.
    pub fn flag_holder(&self, flag: Flag) -> Option<GoalId> {
        self.locked[flag.index()]
    }

    /// Running goals in priority order.
    pub fn running_goals(&self) -> impl Iterator<Item = (GoalId, &dyn Goal<C>)> + '_ {
        self.goals
            .iter()
            .filter(|g| g.is_running())
            .map(|g| (g.id, g.goal.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    fn index_of(&self, id: GoalId) -> Option<usize> {
        self.goals.iter().position(|g| g.id == id)
    }

    fn flags_available(&self, flags: FlagSet, priority: u32) -> bool {
        flags.iter().all(|flag| match self.locked[flag.index()] {
            None => true,
            Some(holder) => self.index_of(holder).map_or(true, |h| {
                let holder = &self.goals[h];
                !holder.is_running() || holder.can_be_replaced_by(priority)
            }),
        })
    }

    fn preempt_holders(&mut self, index: usize, ctx: &mut C) -> AiResult<()> {
        let flags = self.goals[index].flags;
        let by = self.goals[index].goal.name();
        for flag in flags.iter() {
            let Some(holder) = self.locked[flag.index()] else {
                continue;
            };
            let Some(h) = self.index_of(holder) else {
                continue;
            };
            if self.goals[h].is_running() {
                debug!(goal = self.goals[h].goal.name(), by, ?flag, "goal preempted");
                self.stop_at(h, ctx)?;
            }
        }
        Ok(())
    }

    fn start_at(&mut self, index: usize, ctx: &mut C) -> AiResult<()> {
        let wrapped = &mut self.goals[index];
        wrapped.state = RunState::Running;
        wrapped.running_ticks = 0;
        for flag in wrapped.flags.iter() {
            self.locked[flag.index()] = Some(wrapped.id);
        }
        let name = wrapped.goal.name();
        debug!(goal = name, priority = wrapped.priority, flags = ?wrapped.flags, "goal started");
        wrapped
            .goal
            .start(ctx)
            .map_err(|e| AiError::goal(name, Phase::Start, e))
    }

    fn stop_at(&mut self, index: usize, ctx: &mut C) -> AiResult<()> {
        let wrapped = &mut self.goals[index];
        wrapped.state = RunState::Stopped;
        wrapped.running_ticks = 0;
        for slot in self.locked.iter_mut() {
            if *slot == Some(wrapped.id) {
                *slot = None;
            }
        }
        let name = wrapped.goal.name();
        debug!(goal = name, "goal stopped");
        wrapped
            .goal
            .stop(ctx)
            .map_err(|e| AiError::goal(name, Phase::Stop, e))
    }

    fn tick_running(&mut self, ctx: &mut C) -> AiResult<()> {
        let interval = self.tick_interval;
        for wrapped in self.goals.iter_mut().filter(|g| g.is_running()) {
            let due =
                wrapped.goal.requires_update_every_tick() || wrapped.running_ticks % interval == 0;
            wrapped.running_ticks = wrapped.running_ticks.wrapping_add(1);
            if due {
                let name = wrapped.goal.name();
                wrapped
                    .goal
                    .tick(ctx)
                    .map_err(|e| AiError::goal(name, Phase::Tick, e))?;
            }
        }
        Ok(())
    }
}

impl<C> fmt::Debug for GoalSelector<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoalSelector")
            .field("goal_count", &self.goals.len())
            .field(
                "running",
                &self.running_goals().map(|(_, g)| g.name()).collect::<Vec<_>>(),
            )
            .field("disabled", &self.disabled)
            .field("tick_interval", &self.tick_interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::error::{CallbackResult, Fault};

    #[derive(Default)]
    struct Ctx {
        usable: HashSet<&'static str>,
        log: Vec<String>,
        fail: Option<(&'static str, Phase)>,
    }

    impl Ctx {
        fn record(&mut self, name: &'static str, phase: Phase) -> CallbackResult {
            self.log.push(format!("{phase} {name}"));
            if self.fail == Some((name, phase)) {
                return Err(Fault::new("boom"));
            }
            Ok(())
        }

        fn allow(&mut self, names: &[&'static str]) {
            self.usable.extend(names);
        }

        fn deny(&mut self, name: &'static str) {
            self.usable.remove(name);
        }

        fn take_log(&mut self) -> Vec<String> {
            std::mem::take(&mut self.log)
        }
    }

    #[derive(Debug)]
    struct Recorder {
        name: &'static str,
        flags: FlagSet,
        every_tick: bool,
        interruptable: bool,
    }

    fn recorder(name: &'static str, flags: impl Into<FlagSet>) -> Box<Recorder> {
        Box::new(Recorder {
            name,
            flags: flags.into(),
            every_tick: true,
            interruptable: true,
        })
    }

    impl Goal<Ctx> for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn flags(&self) -> FlagSet {
            self.flags
        }

        fn can_use(&mut self, ctx: &Ctx) -> bool {
            ctx.usable.contains(self.name)
        }

        fn is_interruptable(&self) -> bool {
            self.interruptable
        }

        fn requires_update_every_tick(&self) -> bool {
            self.every_tick
        }

        fn start(&mut self, ctx: &mut Ctx) -> CallbackResult {
            ctx.record(self.name, Phase::Start)
        }

        fn tick(&mut self, ctx: &mut Ctx) -> CallbackResult {
            ctx.record(self.name, Phase::Tick)
        }

        fn stop(&mut self, ctx: &mut Ctx) -> CallbackResult {
            ctx.record(self.name, Phase::Stop)
        }
    }

    #[test]
    fn higher_priority_preempts_shared_flag() {
        let mut sel = GoalSelector::default();
        let a = sel.add_goal(1, recorder("A", Flag::Move));
        let b = sel.add_goal(3, recorder("B", Flag::Move));
        let mut ctx = Ctx::default();

        ctx.allow(&["B"]);
        sel.tick(&mut ctx).unwrap();
        assert_eq!(ctx.take_log(), ["start B", "tick B"]);

        ctx.allow(&["A"]);
        sel.tick(&mut ctx).unwrap();
        assert_eq!(ctx.take_log(), ["stop B", "start A", "tick A"]);
        assert!(sel.is_running(a));
        assert!(!sel.is_running(b));
        assert_eq!(sel.flag_holder(Flag::Move), Some(a));
    }

    #[test]
    fn lower_priority_resumes_when_holder_stops() {
        let mut sel = GoalSelector::default();
        sel.add_goal(1, recorder("A", Flag::Move));
        let b = sel.add_goal(3, recorder("B", Flag::Move));
        let mut ctx = Ctx::default();
        ctx.allow(&["A", "B"]);
        sel.tick(&mut ctx).unwrap();
        assert_eq!(ctx.take_log(), ["start A", "tick A"]);

        ctx.deny("A");
        sel.tick(&mut ctx).unwrap();
        assert_eq!(ctx.take_log(), ["stop A", "start B", "tick B"]);
        assert_eq!(sel.flag_holder(Flag::Move), Some(b));
    }

    #[test]
    fn late_registration_sorts_by_priority() {
        let mut sel = GoalSelector::default();
        let a = sel.add_goal(5, recorder("A", Flag::Jump));
        let b = sel.add_goal(1, recorder("B", Flag::Look));
        let c = sel.add_goal(5, recorder("C", Flag::Target));
        let d = sel.add_goal(1, recorder("D", Flag::Move));
        let mut ctx = Ctx::default();
        ctx.allow(&["A", "B", "C", "D"]);
        sel.tick(&mut ctx).unwrap();
        assert_eq!(
            ctx.take_log(),
            [
                "start B", "start D", "start A", "start C", "tick B", "tick D", "tick A",
                "tick C"
            ]
        );
        let order: Vec<GoalId> = sel.running_goals().map(|(id, _)| id).collect();
        assert_eq!(order, [b, d, a, c]);
    }

    #[test]
    fn late_registration_preempts_in_priority_order() {
        let mut sel = GoalSelector::default();
        let a = sel.add_goal(5, recorder("A", Flag::Move));
        let b = sel.add_goal(1, recorder("B", Flag::Move));
        sel.add_goal(5, recorder("C", Flag::Move));
        let d = sel.add_goal(1, recorder("D", Flag::Move));
        let mut ctx = Ctx::default();

        ctx.allow(&["A", "C"]);
        sel.tick(&mut ctx).unwrap();
        assert_eq!(ctx.take_log(), ["start A", "tick A"]);
        assert_eq!(sel.flag_holder(Flag::Move), Some(a));

        ctx.allow(&["D"]);
        sel.tick(&mut ctx).unwrap();
        assert_eq!(ctx.take_log(), ["stop A", "start D", "tick D"]);

        ctx.allow(&["B"]);
        sel.tick(&mut ctx).unwrap();
        assert_eq!(ctx.take_log(), ["tick D"], "equal priority never preempts");

        ctx.deny("D");
        sel.tick(&mut ctx).unwrap();
        assert_eq!(ctx.take_log(), ["stop D", "start B", "tick B"]);
        assert_eq!(sel.flag_holder(Flag::Move), Some(b));
        assert!(!sel.is_running(d));
    }

    #[test]
    fn equal_priority_keeps_registration_order() {
        let mut sel = GoalSelector::default();
        let first = sel.add_goal(2, recorder("X", Flag::Move));
        let second = sel.add_goal(2, recorder("Y", Flag::Move));
        let mut ctx = Ctx::default();
        ctx.allow(&["X", "Y"]);
        for _ in 0..3 {
            sel.tick(&mut ctx).unwrap();
        }
        assert!(sel.is_running(first));
        assert!(!sel.is_running(second));
    }

    #[test]
    fn equal_priority_does_not_preempt() {
        let mut sel = GoalSelector::default();
        sel.add_goal(2, recorder("X", Flag::Move));
        let y = sel.add_goal(2, recorder("Y", Flag::Move));
        let mut ctx = Ctx::default();
        ctx.allow(&["Y"]);
        sel.tick(&mut ctx).unwrap();
        ctx.allow(&["X"]);
        sel.tick(&mut ctx).unwrap();
        assert!(sel.is_running(y));
        assert_eq!(ctx.take_log(), ["start Y", "tick Y", "tick Y"]);
    }

    #[test]
    fn disjoint_flags_run_together() {
        let mut sel = GoalSelector::default();
        let walk = sel.add_goal(5, recorder("Walk", Flag::Move));
        let look = sel.add_goal(8, recorder("Look", Flag::Look));
        let mut ctx = Ctx::default();
        ctx.allow(&["Walk", "Look"]);
        sel.tick(&mut ctx).unwrap();
        assert!(sel.is_running(walk));
        assert!(sel.is_running(look));
        assert_eq!(sel.running_goals().count(), 2);
    }

    #[test]
    fn multi_flag_goal_preempts_every_holder_first() {
        let mut sel = GoalSelector::default();
        sel.add_goal(1, recorder("A", Flag::Move | Flag::Look));
        sel.add_goal(2, recorder("B", Flag::Move));
        sel.add_goal(3, recorder("C", Flag::Look));
        let mut ctx = Ctx::default();
        ctx.allow(&["B", "C"]);
        sel.tick(&mut ctx).unwrap();
        ctx.take_log();

        ctx.allow(&["A"]);
        sel.tick(&mut ctx).unwrap();
        assert_eq!(ctx.take_log(), ["stop B", "stop C", "start A", "tick A"]);
    }

    #[test]
    fn blocked_when_any_flag_is_held_by_more_important_goal() {
        let mut sel = GoalSelector::default();
        sel.add_goal(1, recorder("C", Flag::Look));
        let a = sel.add_goal(2, recorder("A", Flag::Move | Flag::Look));
        let b = sel.add_goal(3, recorder("B", Flag::Move));
        let mut ctx = Ctx::default();
        ctx.allow(&["A", "B", "C"]);
        sel.tick(&mut ctx).unwrap();
        assert!(!sel.is_running(a));
        assert!(sel.is_running(b));
    }

    #[test]
    fn uninterruptable_goal_keeps_its_flags() {
        let mut sel = GoalSelector::default();
        let a = sel.add_goal(1, recorder("A", Flag::Move));
        let mut stubborn = recorder("B", Flag::Move);
        stubborn.interruptable = false;
        let b = sel.add_goal(3, stubborn);
        let mut ctx = Ctx::default();
        ctx.allow(&["B"]);
        sel.tick(&mut ctx).unwrap();
        ctx.allow(&["A"]);
        sel.tick(&mut ctx).unwrap();
        assert!(sel.is_running(b));
        assert!(!sel.is_running(a));
    }

    #[test]
    fn continuation_failure_stops_goal() {
        let mut sel = GoalSelector::default();
        let a = sel.add_goal(4, recorder("A", Flag::Jump));
        let mut ctx = Ctx::default();
        ctx.allow(&["A"]);
        sel.tick(&mut ctx).unwrap();
        ctx.deny("A");
        sel.tick(&mut ctx).unwrap();
        assert!(!sel.is_running(a));
        assert_eq!(sel.flag_holder(Flag::Jump), None);
        assert_eq!(ctx.take_log(), ["start A", "tick A", "stop A"]);
    }

    #[test]
    fn disabled_flag_stops_and_blocks() {
        let mut sel = GoalSelector::default();
        let walk = sel.add_goal(5, recorder("Walk", Flag::Move));
        let look = sel.add_goal(6, recorder("Look", Flag::Look));
        let mut ctx = Ctx::default();
        ctx.allow(&["Walk", "Look"]);
        sel.tick(&mut ctx).unwrap();

        sel.disable_flag(Flag::Move);
        sel.tick(&mut ctx).unwrap();
        sel.tick(&mut ctx).unwrap();
        assert!(!sel.is_running(walk));
        assert!(sel.is_running(look));

        sel.set_flag(Flag::Move, true);
        sel.tick(&mut ctx).unwrap();
        assert!(sel.is_running(walk));
    }

    #[test]
    fn throttled_goal_ticks_every_interval() {
        let config = SchedulerConfig {
            goal_tick_interval: 3,
        };
        let mut sel = GoalSelector::new(&config).unwrap();
        let mut lazy = recorder("Lazy", Flag::Look);
        lazy.every_tick = false;
        sel.add_goal(1, lazy);
        sel.add_goal(2, recorder("Eager", Flag::Move));
        let mut ctx = Ctx::default();
        ctx.allow(&["Lazy", "Eager"]);

        let mut lazy_ticks = Vec::new();
        let mut eager_ticks = 0;
        for _ in 0..7 {
            sel.tick(&mut ctx).unwrap();
            let log = ctx.take_log();
            lazy_ticks.push(log.iter().any(|l| l == "tick Lazy"));
            eager_ticks += log.iter().filter(|l| *l == "tick Eager").count();
        }
        assert_eq!(
            lazy_ticks,
            [true, false, false, true, false, false, true]
        );
        assert_eq!(eager_ticks, 7);
    }

    #[test]
    fn start_fault_propagates_and_stop_still_pairs() {
        let mut sel = GoalSelector::default();
        let a = sel.add_goal(1, recorder("A", Flag::Move));
        let mut ctx = Ctx::default();
        ctx.allow(&["A"]);
        ctx.fail = Some(("A", Phase::Start));

        let err = sel.tick(&mut ctx).unwrap_err();
        assert!(matches!(
            err,
            AiError::Callback {
                name: "A",
                phase: Phase::Start,
                ..
            }
        ));
        assert!(sel.is_running(a));

        ctx.fail = None;
        ctx.deny("A");
        ctx.take_log();
        sel.tick(&mut ctx).unwrap();
        assert_eq!(ctx.take_log(), ["stop A"]);
    }

    #[test]
    fn remove_goal_stops_running_goal() {
        let mut sel = GoalSelector::default();
        let a = sel.add_goal(1, recorder("A", Flag::Move));
        let mut ctx = Ctx::default();
        ctx.allow(&["A"]);
        sel.tick(&mut ctx).unwrap();
        ctx.take_log();

        assert!(sel.remove_goal(a, &mut ctx).unwrap());
        assert_eq!(ctx.take_log(), ["stop A"]);
        assert_eq!(sel.flag_holder(Flag::Move), None);
        assert!(!sel.remove_goal(a, &mut ctx).unwrap());
        assert!(sel.is_empty());
    }

    #[test]
    fn remove_all_goals_by_name() {
        let mut sel = GoalSelector::default();
        sel.add_goal(1, recorder("A", Flag::Move));
        sel.add_goal(2, recorder("B", Flag::Look));
        sel.add_goal(3, recorder("A", Flag::Jump));
        let mut ctx = Ctx::default();
        let removed = sel.remove_all_goals(|g| g.name() == "A", &mut ctx).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn stop_all_releases_every_flag() {
        let mut sel = GoalSelector::default();
        sel.add_goal(1, recorder("A", Flag::Move));
        sel.add_goal(2, recorder("B", Flag::Look | Flag::Target));
        let mut ctx = Ctx::default();
        ctx.allow(&["A", "B"]);
        sel.tick(&mut ctx).unwrap();
        sel.stop_all(&mut ctx).unwrap();
        assert_eq!(sel.running_goals().count(), 0);
        assert!(Flag::ALL.iter().all(|f| sel.flag_holder(*f).is_none()));
    }

    #[test]
    fn flags_stay_exclusive_and_lifecycle_pairs() {
        let roster: [(&'static str, u32, FlagSet); 6] = [
            ("float", 0, Flag::Jump.into()),
            ("panic", 1, Flag::Move.into()),
            ("melee", 2, Flag::Move | Flag::Look),
            ("stroll", 5, Flag::Move.into()),
            ("stare", 6, Flag::Look.into()),
            ("look_around", 7, Flag::Move | Flag::Look),
        ];
        let mut sel = GoalSelector::default();
        for (name, priority, flags) in roster {
            sel.add_goal(priority, recorder(name, flags));
        }
        let mut ctx = Ctx::default();
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut running: HashMap<&str, bool> = HashMap::new();

        for _ in 0..500 {
            for (name, _, _) in roster {
                if rng.gen_bool(0.3) {
                    if ctx.usable.contains(name) {
                        ctx.deny(name);
                    } else {
                        ctx.allow(&[name]);
                    }
                }
            }
            sel.tick(&mut ctx).unwrap();

            let mut held = FlagSet::EMPTY;
            for (_, goal) in sel.running_goals() {
                assert!(!held.intersects(goal.flags()), "flag shared by two goals");
                held = held | goal.flags();
            }

            for line in ctx.take_log() {
                let (phase, name) = line.split_once(' ').unwrap();
                let name = roster.iter().find(|s| s.0 == name).unwrap().0;
                let was_running = running.get(name).copied().unwrap_or(false);
                match phase {
                    "start" => {
                        assert!(!was_running, "{name} started twice");
                        running.insert(name, true);
                    }
                    "stop" => {
                        assert!(was_running, "{name} stopped without start");
                        running.insert(name, false);
                    }
                    _ => assert!(was_running, "{name} ticked while stopped"),
                }
            }
        }
    }
}
