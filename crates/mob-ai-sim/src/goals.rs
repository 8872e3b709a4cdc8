//! Goals for goal-driven mobs.

use mob_ai::{CallbackResult, Flag, FlagSet, Goal};
use rand::Rng;

use crate::context::MobContext;
use crate::steering::{self, Vec3, ARRIVAL_RADIUS};

// ---------------------------------------------------------------------------
// RandomStroll (Move) — wander to a random nearby point, then rest
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct RandomStroll {
    radius: f32,
    destination: Option<Vec3>,
    /// Tick when the mob may pick a new destination.
    cooldown_until: u64,
}

impl RandomStroll {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            destination: None,
            cooldown_until: 0,
        }
    }
}

impl Goal<MobContext> for RandomStroll {
    fn flags(&self) -> FlagSet {
        Flag::Move.into()
    }

    fn can_use(&mut self, ctx: &MobContext) -> bool {
        ctx.current_tick >= self.cooldown_until
    }

    fn can_continue_to_use(&mut self, ctx: &MobContext) -> bool {
        match self.destination {
            Some(dest) if steering::distance_xz(ctx.position, dest) >= ARRIVAL_RADIUS => true,
            _ => {
                self.cooldown_until = ctx.current_tick + rand::thread_rng().gen_range(40..120);
                false
            }
        }
    }

    fn start(&mut self, ctx: &mut MobContext) -> CallbackResult {
        let dest = steering::random_point_near(ctx.position, self.radius, &mut rand::thread_rng());
        self.destination = Some(dest);
        ctx.output.walk_to(dest, 1.0);
        Ok(())
    }

    fn stop(&mut self, ctx: &mut MobContext) -> CallbackResult {
        self.destination = None;
        ctx.output.halt();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Panic (Move) — run away from whatever hit us
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Panic {
    speed_multiplier: f32,
    destination: Option<Vec3>,
    started_at: u64,
}

impl Panic {
    /// Only hits this recent trigger a panic.
    const TRIGGER_WINDOW: u64 = 10;
    /// Give up fleeing after this many ticks.
    const MAX_DURATION: u64 = 100;
    const FLEE_DISTANCE: f32 = 8.0;

    pub fn new(speed_multiplier: f32) -> Self {
        Self {
            speed_multiplier,
            destination: None,
            started_at: 0,
        }
    }
}

impl Goal<MobContext> for Panic {
    fn flags(&self) -> FlagSet {
        Flag::Move.into()
    }

    fn can_use(&mut self, ctx: &MobContext) -> bool {
        ctx.ticks_since_hurt()
            .is_some_and(|age| age <= Self::TRIGGER_WINDOW)
    }

    fn can_continue_to_use(&mut self, ctx: &MobContext) -> bool {
        let Some(dest) = self.destination else {
            return false;
        };
        ctx.current_tick.saturating_sub(self.started_at) < Self::MAX_DURATION
            && steering::distance_xz(ctx.position, dest) >= ARRIVAL_RADIUS
    }

    fn start(&mut self, ctx: &mut MobContext) -> CallbackResult {
        let threat = ctx
            .last_damage
            .attacker
            .and_then(|(entity, _)| ctx.player(entity))
            .map(|p| p.position);
        let dest = match threat {
            Some(threat) => steering::flee_point(ctx.position, threat, Self::FLEE_DISTANCE),
            None => steering::random_point_near(
                ctx.position,
                Self::FLEE_DISTANCE,
                &mut rand::thread_rng(),
            ),
        };
        self.destination = Some(dest);
        self.started_at = ctx.current_tick;
        ctx.output.walk_to(dest, self.speed_multiplier);
        Ok(())
    }

    fn stop(&mut self, ctx: &mut MobContext) -> CallbackResult {
        self.destination = None;
        ctx.output.halt();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MeleeAttack (Move + Look) — chase the target and hit it in reach
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct MeleeAttack {
    /// Ticks between hits.
    attack_interval: u64,
    next_attack_tick: u64,
    reach: f32,
    follow_range: f32,
}

impl MeleeAttack {
    pub fn new(attack_interval: u64) -> Self {
        Self {
            attack_interval,
            next_attack_tick: 0,
            reach: 2.0,
            follow_range: 24.0,
        }
    }
}

impl Goal<MobContext> for MeleeAttack {
    fn flags(&self) -> FlagSet {
        Flag::Move | Flag::Look
    }

    fn can_use(&mut self, ctx: &MobContext) -> bool {
        ctx.target
            .is_some_and(|target| target.distance <= self.follow_range)
    }

    fn requires_update_every_tick(&self) -> bool {
        true
    }

    fn tick(&mut self, ctx: &mut MobContext) -> CallbackResult {
        let Some(target) = ctx.target else {
            return Ok(());
        };
        ctx.output.face(target.position);
        if target.distance > self.reach {
            ctx.output.walk_to(target.position, 1.0);
            return Ok(());
        }
        ctx.output.halt();
        if ctx.current_tick >= self.next_attack_tick {
            ctx.output.strike(target.handle());
            self.next_attack_tick = ctx.current_tick + self.attack_interval;
        }
        Ok(())
    }

    fn stop(&mut self, ctx: &mut MobContext) -> CallbackResult {
        ctx.output.halt();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LookAtPlayer (Look) — stare at the nearest player for a while
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct LookAtPlayer {
    range: f32,
    look_ticks: u32,
}

impl LookAtPlayer {
    pub fn new(range: f32) -> Self {
        Self {
            range,
            look_ticks: 0,
        }
    }

    fn player_in_range(&self, ctx: &MobContext) -> Option<Vec3> {
        ctx.nearest_player()
            .filter(|p| p.distance <= self.range)
            .map(|p| p.position)
    }
}

impl Goal<MobContext> for LookAtPlayer {
    fn flags(&self) -> FlagSet {
        Flag::Look.into()
    }

    fn can_use(&mut self, ctx: &MobContext) -> bool {
        self.player_in_range(ctx).is_some()
    }

    fn can_continue_to_use(&mut self, ctx: &MobContext) -> bool {
        self.look_ticks > 0 && self.player_in_range(ctx).is_some()
    }

    fn requires_update_every_tick(&self) -> bool {
        true
    }

    fn start(&mut self, _ctx: &mut MobContext) -> CallbackResult {
        self.look_ticks = 40 + rand::thread_rng().gen_range(0..40);
        Ok(())
    }

    fn tick(&mut self, ctx: &mut MobContext) -> CallbackResult {
        if let Some(point) = self.player_in_range(ctx) {
            ctx.output.face(point);
        }
        self.look_ticks = self.look_ticks.saturating_sub(1);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// HurtByTarget (Target) — retaliate against the last attacker
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct HurtByTarget {
    /// Ticks after a hit during which the attacker is targeted.
    memory_ticks: u64,
    /// Hit already answered, so one hit triggers once.
    answered_hit: Option<u64>,
}

impl Default for HurtByTarget {
    fn default() -> Self {
        Self {
            memory_ticks: 60,
            answered_hit: None,
        }
    }
}

impl HurtByTarget {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Goal<MobContext> for HurtByTarget {
    fn flags(&self) -> FlagSet {
        Flag::Target.into()
    }

    fn can_use(&mut self, ctx: &MobContext) -> bool {
        let fresh_hit = ctx.last_damage.tick.is_some() && ctx.last_damage.tick != self.answered_hit;
        let attacker_visible = ctx
            .last_damage
            .attacker
            .is_some_and(|(entity, _)| ctx.player(entity).is_some());
        fresh_hit
            && attacker_visible
            && ctx.ticks_since_hurt().is_some_and(|age| age < self.memory_ticks)
    }

    fn can_continue_to_use(&mut self, ctx: &MobContext) -> bool {
        ctx.target.is_some()
            && ctx
                .ticks_since_hurt()
                .is_some_and(|age| age < self.memory_ticks * 2)
    }

    fn start(&mut self, ctx: &mut MobContext) -> CallbackResult {
        self.answered_hit = ctx.last_damage.tick;
        let attacker = ctx
            .last_damage
            .attacker
            .and_then(|(entity, _)| ctx.player(entity))
            .copied();
        if let Some(attacker) = attacker {
            ctx.output.target(attacker.handle());
        }
        Ok(())
    }

    fn stop(&mut self, ctx: &mut MobContext) -> CallbackResult {
        ctx.output.forget_target();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// NearestAttackableTarget (Target) — pick the closest player in range
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct NearestAttackableTarget {
    range: f32,
}

impl NearestAttackableTarget {
    pub fn new(range: f32) -> Self {
        Self { range }
    }
}

impl Goal<MobContext> for NearestAttackableTarget {
    fn flags(&self) -> FlagSet {
        Flag::Target.into()
    }

    fn can_use(&mut self, ctx: &MobContext) -> bool {
        ctx.target.is_none()
            && ctx
                .nearest_player()
                .is_some_and(|p| p.distance <= self.range)
    }

    fn can_continue_to_use(&mut self, ctx: &MobContext) -> bool {
        ctx.target
            .is_some_and(|target| target.distance <= self.range * 2.0)
    }

    fn start(&mut self, ctx: &mut MobContext) -> CallbackResult {
        if let Some(nearest) = ctx.nearest_player().copied() {
            ctx.output.target(nearest.handle());
        }
        Ok(())
    }

    fn stop(&mut self, ctx: &mut MobContext) -> CallbackResult {
        ctx.output.forget_target();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bevy_ecs::entity::Entity;
    use mob_ai::{GoalSelector, SchedulerConfig};

    use super::*;
    use crate::context::TargetInfo;

    fn player_at(index: u32, position: Vec3, mob: Vec3) -> TargetInfo {
        TargetInfo {
            entity: Entity::from_raw(index),
            runtime_id: u64::from(index),
            position,
            distance: steering::distance_xz(mob, position),
        }
    }

    fn ctx_at(tick: u64) -> MobContext {
        MobContext::new(1, (0.0, 4.0, 0.0), tick)
    }

    #[test]
    fn stroll_rests_after_arrival() {
        let mut stroll = RandomStroll::new(6.0);
        let mut ctx = ctx_at(0);
        assert!(stroll.can_use(&ctx));
        stroll.start(&mut ctx).unwrap();
        let dest = ctx.output.move_to.unwrap().destination;
        assert!(stroll.can_continue_to_use(&ctx));

        ctx.position = dest;
        ctx.current_tick = 30;
        assert!(!stroll.can_continue_to_use(&ctx));
        assert!(!stroll.can_use(&ctx));

        stroll.stop(&mut ctx).unwrap();
        assert!(ctx.output.stop_moving);
    }

    #[test]
    fn panic_needs_a_recent_hit() {
        let mut panic = Panic::new(1.25);
        let mut ctx = ctx_at(100);
        assert!(!panic.can_use(&ctx));

        ctx.last_damage.tick = Some(80);
        assert!(!panic.can_use(&ctx));

        ctx.last_damage.tick = Some(98);
        assert!(panic.can_use(&ctx));
    }

    #[test]
    fn panic_flees_away_from_visible_attacker() {
        let mut panic = Panic::new(1.25);
        let mut ctx = ctx_at(100);
        let attacker = player_at(7, (-3.0, 4.0, 0.0), ctx.position);
        ctx.players = vec![attacker];
        ctx.last_damage.tick = Some(99);
        ctx.last_damage.attacker = Some((attacker.entity, attacker.runtime_id));

        panic.start(&mut ctx).unwrap();
        let request = ctx.output.move_to.unwrap();
        assert!(request.destination.0 > 7.0);
        assert_eq!(request.speed_multiplier, 1.25);
        assert!(panic.can_continue_to_use(&ctx));

        ctx.current_tick = 200;
        assert!(!panic.can_continue_to_use(&ctx));
    }

    #[test]
    fn melee_chases_then_strikes_on_cooldown() {
        let mut melee = MeleeAttack::new(20);
        let mut ctx = ctx_at(10);
        assert!(!melee.can_use(&ctx));

        ctx.target = Some(player_at(3, (6.0, 4.0, 0.0), ctx.position));
        assert!(melee.can_use(&ctx));
        melee.tick(&mut ctx).unwrap();
        assert_eq!(ctx.output.move_to.unwrap().destination, (6.0, 4.0, 0.0));
        assert!(ctx.output.attack.is_none());

        ctx.output = Default::default();
        ctx.target = Some(player_at(3, (1.5, 4.0, 0.0), ctx.position));
        melee.tick(&mut ctx).unwrap();
        assert!(ctx.output.attack.is_some());
        assert!(ctx.output.stop_moving);

        ctx.output = Default::default();
        ctx.current_tick = 20;
        melee.tick(&mut ctx).unwrap();
        assert!(ctx.output.attack.is_none());

        ctx.current_tick = 30;
        melee.tick(&mut ctx).unwrap();
        assert!(ctx.output.attack.is_some());
    }

    #[test]
    fn look_at_player_loses_interest() {
        let mut look = LookAtPlayer::new(8.0);
        let mut ctx = ctx_at(0);
        ctx.players = vec![player_at(2, (4.0, 4.0, 0.0), ctx.position)];
        assert!(look.can_use(&ctx));
        look.start(&mut ctx).unwrap();

        let mut ticks = 0;
        while look.can_continue_to_use(&ctx) {
            look.tick(&mut ctx).unwrap();
            ticks += 1;
        }
        assert!((40..80).contains(&ticks));
        assert_eq!(ctx.output.look_at, Some((4.0, 4.0, 0.0)));

        ctx.players[0] = player_at(2, (20.0, 4.0, 0.0), ctx.position);
        assert!(!look.can_use(&ctx));
    }

    #[test]
    fn hurt_by_target_answers_each_hit_once() {
        let mut hurt = HurtByTarget::new();
        let mut ctx = ctx_at(50);
        let attacker = player_at(4, (3.0, 4.0, 0.0), ctx.position);
        ctx.players = vec![attacker];
        ctx.last_damage.tick = Some(48);
        ctx.last_damage.attacker = Some((attacker.entity, attacker.runtime_id));

        assert!(hurt.can_use(&ctx));
        hurt.start(&mut ctx).unwrap();
        assert_eq!(ctx.output.set_target, Some((attacker.entity, 4)));
        assert!(!hurt.can_use(&ctx));

        ctx.last_damage.tick = Some(50);
        assert!(hurt.can_use(&ctx));
    }

    #[test]
    fn retaliation_preempts_nearest_target() {
        let mut targets: GoalSelector<MobContext> =
            GoalSelector::new(&SchedulerConfig::default()).unwrap();
        let hurt = targets.add_goal(1, Box::new(HurtByTarget::new()));
        let nearest = targets.add_goal(2, Box::new(NearestAttackableTarget::new(16.0)));

        let mut ctx = ctx_at(10);
        let near = player_at(1, (3.0, 4.0, 0.0), ctx.position);
        let far = player_at(2, (9.0, 4.0, 0.0), ctx.position);
        ctx.players = vec![near, far];
        targets.tick(&mut ctx).unwrap();
        assert!(targets.is_running(nearest));
        assert_eq!(ctx.output.set_target, Some((near.entity, 1)));

        ctx.commit_target_change();
        ctx.output = Default::default();
        ctx.current_tick = 11;
        ctx.last_damage.tick = Some(11);
        ctx.last_damage.attacker = Some((far.entity, far.runtime_id));
        targets.tick(&mut ctx).unwrap();

        assert!(!targets.is_running(nearest));
        assert_eq!(targets.flag_holder(Flag::Target), Some(hurt));
        assert_eq!(ctx.output.set_target, Some((far.entity, 2)));
        assert!(!ctx.output.clear_target);
    }
}
