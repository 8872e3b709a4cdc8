//! Brain layout for the piglin brute: sensor-fed memories, a core activity
//! that turns walk and look targets into movement, and idle/fight activities
//! picked by whether an attack target is remembered.

use bevy_ecs::entity::Entity;
use mob_ai::{
    Activity, ActivityId, AiResult, Behavior, Brain, CallbackResult, MemoryCondition, MemoryKey,
    MemoryModuleType, MemoryStore, Sensor,
};
use rand::Rng;

use crate::context::{MobContext, TargetInfo};
use crate::steering::{self, Vec3, ARRIVAL_RADIUS};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkTarget {
    pub destination: Vec3,
    pub speed_multiplier: f32,
}

pub const NEAREST_PLAYER: MemoryModuleType<TargetInfo> =
    MemoryModuleType::expirable("nearest_visible_player");
pub const HURT_BY: MemoryModuleType<(Entity, u64)> = MemoryModuleType::expirable("hurt_by");
pub const ATTACK_TARGET: MemoryModuleType<(Entity, u64)> = MemoryModuleType::new("attack_target");
pub const WALK_TARGET: MemoryModuleType<WalkTarget> = MemoryModuleType::new("walk_target");
pub const LOOK_TARGET: MemoryModuleType<Vec3> = MemoryModuleType::expirable("look_target");
pub const ATTACK_COOLING_DOWN: MemoryModuleType<()> =
    MemoryModuleType::expirable("attack_cooling_down");
pub const STROLL_COOLDOWN: MemoryModuleType<()> = MemoryModuleType::expirable("stroll_cooldown");

const DETECTION_RANGE: f32 = 16.0;
const FORGET_RANGE: f32 = 24.0;
const REACH: f32 = 2.0;
const ATTACK_COOLDOWN: u64 = 20;

pub fn create_brain(salt: u64) -> AiResult<Brain<MobContext>> {
    let mut b = Brain::builder();
    b.sensor(Box::new(NearestPlayerSensor))
        .sensor(Box::new(HurtBySensor));

    let look_sink = b.add_behavior(Box::new(LookAtTargetSink));
    let move_sink = b.add_behavior(Box::new(MoveToTargetSink));
    let start_attacking = b.add_behavior(Box::new(StartAttacking));
    let stroll = b.add_behavior(Box::new(StrollAround { radius: 8.0 }));
    let look_around = b.add_behavior(Box::new(LookAtNearestPlayer));
    let stop_attacking = b.add_behavior(Box::new(StopAttackingIfTargetInvalid));
    let chase = b.add_behavior(Box::new(ChaseTarget));
    let strike = b.add_behavior(Box::new(MeleeStrike));

    b.activity(Activity::core(0).with(look_sink).with(move_sink))
        .activity(
            Activity::new(ActivityId::IDLE, 10)
                .requires(MemoryCondition::absent(&ATTACK_TARGET))
                .with(start_attacking)
                .with(stroll)
                .with(look_around)
                .erase_on_stop(&WALK_TARGET),
        )
        .activity(
            Activity::new(ActivityId::FIGHT, 10)
                .requires(MemoryCondition::present(&ATTACK_TARGET))
                .with(stop_attacking)
                .with(chase)
                .with(strike)
                .erase_on_stop(&WALK_TARGET)
                .erase_on_stop(&LOOK_TARGET),
        )
        .rotation([ActivityId::FIGHT, ActivityId::IDLE])
        .default_activity(ActivityId::IDLE);
    b.build(salt)
}

/// Current view of the remembered attack target, if it is still visible.
fn visible_target<'a>(ctx: &'a MobContext, memory: &MemoryStore) -> Option<&'a TargetInfo> {
    memory
        .get(&ATTACK_TARGET)
        .and_then(|&(entity, _)| ctx.player(entity))
}

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct NearestPlayerSensor;

impl Sensor<MobContext> for NearestPlayerSensor {
    fn interval(&self) -> u64 {
        10
    }

    fn produces(&self) -> Vec<MemoryKey> {
        vec![NEAREST_PLAYER.key()]
    }

    fn sense(&mut self, ctx: &MobContext, memory: &mut MemoryStore) {
        match ctx.nearest_player().filter(|p| p.distance <= DETECTION_RANGE) {
            Some(player) => memory.set_with_expiry(&NEAREST_PLAYER, *player, 20),
            None => memory.erase(&NEAREST_PLAYER),
        }
    }
}

#[derive(Debug)]
struct HurtBySensor;

impl Sensor<MobContext> for HurtBySensor {
    fn interval(&self) -> u64 {
        2
    }

    fn produces(&self) -> Vec<MemoryKey> {
        vec![HURT_BY.key()]
    }

    fn sense(&mut self, ctx: &MobContext, memory: &mut MemoryStore) {
        let fresh = ctx.ticks_since_hurt().is_some_and(|age| age < self.interval());
        if let (true, Some(attacker)) = (fresh, ctx.last_damage.attacker) {
            memory.set_with_expiry(&HURT_BY, attacker, 100);
        }
    }
}

// ---------------------------------------------------------------------------
// Core
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct LookAtTargetSink;

impl Behavior<MobContext> for LookAtTargetSink {
    fn entry_conditions(&self) -> Vec<MemoryCondition> {
        vec![MemoryCondition::present(&LOOK_TARGET)]
    }

    fn can_still_use(&mut self, _ctx: &MobContext, memory: &MemoryStore) -> bool {
        memory.has(&LOOK_TARGET)
    }

    fn tick(&mut self, ctx: &mut MobContext, memory: &mut MemoryStore) -> CallbackResult {
        if let Some(&point) = memory.get(&LOOK_TARGET) {
            ctx.output.face(point);
        }
        Ok(())
    }
}

#[derive(Debug)]
struct MoveToTargetSink;

impl Behavior<MobContext> for MoveToTargetSink {
    fn entry_conditions(&self) -> Vec<MemoryCondition> {
        vec![MemoryCondition::present(&WALK_TARGET)]
    }

    fn can_still_use(&mut self, ctx: &MobContext, memory: &MemoryStore) -> bool {
        memory
            .get(&WALK_TARGET)
            .is_some_and(|walk| steering::distance_xz(ctx.position, walk.destination) >= ARRIVAL_RADIUS)
    }

    fn tick(&mut self, ctx: &mut MobContext, memory: &mut MemoryStore) -> CallbackResult {
        if let Some(walk) = memory.get(&WALK_TARGET) {
            ctx.output.walk_to(walk.destination, walk.speed_multiplier);
        }
        Ok(())
    }

    fn stop(&mut self, ctx: &mut MobContext, memory: &mut MemoryStore) -> CallbackResult {
        memory.erase(&WALK_TARGET);
        ctx.output.halt();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Idle
// ---------------------------------------------------------------------------

/// Remember an attacker, or failing that the nearest player, as the attack
/// target.
#[derive(Debug)]
struct StartAttacking;

impl Behavior<MobContext> for StartAttacking {
    fn entry_conditions(&self) -> Vec<MemoryCondition> {
        vec![MemoryCondition::absent(&ATTACK_TARGET)]
    }

    fn check_extra_start_conditions(&mut self, ctx: &MobContext, memory: &MemoryStore) -> bool {
        Self::victim(ctx, memory).is_some()
    }

    fn start(&mut self, ctx: &mut MobContext, memory: &mut MemoryStore) -> CallbackResult {
        if let Some(victim) = Self::victim(ctx, memory) {
            memory.set(&ATTACK_TARGET, victim);
            ctx.output.target(victim);
        }
        Ok(())
    }
}

impl StartAttacking {
    fn victim(ctx: &MobContext, memory: &MemoryStore) -> Option<(Entity, u64)> {
        let attacker = memory.get(&HURT_BY).map(|&(entity, _)| entity);
        let nearest = memory.get(&NEAREST_PLAYER).map(|p| p.entity);
        attacker
            .and_then(|entity| ctx.player(entity))
            .or_else(|| nearest.and_then(|entity| ctx.player(entity)))
            .map(TargetInfo::handle)
    }
}

#[derive(Debug)]
struct StrollAround {
    radius: f32,
}

impl Behavior<MobContext> for StrollAround {
    fn entry_conditions(&self) -> Vec<MemoryCondition> {
        vec![
            MemoryCondition::absent(&WALK_TARGET),
            MemoryCondition::absent(&STROLL_COOLDOWN),
        ]
    }

    fn start(&mut self, ctx: &mut MobContext, memory: &mut MemoryStore) -> CallbackResult {
        let mut rng = rand::thread_rng();
        let destination = steering::random_point_near(ctx.position, self.radius, &mut rng);
        memory.set(
            &WALK_TARGET,
            WalkTarget {
                destination,
                speed_multiplier: 1.0,
            },
        );
        memory.set_with_expiry(&STROLL_COOLDOWN, (), rng.gen_range(60..140));
        Ok(())
    }
}

#[derive(Debug)]
struct LookAtNearestPlayer;

impl Behavior<MobContext> for LookAtNearestPlayer {
    fn entry_conditions(&self) -> Vec<MemoryCondition> {
        vec![
            MemoryCondition::present(&NEAREST_PLAYER),
            MemoryCondition::absent(&LOOK_TARGET),
        ]
    }

    fn check_extra_start_conditions(&mut self, ctx: &MobContext, memory: &MemoryStore) -> bool {
        memory
            .get(&NEAREST_PLAYER)
            .is_some_and(|p| ctx.player(p.entity).is_some())
    }

    fn start(&mut self, ctx: &mut MobContext, memory: &mut MemoryStore) -> CallbackResult {
        let seen = memory.get(&NEAREST_PLAYER).and_then(|p| ctx.player(p.entity));
        if let Some(player) = seen.copied() {
            memory.set_with_expiry(&LOOK_TARGET, player.position, 40);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fight
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct StopAttackingIfTargetInvalid;

impl Behavior<MobContext> for StopAttackingIfTargetInvalid {
    fn entry_conditions(&self) -> Vec<MemoryCondition> {
        vec![MemoryCondition::present(&ATTACK_TARGET)]
    }

    fn check_extra_start_conditions(&mut self, ctx: &MobContext, memory: &MemoryStore) -> bool {
        visible_target(ctx, memory).map_or(true, |target| target.distance > FORGET_RANGE)
    }

    fn start(&mut self, ctx: &mut MobContext, memory: &mut MemoryStore) -> CallbackResult {
        memory.erase(&ATTACK_TARGET);
        ctx.output.forget_target();
        Ok(())
    }
}

/// Keep the walk and look targets pinned on the attack target.
#[derive(Debug)]
struct ChaseTarget;

impl ChaseTarget {
    fn follow(ctx: &MobContext, memory: &mut MemoryStore) {
        let Some(target) = visible_target(ctx, memory).copied() else {
            return;
        };
        memory.set_with_expiry(&LOOK_TARGET, target.position, 5);
        if target.distance > REACH {
            memory.set(
                &WALK_TARGET,
                WalkTarget {
                    destination: target.position,
                    speed_multiplier: 1.0,
                },
            );
        } else {
            memory.erase(&WALK_TARGET);
        }
    }
}

impl Behavior<MobContext> for ChaseTarget {
    fn entry_conditions(&self) -> Vec<MemoryCondition> {
        vec![MemoryCondition::present(&ATTACK_TARGET)]
    }

    fn check_extra_start_conditions(&mut self, ctx: &MobContext, memory: &MemoryStore) -> bool {
        visible_target(ctx, memory).is_some()
    }

    fn can_still_use(&mut self, ctx: &MobContext, memory: &MemoryStore) -> bool {
        visible_target(ctx, memory).is_some()
    }

    fn start(&mut self, ctx: &mut MobContext, memory: &mut MemoryStore) -> CallbackResult {
        Self::follow(ctx, memory);
        Ok(())
    }

    fn tick(&mut self, ctx: &mut MobContext, memory: &mut MemoryStore) -> CallbackResult {
        Self::follow(ctx, memory);
        Ok(())
    }
}

#[derive(Debug)]
struct MeleeStrike;

impl Behavior<MobContext> for MeleeStrike {
    fn entry_conditions(&self) -> Vec<MemoryCondition> {
        vec![
            MemoryCondition::present(&ATTACK_TARGET),
            MemoryCondition::absent(&ATTACK_COOLING_DOWN),
        ]
    }

    fn check_extra_start_conditions(&mut self, ctx: &MobContext, memory: &MemoryStore) -> bool {
        visible_target(ctx, memory).is_some_and(|target| target.distance <= REACH)
    }

    fn start(&mut self, ctx: &mut MobContext, memory: &mut MemoryStore) -> CallbackResult {
        if let Some(target) = visible_target(ctx, memory).copied() {
            ctx.output.strike(target.handle());
            memory.set_with_expiry(&ATTACK_COOLING_DOWN, (), ATTACK_COOLDOWN);
        }
        Ok(())
    }
}
