//! AI tick system: snapshot the world, run each mob's schedulers against the
//! snapshot, then apply the collected actions.

use bevy_ecs::prelude::*;
use mob_ai::AiResult;
use tracing::error;

use crate::components::*;
use crate::context::{AiOutput, MobContext, TargetInfo};
use crate::steering::{self, Vec3};
use crate::world::{GameEvent, OutgoingEvents, TickCounter};

/// Players farther away than this are invisible to mobs.
pub const VIEW_RANGE: f32 = 32.0;

struct PlayerSnapshot {
    entity: Entity,
    runtime_id: u64,
    position: Vec3,
}

struct MobSnapshot {
    entity: Entity,
    runtime_id: u64,
    position: Vec3,
    attack_damage: f32,
    last_damage: LastDamage,
    target: Option<(Entity, u64)>,
}

impl MobSnapshot {
    fn context(&self, players: &[PlayerSnapshot], current_tick: u64) -> MobContext {
        let mut ctx = MobContext::new(self.runtime_id, self.position, current_tick);
        ctx.attack_damage = self.attack_damage;
        ctx.last_damage = self.last_damage;
        ctx.players = players
            .iter()
            .map(|p| TargetInfo {
                entity: p.entity,
                runtime_id: p.runtime_id,
                position: p.position,
                distance: steering::distance_xz(self.position, p.position),
            })
            .filter(|p| p.distance <= VIEW_RANGE)
            .collect();
        ctx.players.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        ctx.target = self
            .target
            .and_then(|(entity, _)| ctx.player(entity).copied());
        ctx
    }
}

/// Runs goal selectors and brains for all alive mobs.
///
/// A mob whose goal or behavior faults has its actions for this tick
/// dropped; the fault is logged and reported as [`GameEvent::AiFault`].
pub fn system_ai_tick(world: &mut World) {
    let players: Vec<PlayerSnapshot> = world
        .query_filtered::<(Entity, &EntityId, &Position), (With<Player>, Without<Dead>)>()
        .iter(world)
        .map(|(entity, eid, pos)| PlayerSnapshot {
            entity,
            runtime_id: eid.runtime_id,
            position: pos.as_vec3(),
        })
        .collect();

    let current_tick = world.resource::<TickCounter>().0;

    let mobs: Vec<MobSnapshot> = world
        .query_filtered::<(
            Entity,
            &EntityId,
            &Position,
            &AttackDamage,
            &LastDamage,
            Option<&AiTarget>,
        ), (With<Mob>, Without<Dead>)>()
        .iter(world)
        .map(|(entity, eid, pos, dmg, last_damage, target)| MobSnapshot {
            entity,
            runtime_id: eid.runtime_id,
            position: pos.as_vec3(),
            attack_damage: dmg.0,
            last_damage: *last_damage,
            target: target.map(|t| (t.0, t.1)),
        })
        .collect();

    let mut actions = Vec::with_capacity(mobs.len());
    let mut events = Vec::new();
    for mob in &mobs {
        let mut ctx = mob.context(&players, current_tick);
        match run_mob_ai(world, mob.entity, &mut ctx) {
            Ok(()) => actions.push((mob, ctx.output)),
            Err(e) => {
                error!(runtime_id = mob.runtime_id, error = %e, "mob AI fault, actions dropped");
                events.push(GameEvent::AiFault {
                    runtime_id: mob.runtime_id,
                    reason: e.to_string(),
                });
            }
        }
    }

    for (mob, output) in actions {
        apply_output(world, mob, output, &mut events);
    }
    world.resource_mut::<OutgoingEvents>().events.extend(events);
}

/// Target selector first, so goals see a target picked this tick.
fn run_mob_ai(world: &mut World, entity: Entity, ctx: &mut MobContext) -> AiResult<()> {
    if let Some(mut goals) = world.get_mut::<MobGoals>(entity) {
        let selectors = &mut *goals;
        selectors.targets.tick(ctx)?;
        ctx.commit_target_change();
        selectors.goals.tick(ctx)?;
    }
    if let Some(mut brain) = world.get_mut::<MobBrain>(entity) {
        brain.0.tick(ctx.current_tick, ctx)?;
    }
    Ok(())
}

/// Stop everything the mob is running. Both selectors and the brain are
/// unwound even if one of them faults; the first fault is returned.
pub(crate) fn stop_mob_ai(world: &mut World, entity: Entity, ctx: &mut MobContext) -> AiResult<()> {
    let mut results = Vec::new();
    if let Some(mut goals) = world.get_mut::<MobGoals>(entity) {
        let selectors = &mut *goals;
        results.push(selectors.goals.stop_all(ctx));
        results.push(selectors.targets.stop_all(ctx));
    }
    if let Some(mut brain) = world.get_mut::<MobBrain>(entity) {
        results.push(brain.0.stop_all(ctx));
    }
    results.into_iter().collect()
}

fn apply_output(world: &mut World, mob: &MobSnapshot, output: AiOutput, events: &mut Vec<GameEvent>) {
    if let Some(mut nav) = world.get_mut::<Navigation>(mob.entity) {
        if let Some(request) = output.move_to {
            nav.destination = Some(request.destination);
            nav.speed_multiplier = request.speed_multiplier;
        } else if output.stop_moving {
            nav.destination = None;
        }
    }

    if let Some(point) = output.look_at {
        if let Some(mut rot) = world.get_mut::<Rotation>(mob.entity) {
            rot.yaw = steering::yaw_toward(mob.position, point);
            rot.pitch = steering::pitch_toward(mob.position, point);
        }
    }

    if output.clear_target {
        world.entity_mut(mob.entity).remove::<AiTarget>();
    }
    if let Some((target, runtime_id)) = output.set_target {
        world
            .entity_mut(mob.entity)
            .insert(AiTarget(target, runtime_id));
    }

    if let Some((victim, victim_runtime_id)) = output.attack {
        let Some(mut health) = world.get_mut::<Health>(victim) else {
            return;
        };
        health.current = (health.current - mob.attack_damage).max(0.0);
        let killed = health.current <= 0.0;
        events.push(GameEvent::MobAttackPlayer {
            mob_runtime_id: mob.runtime_id,
            target_runtime_id: victim_runtime_id,
            damage: mob.attack_damage,
        });
        if killed && world.get::<Dead>(victim).is_none() {
            world.entity_mut(victim).insert(Dead);
            events.push(GameEvent::PlayerDied {
                runtime_id: victim_runtime_id,
            });
        }
    }
}
