//! ECS simulation world: entities, tick systems and the event queue.

use std::sync::atomic::{AtomicU64, Ordering};

use bevy_ecs::prelude::*;
use mob_ai::{ActivityId, SchedulerConfig};
use tracing::{debug, warn};

use crate::components::*;
use crate::config::SimConfig;
use crate::context::MobContext;
use crate::error::{SimError, SimResult};
use crate::mob_behaviors::{self, MobAi};
use crate::mob_registry::MobRegistry;
use crate::steering::{self, Vec3};
use crate::system::{self, system_ai_tick};

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Events queued by systems, drained by the caller after each tick.
#[derive(Resource, Default)]
pub struct OutgoingEvents {
    pub events: Vec<GameEvent>,
}

/// Global tick counter.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

/// Runtime id allocator shared by mobs and players.
#[derive(Resource)]
pub struct EntityIdAllocator {
    next: AtomicU64,
}

impl EntityIdAllocator {
    pub fn new(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    pub fn allocate(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Next id that will be handed out.
    pub fn current(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    MobSpawned {
        runtime_id: u64,
        mob_type: String,
        position: Vec3,
    },
    PlayerJoined {
        runtime_id: u64,
        position: Vec3,
    },
    MobHurt {
        runtime_id: u64,
        new_health: f32,
        tick: u64,
    },
    MobDied {
        runtime_id: u64,
    },
    MobAttackPlayer {
        mob_runtime_id: u64,
        target_runtime_id: u64,
        damage: f32,
    },
    PlayerDied {
        runtime_id: u64,
    },
    EntityRemoved {
        runtime_id: u64,
    },
    /// A goal or behavior callback failed; the mob's actions for this tick
    /// were dropped.
    AiFault {
        runtime_id: u64,
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// SimWorld
// ---------------------------------------------------------------------------

pub struct SimWorld {
    pub world: World,
    pub mob_registry: MobRegistry,
    scheduler: SchedulerConfig,
    players_wander: bool,
    players_fight_back: bool,
}

impl SimWorld {
    pub fn new(config: &SimConfig) -> Self {
        let mut world = World::new();
        world.insert_resource(OutgoingEvents::default());
        world.insert_resource(TickCounter::default());
        world.insert_resource(EntityIdAllocator::new(1));

        Self {
            world,
            mob_registry: MobRegistry::new(),
            scheduler: config.scheduler.clone(),
            players_wander: config.world.players_wander,
            players_fight_back: config.world.players_fight_back,
        }
    }

    /// Run one tick: AI, navigation, simulated players, dead cleanup.
    pub fn tick(&mut self) {
        self.world.resource_mut::<TickCounter>().0 += 1;
        system_ai_tick(&mut self.world);
        system_navigation(&mut self.world);
        if self.players_wander {
            system_player_wander(&mut self.world);
        }
        if self.players_fight_back {
            system_player_attacks(&mut self.world);
        }
        system_cleanup_dead(&mut self.world);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.world.resource_mut::<OutgoingEvents>().events)
    }

    pub fn current_tick(&self) -> u64 {
        self.world.resource::<TickCounter>().0
    }

    /// Spawn a mob of a registered type. Returns its runtime id.
    pub fn spawn_mob(&mut self, type_id: &str, position: Vec3) -> SimResult<u64> {
        let def = self
            .mob_registry
            .get(type_id)
            .ok_or_else(|| SimError::UnknownMob(type_id.to_string()))?
            .clone();
        let runtime_id = self.world.resource::<EntityIdAllocator>().allocate();
        let ai = mob_behaviors::create_ai(&def, &self.scheduler, runtime_id)?;

        let mut entity = self.world.spawn((
            EntityId { runtime_id },
            Position {
                x: position.0,
                y: position.1,
                z: position.2,
            },
            Rotation::default(),
            Velocity::default(),
            Health {
                current: def.max_health,
                max: def.max_health,
            },
            Mob,
            MobType(type_id.to_string()),
            AttackDamage(def.attack_damage),
            MovementSpeed(def.movement_speed),
            LastDamage::default(),
            Navigation::default(),
        ));
        match ai {
            MobAi::Goals(goals) => entity.insert(goals),
            MobAi::Brain(brain) => entity.insert(brain),
        };

        debug!(runtime_id, mob_type = type_id, "mob spawned");
        self.push_event(GameEvent::MobSpawned {
            runtime_id,
            mob_type: type_id.to_string(),
            position,
        });
        Ok(runtime_id)
    }

    /// Spawn a simulated player. Returns its runtime id.
    pub fn spawn_player(&mut self, position: Vec3) -> u64 {
        let runtime_id = self.world.resource::<EntityIdAllocator>().allocate();
        self.world.spawn((
            EntityId { runtime_id },
            Position {
                x: position.0,
                y: position.1,
                z: position.2,
            },
            Health {
                current: 20.0,
                max: 20.0,
            },
            Player,
        ));
        self.push_event(GameEvent::PlayerJoined {
            runtime_id,
            position,
        });
        runtime_id
    }

    /// Deal damage to a mob, optionally on behalf of a player. Returns
    /// remaining health, or `None` if the mob or attacker is unknown or the
    /// mob is still invulnerable from the last hit.
    pub fn damage_mob(&mut self, runtime_id: u64, damage: f32, attacker: Option<u64>) -> Option<f32> {
        let target = self.find_mob(runtime_id)?;
        let attacker = match attacker {
            Some(rid) => Some((self.find_player(rid)?, rid)),
            None => None,
        };
        apply_mob_damage(&mut self.world, target, damage, attacker)
    }

    /// Remove a mob, unwinding its running goals and behaviors first.
    pub fn remove_mob(&mut self, runtime_id: u64) -> bool {
        let Some(entity) = self.find_mob(runtime_id) else {
            return false;
        };
        stop_mob_ai(&mut self.world, entity);
        self.world.despawn(entity);
        self.push_event(GameEvent::EntityRemoved { runtime_id });
        true
    }

    pub fn remove_player(&mut self, runtime_id: u64) -> bool {
        let Some(entity) = self.find_player(runtime_id) else {
            return false;
        };
        self.world.despawn(entity);
        self.push_event(GameEvent::EntityRemoved { runtime_id });
        true
    }

    /// Stop every mob's running goals and behaviors.
    pub fn shutdown(&mut self) {
        let mobs: Vec<Entity> = self
            .world
            .query_filtered::<Entity, With<Mob>>()
            .iter(&self.world)
            .collect();
        for entity in mobs {
            stop_mob_ai(&mut self.world, entity);
        }
    }

    pub fn mob_position(&mut self, runtime_id: u64) -> Option<Vec3> {
        let entity = self.find_mob(runtime_id)?;
        self.world.get::<Position>(entity).map(Position::as_vec3)
    }

    pub fn player_health(&mut self, runtime_id: u64) -> Option<f32> {
        let entity = self.find_player(runtime_id)?;
        self.world.get::<Health>(entity).map(|h| h.current)
    }

    /// Runtime id of the mob's current hostile target.
    pub fn mob_target(&mut self, runtime_id: u64) -> Option<u64> {
        let entity = self.find_mob(runtime_id)?;
        self.world.get::<AiTarget>(entity).map(|t| t.1)
    }

    /// Names of the goals a goal-driven mob is running.
    pub fn running_goals(&mut self, runtime_id: u64) -> Vec<&'static str> {
        let Some(entity) = self.find_mob(runtime_id) else {
            return Vec::new();
        };
        let Some(goals) = self.world.get::<MobGoals>(entity) else {
            return Vec::new();
        };
        goals
            .targets
            .running_goals()
            .chain(goals.goals.running_goals())
            .map(|(_, goal)| goal.name())
            .collect()
    }

    /// Active non-core activity of a brain-driven mob.
    pub fn active_activity(&mut self, runtime_id: u64) -> Option<ActivityId> {
        let entity = self.find_mob(runtime_id)?;
        self.world
            .get::<MobBrain>(entity)
            .and_then(|brain| brain.0.active_activity())
    }

    pub fn mob_count(&mut self) -> usize {
        self.world
            .query_filtered::<(), (With<Mob>, Without<Dead>)>()
            .iter(&self.world)
            .count()
    }

    pub fn player_count(&mut self) -> usize {
        self.world
            .query_filtered::<(), (With<Player>, Without<Dead>)>()
            .iter(&self.world)
            .count()
    }

    pub fn find_mob(&mut self, runtime_id: u64) -> Option<Entity> {
        find_entity::<Mob>(&mut self.world, runtime_id)
    }

    pub fn find_player(&mut self, runtime_id: u64) -> Option<Entity> {
        find_entity::<Player>(&mut self.world, runtime_id)
    }

    fn push_event(&mut self, event: GameEvent) {
        self.world.resource_mut::<OutgoingEvents>().events.push(event);
    }
}

fn find_entity<M: Component>(world: &mut World, runtime_id: u64) -> Option<Entity> {
    let mut query = world.query_filtered::<(Entity, &EntityId), With<M>>();
    query
        .iter(world)
        .find(|(_, eid)| eid.runtime_id == runtime_id)
        .map(|(entity, _)| entity)
}

/// Unwind a mob's AI before it leaves the world. Actions requested by stop
/// callbacks are dropped with the mob.
fn stop_mob_ai(world: &mut World, entity: Entity) {
    let tick = world.resource::<TickCounter>().0;
    let Some(runtime_id) = world.get::<EntityId>(entity).map(|e| e.runtime_id) else {
        return;
    };
    let position = world
        .get::<Position>(entity)
        .map(Position::as_vec3)
        .unwrap_or_default();
    let mut ctx = MobContext::new(runtime_id, position, tick);
    if let Err(e) = system::stop_mob_ai(world, entity, &mut ctx) {
        warn!(runtime_id, error = %e, "failed to stop mob AI cleanly");
    }
}

/// Apply damage with 10 ticks of invulnerability after each hit.
pub(crate) fn apply_mob_damage(
    world: &mut World,
    target: Entity,
    damage: f32,
    attacker: Option<(Entity, u64)>,
) -> Option<f32> {
    const INVULNERABLE_TICKS: u64 = 10;
    let tick = world.resource::<TickCounter>().0;

    if let Some(last) = world.get::<LastDamage>(target).and_then(|d| d.tick) {
        if tick.saturating_sub(last) < INVULNERABLE_TICKS {
            return None;
        }
    }

    let new_health = {
        let mut health = world.get_mut::<Health>(target)?;
        health.current = (health.current - damage).max(0.0);
        health.current
    };
    if let Some(mut last) = world.get_mut::<LastDamage>(target) {
        last.tick = Some(tick);
        last.attacker = attacker;
    }

    let runtime_id = world.get::<EntityId>(target)?.runtime_id;
    let event = if new_health <= 0.0 {
        world.entity_mut(target).insert(Dead);
        GameEvent::MobDied { runtime_id }
    } else {
        GameEvent::MobHurt {
            runtime_id,
            new_health,
            tick,
        }
    };
    world.resource_mut::<OutgoingEvents>().events.push(event);
    Some(new_health)
}

// ---------------------------------------------------------------------------
// Systems (called by SimWorld::tick)
// ---------------------------------------------------------------------------

/// Steer mobs toward their navigation destination and move them.
fn system_navigation(world: &mut World) {
    let mut query = world.query_filtered::<(
        &mut Navigation,
        &mut Position,
        &mut Velocity,
        &mut Rotation,
        &MovementSpeed,
    ), (With<Mob>, Without<Dead>)>();

    for (mut nav, mut pos, mut vel, mut rot, speed) in query.iter_mut(world) {
        let Some(dest) = nav.destination else {
            vel.x = 0.0;
            vel.z = 0.0;
            continue;
        };
        let here = pos.as_vec3();
        if steering::distance_xz(here, dest) < steering::ARRIVAL_RADIUS {
            nav.destination = None;
            vel.x = 0.0;
            vel.z = 0.0;
            continue;
        }
        let (vx, vz) = steering::velocity_toward(here, dest, speed.0 * nav.speed_multiplier);
        vel.x = vx;
        vel.z = vz;
        pos.x += vx;
        pos.z += vz;
        rot.yaw = steering::yaw_toward(here, dest);
    }
}

/// Simulated players take a random step every couple of seconds.
fn system_player_wander(world: &mut World) {
    const STEP_INTERVAL: u64 = 40;
    let tick = world.resource::<TickCounter>().0;
    let mut rng = rand::thread_rng();

    let mut query =
        world.query_filtered::<(&EntityId, &mut Position), (With<Player>, Without<Dead>)>();
    for (eid, mut pos) in query.iter_mut(world) {
        if (tick + eid.runtime_id) % STEP_INTERVAL != 0 {
            continue;
        }
        let (x, _, z) = steering::random_point_near(pos.as_vec3(), 4.0, &mut rng);
        pos.x = x;
        pos.z = z;
    }
}

/// Simulated players punch the nearest mob within reach once a second.
fn system_player_attacks(world: &mut World) {
    const REACH: f32 = 3.0;
    const PUNCH_INTERVAL: u64 = 20;
    let tick = world.resource::<TickCounter>().0;

    let players: Vec<(Entity, u64, Vec3)> = world
        .query_filtered::<(Entity, &EntityId, &Position), (With<Player>, Without<Dead>)>()
        .iter(world)
        .filter(|(_, eid, _)| (tick + eid.runtime_id) % PUNCH_INTERVAL == 0)
        .map(|(entity, eid, pos)| (entity, eid.runtime_id, pos.as_vec3()))
        .collect();
    if players.is_empty() {
        return;
    }
    let mobs: Vec<(Entity, Vec3)> = world
        .query_filtered::<(Entity, &Position), (With<Mob>, Without<Dead>)>()
        .iter(world)
        .map(|(entity, pos)| (entity, pos.as_vec3()))
        .collect();

    for (player, runtime_id, at) in players {
        let victim = mobs
            .iter()
            .map(|&(mob, pos)| (mob, steering::distance_xz(at, pos)))
            .filter(|&(_, dist)| dist <= REACH)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((mob, _)) = victim {
            apply_mob_damage(world, mob, 1.0, Some((player, runtime_id)));
        }
    }
}

/// Despawn dead entities once their death events have been queued.
fn system_cleanup_dead(world: &mut World) {
    let dead: Vec<Entity> = world
        .query_filtered::<Entity, With<Dead>>()
        .iter(world)
        .collect();
    for entity in dead {
        if world.get::<Mob>(entity).is_some() {
            stop_mob_ai(world, entity);
        }
        world.despawn(entity);
    }
}
