//! ECS components for simulated players and mobs.

use bevy_ecs::prelude::*;
use mob_ai::{Brain, GoalSelector};

use crate::context::MobContext;
use crate::steering::Vec3;

/// Stable identity of a simulated entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityId {
    pub runtime_id: u64,
}

/// Position in the world.
#[derive(Component, Debug, Clone, Copy)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn as_vec3(&self) -> Vec3 {
        (self.x, self.y, self.z)
    }
}

/// Rotation angles in degrees.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Rotation {
    pub pitch: f32,
    pub yaw: f32,
}

/// Horizontal velocity, blocks per tick.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Velocity {
    pub x: f32,
    pub z: f32,
}

/// Health points.
#[derive(Component, Debug, Clone, Copy)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

/// Registry identifier, e.g. `"minecraft:zombie"`.
#[derive(Component, Debug, Clone)]
pub struct MobType(pub String);

/// Damage dealt per melee hit.
#[derive(Component, Debug, Clone, Copy)]
pub struct AttackDamage(pub f32);

/// Blocks per tick at walking pace.
#[derive(Component, Debug, Clone, Copy)]
pub struct MovementSpeed(pub f32);

/// Most recent hit taken: tick and attacker.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct LastDamage {
    pub tick: Option<u64>,
    pub attacker: Option<(Entity, u64)>,
}

/// Entity this mob is hostile toward, with its runtime id.
#[derive(Component, Debug, Clone, Copy)]
pub struct AiTarget(pub Entity, pub u64);

/// Where the mob is walking, consumed by the navigation system.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Navigation {
    pub destination: Option<Vec3>,
    pub speed_multiplier: f32,
}

/// Goal-driven AI: a movement/look selector and a target selector.
#[derive(Component)]
pub struct MobGoals {
    pub goals: GoalSelector<MobContext>,
    pub targets: GoalSelector<MobContext>,
}

/// Brain-driven AI.
#[derive(Component)]
pub struct MobBrain(pub Brain<MobContext>);

#[derive(Component, Debug)]
pub struct Mob;

#[derive(Component, Debug)]
pub struct Player;

/// Marker: pending removal at the end of the tick.
#[derive(Component, Debug)]
pub struct Dead;
