//! The per-mob view handed to goals, behaviors and sensors, and the action
//! sink they write into.
//!
//! The AI system snapshots the world before any mob thinks, so every mob in a
//! tick sees the same state. Actions collected in [`AiOutput`] are applied
//! after all mobs have run.

use bevy_ecs::entity::Entity;

use crate::components::LastDamage;
use crate::steering::Vec3;

/// A player as seen by one mob.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetInfo {
    pub entity: Entity,
    pub runtime_id: u64,
    pub position: Vec3,
    pub distance: f32,
}

impl TargetInfo {
    pub fn handle(&self) -> (Entity, u64) {
        (self.entity, self.runtime_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveRequest {
    pub destination: Vec3,
    pub speed_multiplier: f32,
}

/// Actions requested during one AI tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiOutput {
    pub move_to: Option<MoveRequest>,
    pub stop_moving: bool,
    pub look_at: Option<Vec3>,
    pub attack: Option<(Entity, u64)>,
    pub set_target: Option<(Entity, u64)>,
    pub clear_target: bool,
}

impl AiOutput {
    pub fn walk_to(&mut self, destination: Vec3, speed_multiplier: f32) {
        self.move_to = Some(MoveRequest {
            destination,
            speed_multiplier,
        });
        self.stop_moving = false;
    }

    pub fn halt(&mut self) {
        self.move_to = None;
        self.stop_moving = true;
    }

    pub fn face(&mut self, point: Vec3) {
        self.look_at = Some(point);
    }

    pub fn strike(&mut self, victim: (Entity, u64)) {
        self.attack = Some(victim);
    }

    /// Later calls win over earlier ones within the same tick, so a goal
    /// stopped and another started in the same tick leaves the new target.
    pub fn target(&mut self, victim: (Entity, u64)) {
        self.set_target = Some(victim);
        self.clear_target = false;
    }

    pub fn forget_target(&mut self) {
        self.set_target = None;
        self.clear_target = true;
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug)]
pub struct MobContext {
    pub runtime_id: u64,
    pub position: Vec3,
    pub current_tick: u64,
    pub attack_damage: f32,
    pub last_damage: LastDamage,
    /// Resolved hostile target, if it is still in view.
    pub target: Option<TargetInfo>,
    /// Players in view, nearest first.
    pub players: Vec<TargetInfo>,
    pub output: AiOutput,
}

impl MobContext {
    pub fn new(runtime_id: u64, position: Vec3, current_tick: u64) -> Self {
        Self {
            runtime_id,
            position,
            current_tick,
            attack_damage: 0.0,
            last_damage: LastDamage::default(),
            target: None,
            players: Vec::new(),
            output: AiOutput::default(),
        }
    }

    pub fn nearest_player(&self) -> Option<&TargetInfo> {
        self.players.first()
    }

    pub fn player(&self, entity: Entity) -> Option<&TargetInfo> {
        self.players.iter().find(|p| p.entity == entity)
    }

    pub fn ticks_since_hurt(&self) -> Option<u64> {
        self.last_damage
            .tick
            .map(|tick| self.current_tick.saturating_sub(tick))
    }

    pub fn is_passive(&self) -> bool {
        self.attack_damage <= 0.0
    }

    /// Fold pending target changes into [`MobContext::target`] so selectors
    /// ticked after the target selector see the new target this tick.
    pub fn commit_target_change(&mut self) {
        if self.output.clear_target {
            self.target = None;
        }
        if let Some((entity, _)) = self.output.set_target {
            self.target = self.player(entity).copied();
        }
    }
}
