//! Mob type definitions and which scheduler drives each type.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobCategory {
    Passive,
    Hostile,
}

/// Which AI model a mob type runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiModel {
    /// Flag-arbitrated goal selectors.
    Goals,
    /// Memory, sensors and activities.
    Brain,
}

#[derive(Debug, Clone)]
pub struct MobDefinition {
    /// Registry identifier, e.g. `"minecraft:zombie"`.
    pub type_id: String,
    pub display_name: String,
    pub category: MobCategory,
    pub ai: AiModel,
    pub max_health: f32,
    /// Damage per hit (0 for passive mobs).
    pub attack_damage: f32,
    /// Blocks per tick at walking pace.
    pub movement_speed: f32,
}

pub struct MobRegistry {
    mobs: Vec<MobDefinition>,
}

impl Default for MobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MobRegistry {
    pub fn new() -> Self {
        Self {
            mobs: vec![
                MobDefinition {
                    type_id: "minecraft:zombie".into(),
                    display_name: "Zombie".into(),
                    category: MobCategory::Hostile,
                    ai: AiModel::Goals,
                    max_health: 20.0,
                    attack_damage: 3.0,
                    movement_speed: 0.23,
                },
                MobDefinition {
                    type_id: "minecraft:cow".into(),
                    display_name: "Cow".into(),
                    category: MobCategory::Passive,
                    ai: AiModel::Goals,
                    max_health: 10.0,
                    attack_damage: 0.0,
                    movement_speed: 0.2,
                },
                MobDefinition {
                    type_id: "minecraft:piglin_brute".into(),
                    display_name: "Piglin Brute".into(),
                    category: MobCategory::Hostile,
                    ai: AiModel::Brain,
                    max_health: 50.0,
                    attack_damage: 7.0,
                    movement_speed: 0.35,
                },
            ],
        }
    }

    pub fn get(&self, type_id: &str) -> Option<&MobDefinition> {
        self.mobs.iter().find(|m| m.type_id == type_id)
    }

    pub fn all(&self) -> &[MobDefinition] {
        &self.mobs
    }

    /// Add a mob type, replacing any existing definition with the same id.
    pub fn register_mob(&mut self, def: MobDefinition) {
        self.mobs.retain(|m| m.type_id != def.type_id);
        self.mobs.push(def);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vanilla_mobs_registered() {
        let reg = MobRegistry::new();
        assert_eq!(reg.all().len(), 3);
        assert!(reg.get("minecraft:enderman").is_none());
    }

    #[test]
    fn piglin_brute_runs_a_brain() {
        let reg = MobRegistry::new();
        let brute = reg.get("minecraft:piglin_brute").unwrap();
        assert_eq!(brute.ai, AiModel::Brain);
        assert_eq!(brute.category, MobCategory::Hostile);
        assert_eq!(reg.get("minecraft:cow").unwrap().ai, AiModel::Goals);
    }

    #[test]
    fn register_replaces_existing_definition() {
        let mut reg = MobRegistry::new();
        let mut zombie = reg.get("minecraft:zombie").unwrap().clone();
        zombie.max_health = 40.0;
        reg.register_mob(zombie);
        assert_eq!(reg.all().len(), 3);
        assert_eq!(reg.get("minecraft:zombie").unwrap().max_health, 40.0);
    }
}
