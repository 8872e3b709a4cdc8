//! Per-mob-type AI setup.

use mob_ai::{AiResult, GoalSelector, SchedulerConfig};

use crate::components::{MobBrain, MobGoals};
use crate::goals::*;
use crate::mob_registry::{AiModel, MobCategory, MobDefinition};
use crate::piglin;

/// Freshly built AI for one mob, ready to insert as a component.
pub enum MobAi {
    Goals(MobGoals),
    Brain(MobBrain),
}

/// Build the AI for `def`. `salt` staggers brain sensor scans between mobs.
pub fn create_ai(def: &MobDefinition, scheduler: &SchedulerConfig, salt: u64) -> AiResult<MobAi> {
    match def.ai {
        AiModel::Brain => Ok(MobAi::Brain(MobBrain(piglin::create_brain(salt)?))),
        AiModel::Goals => create_goals(def.category, scheduler).map(MobAi::Goals),
    }
}

fn create_goals(category: MobCategory, scheduler: &SchedulerConfig) -> AiResult<MobGoals> {
    let mut goals = GoalSelector::new(scheduler)?;
    let mut targets = GoalSelector::new(scheduler)?;
    match category {
        MobCategory::Hostile => {
            goals.add_goal(2, Box::new(MeleeAttack::new(20)));
            goals.add_goal(7, Box::new(RandomStroll::new(10.0)));
            goals.add_goal(8, Box::new(LookAtPlayer::new(8.0)));
            targets.add_goal(1, Box::new(HurtByTarget::new()));
            targets.add_goal(2, Box::new(NearestAttackableTarget::new(16.0)));
        }
        MobCategory::Passive => {
            goals.add_goal(1, Box::new(Panic::new(1.25)));
            goals.add_goal(6, Box::new(RandomStroll::new(10.0)));
            goals.add_goal(7, Box::new(LookAtPlayer::new(6.0)));
        }
    }
    Ok(MobGoals { goals, targets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mob_registry::MobRegistry;

    fn build(type_id: &str) -> MobAi {
        let reg = MobRegistry::new();
        create_ai(reg.get(type_id).unwrap(), &SchedulerConfig::default(), 0).unwrap()
    }

    #[test]
    fn zombie_has_target_selector() {
        let MobAi::Goals(zombie) = build("minecraft:zombie") else {
            panic!("zombie should be goal driven");
        };
        assert_eq!(zombie.goals.len(), 3);
        assert_eq!(zombie.targets.len(), 2);
    }

    #[test]
    fn cow_has_no_target_selector() {
        let MobAi::Goals(cow) = build("minecraft:cow") else {
            panic!("cow should be goal driven");
        };
        assert_eq!(cow.goals.len(), 3);
        assert!(cow.targets.is_empty());
    }

    #[test]
    fn piglin_brute_starts_idle() {
        let MobAi::Brain(MobBrain(brain)) = build("minecraft:piglin_brute") else {
            panic!("piglin brute should be brain driven");
        };
        assert!(brain.is_active(mob_ai::ActivityId::IDLE));
    }

    #[test]
    fn zero_tick_interval_is_rejected() {
        let reg = MobRegistry::new();
        let scheduler = SchedulerConfig {
            goal_tick_interval: 0,
        };
        assert!(create_ai(reg.get("minecraft:cow").unwrap(), &scheduler, 0).is_err());
    }
}
