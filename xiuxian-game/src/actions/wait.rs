use std::collections::BTreeMap;

use super::{
    Action, ActionId, ActionResult, EFFECT_HP_RECOVERY, EFFECT_MP_RECOVERY, Projection, finish,
};
use crate::character::{Character, Cost};
use crate::constants::{WAIT_HEALTH_COST, WAIT_HEALTH_RECOVERY, WAIT_MANA_RECOVERY, WAIT_TIME_COST};
use crate::journal::GameLog;

/// Rest quietly. Never scaled by talent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wait;

impl Action for Wait {
    fn id(&self) -> ActionId {
        ActionId::Wait
    }

    fn cost(&self) -> Cost {
        Cost::default().health(WAIT_HEALTH_COST).time(WAIT_TIME_COST)
    }

    fn can_execute(&self, character: &Character) -> bool {
        character.is_alive() && character.can_afford(&self.cost())
    }

    fn projected_effects(&self, _character: &Character) -> Projection {
        Projection {
            health: WAIT_HEALTH_RECOVERY,
            mana: WAIT_MANA_RECOVERY,
            ..Projection::default()
        }
    }

    fn execute(&self, character: &mut Character, log: &mut GameLog) -> ActionResult {
        if !self.can_execute(character) {
            return ActionResult::failure(self.failure_message(character));
        }
        let projection = self.projected_effects(character);
        let cost = self.cost();
        if !character.apply_cost(&cost) {
            return ActionResult::failure(self.failure_message(character));
        }
        character.meditation_streak = 0;

        let healed = character.health.restore(projection.health);
        let recovered = character.mana.restore(projection.mana);

        let mut effects = BTreeMap::new();
        effects.insert(EFFECT_HP_RECOVERY.to_string(), healed.into());
        effects.insert(EFFECT_MP_RECOVERY.to_string(), recovered.into());
        let parts = [format!(
            "You rest quietly, recovering {healed} health and {recovered} mana."
        )];

        finish(&parts, effects, &cost, log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::MSG_CANNOT_ACT;
    use crate::talent::TalentScore;

    #[test]
    fn wait_nets_one_health_and_three_mana() {
        let mut character = Character::new("Lin", TalentScore::MAX);
        character.health.set_current(50);
        character.meditation_streak = 4;
        let result = Wait.execute(&mut character, &mut GameLog::default());
        assert!(result.success);
        assert_eq!(character.health.current(), 51);
        assert_eq!(character.mana.current(), 53);
        assert_eq!(character.meditation_streak, 0);
        assert_eq!(result.amount(EFFECT_HP_RECOVERY), Some(2));
    }

    #[test]
    fn talent_does_not_change_wait() {
        let mut low = Character::new("Low", TalentScore::MIN);
        let mut high = Character::new("High", TalentScore::MAX);
        Wait.execute(&mut low, &mut GameLog::default());
        Wait.execute(&mut high, &mut GameLog::default());
        assert_eq!(low.mana.current(), high.mana.current());
        assert_eq!(low.health.current(), high.health.current());
    }

    #[test]
    fn dead_character_cannot_wait() {
        let mut character = Character::new("Lin", TalentScore::MIN);
        character.health.set_current(0);
        let result = Wait.execute(&mut character, &mut GameLog::default());
        assert!(!result.success);
        assert_eq!(result.message, MSG_CANNOT_ACT);
        assert_eq!(character.health.current(), 0);
    }
}
