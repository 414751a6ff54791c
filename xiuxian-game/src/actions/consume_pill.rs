use std::collections::BTreeMap;

use super::{
    Action, ActionId, ActionResult, EFFECT_EXP_GAIN, EFFECT_HP_RECOVERY, EFFECT_MP_RECOVERY,
    MSG_CANNOT_ACT, Projection, finish, record_breakthrough,
};
use crate::character::{Character, Cost};
use crate::constants::{PILL_BASE_EXP, PILL_BASE_HEALTH, PILL_BASE_MANA, PILL_COST};
use crate::journal::GameLog;
use crate::talent::TalentKind;

/// Swallow a pill to restore health and mana with a small experience gain.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsumePill;

impl Action for ConsumePill {
    fn id(&self) -> ActionId {
        ActionId::ConsumePill
    }

    fn cost(&self) -> Cost {
        Cost::default().pills(PILL_COST)
    }

    fn can_execute(&self, character: &Character) -> bool {
        character.is_alive() && character.can_afford(&self.cost())
    }

    fn projected_effects(&self, character: &Character) -> Projection {
        let talent = character.talent;
        Projection {
            health: talent.bonus(PILL_BASE_HEALTH, TalentKind::Pill),
            mana: talent.bonus(PILL_BASE_MANA, TalentKind::Pill),
            experience: talent.bonus(PILL_BASE_EXP, TalentKind::Pill),
            pills: 0,
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
        let breakthrough = character.progression.add_experience(projection.experience);

        let mut effects = BTreeMap::new();
        effects.insert(EFFECT_HP_RECOVERY.to_string(), healed.into());
        effects.insert(EFFECT_MP_RECOVERY.to_string(), recovered.into());
        effects.insert(EFFECT_EXP_GAIN.to_string(), projection.experience.into());
        let mut parts = vec![format!(
            "You swallow a pill, recovering {healed} health and {recovered} mana. You gain {} experience.",
            projection.experience
        )];
        record_breakthrough(breakthrough, character, &mut effects, &mut parts);

        finish(&parts, effects, &cost, log)
    }

    fn failure_message(&self, character: &Character) -> String {
        if character.is_alive() {
            "No pills left to consume.".to_string()
        } else {
            MSG_CANNOT_ACT.to_string()
        }
    }
}
