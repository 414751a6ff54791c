use std::collections::BTreeMap;

use super::{
    Action, ActionId, ActionResult, EFFECT_EXP_GAIN, MSG_CANNOT_ACT, Projection, finish,
    record_breakthrough,
};
use crate::character::{Character, Cost};
use crate::constants::{CULTIVATE_BASE_EXP, CULTIVATE_MANA_COST, CULTIVATE_TIME_COST};
use crate::journal::GameLog;
use crate::talent::TalentKind;

/// Burn mana for a large experience gain.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cultivate;

impl Action for Cultivate {
    fn id(&self) -> ActionId {
        ActionId::Cultivate
    }

    fn cost(&self) -> Cost {
        Cost::default()
            .mana(CULTIVATE_MANA_COST)
            .time(CULTIVATE_TIME_COST)
    }

    fn can_execute(&self, character: &Character) -> bool {
        character.is_alive() && character.can_afford(&self.cost())
    }

    fn projected_effects(&self, character: &Character) -> Projection {
        Projection {
            experience: character
                .talent
                .bonus(CULTIVATE_BASE_EXP, TalentKind::Cultivate),
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

        let breakthrough = character.progression.add_experience(projection.experience);

        let mut effects = BTreeMap::new();
        effects.insert(EFFECT_EXP_GAIN.to_string(), projection.experience.into());
        let mut parts = vec![format!(
            "You circulate your technique and gain {} experience.",
            projection.experience
        )];
        record_breakthrough(breakthrough, character, &mut effects, &mut parts);

        finish(&parts, effects, &cost, log)
    }

    fn failure_message(&self, character: &Character) -> String {
        if character.is_alive() {
            format!(
                "Insufficient mana to cultivate (need {CULTIVATE_MANA_COST}, have {}).",
                character.mana.current()
            )
        } else {
            MSG_CANNOT_ACT.to_string()
        }
    }
}
