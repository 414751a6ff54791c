use std::collections::BTreeMap;

use super::{
    Action, ActionId, ActionResult, EFFECT_EXP_GAIN, EFFECT_MP_RECOVERY, EFFECT_PILL_BONUS,
    Projection, finish, record_breakthrough,
};
use crate::character::{Character, Cost};
use crate::constants::{
    MEDITATE_BASE_EXP, MEDITATE_BASE_MANA, MEDITATE_HEALTH_COST, MEDITATE_TIME_COST,
    MEDITATION_STREAK_INTERVAL, MEDITATION_STREAK_PILLS,
};
use crate::journal::GameLog;
use crate::resources::ItemKind;
use crate::talent::TalentKind;

/// Recover mana and gain a little experience. Every fifth consecutive
/// meditation condenses a pill.
#[derive(Debug, Clone, Copy, Default)]
pub struct Meditate;

impl Action for Meditate {
    fn id(&self) -> ActionId {
        ActionId::Meditate
    }

    fn cost(&self) -> Cost {
        Cost::default()
            .health(MEDITATE_HEALTH_COST)
            .time(MEDITATE_TIME_COST)
    }

    fn can_execute(&self, character: &Character) -> bool {
        character.is_alive() && character.can_afford(&self.cost())
    }

    fn projected_effects(&self, character: &Character) -> Projection {
        let next_streak = character.meditation_streak.saturating_add(1);
        let pills = if next_streak % MEDITATION_STREAK_INTERVAL == 0 {
            MEDITATION_STREAK_PILLS
        } else {
            0
        };
        Projection {
            health: 0,
            mana: character.talent.bonus(MEDITATE_BASE_MANA, TalentKind::Meditate),
            experience: character.talent.bonus(MEDITATE_BASE_EXP, TalentKind::Meditate),
            pills,
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
        character.meditation_streak = character.meditation_streak.saturating_add(1);

        let recovered = character.mana.restore(projection.mana);
        let breakthrough = character.progression.add_experience(projection.experience);

        let mut effects = BTreeMap::new();
        effects.insert(EFFECT_MP_RECOVERY.to_string(), recovered.into());
        effects.insert(EFFECT_EXP_GAIN.to_string(), projection.experience.into());
        let mut parts = vec![format!(
            "You meditate, recovering {recovered} mana and gaining {} experience.",
            projection.experience
        )];
        record_breakthrough(breakthrough, character, &mut effects, &mut parts);

        if projection.pills > 0 {
            character.inventory.add(ItemKind::Pill, projection.pills);
            effects.insert(EFFECT_PILL_BONUS.to_string(), projection.pills.into());
            parts.push(format!(
                "A meditation streak of {} condensed {} pill!",
                character.meditation_streak, projection.pills
            ));
        }

        finish(&parts, effects, &cost, log)
    }
}
