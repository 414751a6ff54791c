use std::cell::RefCell;
use std::rc::Rc;

use xiuxian_game::{
    ActionId, Difficulty, EventRecorder, GameCore, GameEvent, GameEventKind, GameSetup,
    Progression, Realm, Recommendation, SaveFile, TalentScore,
};

fn fresh_core(talent: u8) -> GameCore {
    let mut core = GameCore::new(2024);
    assert!(core.start(
        GameSetup::new(Difficulty::Normal)
            .name("Lin Feng")
            .talent(TalentScore::new(talent).unwrap()),
    ));
    core
}

fn save_json(hp: u32, mp: u32, version: &str) -> String {
    format!(
        r#"{{
            "version": "{version}",
            "difficulty": "normal",
            "is_game_over": false,
            "log_entries": ["Loaded from disk."],
            "character": {{
                "name": "Lin Feng", "hp": {hp}, "mp": {mp}, "pills": 1,
                "meditation_streak": 0, "total_actions": 4,
                "realm": "Qi Refining", "exp": 30, "total_exp": 30, "talent": 5
            }}
        }}"#
    )
}

fn core_from_save(hp: u32, mp: u32) -> GameCore {
    let mut core = GameCore::new(7);
    let save = SaveFile::from_json(&save_json(hp, mp, "2.0.0")).unwrap();
    core.apply_save(&save).unwrap();
    core
}

#[test]
fn first_meditation_applies_talent_scaled_gains() {
    let mut core = fresh_core(5);
    let result = core.execute_action("meditate");

    assert!(result.success);
    let character = core.character().unwrap();
    assert_eq!(character.health.current(), 99);
    // 8 + 5 * 0.8 = 12 mana, 3 + 5 * 0.8 = 7 experience
    assert_eq!(character.mana.current(), 62);
    assert_eq!(character.progression.total_experience(), 7);
    assert_eq!(character.meditation_streak, 1);
    assert_eq!(character.pills(), 1);
}

#[test]
fn fifth_consecutive_meditation_grants_pill() {
    let mut core = fresh_core(5);
    for _ in 0..4 {
        let result = core.execute_action("meditate");
        assert!(result.amount("pill_bonus").is_none());
    }
    let fifth = core.execute_action("meditate");

    assert!(fifth.success);
    assert_eq!(fifth.amount("pill_bonus"), Some(1));
    assert!(fifth.message.contains("streak"));
    assert_eq!(core.character().unwrap().pills(), 2);
}

#[test]
fn cultivating_without_mana_fails_cleanly() {
    let mut core = fresh_core(5);
    assert!(core.execute_action("cultivate").success);
    assert!(core.execute_action("cultivate").success);
    let before = core.character().cloned().unwrap();
    assert_eq!(before.mana.current(), 10);

    let result = core.execute_action("cultivate");
    assert!(!result.success);
    assert!(result.message.contains("Insufficient mana"));
    let after = core.character().unwrap();
    assert_eq!(after.mana.current(), 10);
    assert_eq!(after.total_actions, before.total_actions);
    assert_eq!(after, &before);
}

#[test]
fn experience_overflow_carries_into_foundation() {
    let mut progression = Progression::new();
    assert!(!progression.add_experience(95).occurred);
    let outcome = progression.add_experience(10);

    assert!(outcome.occurred);
    assert!(outcome.message.unwrap().contains("Foundation"));
    assert_eq!(progression.level_experience(), 5);
    assert_eq!(progression.realm(), Realm::Foundation);
}

#[test]
fn waiting_on_last_health_point_survives() {
    let mut core = core_from_save(1, 40);
    let result = core.execute_action("wait");
    assert!(result.success);
    let character = core.character().unwrap();
    assert_eq!(character.health.current(), 2);
    assert!(character.is_alive());
    assert!(!core.is_game_over());
}

#[test]
fn meditating_on_last_health_point_ends_the_game() {
    let mut core = core_from_save(1, 40);
    let recorder = Rc::new(RefCell::new(EventRecorder::default()));
    core.add_sink(Rc::clone(&recorder));

    let result = core.execute_action("meditate");
    assert!(result.success);
    let character = core.character().unwrap();
    assert_eq!(character.health.current(), 0);
    assert!(!character.is_alive());
    assert!(core.is_game_over());
    assert!(
        core.log()
            .last()
            .is_some_and(|line| line.contains("game is over"))
    );

    let recorder = recorder.borrow();
    assert_eq!(recorder.count(GameEventKind::CharacterDied), 1);
    assert!(
        recorder
            .events()
            .any(|event| *event == GameEvent::GameOver { victory: false })
    );
    drop(recorder);

    let blocked = core.execute_action("wait");
    assert!(!blocked.success);
    assert_eq!(blocked.message, "The game has ended.");
}

#[test]
fn mismatched_save_version_leaves_game_untouched() {
    let mut core = fresh_core(5);
    core.execute_action("meditate");
    let before = core.character().cloned();
    let log_before = core.log().clone();

    let save = SaveFile::from_json(&save_json(80, 80, "1.0.0")).unwrap();
    let err = core.apply_save(&save).unwrap_err();

    assert!(err.to_string().contains("version mismatch"));
    assert_eq!(core.character().cloned(), before);
    assert_eq!(core.log(), &log_before);
}

#[test]
fn unknown_realm_in_save_is_corrupt() {
    let mut core = fresh_core(5);
    let text = save_json(80, 80, "2.0.0").replace("Qi Refining", "Golden Core");
    let save = SaveFile::from_json(&text).unwrap();
    let err = core.apply_save(&save).unwrap_err();
    assert!(err.to_string().contains("corrupt save"));
    assert_eq!(core.character().unwrap().name, "Lin Feng");
    assert_eq!(core.character().unwrap().total_actions, 0);
}

#[test]
fn full_game_reaches_ascension_with_cultivation() {
    let mut core = fresh_core(10);
    let mut turns = 0;
    while !core.is_game_over() && turns < 5_000 {
        let character = core.character().unwrap();
        let id = if character.mana.current() >= 20 {
            ActionId::Cultivate
        } else if character.pills() > 0 && character.health.current() < 50 {
            ActionId::ConsumePill
        } else if character.health.current() > 10 {
            ActionId::Meditate
        } else {
            ActionId::Wait
        };
        assert!(core.execute_action(id.as_str()).success);
        turns += 1;
    }

    assert!(core.is_game_over());
    let character = core.character().unwrap();
    assert!(character.is_alive());
    assert_eq!(character.realm(), Realm::Ascension);
    assert_eq!(core.statistics().session.breakthroughs, 5);
}

#[test]
fn loading_a_zero_health_save_ends_the_game() {
    let mut core = core_from_save(0, 20);
    assert!(core.is_game_over());
    assert_eq!(
        core.log().last(),
        Some("Your cultivation has failed. The game is over.")
    );

    let result = core.execute_action("wait");
    assert!(!result.success);
    assert_eq!(result.message, "The game has ended.");
    assert!(core.reset(None, None));
    assert!(!core.is_game_over());
}

#[test]
fn fallen_character_is_not_advised_to_act() {
    let mut core = core_from_save(1, 20);
    while !core.is_game_over() {
        core.execute_action("meditate");
    }
    assert!(!core.character().unwrap().is_alive());

    let state = core.game_state().unwrap();
    assert_eq!(state.recommendation, Recommendation::Fallen);
    assert_eq!(state.recommendation.suggested_action(), None);
}
