pub mod catalog;

use crate::logic::SimulationPlan;

/// Logic test scenario: a named simulation plan with expectations.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: String,
    pub description: &'static str,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(
        key: &'static str,
        name: impl Into<String>,
        description: &'static str,
        plan: SimulationPlan,
    ) -> Self {
        Self {
            key,
            name: name.into(),
            description,
            plan,
        }
    }
}

/// Scenario keys in the order `all` expands to.
pub const SCENARIO_KEYS: [&str; 10] = [
    "smoke",
    "first-meditation",
    "meditation-streak",
    "mana-exhaustion",
    "breakthrough",
    "last-breath",
    "save-version-guard",
    "random-walk",
    "deterministic-talent",
    "ascension-run",
];

/// Look a scenario up by key or short alias, case-insensitively.
#[must_use]
pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let key = match name.trim().to_lowercase().as_str() {
        "smoke" => "smoke",
        "first-meditation" | "meditate" => "first-meditation",
        "meditation-streak" | "streak" => "meditation-streak",
        "mana-exhaustion" | "mana" => "mana-exhaustion",
        "breakthrough" => "breakthrough",
        "last-breath" | "death" => "last-breath",
        "save-version-guard" | "save-guard" => "save-version-guard",
        "random-walk" | "random" => "random-walk",
        "deterministic-talent" | "deterministic" => "deterministic-talent",
        "ascension-run" | "ascension" => "ascension-run",
        _ => return None,
    };
    catalog::catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.key == key)
}

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog::catalog_scenarios()
        .into_iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}
