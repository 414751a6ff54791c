//! Centralized balance and tuning constants for Xiuxian game logic.
//!
//! These values define the deterministic math for the core simulation.
//! Keeping them together ensures that gameplay can only be adjusted via
//! code changes reviewed in version control, rather than through external
//! JSON assets.

// Resource pools ------------------------------------------------------------
pub const HEALTH_MAX: u32 = 100;
pub const MANA_MAX: u32 = 100;
pub const TALENT_MIN: u8 = 1;
pub const TALENT_MAX: u8 = 10;

// Meditate ------------------------------------------------------------------
pub(crate) const MEDITATE_HEALTH_COST: u32 = 1;
pub(crate) const MEDITATE_TIME_COST: u32 = 1;
pub(crate) const MEDITATE_BASE_MANA: u32 = 8;
pub(crate) const MEDITATE_BASE_EXP: u32 = 3;
pub(crate) const MEDITATION_STREAK_INTERVAL: u32 = 5;
pub(crate) const MEDITATION_STREAK_PILLS: u32 = 1;

// Consume pill --------------------------------------------------------------
pub(crate) const PILL_COST: u32 = 1;
pub(crate) const PILL_BASE_HEALTH: u32 = 15;
pub(crate) const PILL_BASE_MANA: u32 = 15;
pub(crate) const PILL_BASE_EXP: u32 = 5;

// Cultivate -----------------------------------------------------------------
pub(crate) const CULTIVATE_MANA_COST: u32 = 20;
pub(crate) const CULTIVATE_TIME_COST: u32 = 2;
pub(crate) const CULTIVATE_BASE_EXP: u32 = 12;

// Wait ----------------------------------------------------------------------
pub(crate) const WAIT_HEALTH_COST: u32 = 1;
pub(crate) const WAIT_TIME_COST: u32 = 1;
pub(crate) const WAIT_HEALTH_RECOVERY: u32 = 2;
pub(crate) const WAIT_MANA_RECOVERY: u32 = 3;

// Talent multipliers --------------------------------------------------------
pub(crate) const TALENT_MULT_MEDITATE: f64 = 0.8;
pub(crate) const TALENT_MULT_CULTIVATE: f64 = 1.5;
pub(crate) const TALENT_MULT_PILL: f64 = 1.0;

// Realm thresholds (experience needed to leave the realm) -------------------
pub(crate) const THRESHOLD_QI_REFINING: u32 = 100;
pub(crate) const THRESHOLD_FOUNDATION: u32 = 200;
pub(crate) const THRESHOLD_CORE_FORMATION: u32 = 400;
pub(crate) const THRESHOLD_NASCENT_SOUL: u32 = 800;
pub(crate) const THRESHOLD_SPIRITUAL_TRANSFORMATION: u32 = 1_600;

// Journal -------------------------------------------------------------------
pub const JOURNAL_CAPACITY: usize = 100;
pub const JOURNAL_RECENT_DEFAULT: usize = 8;
pub(crate) const JOURNAL_EMPTY_LINE: &str = "Your cultivation journey begins...";

// Engine ----------------------------------------------------------------------
pub const DEFAULT_CHARACTER_NAME: &str = "Nameless Cultivator";
pub const SAVE_VERSION: &str = "2.0.0";
pub(crate) const EVENT_HISTORY_CAPACITY: usize = 100;
pub(crate) const LOG_GAME_ENDED: &str = "The game has ended.";
pub(crate) const LOG_DEATH: &str = "Your cultivation has failed. The game is over.";
pub(crate) const LOG_ASCENSION: &str = "Congratulations! You have ascended and reached the perfect ending!";
pub(crate) const SAVE_CHECKSUM_SEED: u64 = 0x5849_5558_4941_4E00;
