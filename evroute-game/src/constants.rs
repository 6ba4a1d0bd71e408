//! Centralized constants for the leveling simulation.
//!
//! These values define the deterministic math of the route replay and the
//! keywords of the route grammar. Keeping them together means the formulas
//! can only change through reviewed code, never through data files.

// Level bounds -------------------------------------------------------------
pub const MIN_LEVEL: u32 = 1;
pub const MAX_LEVEL: u32 = 100;

// Stat yields --------------------------------------------------------------
pub const STAT_COUNT: usize = 6;
pub const STAT_LABELS: [&str; STAT_COUNT] = ["HP", "Atk", "Def", "SpA", "SpD", "Spe"];

// Battle experience --------------------------------------------------------
pub(crate) const EXP_LEVEL_DIVISOR: i64 = 7;
/// Trainer battles award 1.5x; kept as a ratio so the math stays integral.
pub(crate) const TRAINER_BONUS_NUM: i64 = 3;
pub(crate) const TRAINER_BONUS_DEN: i64 = 2;
pub(crate) const SHARED_DIVISOR: i64 = 2;

// Route grammar ------------------------------------------------------------
pub(crate) const COMMENT_MARKER: char = '#';
pub(crate) const KEYWORD_FORCE: &str = "force";
pub(crate) const KEYWORD_CANDY: &str = "candy";
pub(crate) const KEYWORD_SHARED: &str = "shared";
pub(crate) const ABBREVIATION_MARK: char = '.';

// Yield table --------------------------------------------------------------
pub(crate) const YIELD_FIELD_SEPARATOR: char = ',';
pub(crate) const YIELD_ROW_FIELDS: usize = 2 + STAT_COUNT;
