//! Experience and stat-yield lookup table.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::AddAssign;
use thiserror::Error;

use crate::constants::{STAT_COUNT, YIELD_FIELD_SEPARATOR, YIELD_ROW_FIELDS};

/// Six stat-yield counters in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StatYields {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub sp_attack: u32,
    pub sp_defense: u32,
    pub speed: u32,
}

impl StatYields {
    #[must_use]
    pub const fn from_array(values: [u32; STAT_COUNT]) -> Self {
        let [hp, attack, defense, sp_attack, sp_defense, speed] = values;
        Self {
            hp,
            attack,
            defense,
            sp_attack,
            sp_defense,
            speed,
        }
    }

    #[must_use]
    pub const fn to_array(self) -> [u32; STAT_COUNT] {
        [
            self.hp,
            self.attack,
            self.defense,
            self.sp_attack,
            self.sp_defense,
            self.speed,
        ]
    }

    /// True when every counter is at least the matching counter of `other`.
    #[must_use]
    pub fn dominates(self, other: Self) -> bool {
        self.to_array()
            .iter()
            .zip(other.to_array())
            .all(|(mine, theirs)| *mine >= theirs)
    }
}

impl AddAssign for StatYields {
    fn add_assign(&mut self, rhs: Self) {
        self.hp = self.hp.saturating_add(rhs.hp);
        self.attack = self.attack.saturating_add(rhs.attack);
        self.defense = self.defense.saturating_add(rhs.defense);
        self.sp_attack = self.sp_attack.saturating_add(rhs.sp_attack);
        self.sp_defense = self.sp_defense.saturating_add(rhs.sp_defense);
        self.speed = self.speed.saturating_add(rhs.speed);
    }
}

impl std::fmt::Display for StatYields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [hp, atk, def, spa, spd, spe] = self.to_array();
        write!(f, "{hp}, {atk}, {def}, {spa}, {spd}, {spe}")
    }
}

/// Rewards granted for defeating one species.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldEntry {
    pub name: String,
    pub experience: u32,
    pub stats: StatYields,
}

/// Errors raised while loading the yield table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum YieldTableError {
    #[error("malformed yield entry on line {line}: {reason}")]
    MalformedEntry { line: usize, reason: String },
}

/// Immutable species lookup keyed by lowercase identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YieldTable {
    entries: HashMap<String, YieldEntry>,
    max_identifier_words: usize,
}

impl YieldTable {
    /// Parse comma-separated rows of `name,exp,hp,atk,def,spa,spd,spe`.
    ///
    /// # Errors
    ///
    /// Returns [`YieldTableError::MalformedEntry`] for the first row with the
    /// wrong number of fields, a non-integer yield, or a duplicate name.
    pub fn from_csv(source: &str) -> Result<Self, YieldTableError> {
        let mut table = Self::default();
        for (index, raw) in source.lines().enumerate() {
            let line = index + 1;
            if raw.trim().is_empty() {
                continue;
            }
            let entry = parse_row(raw).map_err(|reason| YieldTableError::MalformedEntry {
                line,
                reason,
            })?;
            if table.entries.contains_key(&entry.name) {
                return Err(YieldTableError::MalformedEntry {
                    line,
                    reason: format!("duplicate entry for `{}`", entry.name),
                });
            }
            table.insert(entry);
        }
        log::debug!("loaded {} yield entries", table.len());
        Ok(table)
    }

    /// Build a table from pre-parsed entries (useful for tests).
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = YieldEntry>) -> Self {
        let mut table = Self::default();
        for mut entry in entries {
            entry.name = entry.name.trim().to_lowercase();
            table.insert(entry);
        }
        table
    }

    fn insert(&mut self, entry: YieldEntry) {
        let words = entry.name.split_whitespace().count();
        self.max_identifier_words = self.max_identifier_words.max(words);
        self.entries.insert(entry.name.clone(), entry);
    }

    #[must_use]
    pub fn lookup(&self, identifier: &str) -> Option<&YieldEntry> {
        self.entries.get(identifier).or_else(|| {
            let lowered = identifier.trim().to_lowercase();
            self.entries.get(&lowered)
        })
    }

    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.lookup(identifier).is_some()
    }

    /// Word count of the longest identifier, e.g. 2 for `mr. mime`.
    #[must_use]
    pub const fn max_identifier_words(&self) -> usize {
        self.max_identifier_words
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_row(raw: &str) -> Result<YieldEntry, String> {
    let fields: Vec<&str> = raw.split(YIELD_FIELD_SEPARATOR).map(str::trim).collect();
    if fields.len() != YIELD_ROW_FIELDS {
        return Err(format!(
            "expected {YIELD_ROW_FIELDS} fields, found {}",
            fields.len()
        ));
    }
    let name = fields[0].to_lowercase();
    if name.is_empty() {
        return Err("missing identifier".to_string());
    }
    let experience = parse_count(fields[1], "experience yield")?;
    let mut stats = [0_u32; STAT_COUNT];
    for (slot, field) in stats.iter_mut().zip(&fields[2..]) {
        *slot = parse_count(field, "stat yield")?;
    }
    Ok(YieldEntry {
        name,
        experience,
        stats: StatYields::from_array(stats),
    })
}

fn parse_count(field: &str, what: &str) -> Result<u32, String> {
    field
        .parse::<u32>()
        .map_err(|_| format!("{what} `{field}` is not a non-negative integer"))
}
