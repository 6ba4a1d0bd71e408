//! Creature progression state machine.
//!
//! A [`CreatureState`] accrues experience and stat yields from route commands
//! and resolves any resulting level-ups in a single iterative cascade. Every
//! level reached is recorded as a [`LevelSnapshot`].
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::constants::{
    EXP_LEVEL_DIVISOR, MAX_LEVEL, SHARED_DIVISOR, TRAINER_BONUS_DEN, TRAINER_BONUS_NUM,
};
use crate::curve::{CurveError, ExperienceCurve, LevelingCurve};
use crate::yields::{StatYields, YieldTable};

/// Opponents defeated between two snapshots.
pub type OpponentList = SmallVec<[String; 4]>;

/// Errors raised while simulating a creature.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("unknown opponent `{opponent}`")]
    UnknownOpponent { opponent: String },
    #[error("{curve} curve does not progress into level {level} (step of {step} experience)")]
    NonProgressingCurve {
        curve: &'static str,
        level: u32,
        step: i64,
    },
    #[error(transparent)]
    Curve(#[from] CurveError),
}

/// Cumulative yields at the moment a level is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub level: u32,
    pub stats: StatYields,
    #[serde(default)]
    pub opponents: OpponentList,
}

/// Experience awarded for one defeated opponent.
///
/// Trainer battles grant `floor(exp * level / 7) * 1.5`, halved again when
/// the experience is shared.
#[must_use]
pub fn battle_experience(base_experience: u32, opponent_level: u32, shared: bool) -> i64 {
    let base = i64::from(base_experience) * i64::from(opponent_level) / EXP_LEVEL_DIVISOR;
    let den = if shared {
        TRAINER_BONUS_DEN * SHARED_DIVISOR
    } else {
        TRAINER_BONUS_DEN
    };
    base * TRAINER_BONUS_NUM / den
}

/// One simulated creature walking a route.
#[derive(Debug, Clone)]
pub struct CreatureState<'a, C = LevelingCurve>
where
    C: ExperienceCurve,
{
    table: &'a YieldTable,
    curve: C,
    level: u32,
    experience_remaining: i64,
    stats: StatYields,
    recent_opponents: OpponentList,
    snapshots: Vec<LevelSnapshot>,
}

impl<'a, C> CreatureState<'a, C>
where
    C: ExperienceCurve,
{
    /// Start a creature at `start_level` and record its first snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the level is outside the curve's domain or the
    /// curve does not progress out of the starting level.
    pub fn new(start_level: u32, curve: C, table: &'a YieldTable) -> Result<Self, SimError> {
        let experience_remaining = if start_level == MAX_LEVEL {
            curve.total_experience(start_level)?;
            0
        } else {
            step_into(&curve, start_level)?
        };
        let mut state = Self {
            table,
            curve,
            level: start_level,
            experience_remaining,
            stats: StatYields::default(),
            recent_opponents: OpponentList::new(),
            snapshots: Vec::new(),
        };
        state.record_snapshot();
        Ok(state)
    }

    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub const fn curve(&self) -> &C {
        &self.curve
    }

    #[must_use]
    pub const fn experience_remaining(&self) -> i64 {
        self.experience_remaining
    }

    #[must_use]
    pub const fn stats(&self) -> StatYields {
        self.stats
    }

    #[must_use]
    pub fn recent_opponents(&self) -> &[String] {
        &self.recent_opponents
    }

    #[must_use]
    pub fn snapshots(&self) -> &[LevelSnapshot] {
        &self.snapshots
    }

    /// Finish the run and hand back its snapshots. Opponents defeated at
    /// the maximum level get a closing snapshot, since no later level-up
    /// would ever record them.
    #[must_use]
    pub fn into_snapshots(mut self) -> Vec<LevelSnapshot> {
        if self.level == MAX_LEVEL && !self.recent_opponents.is_empty() {
            self.record_snapshot();
        }
        self.snapshots
    }

    /// Defeat `opponent` at `opponent_level`, returning the levels gained.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownOpponent`] without touching the state when
    /// the opponent is missing from the yield table, or a curve error raised
    /// while resolving level-ups.
    pub fn battle(
        &mut self,
        opponent: &str,
        opponent_level: u32,
        shared: bool,
    ) -> Result<u32, SimError> {
        let table = self.table;
        let entry = table
            .lookup(opponent)
            .ok_or_else(|| SimError::UnknownOpponent {
                opponent: opponent.to_string(),
            })?;
        let gained = battle_experience(entry.experience, opponent_level, shared);
        self.experience_remaining -= gained;
        self.stats += entry.stats;
        self.recent_opponents.push(entry.name.clone());
        log::trace!(
            "defeated {} (lv {opponent_level}{}) for {gained} exp",
            entry.name,
            if shared { ", shared" } else { "" }
        );
        self.resolve()
    }

    /// Level up exactly once, discarding any progress toward the next level.
    ///
    /// # Errors
    ///
    /// Returns an error if the curve cannot progress past the new level.
    pub fn candy(&mut self) -> Result<u32, SimError> {
        if self.level >= MAX_LEVEL {
            log::debug!("candy ignored at level {MAX_LEVEL}");
            return Ok(0);
        }
        self.experience_remaining = 0;
        self.resolve()
    }

    /// Use candies until `target_level` is reached. Targets at or below the
    /// current level leave the state untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Curve`] for targets above the maximum level.
    pub fn force(&mut self, target_level: u32) -> Result<u32, SimError> {
        if target_level > MAX_LEVEL {
            return Err(CurveError::out_of_range(target_level, MAX_LEVEL).into());
        }
        let mut gained = 0;
        while self.level < target_level {
            gained += self.candy()?;
        }
        Ok(gained)
    }

    fn resolve(&mut self) -> Result<u32, SimError> {
        let mut gained = 0;
        while self.experience_remaining <= 0 && self.level < MAX_LEVEL {
            let next = self.level + 1;
            if next == MAX_LEVEL {
                self.experience_remaining = 0;
            } else {
                self.experience_remaining += step_into(&self.curve, next)?;
            }
            self.level = next;
            self.record_snapshot();
            gained += 1;
        }
        if self.level == MAX_LEVEL {
            self.experience_remaining = 0;
        }
        Ok(gained)
    }

    fn record_snapshot(&mut self) {
        log::debug!(
            "level {} -> {}{}",
            self.level,
            self.stats,
            if self.recent_opponents.is_empty() {
                String::new()
            } else {
                format!(" # {}", self.recent_opponents.join(", "))
            }
        );
        self.snapshots.push(LevelSnapshot {
            level: self.level,
            stats: self.stats,
            opponents: std::mem::take(&mut self.recent_opponents),
        });
    }
}

fn step_into<C: ExperienceCurve>(curve: &C, level: u32) -> Result<i64, SimError> {
    let step = curve.experience_to_next_level(level)?;
    if step <= 0 {
        return Err(SimError::NonProgressingCurve {
            curve: curve.label(),
            level,
            step,
        });
    }
    Ok(step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yields::YieldEntry;

    fn table() -> YieldTable {
        YieldTable::from_entries([
            YieldEntry {
                name: "shinx".to_string(),
                experience: 65,
                stats: StatYields::from_array([0, 1, 0, 0, 0, 0]),
            },
            YieldEntry {
                name: "chansey".to_string(),
                experience: 255,
                stats: StatYields::from_array([2, 0, 0, 0, 0, 0]),
            },
        ])
    }

    #[derive(Debug)]
    struct StallingCurve;

    impl ExperienceCurve for StallingCurve {
        fn label(&self) -> &'static str {
            "stalling"
        }

        fn total_experience(&self, level: u32) -> Result<i64, CurveError> {
            Ok(i64::from(level.min(10)) * 10)
        }
    }

    #[test]
    fn battle_experience_matches_trainer_formula() {
        assert_eq!(battle_experience(65, 6, false), 82);
        assert_eq!(battle_experience(65, 6, true), 41);
        assert_eq!(battle_experience(0, 50, false), 0);
    }

    #[test]
    fn shared_battles_grant_half_experience() {
        for exp in [1, 36, 49, 65, 161, 255] {
            for level in 1..=100 {
                let full = battle_experience(exp, level, false);
                assert_eq!(battle_experience(exp, level, true), full / 2);
            }
        }
    }

    #[test]
    fn construction_records_initial_snapshot() {
        let table = table();
        let state = CreatureState::new(5, LevelingCurve::MediumSlow, &table).unwrap();
        assert_eq!(state.level(), 5);
        assert_eq!(state.experience_remaining(), 44);
        assert_eq!(state.snapshots().len(), 1);
        assert_eq!(state.snapshots()[0].level, 5);
        assert!(state.snapshots()[0].opponents.is_empty());
    }

    #[test]
    fn battle_deducts_experience_and_levels_once() {
        let table = table();
        let mut state = CreatureState::new(5, LevelingCurve::MediumSlow, &table).unwrap();
        let gained = state.battle("shinx", 6, false).unwrap();
        assert_eq!(gained, 1);
        assert_eq!(state.level(), 6);
        // 44 - 82 + 57
        assert_eq!(state.experience_remaining(), 19);
        let last = state.snapshots().last().unwrap();
        assert_eq!(last.level, 6);
        assert_eq!(last.stats.attack, 1);
        assert_eq!(last.opponents.to_vec(), vec!["shinx".to_string()]);
        assert!(state.recent_opponents().is_empty());
    }

    #[test]
    fn single_battle_can_cascade_many_levels() {
        let table = table();
        let mut state = CreatureState::new(2, LevelingCurve::MediumFast, &table).unwrap();
        // 8 + 2731 total experience lands between 13^3 and 14^3
        let gained = state.battle("chansey", 50, false).unwrap();
        assert_eq!(gained, 11);
        assert_eq!(state.level(), 13);
        assert_eq!(state.experience_remaining(), 14_i64.pow(3) - 2739);
        let snapshots = state.snapshots();
        assert_eq!(snapshots[1].level, 3);
        assert_eq!(snapshots[1].opponents.len(), 1);
        assert!(snapshots[2..].iter().all(|s| s.opponents.is_empty()));
    }

    #[test]
    fn opponents_accumulate_until_next_level() {
        let table = table();
        let mut state = CreatureState::new(30, LevelingCurve::Slow, &table).unwrap();
        state.battle("shinx", 2, false).unwrap();
        state.battle("shinx", 2, true).unwrap();
        assert_eq!(state.recent_opponents().len(), 2);
        state.candy().unwrap();
        let last = state.snapshots().last().unwrap();
        assert_eq!(last.level, 31);
        assert_eq!(last.opponents.len(), 2);
        assert_eq!(last.stats.attack, 2);
    }

    #[test]
    fn unknown_opponent_leaves_state_untouched() {
        let table = table();
        let mut state = CreatureState::new(5, LevelingCurve::MediumSlow, &table).unwrap();
        let before = state.clone();
        let err = state.battle("missingno", 10, false).unwrap_err();
        assert_eq!(
            err,
            SimError::UnknownOpponent {
                opponent: "missingno".to_string()
            }
        );
        assert_eq!(state.level(), before.level());
        assert_eq!(state.experience_remaining(), before.experience_remaining());
        assert_eq!(state.stats(), before.stats());
        assert_eq!(state.snapshots(), before.snapshots());
    }

    #[test]
    fn candy_discards_leftover_progress() {
        let table = table();
        let mut state = CreatureState::new(5, LevelingCurve::MediumSlow, &table).unwrap();
        state.battle("shinx", 2, false).unwrap();
        assert!(state.experience_remaining() > 0);
        assert_eq!(state.candy().unwrap(), 1);
        assert_eq!(state.level(), 6);
        assert_eq!(state.experience_remaining(), 57);
    }

    #[test]
    fn force_records_one_snapshot_per_level() {
        let table = table();
        let mut state = CreatureState::new(5, LevelingCurve::MediumSlow, &table).unwrap();
        assert_eq!(state.force(10).unwrap(), 5);
        let levels: Vec<u32> = state.snapshots()[1..].iter().map(|s| s.level).collect();
        assert_eq!(levels, vec![6, 7, 8, 9, 10]);
        assert!(
            state.snapshots()[1..]
                .iter()
                .all(|s| s.opponents.is_empty() && s.stats == StatYields::default())
        );
        assert_eq!(state.experience_remaining(), 182);
    }

    #[test]
    fn force_is_idempotent() {
        let table = table();
        let mut state = CreatureState::new(5, LevelingCurve::Fast, &table).unwrap();
        state.force(12).unwrap();
        let snapshot_count = state.snapshots().len();
        let remaining = state.experience_remaining();
        assert_eq!(state.force(12).unwrap(), 0);
        assert_eq!(state.snapshots().len(), snapshot_count);
        assert_eq!(state.experience_remaining(), remaining);
    }

    #[test]
    fn force_below_current_level_is_a_no_op() {
        let table = table();
        let mut state = CreatureState::new(20, LevelingCurve::Erratic, &table).unwrap();
        state.battle("shinx", 3, false).unwrap();
        let before = state.clone();
        assert_eq!(state.force(10).unwrap(), 0);
        assert_eq!(state.level(), 20);
        assert_eq!(state.experience_remaining(), before.experience_remaining());
        assert_eq!(state.recent_opponents(), before.recent_opponents());
        assert_eq!(state.snapshots(), before.snapshots());
    }

    #[test]
    fn force_above_max_level_is_rejected() {
        let table = table();
        let mut state = CreatureState::new(20, LevelingCurve::Erratic, &table).unwrap();
        assert!(matches!(state.force(101), Err(SimError::Curve(_))));
        assert_eq!(state.level(), 20);
    }

    #[test]
    fn max_level_pins_remaining_experience() {
        let table = table();
        let mut state = CreatureState::new(98, LevelingCurve::Fluctuating, &table).unwrap();
        state.force(100).unwrap();
        assert_eq!(state.level(), 100);
        assert_eq!(state.experience_remaining(), 0);
        assert_eq!(state.candy().unwrap(), 0);
        state.battle("chansey", 100, false).unwrap();
        assert_eq!(state.level(), 100);
        assert_eq!(state.experience_remaining(), 0);
        assert_eq!(state.stats().hp, 2);
    }

    #[test]
    fn battles_at_max_level_get_a_closing_snapshot() {
        let table = table();
        let mut state = CreatureState::new(99, LevelingCurve::Fast, &table).unwrap();
        state.candy().unwrap();
        state.battle("shinx", 40, false).unwrap();
        state.battle("chansey", 40, true).unwrap();
        assert_eq!(state.snapshots().len(), 2);

        let snapshots = state.into_snapshots();
        assert_eq!(snapshots.len(), 3);
        let closing = &snapshots[2];
        assert_eq!(closing.level, 100);
        assert_eq!(closing.stats, StatYields::from_array([2, 1, 0, 0, 0, 0]));
        assert_eq!(closing.opponents.to_vec(), vec!["shinx", "chansey"]);
    }

    #[test]
    fn runs_ending_below_max_level_add_no_closing_snapshot() {
        let table = table();
        let mut state = CreatureState::new(20, LevelingCurve::Slow, &table).unwrap();
        state.battle("shinx", 5, false).unwrap();
        assert_eq!(state.recent_opponents(), ["shinx"]);
        assert_eq!(state.into_snapshots().len(), 1);
    }

    #[test]
    fn stat_yields_never_decrease() {
        let table = table();
        let mut state = CreatureState::new(8, LevelingCurve::Slow, &table).unwrap();
        let mut previous = state.stats();
        for step in 0..20 {
            match step % 4 {
                0 => state.battle("shinx", 10, step % 2 == 0).map(|_| ()).unwrap(),
                1 => state.battle("chansey", 12, false).map(|_| ()).unwrap(),
                2 => state.candy().map(|_| ()).unwrap(),
                _ => state.force(state.level() + 2).map(|_| ()).unwrap(),
            }
            assert!(state.stats().dominates(previous));
            previous = state.stats();
        }
    }

    #[test]
    fn non_progressing_curve_aborts_cascade() {
        let table = table();
        let mut state = CreatureState::new(5, StallingCurve, &table).unwrap();
        let err = state.force(15).unwrap_err();
        assert_eq!(
            err,
            SimError::NonProgressingCurve {
                curve: "stalling",
                level: 10,
                step: 0,
            }
        );
        assert_eq!(state.level(), 9);
    }

    #[test]
    fn rejects_out_of_range_start_levels() {
        let table = table();
        assert!(CreatureState::new(0, LevelingCurve::Slow, &table).is_err());
        assert!(CreatureState::new(101, LevelingCurve::Slow, &table).is_err());
        let capped = CreatureState::new(100, LevelingCurve::Slow, &table).unwrap();
        assert_eq!(capped.experience_remaining(), 0);
    }
}
