//! Run plan configuration.
//!
//! A plan names the yield table, the optional output file, and for each
//! species the curve, base stats and the routes to replay from each starting
//! level. Plans are plain JSON.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{MAX_LEVEL, MIN_LEVEL, STAT_COUNT};
use crate::curve::LevelingCurve;

/// Errors raised when a plan violates its invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("plan lists no creatures")]
    NoCreatures,
    #[error("{species} has no runs")]
    NoRuns { species: String },
    #[error("{species} run `{route}` starts at level {level}, outside {min}..={max}")]
    StartLevel {
        species: String,
        route: String,
        level: u32,
        min: u32,
        max: u32,
    },
    #[error("creature species name is empty")]
    EmptySpecies,
    #[error("{field} path is empty")]
    EmptyPath { field: &'static str },
}

/// One starting level and the route replayed from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPlan {
    pub start_level: u32,
    pub route: String,
}

/// A species and all of its runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreaturePlan {
    pub species: String,
    pub curve: LevelingCurve,
    #[serde(default)]
    pub base_stats: Vec<[u32; STAT_COUNT]>,
    pub runs: Vec<RunPlan>,
}

/// Top-level plan file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePlan {
    #[serde(default = "RoutePlan::default_yield_table")]
    pub yield_table: String,
    #[serde(default)]
    pub output: Option<String>,
    pub creatures: Vec<CreaturePlan>,
}

impl RoutePlan {
    fn default_yield_table() -> String {
        "ev_table.csv".to_string()
    }

    /// Parse a plan from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a plan.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check plan invariants before anything is loaded.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.yield_table.trim().is_empty() {
            return Err(PlanError::EmptyPath {
                field: "yield_table",
            });
        }
        if self.creatures.is_empty() {
            return Err(PlanError::NoCreatures);
        }
        for creature in &self.creatures {
            creature.validate()?;
        }
        Ok(())
    }
}

impl CreaturePlan {
    fn validate(&self) -> Result<(), PlanError> {
        if self.species.trim().is_empty() {
            return Err(PlanError::EmptySpecies);
        }
        if self.runs.is_empty() {
            return Err(PlanError::NoRuns {
                species: self.species.clone(),
            });
        }
        for run in &self.runs {
            if run.route.trim().is_empty() {
                return Err(PlanError::EmptyPath { field: "route" });
            }
            if !(MIN_LEVEL..=MAX_LEVEL).contains(&run.start_level) {
                return Err(PlanError::StartLevel {
                    species: self.species.clone(),
                    route: run.route.clone(),
                    level: run.start_level,
                    min: MIN_LEVEL,
                    max: MAX_LEVEL,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"{
        "yield_table": "ev_table.csv",
        "output": "route.mdr",
        "creatures": [
            {
                "species": "Chimchar",
                "curve": "medium_slow",
                "base_stats": [[44, 58, 44, 58, 44, 61], [64, 78, 52, 78, 52, 81]],
                "runs": [{ "start_level": 5, "route": "chimchar_route.txt" }]
            },
            {
                "species": "Gible",
                "curve": "slow",
                "runs": [
                    { "start_level": 17, "route": "lvl_17.txt" },
                    { "start_level": 18, "route": "lvl_18.txt" }
                ]
            }
        ]
    }"#;

    #[test]
    fn parses_plan_json() {
        let plan = RoutePlan::from_json(PLAN).unwrap();
        assert_eq!(plan.output.as_deref(), Some("route.mdr"));
        assert_eq!(plan.creatures.len(), 2);
        assert_eq!(plan.creatures[0].curve, LevelingCurve::MediumSlow);
        assert_eq!(plan.creatures[0].base_stats.len(), 2);
        assert!(plan.creatures[1].base_stats.is_empty());
        assert_eq!(plan.creatures[1].runs[1].start_level, 18);
        assert_eq!(plan.validate(), Ok(()));
    }

    #[test]
    fn yield_table_defaults_when_omitted() {
        let plan = RoutePlan::from_json(
            r#"{"creatures": [{"species": "Gible", "curve": "slow", "runs": []}]}"#,
        )
        .unwrap();
        assert_eq!(plan.yield_table, "ev_table.csv");
        assert!(plan.output.is_none());
        assert_eq!(
            plan.validate(),
            Err(PlanError::NoRuns {
                species: "Gible".to_string()
            })
        );
    }

    #[test]
    fn rejects_unknown_curves_and_short_stat_rows() {
        let bad_curve = r#"{"creatures": [{"species": "A", "curve": "glacial", "runs": []}]}"#;
        assert!(RoutePlan::from_json(bad_curve).is_err());
        let short_row = r#"{"creatures": [{"species": "A", "curve": "fast", "base_stats": [[1, 2, 3]], "runs": []}]}"#;
        assert!(RoutePlan::from_json(short_row).is_err());
    }

    #[test]
    fn validation_catches_start_levels_and_empty_plans() {
        let mut plan = RoutePlan::from_json(PLAN).unwrap();
        plan.creatures[1].runs[0].start_level = 0;
        assert!(matches!(
            plan.validate(),
            Err(PlanError::StartLevel { level: 0, .. })
        ));
        plan.creatures.clear();
        assert_eq!(plan.validate(), Err(PlanError::NoCreatures));
    }
}
