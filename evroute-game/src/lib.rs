//! EV Route Engine
//!
//! Platform-agnostic leveling and stat-yield simulation. Given a yield table
//! and linear route scripts, it replays every battle and level grant against
//! a creature and records the cumulative stat yields at each level.
//! File access is abstracted behind [`DataLoader`].

pub mod constants;
pub mod curve;
pub mod journal;
pub mod plan;
pub mod route;
pub mod state;
pub mod yields;

use anyhow::{Context, bail};

// Re-export commonly used types
pub use curve::{CurveError, ExperienceCurve, LevelingCurve};
pub use journal::{CreatureJournal, RunJournal, snapshot_line, write_journal, write_journal_json};
pub use plan::{CreaturePlan, PlanError, RoutePlan, RunPlan};
pub use route::{
    ParsedRoute, RouteCommand, RouteDiagnostic, RouteLineError, RouteParser, RouteStep,
    parse_route, replay,
};
pub use state::{CreatureState, LevelSnapshot, OpponentList, SimError, battle_experience};
pub use yields::{StatYields, YieldEntry, YieldTable, YieldTableError};

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the raw yield table text
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read.
    fn load_yield_source(&self, name: &str) -> Result<String, Self::Error>;

    /// Load the raw text of a route script
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read.
    fn load_route_source(&self, name: &str) -> Result<String, Self::Error>;
}

/// A skipped route line, tagged with the run it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDiagnostic {
    pub species: String,
    pub start_level: u32,
    pub route: String,
    pub diagnostic: RouteDiagnostic,
}

impl std::fmt::Display for RunDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (start {}) {}: {}",
            self.species, self.start_level, self.route, self.diagnostic
        )
    }
}

/// Journals and diagnostics produced by a whole plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanOutcome {
    pub journals: Vec<CreatureJournal>,
    pub diagnostics: Vec<RunDiagnostic>,
}

/// Main engine replaying route plans
pub struct RouteEngine<L>
where
    L: DataLoader,
{
    data_loader: L,
}

impl<L> RouteEngine<L>
where
    L: DataLoader,
{
    /// Create a new engine with the provided data loader
    pub const fn new(data_loader: L) -> Self {
        Self { data_loader }
    }

    /// Load and parse the yield table
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be read or has a malformed row.
    pub fn load_table(&self, name: &str) -> anyhow::Result<YieldTable> {
        let source = self
            .data_loader
            .load_yield_source(name)
            .with_context(|| format!("failed to read yield table `{name}`"))?;
        let table = YieldTable::from_csv(&source)
            .with_context(|| format!("failed to load yield table `{name}`"))?;
        if table.is_empty() {
            bail!("yield table `{name}` has no entries");
        }
        Ok(table)
    }

    /// Replay one route from `run.start_level`.
    ///
    /// # Errors
    ///
    /// Returns an error if the route cannot be read or the simulation hits a
    /// fatal error. Skipped lines are returned alongside the journal.
    pub fn simulate_run<C>(
        &self,
        table: &YieldTable,
        curve: C,
        run: &RunPlan,
    ) -> anyhow::Result<(RunJournal, Vec<RouteDiagnostic>)>
    where
        C: ExperienceCurve,
    {
        let script = self
            .data_loader
            .load_route_source(&run.route)
            .with_context(|| format!("failed to read route `{}`", run.route))?;
        let parsed = parse_route(&script, table);
        let mut state = CreatureState::new(run.start_level, curve, table)
            .with_context(|| format!("cannot start `{}` at level {}", run.route, run.start_level))?;
        let replay_diagnostics = replay(&mut state, &parsed)
            .with_context(|| format!("route `{}` aborted", run.route))?;
        log::debug!(
            "route {} from level {} finished at level {} ({} steps, {} skipped)",
            run.route,
            run.start_level,
            state.level(),
            parsed.steps.len(),
            parsed.diagnostics.len() + replay_diagnostics.len()
        );

        let mut diagnostics = parsed.diagnostics;
        diagnostics.extend(replay_diagnostics);
        diagnostics.sort_by_key(|d| d.line);
        let journal = RunJournal {
            start_level: run.start_level,
            route: run.route.clone(),
            snapshots: state.into_snapshots(),
        };
        Ok((journal, diagnostics))
    }

    /// Validate `plan`, load its table once, and replay every run.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan is invalid, the table cannot be loaded,
    /// or any run fails fatally.
    pub fn run_plan(&self, plan: &RoutePlan) -> anyhow::Result<PlanOutcome> {
        plan.validate().context("invalid route plan")?;
        let table = self.load_table(&plan.yield_table)?;

        let mut outcome = PlanOutcome::default();
        for creature in &plan.creatures {
            log::info!(
                "simulating {} on the {} curve ({} runs)",
                creature.species,
                creature.curve,
                creature.runs.len()
            );
            let mut journal = CreatureJournal {
                species: creature.species.clone(),
                base_stats: creature.base_stats.clone(),
                runs: Vec::with_capacity(creature.runs.len()),
            };
            for run in &creature.runs {
                let (run_journal, diagnostics) = self
                    .simulate_run(&table, creature.curve, run)
                    .with_context(|| format!("{} failed", creature.species))?;
                outcome
                    .diagnostics
                    .extend(diagnostics.into_iter().map(|diagnostic| RunDiagnostic {
                        species: creature.species.clone(),
                        start_level: run.start_level,
                        route: run.route.clone(),
                        diagnostic,
                    }));
                journal.runs.push(run_journal);
            }
            outcome.journals.push(journal);
        }
        Ok(outcome)
    }
}
