//! Level journal rendering.
//!
//! The journal groups every simulated run of a species under a tracker
//! header listing the species' base stats per growth stage:
//!
//! ```text
//! :::tracker{species=Chimchar baseStats="[[44, 58, 44, 58, 44, 61]]"}
//! 5:
//!    5 -> 0, 0, 0, 0, 0, 0
//!    6 -> 0, 0, 0, 0, 0, 1 # starly
//! :::
//! ```
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use crate::constants::STAT_COUNT;
use crate::state::LevelSnapshot;

/// Snapshots of one (starting level, route) simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunJournal {
    pub start_level: u32,
    pub route: String,
    pub snapshots: Vec<LevelSnapshot>,
}

impl RunJournal {
    #[must_use]
    pub fn final_snapshot(&self) -> Option<&LevelSnapshot> {
        self.snapshots.last()
    }
}

/// Every run simulated for one species.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureJournal {
    pub species: String,
    pub base_stats: Vec<[u32; STAT_COUNT]>,
    pub runs: Vec<RunJournal>,
}

impl CreatureJournal {
    #[must_use]
    pub fn tracker_header(&self) -> String {
        let stages: Vec<String> = self
            .base_stats
            .iter()
            .map(|stage| {
                let values: Vec<String> = stage.iter().map(u32::to_string).collect();
                format!("[{}]", values.join(", "))
            })
            .collect();
        format!(
            ":::tracker{{species={} baseStats=\"[{}]\"}}",
            self.species,
            stages.join(", ")
        )
    }
}

/// Render one snapshot as `   <level> -> <yields>[ # <opponents>]`.
#[must_use]
pub fn snapshot_line(snapshot: &LevelSnapshot) -> String {
    let mut line = format!("   {} -> {}", snapshot.level, snapshot.stats);
    if !snapshot.opponents.is_empty() {
        line.push_str(" # ");
        line.push_str(&snapshot.opponents.join(", "));
    }
    line
}

/// Write the text journal for all species.
///
/// # Errors
///
/// Returns any I/O error raised by `out`.
pub fn write_journal<W: Write + ?Sized>(
    out: &mut W,
    journals: &[CreatureJournal],
) -> io::Result<()> {
    for (index, journal) in journals.iter().enumerate() {
        if index > 0 {
            writeln!(out)?;
        }
        writeln!(out, "{}", journal.tracker_header())?;
        for (run_index, run) in journal.runs.iter().enumerate() {
            if run_index > 0 {
                writeln!(out)?;
            }
            writeln!(out, "{}:", run.start_level)?;
            for snapshot in &run.snapshots {
                writeln!(out, "{}", snapshot_line(snapshot))?;
            }
        }
        writeln!(out, ":::")?;
    }
    Ok(())
}

/// Write the journal as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_journal_json<W: Write + ?Sized>(
    out: &mut W,
    journals: &[CreatureJournal],
) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(&mut *out, journals)?;
    writeln!(out).map_err(serde_json::Error::io)
}
