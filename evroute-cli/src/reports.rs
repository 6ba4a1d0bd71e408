use colored::Colorize;
use std::io::{self, Write};
use std::time::Duration;

use evroute_game::PlanOutcome;
use evroute_game::constants::STAT_LABELS;

pub fn generate_console_report<W: Write + ?Sized>(
    out: &mut W,
    outcome: &PlanOutcome,
    total_duration: Duration,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Route Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "================".cyan())?;

    for journal in &outcome.journals {
        writeln!(out, "{}", journal.species.bold())?;
        for run in &journal.runs {
            let Some(last) = run.final_snapshot() else {
                continue;
            };
            let yields: Vec<String> = STAT_LABELS
                .iter()
                .zip(last.stats.to_array())
                .filter(|(_, value)| *value > 0)
                .map(|(label, value)| format!("{value} {label}"))
                .collect();
            writeln!(
                out,
                "   {} lv {} -> lv {}: {}",
                run.route,
                run.start_level,
                last.level,
                if yields.is_empty() {
                    "no yields".to_string()
                } else {
                    yields.join(", ")
                }
            )?;
        }
    }
    writeln!(out)?;

    if outcome.diagnostics.is_empty() {
        writeln!(out, "{}", "✅ Every route line applied".green())?;
    } else {
        writeln!(
            out,
            "{}",
            format!("⚠️  {} route lines skipped", outcome.diagnostics.len()).yellow()
        )?;
        for diagnostic in &outcome.diagnostics {
            writeln!(out, "     • {}", diagnostic.to_string().yellow())?;
        }
    }
    writeln!(out, "🏁 Total time: {total_duration:?}")?;
    Ok(())
}
