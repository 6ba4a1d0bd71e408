mod loader;
mod reports;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stderr, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use evroute_game::{PlanOutcome, RouteEngine, RoutePlan, write_journal, write_journal_json};
use loader::FsLoader;

#[derive(Debug, Parser)]
#[command(name = "evroute", version)]
#[command(about = "Replay EV training routes and write the level-by-level stat-yield journal")]
struct Args {
    /// Run plan listing species, curves, and routes
    #[arg(long, default_value = "route-plan.json")]
    plan: PathBuf,

    /// Yield table to use instead of the one named in the plan
    #[arg(long)]
    table: Option<PathBuf>,

    /// Journal destination instead of the plan's output; `.json` writes JSON
    #[arg(long)]
    output: Option<PathBuf>,

    /// Fail when any route line had to be skipped
    #[arg(long)]
    strict: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JournalFormat {
    Text,
    Json,
}

impl JournalFormat {
    fn for_path(path: Option<&Path>) -> Self {
        match path.and_then(Path::extension).and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    announce_banner();

    let start_time = Instant::now();
    let outcome = run(&args)?;

    reports::generate_console_report(&mut stderr().lock(), &outcome, start_time.elapsed())?;

    if args.strict && !outcome.diagnostics.is_empty() {
        eprintln!(
            "❌ {} route lines skipped in strict mode",
            outcome.diagnostics.len()
        );
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn announce_banner() {
    eprintln!("{}", "🧮 EV Route Simulator".bright_cyan().bold());
    eprintln!("{}", "=====================".cyan());
}

fn run(args: &Args) -> Result<PlanOutcome> {
    let plan_text = std::fs::read_to_string(&args.plan)
        .with_context(|| format!("failed to read plan {}", args.plan.display()))?;
    let mut plan = RoutePlan::from_json(&plan_text)
        .with_context(|| format!("failed to parse plan {}", args.plan.display()))?;
    let base_dir = plan_dir(&args.plan);

    if let Some(table) = &args.table {
        let table = std::path::absolute(table)
            .with_context(|| format!("failed to resolve {}", table.display()))?;
        plan.yield_table = table.to_string_lossy().into_owned();
    }

    let engine = RouteEngine::new(FsLoader::new(&base_dir));
    let outcome = engine.run_plan(&plan)?;

    let output_path =
        resolve_output_path(args.output.as_deref(), plan.output.as_deref(), &base_dir);
    let mut output_target = OutputTarget::new(output_path.clone())?;
    match JournalFormat::for_path(output_path.as_deref()) {
        JournalFormat::Json => write_journal_json(&mut output_target, &outcome.journals)?,
        JournalFormat::Text => write_journal(&mut output_target, &outcome.journals)?,
    }
    output_target.flush_inner()?;
    if let Some(path) = &output_path {
        log::info!("journal written to {}", path.display());
    }
    Ok(outcome)
}

fn plan_dir(plan: &Path) -> PathBuf {
    match plan.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn resolve_output_path(
    cli_output: Option<&Path>,
    plan_output: Option<&str>,
    base_dir: &Path,
) -> Option<PathBuf> {
    cli_output
        .map(Path::to_path_buf)
        .or_else(|| plan_output.map(|output| base_dir.join(output)))
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
