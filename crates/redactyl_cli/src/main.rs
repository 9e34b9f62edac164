//! # Commands
//!
//! - `redactyl scan` - Scan a tree, the index, history, or a base diff
//! - `redactyl baseline` - Record current findings as accepted
//! - `redactyl detectors` - List the active backend's detector ids

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod commands;
mod git;
mod output;
mod ui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use redactyl_core::finding::Severity;

/// Output format for scan results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable terminal output.
    #[default]
    Text,
    /// The findings JSON array.
    Json,
    /// Extended JSON with schema version and artifact stats.
    JsonExtended,
    /// SARIF v2.1.0.
    Sarif,
}

/// Which detection backend runs the scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Engine {
    /// The external Gitleaks binary (the default).
    #[default]
    Gitleaks,
    /// The in-process builtin rule set.
    Builtin,
}

#[derive(Debug, Parser)]
#[command(name = "redactyl", version, about = ABOUT, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

const ABOUT: &str = "\
redactyl finds secrets in working trees, git objects, archives,
container images, Helm charts, and Kubernetes manifests.";

#[derive(Debug, Subcommand)]
enum Command {
    #[command(visible_alias = "s")]
    Scan(ScanArgs),

    #[command(visible_alias = "b")]
    Baseline(BaselineArgs),

    #[command(visible_alias = "d")]
    Detectors(DetectorsArgs),
}

/// Flags shared by every command that runs the scan pipeline.
#[derive(Debug, clap::Args)]
pub struct ScanFlags {
    /// Repository root to scan.
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Path to `.redactyl.toml` configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Comma-separated include globs; when set, only matches are scanned.
    #[arg(short, long)]
    pub include: Option<String>,

    /// Comma-separated exclude globs.
    #[arg(short = 'x', long)]
    pub exclude: Option<String>,

    /// Scan vendored directories, lock files, and other default excludes.
    #[arg(long)]
    pub no_default_excludes: bool,

    /// Skip files larger than this size in bytes.
    #[arg(long)]
    pub max_bytes: Option<u64>,

    /// Skip the incremental content-hash cache.
    #[arg(long)]
    pub no_cache: bool,

    /// Deep-scan archives, images, charts, and manifests.
    #[arg(short, long)]
    pub artifacts: bool,

    /// Remote image reference to scan (repeatable).
    #[arg(long = "image", value_name = "REF")]
    pub images: Vec<String>,

    /// Minimum confidence for reported findings (0.0 - 1.0).
    #[arg(long)]
    pub min_confidence: Option<f64>,

    /// Comma-separated detector allowlist.
    #[arg(long, value_name = "IDS")]
    pub enable_detectors: Option<String>,

    /// Comma-separated detector denylist.
    #[arg(long, value_name = "IDS")]
    pub disable_detectors: Option<String>,

    /// Detection backend.
    #[arg(long, value_enum, default_value_t)]
    pub engine: Engine,

    /// Explicit path to the scanner binary.
    #[arg(long, value_name = "PATH")]
    pub scanner_path: Option<PathBuf>,

    /// Required scanner release version.
    #[arg(long, value_name = "VERSION")]
    pub scanner_version: Option<String>,

    /// Download the scanner when it cannot be found.
    #[arg(long)]
    pub download_scanner: bool,

    /// Explicit Gitleaks config file (auto-detected otherwise).
    #[arg(long, value_name = "PATH")]
    pub gitleaks_config: Option<PathBuf>,

    /// Number of parallel scanning threads.
    #[arg(long)]
    pub threads: Option<usize>,

    /// Per-artifact decompressed-bytes cap.
    #[arg(long, value_name = "BYTES")]
    pub max_artifact_bytes: Option<u64>,

    /// Per-artifact entry cap.
    #[arg(long, value_name = "N")]
    pub max_artifact_entries: Option<u64>,

    /// Artifact nesting depth cap.
    #[arg(long, value_name = "N")]
    pub max_artifact_depth: Option<u32>,

    /// Per-artifact wall-time budget in milliseconds.
    #[arg(long, value_name = "MS")]
    pub artifact_time_ms: Option<u64>,

    /// Deadline for all artifact work, in milliseconds from start.
    #[arg(long, value_name = "MS")]
    pub global_deadline_ms: Option<u64>,
}

/// Arguments for `redactyl scan`.
#[derive(Debug, Parser)]
pub struct ScanArgs {
    /// Shared pipeline flags.
    #[command(flatten)]
    pub flags: ScanFlags,

    /// Scan only files staged in the git index.
    #[arg(long, conflicts_with_all = ["history", "base"])]
    pub staged: bool,

    /// Scan the last N commits.
    #[arg(long, value_name = "N", conflicts_with = "base")]
    pub history: Option<usize>,

    /// Scan only lines added relative to this base ref.
    #[arg(long, value_name = "REF")]
    pub base: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Baseline file for suppressing accepted findings.
    #[arg(short = 'b', long, value_name = "PATH")]
    pub baseline: Option<PathBuf>,

    /// Severity threshold for the failing exit code.
    #[arg(long, value_name = "SEVERITY")]
    pub fail_on: Option<Severity>,

    /// Always exit with code 0, even when the gate triggers.
    #[arg(long)]
    pub exit_zero: bool,

    /// Suppress the progress bar.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for `redactyl baseline`.
#[derive(Debug, Parser)]
pub struct BaselineArgs {
    /// Shared pipeline flags.
    #[command(flatten)]
    pub flags: ScanFlags,

    /// Output path for the baseline file.
    #[arg(short, long, default_value = ".redactyl-baseline.json")]
    pub output: PathBuf,

    /// Suppress the confirmation line.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for `redactyl detectors`.
#[derive(Debug, Parser)]
pub struct DetectorsArgs {
    /// Shared pipeline flags (engine and scanner selection apply here).
    #[command(flatten)]
    pub flags: ScanFlags,

    /// Output the detector ids as JSON.
    #[arg(long)]
    pub json: bool,
}

fn main() {
    #[cfg(feature = "tracing")]
    {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).without_time())
            .with(EnvFilter::from_default_env())
            .init();
    }

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            ui::print_error(&format!("{e:#}"));
            std::process::exit(ui::exit::ERROR);
        }
    }
}

fn run(command: Command) -> commands::Result {
    match command {
        Command::Scan(args) => commands::scan::run(&args),
        Command::Baseline(args) => commands::baseline::run(&args),
        Command::Detectors(args) => commands::detectors::run(&args),
    }
}
