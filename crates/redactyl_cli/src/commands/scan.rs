//! Scan command - runs the pipeline and applies the fail gate.

use std::fs::File;
use std::io::Write;
use std::sync::Arc;

use anyhow::Context as _;

use redactyl_core::baseline::{Baseline, should_fail};
use redactyl_core::finding::Severity;
use redactyl_core::git::GitProvider;
use redactyl_engine::{Coordinator, ScanMode, count_targets};

use crate::git::CliGitProvider;
use crate::ui::{create_scan_progress, exit};
use crate::{OutputFormat, ScanArgs, commands, output};

/// Executes `redactyl scan`, returning the process exit code.
pub fn run(args: &ScanArgs) -> commands::Result {
    let flags = &args.flags;
    let project = commands::load_project_config(flags)?;
    let options = commands::build_options(flags, scan_mode(args), &project);
    let backend = commands::build_backend(flags, &options.root)?;

    let provider = CliGitProvider::new();
    let git = CliGitProvider::available(&options.root).then_some(&provider as &dyn GitProvider);

    let show_progress = matches!(args.format, OutputFormat::Text) && args.output.is_none() && !args.quiet;
    let bar = show_progress.then(|| create_scan_progress(count_targets(&options) as u64));

    let mut coordinator = Coordinator::new(backend, options.clone());
    if let Some(bar) = &bar {
        let bar = bar.clone();
        coordinator = coordinator.with_progress(Arc::new(move || bar.inc(1)));
    }

    let mut result = coordinator.run(git)?;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let baseline_path = args
        .baseline
        .clone()
        .or_else(|| project.baseline_path.as_ref().map(|p| options.root.join(p)));
    if let Some(path) = baseline_path {
        let baseline = Baseline::load(&path);
        result.findings = baseline.filter_new(result.findings);
    }

    write_output(args, &result)?;

    let threshold = args.fail_on.or(project.fail_threshold).unwrap_or(Severity::Medium);
    let failed = should_fail(&result.findings, threshold);

    if args.exit_zero || !failed {
        Ok(exit::SUCCESS)
    } else {
        Ok(exit::FINDINGS)
    }
}

fn scan_mode(args: &ScanArgs) -> ScanMode {
    if args.staged {
        ScanMode::Staged
    } else if let Some(n) = args.history {
        ScanMode::History(n)
    } else if let Some(base) = &args.base {
        ScanMode::BaseDiff(base.clone())
    } else {
        ScanMode::WorkingTree
    }
}

fn write_output(args: &ScanArgs, result: &redactyl_engine::ScanResult) -> anyhow::Result<()> {
    match &args.output {
        Some(path) => {
            let mut file = File::create(path).with_context(|| format!("creating '{}'", path.display()))?;
            output::write_result(result, args.format, &mut file)?;
            file.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            output::write_result(result, args.format, &mut lock)?;
        }
    }
    Ok(())
}
