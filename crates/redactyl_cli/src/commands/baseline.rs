//! Baseline command - scans and records the accepted findings.

use redactyl_core::baseline::Baseline;
use redactyl_engine::{Coordinator, ScanMode};

use crate::ui::{colors, exit};
use crate::{BaselineArgs, commands};

/// Executes `redactyl baseline`, writing the canonical keys of every
/// current finding so later scans only report what is new.
pub fn run(args: &BaselineArgs) -> commands::Result {
    let flags = &args.flags;
    let project = commands::load_project_config(flags)?;

    let mut options = commands::build_options(flags, ScanMode::WorkingTree, &project);
    // The baseline must cover everything, so the skip-cache never applies.
    options.use_cache = false;

    let backend = commands::build_backend(flags, &options.root)?;
    let result = Coordinator::new(backend, options).run(None)?;

    Baseline::save(&args.output, &result.findings)?;

    if !args.quiet {
        println!(
            "{} baseline written to {} ({} finding(s) accepted)",
            colors::success().apply_to("✓"),
            colors::accent().apply_to(args.output.display().to_string()),
            result.findings.len(),
        );
    }

    Ok(exit::SUCCESS)
}
