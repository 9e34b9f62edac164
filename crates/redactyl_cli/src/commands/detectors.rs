//! Detectors command - lists the active backend's detector ids.

use crate::ui::exit;
use crate::{DetectorsArgs, commands};

/// Executes `redactyl detectors`.
pub fn run(args: &DetectorsArgs) -> commands::Result {
    let backend = commands::build_backend(&args.flags, &args.flags.root)?;
    let mut ids = backend.detectors();
    ids.sort();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&ids)?);
    } else {
        for id in ids {
            println!("{id}");
        }
    }

    Ok(exit::SUCCESS)
}
