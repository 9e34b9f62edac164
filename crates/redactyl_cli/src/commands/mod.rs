//! Command implementations and the option plumbing they share.

pub mod baseline;
pub mod detectors;
pub mod scan;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context as _;

use redactyl_backend::{BinaryManager, GitleaksBackend};
use redactyl_core::scanner::Scanner;
use redactyl_engine::{ProjectConfig, ScanMode, ScanOptions};
use redactyl_rules::RulesBackend;

use crate::{Engine, ScanFlags};

/// Command outcome: the process exit code.
pub type Result = anyhow::Result<i32>;

/// Loads the project configuration named by `--config` or found at the root.
pub(crate) fn load_project_config(flags: &ScanFlags) -> anyhow::Result<ProjectConfig> {
    let config = match &flags.config {
        Some(path) => ProjectConfig::load(path),
        None => ProjectConfig::load_from_root(&flags.root),
    };
    config.context("loading project configuration")
}

/// Builds scan options from the project config overlaid with CLI flags.
pub(crate) fn build_options(flags: &ScanFlags, mode: ScanMode, project: &ProjectConfig) -> ScanOptions {
    let mut options = ScanOptions::for_root(&flags.root);
    options.mode = mode;
    options.apply_project_config(project);

    if let Some(include) = &flags.include {
        options.include = include.clone();
    }
    if let Some(exclude) = &flags.exclude {
        options.exclude = exclude.clone();
    }
    if flags.no_default_excludes {
        options.default_excludes = false;
    }
    if let Some(max_bytes) = flags.max_bytes {
        options.max_bytes = max_bytes;
    }
    if flags.no_cache {
        options.use_cache = false;
    }
    if flags.artifacts {
        options.scan_artifacts = true;
    }
    if !flags.images.is_empty() {
        options.images = flags.images.clone();
    }
    if let Some(min_confidence) = flags.min_confidence {
        options.min_confidence = min_confidence;
    }
    if let Some(enable) = &flags.enable_detectors {
        options.enable_detectors = enable.clone();
    }
    if let Some(disable) = &flags.disable_detectors {
        options.disable_detectors = disable.clone();
    }
    if let Some(threads) = flags.threads {
        options.limits.workers = Some(threads);
    }
    if let Some(bytes) = flags.max_artifact_bytes {
        options.limits.max_bytes_per_artifact = bytes;
    }
    if let Some(entries) = flags.max_artifact_entries {
        options.limits.max_entries = entries;
    }
    if let Some(depth) = flags.max_artifact_depth {
        options.limits.max_depth = depth;
    }
    if let Some(ms) = flags.artifact_time_ms {
        options.limits.per_artifact_time = Duration::from_millis(ms);
    }
    if let Some(ms) = flags.global_deadline_ms {
        options.limits.global_deadline = Some(Instant::now() + Duration::from_millis(ms));
    }

    options
}

/// Constructs the configured detection backend.
pub(crate) fn build_backend(flags: &ScanFlags, root: &Path) -> anyhow::Result<Arc<dyn Scanner>> {
    match flags.engine {
        Engine::Builtin => {
            let backend = RulesBackend::builtin().context("compiling builtin rules")?;
            Ok(Arc::new(backend))
        }
        Engine::Gitleaks => {
            let manager = BinaryManager::new()
                .with_explicit_path(flags.scanner_path.clone())
                .with_version(flags.scanner_version.clone())
                .with_auto_download(flags.download_scanner);

            let binary = manager.resolve()?;
            if flags.scanner_version.is_some() {
                manager.verify_version(&binary)?;
            }

            let config = flags
                .gitleaks_config
                .clone()
                .or_else(|| GitleaksBackend::auto_config(root));

            Ok(Arc::new(GitleaksBackend::new(binary).with_config(config)))
        }
    }
}
