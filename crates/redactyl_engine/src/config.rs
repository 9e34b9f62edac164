//! Scan options and project configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use redactyl_core::budget::ArtifactLimits;
use redactyl_core::error::ScanError;
use redactyl_core::finding::Severity;

/// Default filename for redactyl project configuration.
pub const CONFIG_FILENAME: &str = ".redactyl.toml";

/// Default per-file size cap in bytes.
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// What a scan enumerates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanMode {
    /// Recursive walk of the working tree (the default).
    WorkingTree,
    /// Files staged in the git index.
    Staged,
    /// The last `n` commits, each changed file at its commit state.
    History(usize),
    /// Added-line content of the diff against a base ref.
    BaseDiff(String),
}

/// Everything the coordinator needs to run one scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Repository root to scan.
    pub root: PathBuf,
    /// Enumeration mode.
    pub mode: ScanMode,
    /// Comma-separated include globs; empty means everything.
    pub include: String,
    /// Comma-separated exclude globs.
    pub exclude: String,
    /// Whether the built-in default-exclude lists apply.
    pub default_excludes: bool,
    /// Per-file size cap; larger files are skipped.
    pub max_bytes: u64,
    /// Whether the incremental content-hash cache is consulted and updated.
    pub use_cache: bool,
    /// Whether artifact deep-scanning runs after the file modes.
    pub scan_artifacts: bool,
    /// Remote image references to scan via the registry decoder.
    pub images: Vec<String>,
    /// Artifact resource limits, including the optional global deadline.
    pub limits: ArtifactLimits,
    /// Minimum confidence; findings below are dropped.
    pub min_confidence: f64,
    /// Comma-separated detector allowlist; empty means all.
    pub enable_detectors: String,
    /// Comma-separated detector denylist.
    pub disable_detectors: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            mode: ScanMode::WorkingTree,
            include: String::new(),
            exclude: String::new(),
            default_excludes: true,
            max_bytes: DEFAULT_MAX_BYTES,
            use_cache: true,
            scan_artifacts: false,
            images: Vec::new(),
            limits: ArtifactLimits::default(),
            min_confidence: 0.0,
            enable_detectors: String::new(),
            disable_detectors: String::new(),
        }
    }
}

impl ScanOptions {
    /// Options rooted at `root` with everything else defaulted.
    #[must_use]
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Overlays values from a project configuration file. Explicitly set
    /// options win; the file only fills the gaps, so callers apply CLI
    /// flags after this.
    pub fn apply_project_config(&mut self, config: &ProjectConfig) {
        if let Some(include) = &config.include {
            self.include = include.clone();
        }
        if let Some(exclude) = &config.exclude {
            self.exclude = exclude.clone();
        }
        if let Some(default_excludes) = config.default_excludes {
            self.default_excludes = default_excludes;
        }
        if let Some(max_bytes) = config.max_bytes {
            self.max_bytes = max_bytes;
        }
        if let Some(cache) = config.cache {
            self.use_cache = cache;
        }
        if let Some(artifacts) = config.artifacts {
            self.scan_artifacts = artifacts;
        }
        if let Some(min_confidence) = config.min_confidence {
            self.min_confidence = min_confidence;
        }
        if let Some(enable) = &config.enable_detectors {
            self.enable_detectors = enable.clone();
        }
        if let Some(disable) = &config.disable_detectors {
            self.disable_detectors = disable.clone();
        }
        if let Some(bytes) = config.max_artifact_bytes {
            self.limits.max_bytes_per_artifact = bytes;
        }
        if let Some(entries) = config.max_artifact_entries {
            self.limits.max_entries = entries;
        }
        if let Some(depth) = config.max_artifact_depth {
            self.limits.max_depth = depth;
        }
        if let Some(ms) = config.artifact_time_budget_ms {
            self.limits.per_artifact_time = Duration::from_millis(ms);
        }
        if let Some(workers) = config.threads {
            self.limits.workers = Some(workers);
        }
    }
}

/// Project-level configuration loaded from `.redactyl.toml`.
///
/// All fields are optional; a missing file yields the defaults, a malformed
/// file is an operational error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Comma-separated include globs.
    #[serde(default)]
    pub include: Option<String>,

    /// Comma-separated exclude globs.
    #[serde(default)]
    pub exclude: Option<String>,

    /// Whether the default-exclude lists apply.
    #[serde(default)]
    pub default_excludes: Option<bool>,

    /// Per-file size cap in bytes.
    #[serde(default)]
    pub max_bytes: Option<u64>,

    /// Minimum confidence for reported findings.
    #[serde(default)]
    pub min_confidence: Option<f64>,

    /// Comma-separated detector allowlist.
    #[serde(default)]
    pub enable_detectors: Option<String>,

    /// Comma-separated detector denylist.
    #[serde(default)]
    pub disable_detectors: Option<String>,

    /// Severity threshold for the fail gate.
    #[serde(default)]
    pub fail_threshold: Option<Severity>,

    /// Baseline file path, relative to the root.
    #[serde(default)]
    pub baseline_path: Option<String>,

    /// Whether the content-hash cache is enabled.
    #[serde(default)]
    pub cache: Option<bool>,

    /// Whether artifact deep-scanning is enabled.
    #[serde(default)]
    pub artifacts: Option<bool>,

    /// Worker thread count.
    #[serde(default)]
    pub threads: Option<usize>,

    /// Per-artifact decompressed-bytes cap.
    #[serde(default)]
    pub max_artifact_bytes: Option<u64>,

    /// Per-artifact entry cap.
    #[serde(default)]
    pub max_artifact_entries: Option<u64>,

    /// Artifact nesting depth cap.
    #[serde(default)]
    pub max_artifact_depth: Option<u32>,

    /// Per-artifact wall-time budget in milliseconds.
    #[serde(default)]
    pub artifact_time_budget_ms: Option<u64>,
}

impl ProjectConfig {
    /// Loads configuration from a `.redactyl.toml` file.
    ///
    /// A missing file yields the defaults; a malformed one is a
    /// [`ScanError::Config`].
    pub fn load(path: &Path) -> Result<Self, ScanError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ScanError::io(path, e))?;
        toml::from_str(&content).map_err(|e| ScanError::Config {
            message: format!("cannot parse '{}': {e}", path.display()),
        })
    }

    /// Loads `<root>/.redactyl.toml`.
    pub fn load_from_root(root: &Path) -> Result<Self, ScanError> {
        Self::load(&root.join(CONFIG_FILENAME))
    }
}
