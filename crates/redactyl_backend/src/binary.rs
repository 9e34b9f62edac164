//! Gitleaks binary lifecycle.
//!
//! Resolution order: an explicit path, then `$PATH`, then the cached copy
//! under `~/.redactyl/bin/`. When nothing is found and auto-download is
//! enabled, the requested (or latest) release for the current OS and
//! architecture is fetched from the Gitleaks release site, extracted, and
//! marked executable.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use serde::Deserialize;

use redactyl_core::error::ScanError;

/// Name of the scanner binary on `$PATH`.
const BINARY_NAME: &str = "gitleaks";

/// Directory under the user's home where downloaded binaries live.
const CACHE_DIR: &str = ".redactyl/bin";

const RELEASE_API: &str = "https://api.github.com/repos/gitleaks/gitleaks/releases/latest";
const RELEASE_DOWNLOAD: &str = "https://github.com/gitleaks/gitleaks/releases/download";
const USER_AGENT: &str = concat!("redactyl/", env!("CARGO_PKG_VERSION"));
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// Locates or installs the scanner binary.
#[derive(Debug, Clone, Default)]
pub struct BinaryManager {
    explicit: Option<PathBuf>,
    wanted_version: Option<String>,
    auto_download: bool,
}

#[derive(Debug, Deserialize)]
struct LatestRelease {
    tag_name: String,
}

impl BinaryManager {
    /// Manager with default resolution and auto-download disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Honours an explicit binary path before any search.
    #[must_use]
    pub fn with_explicit_path(mut self, path: Option<PathBuf>) -> Self {
        self.explicit = path;
        self
    }

    /// Pins the release version for download and verification.
    #[must_use]
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.wanted_version = version;
        self
    }

    /// Enables fetching a release when no binary is found.
    #[must_use]
    pub fn with_auto_download(mut self, enabled: bool) -> Self {
        self.auto_download = enabled;
        self
    }

    /// Resolves the binary, downloading it as a last resort when enabled.
    pub fn resolve(&self) -> Result<PathBuf, ScanError> {
        if let Some(explicit) = &self.explicit {
            if explicit.is_file() {
                return Ok(explicit.clone());
            }
            return Err(ScanError::BinaryNotFound {
                hint: format!("'{}' does not exist", explicit.display()),
            });
        }

        if let Ok(found) = which::which(BINARY_NAME) {
            return Ok(found);
        }

        let cached = cached_binary_path();
        if let Some(cached) = &cached
            && cached.is_file()
        {
            return Ok(cached.clone());
        }

        if self.auto_download {
            return self.download();
        }

        Err(ScanError::BinaryNotFound {
            hint: "install gitleaks (https://github.com/gitleaks/gitleaks), pass --scanner-path, \
                   or rerun with --download-scanner"
                .to_string(),
        })
    }

    /// Checks the binary's reported version against the pinned one, if any.
    pub fn verify_version(&self, binary: &Path) -> Result<String, ScanError> {
        let output = Command::new(binary)
            .arg("version")
            .output()
            .map_err(|e| ScanError::io(binary, e))?;
        let found = String::from_utf8_lossy(&output.stdout).trim().to_string();

        if let Some(wanted) = &self.wanted_version
            && !found.contains(wanted.trim_start_matches('v'))
        {
            return Err(ScanError::BinaryVersionMismatch {
                wanted: wanted.clone(),
                found,
            });
        }

        Ok(found)
    }

    fn download(&self) -> Result<PathBuf, ScanError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| network(format!("cannot build HTTP client: {e}")))?;

        let version = match &self.wanted_version {
            Some(version) => version.trim_start_matches('v').to_string(),
            None => latest_version(&client)?,
        };

        let asset = release_asset(&version);
        let url = format!("{RELEASE_DOWNLOAD}/v{version}/{asset}");

        #[cfg(feature = "tracing")]
        tracing::info!(version, url, "downloading scanner binary");

        let response = client
            .get(&url)
            .send()
            .map_err(|e| network(format!("download failed: {e}")))?
            .error_for_status()
            .map_err(|e| network(format!("download failed: {e}")))?;

        let archive = response
            .bytes()
            .map_err(|e| network(format!("download interrupted: {e}")))?;

        let target = cached_binary_path().ok_or_else(|| ScanError::BinaryNotFound {
            hint: "cannot determine a home directory for the binary cache".to_string(),
        })?;
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ScanError::io(parent, e))?;
        }

        extract_binary(&archive, &asset, &target)?;
        mark_executable(&target)?;

        Ok(target)
    }
}

fn latest_version(client: &reqwest::blocking::Client) -> Result<String, ScanError> {
    let release: LatestRelease = client
        .get(RELEASE_API)
        .send()
        .map_err(|e| network(format!("cannot query latest release: {e}")))?
        .error_for_status()
        .map_err(|e| network(format!("cannot query latest release: {e}")))?
        .json()
        .map_err(|e| network(format!("invalid release metadata: {e}")))?;

    Ok(release.tag_name.trim_start_matches('v').to_string())
}

/// Release asset name for the current OS and architecture.
fn release_asset(version: &str) -> String {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        other => other,
    };

    if os == "windows" {
        format!("gitleaks_{version}_{os}_{arch}.zip")
    } else {
        format!("gitleaks_{version}_{os}_{arch}.tar.gz")
    }
}

/// Pulls the `gitleaks` member out of a release archive.
fn extract_binary(archive: &[u8], asset: &str, target: &Path) -> Result<(), ScanError> {
    if asset.ends_with(".zip") {
        return extract_from_zip(archive, target);
    }
    extract_from_tar_gz(archive, target)
}

fn extract_from_tar_gz(archive: &[u8], target: &Path) -> Result<(), ScanError> {
    let decoder = flate2::read::GzDecoder::new(archive);
    let mut tarball = tar::Archive::new(decoder);

    let entries = tarball
        .entries()
        .map_err(|e| ScanError::decode("release archive", e.to_string()))?;

    for entry in entries {
        let Ok(mut entry) = entry else { break };
        let is_binary = entry
            .path()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .is_some_and(|stem| stem == BINARY_NAME);
        if !is_binary {
            continue;
        }

        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| ScanError::decode("release archive", e.to_string()))?;
        std::fs::write(target, bytes).map_err(|e| ScanError::io(target, e))?;
        return Ok(());
    }

    Err(ScanError::decode("release archive", "no gitleaks binary inside"))
}

fn extract_from_zip(archive: &[u8], target: &Path) -> Result<(), ScanError> {
    let mut zip_archive = zip::ZipArchive::new(std::io::Cursor::new(archive))
        .map_err(|e| ScanError::decode("release archive", e.to_string()))?;

    for index in 0..zip_archive.len() {
        let Ok(mut file) = zip_archive.by_index(index) else {
            continue;
        };
        let name = file.name().to_string();
        let stem = name.rsplit('/').next().unwrap_or(&name);
        if !stem.starts_with(BINARY_NAME) {
            continue;
        }

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| ScanError::decode("release archive", e.to_string()))?;
        std::fs::write(target, bytes).map_err(|e| ScanError::io(target, e))?;
        return Ok(());
    }

    Err(ScanError::decode("release archive", "no gitleaks binary inside"))
}

/// Location of the cached binary under the user's home, `None` when no home
/// directory can be determined.
#[must_use]
pub fn cached_binary_path() -> Option<PathBuf> {
    let name = if cfg!(windows) {
        format!("{BINARY_NAME}.exe")
    } else {
        BINARY_NAME.to_string()
    };
    Some(dirs::home_dir()?.join(CACHE_DIR).join(name))
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<(), ScanError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(|e| ScanError::io(path, e))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<(), ScanError> {
    Ok(())
}

fn network(message: String) -> ScanError {
    ScanError::Network { message }
}
