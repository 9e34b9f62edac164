use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Classification of a backend subprocess failure, derived from its
/// standard-error output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// The backend rejected its configuration file.
    Config,
    /// The backend was denied access to the scan workspace.
    Permission,
    /// The backend reported invalid arguments or input syntax.
    InvalidSyntax,
    /// Any other non-zero exit.
    Other,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Config => "config",
            Self::Permission => "permission",
            Self::InvalidSyntax => "invalid syntax",
            Self::Other => "backend",
        };
        write!(f, "{s}")
    }
}

/// Top-level error type for the redactyl scan pipeline.
///
/// Per-file and per-batch failures are contained by the coordinator; the
/// variants here are what escapes to callers. The process exit-code contract
/// maps any of these to operational failure (exit 2), as opposed to the
/// findings-driven fail gate (exit 1).
#[derive(Debug, Error)]
pub enum ScanError {
    /// The detector backend binary could not be located.
    #[error("scanner binary not found: {hint}")]
    BinaryNotFound {
        /// Installation guidance shown to the user.
        hint: String,
    },

    /// The resolved backend binary reported an unusable version.
    #[error("scanner binary version mismatch: wanted {wanted}, found {found}")]
    BinaryVersionMismatch {
        /// Version the caller requested.
        wanted: String,
        /// Version the resolved binary reported.
        found: String,
    },

    /// A configuration file was malformed or self-contradictory.
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable description of the problem.
        message: String,
    },

    /// Reading or writing a file failed.
    #[error("i/o error on '{path}': {source}")]
    Io {
        /// Path of the file involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The backend subprocess exited non-zero.
    #[error("scanner failed ({kind}): {stderr}")]
    BackendExec {
        /// Classification derived from the stderr content.
        kind: BackendErrorKind,
        /// Captured standard-error output, trimmed.
        stderr: String,
    },

    /// The backend produced a report that is not valid JSON.
    #[error("cannot parse scanner report (backend {backend_version}): {source}")]
    ReportParse {
        /// Version string of the backend that wrote the report.
        backend_version: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// An artifact could not be decoded as the detected format.
    #[error("cannot decode artifact '{path}': {message}")]
    Decode {
        /// Virtual path of the artifact that failed.
        path: String,
        /// Format-specific description of the failure.
        message: String,
    },

    /// A network operation against a remote registry failed.
    #[error("network error: {message}")]
    Network {
        /// Description of the failed request.
        message: String,
    },
}

impl ScanError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Builds a decode error for the given virtual path.
    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_kind_displays_lowercase() {
        assert_eq!(format!("{}", BackendErrorKind::Config), "config");
        assert_eq!(format!("{}", BackendErrorKind::Permission), "permission");
    }

    #[test]
    fn io_error_message_includes_path() {
        let err = ScanError::io("a/b.txt", std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let msg = err.to_string();
        assert!(msg.contains("a/b.txt"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn backend_exec_message_includes_kind_and_stderr() {
        let err = ScanError::BackendExec {
            kind: BackendErrorKind::Permission,
            stderr: "denied".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("permission"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn binary_not_found_carries_hint() {
        let err = ScanError::BinaryNotFound {
            hint: "install gitleaks or pass --scanner-path".to_string(),
        };
        assert!(err.to_string().contains("--scanner-path"));
    }
}
