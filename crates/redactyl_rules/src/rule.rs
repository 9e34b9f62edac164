//! Rule definition and compiled-rule types.

use regex::Regex;
use thiserror::Error;

/// Errors that can occur when compiling a detector rule.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The rule's regular expression failed to compile.
    #[error("invalid regex in rule '{id}': {source}")]
    InvalidRegex {
        /// Identifier of the rule that failed (e.g. `"github-pat"`).
        id: String,
        /// The underlying regex compilation error.
        #[source]
        source: regex::Error,
    },
}

/// A static detector definition.
///
/// Ids live in the shared detector namespace also used by the external
/// backend, so enable/disable lists apply to either engine unchanged.
#[derive(Debug, Clone, Copy)]
pub struct RuleDef {
    /// Stable identifier (e.g. `"github-pat"`).
    pub id: &'static str,
    /// Short description carried into finding context.
    pub description: &'static str,
    /// The regular expression matching the secret. When it contains a
    /// capture group, group 1 is reported as the secret value; otherwise the
    /// whole match is.
    pub regex: &'static str,
    /// Case-insensitive keywords for pre-filtering. A rule with keywords is
    /// only run against content that contains at least one of them.
    pub keywords: &'static [&'static str],
    /// Whether the token format alone is near-certain evidence; such rules
    /// report fixed high confidence instead of entropy-derived confidence.
    pub high_signal: bool,
}

/// A rule whose regex has been compiled.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Stable identifier.
    pub id: &'static str,
    /// Short description carried into finding context.
    pub description: &'static str,
    /// Compiled matcher.
    pub regex: Regex,
    /// Pre-filter keywords.
    pub keywords: &'static [&'static str],
    /// Fixed-high-confidence flag.
    pub high_signal: bool,
}

impl Rule {
    /// Compiles a definition, failing on an invalid regex.
    pub fn compile(def: &RuleDef) -> Result<Self, RuleError> {
        let regex = Regex::new(def.regex).map_err(|source| RuleError::InvalidRegex {
            id: def.id.to_string(),
            source,
        })?;

        Ok(Self {
            id: def.id,
            description: def.description,
            regex,
            keywords: def.keywords,
            high_signal: def.high_signal,
        })
    }
}
