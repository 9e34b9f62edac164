//! Builtin in-process detector rules.
//!
//! This crate is the legacy, self-contained counterpart to the Gitleaks
//! subprocess backend: a static registry of regex rules with Aho-Corasick
//! keyword pre-filtering, exposed through the same
//! [`redactyl_core::Scanner`] interface and the same detector-id namespace.
//! Exactly one backend runs per scan, so these rules and the external
//! scanner never double-report.
//!
//! # Main Types
//!
//! - [`RuleRegistry`] - All compiled rules with the keyword pre-filter index
//! - [`RulesBackend`] - `Scanner` implementation over a registry
//! - [`RuleDef`] / [`Rule`] - A single detector definition / compiled form

/// The `Scanner` implementation over the rule registry.
pub mod backend;
/// Static definitions of the builtin detector rules.
pub mod builtin;
pub(crate) mod entropy;
/// The registry holding compiled rules and the keyword index.
pub mod registry;
/// Rule definition and compiled-rule types.
pub mod rule;
pub(crate) mod text;

pub use backend::RulesBackend;
pub use builtin::builtin_rules;
pub use registry::RuleRegistry;
pub use rule::{Rule, RuleDef, RuleError};

/// Marker that suppresses findings on the line that carries it.
pub const IGNORE_MARKER: &str = "redactyl:ignore";
