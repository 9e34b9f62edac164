//! Rule registry with keyword pre-filtering.

use std::collections::HashMap;
use std::fmt;

use aho_corasick::AhoCorasick;

use redactyl_core::filter::DetectorFilter;

use crate::builtin::builtin_rules;
use crate::rule::{Rule, RuleError};

/// Indexed collection of compiled rules.
///
/// The registry builds one case-insensitive Aho-Corasick automaton over all
/// rule keywords at construction time, so a scan can cheaply determine which
/// rules could possibly match a piece of content before running any regex.
/// The registry is immutable after construction; per-scan allow/deny subsets
/// are produced with [`RuleRegistry::select`].
pub struct RuleRegistry {
    rules: Vec<Rule>,
    keyword_automaton: Option<AhoCorasick>,
    keyword_to_rules: Vec<Vec<usize>>,
    rules_without_keywords: Vec<usize>,
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.rules.len())
            .field("rules_without_keywords", &self.rules_without_keywords.len())
            .finish_non_exhaustive()
    }
}

impl RuleRegistry {
    /// Creates a registry containing all builtin rules.
    pub fn builtin() -> Result<Self, RuleError> {
        let rules = builtin_rules().iter().map(Rule::compile).collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules))
    }

    /// Creates a registry from compiled rules, building the keyword index.
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        let mut keywords: Vec<String> = Vec::new();
        let mut keyword_to_rules: Vec<Vec<usize>> = Vec::new();
        let mut rules_without_keywords = Vec::new();
        let mut keyword_positions: HashMap<&'static str, usize> = HashMap::new();

        for (rule_idx, rule) in rules.iter().enumerate() {
            if rule.keywords.is_empty() {
                rules_without_keywords.push(rule_idx);
                continue;
            }

            for &keyword in rule.keywords {
                if let Some(&existing) = keyword_positions.get(keyword) {
                    keyword_to_rules[existing].push(rule_idx);
                } else {
                    keyword_positions.insert(keyword, keywords.len());
                    keywords.push(keyword.to_string());
                    keyword_to_rules.push(vec![rule_idx]);
                }
            }
        }

        let keyword_automaton = build_automaton(&keywords);

        Self {
            rules,
            keyword_automaton,
            keyword_to_rules,
            rules_without_keywords,
        }
    }

    /// Returns a new registry retaining only the rules the filter permits.
    #[must_use]
    pub fn select(&self, filter: &DetectorFilter) -> Self {
        if filter.is_noop() {
            return Self::new(self.rules.clone());
        }
        let rules = self.rules.iter().filter(|r| filter.permits(r.id)).cloned().collect();
        Self::new(rules)
    }

    /// Marks which rules could match `content`, by keyword pre-filter.
    ///
    /// Rules without keywords are always marked.
    #[must_use]
    pub fn rules_to_run(&self, content: &str) -> Vec<bool> {
        let mut should_run = vec![false; self.rules.len()];

        for &idx in &self.rules_without_keywords {
            should_run[idx] = true;
        }

        if let Some(automaton) = &self.keyword_automaton {
            for mat in automaton.find_iter(content) {
                for &rule_idx in &self.keyword_to_rules[mat.pattern().as_usize()] {
                    should_run[rule_idx] = true;
                }
            }
        }

        should_run
    }

    /// Looks up a rule by its positional index.
    #[must_use]
    pub fn get_by_index(&self, idx: usize) -> Option<&Rule> {
        self.rules.get(idx)
    }

    /// Looks up a rule by its id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Returns all rules.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Returns the total number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the registry contains no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn build_automaton(keywords: &[String]) -> Option<AhoCorasick> {
    if keywords.is_empty() {
        return None;
    }

    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .match_kind(aho_corasick::MatchKind::LeftmostLongest)
        .build(keywords)
        .ok()
}
