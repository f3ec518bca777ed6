//! Alias-driven biomarker pattern matching over extracted report text.
//!
//! Matching is substring-based, not word-bounded: short aliases can match
//! inside longer tokens. That is the documented trade-off for surviving
//! the mangled spacing of heuristic extraction.

use std::collections::BTreeMap;

use regex::Regex;

use crate::config::ImportConfig;

// ---------------------------------------------------------------------------
// MatchPolicy
// ---------------------------------------------------------------------------

/// How repeated matches for the same canonical key are reconciled.
pub trait MatchPolicy: Send + Sync {
    fn record(&self, matches: &mut BTreeMap<String, f64>, key: &str, value: f64);
}

/// Later lines overwrite earlier ones. The default policy: simple, and it
/// can silently drop earlier analyte values in multi-entry panels.
pub struct LastMatchWins;

impl MatchPolicy for LastMatchWins {
    fn record(&self, matches: &mut BTreeMap<String, f64>, key: &str, value: f64) {
        matches.insert(key.to_string(), value);
    }
}

/// The first matched value for a key is kept; later lines are ignored.
pub struct FirstMatchWins;

impl MatchPolicy for FirstMatchWins {
    fn record(&self, matches: &mut BTreeMap<String, f64>, key: &str, value: f64) {
        matches.entry(key.to_string()).or_insert(value);
    }
}

// ---------------------------------------------------------------------------
// BiomarkerMatcher
// ---------------------------------------------------------------------------

/// Scans plaintext for alias substrings and reads the numeric value that
/// is immediately followed by a recognized unit token on the same line.
///
/// The unit validates the number's context only; it is not retained in
/// the output map. Callers re-supply the unit when building a reading.
pub struct BiomarkerMatcher<'a> {
    config: &'a ImportConfig,
    value_with_unit: Regex,
    policy: Box<dyn MatchPolicy>,
}

impl<'a> BiomarkerMatcher<'a> {
    pub fn new(config: &'a ImportConfig) -> Self {
        Self::with_policy(config, Box::new(LastMatchWins))
    }

    pub fn with_policy(config: &'a ImportConfig, policy: Box<dyn MatchPolicy>) -> Self {
        Self {
            config,
            value_with_unit: compile_value_regex(&config.units),
            policy,
        }
    }

    /// Scan text line by line; returns canonical key -> value. Empty map
    /// when nothing matched.
    pub fn scan(&self, text: &str) -> BTreeMap<String, f64> {
        let mut matches = BTreeMap::new();

        for line in text.lines() {
            let lower = line.to_lowercase();
            for alias in &self.config.aliases {
                let hit = alias
                    .patterns
                    .iter()
                    .find_map(|p| lower.find(&p.to_lowercase()));
                let Some(position) = hit else {
                    continue;
                };
                // Read the first number+unit at or after the alias, so a
                // panel whose entries share one line still resolves each
                // alias to its own value.
                if let Some(value) = self.value_after(&lower, position) {
                    self.policy.record(&mut matches, &alias.key, value);
                }
            }
        }

        tracing::debug!(matched = matches.len(), "Pattern scan complete");
        matches
    }

    /// First numeric token at or after `from` that a recognized unit
    /// follows.
    fn value_after(&self, line: &str, from: usize) -> Option<f64> {
        self.value_with_unit
            .captures(&line[from..])
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
    }
}

/// Number immediately followed (modulo whitespace) by one of the
/// configured unit tokens, longest token first so "ng/dL" wins over "ng".
fn compile_value_regex(units: &[String]) -> Regex {
    let mut sorted: Vec<&String> = units.iter().collect();
    sorted.sort_by_key(|u| std::cmp::Reverse(u.len()));
    let alternation = sorted
        .iter()
        .map(|u| regex::escape(u))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"(?i)(\d+(?:\.\d+)?)\s*(?:{alternation})");
    Regex::new(&pattern).expect("unit alternation regex must compile")
}
