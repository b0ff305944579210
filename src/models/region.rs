//! Region table: an ordered list of `{name, regex, icon}` rules used by the
//! Selector/Dispatcher to decide whether a destination's geography matches a
//! configured "preferred region" for an endpoint pool.
//!
//! Per spec §9 (Open Questions): overlapping patterns are resolved by
//! stable ordering — first match wins per endpoint. Multi-match behaviour
//! beyond "first wins" is intentionally left unspecified upstream; we do not
//! invent additional tie-breaking.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};

/// One entry in the region table. `pattern` is matched against an
/// endpoint's name and/or a country string (e.g. `"CN"`, `"China"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionRule {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub icon: String,
}

impl RegionRule {
    #[must_use]
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            icon: String::new(),
        }
    }

    fn compiled(&self) -> Result<Regex> {
        Regex::new(&format!("(?i){}", self.pattern))
            .map_err(|e| SchedulerError::invalid_endpoint_config(format!("bad region regex '{}': {e}", self.pattern)))
    }
}

/// Compiled, ordered region table. Built once from configuration and reused
/// for every match so regex compilation cost is paid a single time.
#[derive(Debug, Clone)]
pub struct RegionTable {
    entries: Vec<(RegionRule, Regex)>,
}

impl RegionTable {
    /// Compile an ordered rule list. Rules with an invalid pattern are
    /// rejected at load time per spec §7 (Input error) — the table as a
    /// whole fails to build rather than silently skipping a bad rule, since
    /// a partially-built region table could change "first match wins"
    /// semantics in confusing ways.
    pub fn compile(rules: Vec<RegionRule>) -> Result<Self> {
        let mut entries = Vec::with_capacity(rules.len());
        for rule in rules {
            let re = rule.compiled()?;
            entries.push((rule, re));
        }
        Ok(Self { entries })
    }

    #[must_use]
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// First rule whose pattern matches `haystack` (endpoint name or
    /// country string), in table order.
    #[must_use]
    pub fn first_match(&self, haystack: &str) -> Option<&RegionRule> {
        self.entries
            .iter()
            .find(|(_, re)| re.is_match(haystack))
            .map(|(rule, _)| rule)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
