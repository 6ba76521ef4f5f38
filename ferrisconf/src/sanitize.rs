//! Line sanitization for retrieved configurations.
//!
//! Two transforms, applied removal-first:
//!
//! - **removal**: every line matched anywhere by a pattern is deleted,
//!   terminator included.
//! - **substitution**: for each line matching a rule's `search` from the
//!   first character, the span of the first capture group is replaced with
//!   the rule's `replacement`. Output lines are right-trimmed and
//!   newline-terminated.
//!
//! The primary use is stripping secrets before a backup touches disk.
//!
//! # Example
//!
//! ```rust
//! use ferrisconf::sanitize::{SanitizationRules, SubstitutionRule};
//!
//! let rules = SanitizationRules::new()
//!     .remove(r"^ntp clock-period")
//!     .substitute(SubstitutionRule::new(r"^username \S+ secret 5 (\S+)", "<redacted>"));
//! let sanitizer = rules.compile().unwrap();
//!
//! let config = "ntp clock-period 17179\nusername admin secret 5 $1$abc\n";
//! assert_eq!(sanitizer.apply(config), "username admin secret 5 <redacted>\n");
//! ```

use std::borrow::Cow;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::FatalError;

/// A substitution rule as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionRule {
    /// Regex with at least one capture group, matched from the line start.
    #[serde(rename = "regex_search", alias = "search")]
    pub search: String,

    /// Literal text that replaces the first capture group.
    #[serde(rename = "regex_replacement", alias = "replacement")]
    pub replacement: String,
}

impl SubstitutionRule {
    /// Create a new substitution rule.
    pub fn new(search: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            replacement: replacement.into(),
        }
    }
}

/// Removal and substitution rules for one retrieval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizationRules {
    /// Patterns whose matching lines are deleted.
    #[serde(default)]
    pub remove_lines: Vec<String>,

    /// Rules applied to the surviving lines.
    #[serde(default)]
    pub substitute_lines: Vec<SubstitutionRule>,
}

impl SanitizationRules {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a removal pattern.
    pub fn remove(mut self, pattern: impl Into<String>) -> Self {
        self.remove_lines.push(pattern.into());
        self
    }

    /// Add a substitution rule.
    pub fn substitute(mut self, rule: SubstitutionRule) -> Self {
        self.substitute_lines.push(rule);
        self
    }

    /// Check whether there is nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.remove_lines.is_empty() && self.substitute_lines.is_empty()
    }

    /// Compile every rule.
    ///
    /// Fails on the first invalid regex, or on a substitution whose search
    /// pattern has no capture group.
    pub fn compile(&self) -> Result<Sanitizer, FatalError> {
        let removals = self
            .remove_lines
            .iter()
            .map(|pattern| compile_removal(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        let substitutions = self
            .substitute_lines
            .iter()
            .map(CompiledSubstitution::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Sanitizer {
            removals,
            substitutions,
        })
    }
}

/// Compile a removal pattern in multiline mode.
pub fn compile_removal(pattern: &str) -> Result<Regex, FatalError> {
    RegexBuilder::new(pattern)
        .multi_line(true)
        .build()
        .map_err(|e| FatalError::InvalidRule {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// A compiled substitution rule.
#[derive(Debug, Clone)]
pub struct CompiledSubstitution {
    search: Regex,
    replacement: String,
}

impl CompiledSubstitution {
    /// Compile `rule`, anchoring its search pattern to the line start.
    pub fn new(rule: &SubstitutionRule) -> Result<Self, FatalError> {
        let invalid = |reason: String| FatalError::InvalidRule {
            pattern: rule.search.clone(),
            reason,
        };

        let search = Regex::new(&format!("^(?:{})", rule.search)).map_err(|e| invalid(e.to_string()))?;

        // Group 0 is the whole match.
        if search.captures_len() < 2 {
            return Err(invalid("search pattern has no capture group".to_string()));
        }

        Ok(Self {
            search,
            replacement: rule.replacement.clone(),
        })
    }

    /// Replace the first capture group of `line`, if the rule matches.
    ///
    /// Only the group's span is rewritten. Other occurrences of the captured
    /// text elsewhere in the line are left alone, unlike a replace-all of the
    /// captured string.
    ///
    /// Returns `None` when the rule does not match or the first group did not
    /// participate in the match.
    pub fn replace(&self, line: &str) -> Option<String> {
        let group = self.search.captures(line)?.get(1)?;

        let mut replaced =
            String::with_capacity(line.len() - group.len() + self.replacement.len());
        replaced.push_str(&line[..group.start()]);
        replaced.push_str(&self.replacement);
        replaced.push_str(&line[group.end()..]);
        Some(replaced)
    }
}

/// Delete every line matched by any of `patterns`.
///
/// Patterns apply in order, each to the output of the previous one.
pub fn remove_lines(text: &str, patterns: &[Regex]) -> String {
    let mut config = text.to_string();
    for pattern in patterns {
        config = config
            .split_inclusive('\n')
            .filter(|line| !pattern.is_match(line.trim_end_matches(['\r', '\n'])))
            .collect();
    }
    config
}

/// Apply substitution `rules` line by line.
///
/// With no rules the input comes back unchanged.
pub fn substitute_lines(text: &str, rules: &[CompiledSubstitution]) -> String {
    if rules.is_empty() {
        return text.to_string();
    }

    let mut config = String::with_capacity(text.len() + 1);
    for line in text.lines() {
        let mut line = Cow::Borrowed(line);
        for rule in rules {
            if let Some(replaced) = rule.replace(&line) {
                line = Cow::Owned(replaced);
            }
        }
        config.push_str(line.trim_end());
        config.push('\n');
    }
    config
}

/// Compiled removal and substitution rules.
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    removals: Vec<Regex>,
    substitutions: Vec<CompiledSubstitution>,
}

impl Sanitizer {
    /// Check whether any removal patterns are configured.
    pub fn has_removals(&self) -> bool {
        !self.removals.is_empty()
    }

    /// Check whether any substitution rules are configured.
    pub fn has_substitutions(&self) -> bool {
        !self.substitutions.is_empty()
    }

    /// Apply the removal patterns.
    pub fn remove(&self, text: &str) -> String {
        remove_lines(text, &self.removals)
    }

    /// Apply the substitution rules.
    pub fn substitute(&self, text: &str) -> String {
        substitute_lines(text, &self.substitutions)
    }

    /// Removal, then substitution.
    pub fn apply(&self, text: &str) -> String {
        self.substitute(&self.remove(text))
    }
}
