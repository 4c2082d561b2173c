// SPDX-License-Identifier: MIT OR Apache-2.0
//! cvr-provider
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! The Spec Provider (§4.B): an immutable, ordered table of compiled rules.
//! `RuleTable::get_repo_spec` returns the first rule whose pattern matches
//! the component's `name` attribute.

use cvr_pattern::{Pattern, PatternError};
use cvr_types::{ComponentIdentity, CoreError, CoreErrorCode, RepoSpec, Rule};
use std::fmt;

/// A single compiled rule: a [`Pattern`] paired with the [`RepoSpec`] it
/// selects.
#[derive(Debug, Clone)]
struct CompiledRule {
    pattern: Pattern,
    repo_spec: RepoSpec,
}

/// Immutable, ordered sequence of rules used to resolve a component identity
/// to a [`RepoSpec`].
///
/// Compilation happens once at construction; a malformed pattern anywhere in
/// the table is a fatal construction error — the provider refuses to operate
/// with a partially compiled table (§4.A). Once built, a `RuleTable` is
/// deep-copied on entry and shared freely (`Clone` is O(n) but cheap; callers
/// typically wrap it in an `Arc`).
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<CompiledRule>,
}

impl RuleTable {
    /// Compile a rule table from an ordered list of raw [`Rule`]s.
    ///
    /// # Errors
    ///
    /// Returns [`RuleTableError::Compile`] naming the first pattern that
    /// fails to compile; no partially-compiled table is ever produced.
    pub fn compile(rules: impl IntoIterator<Item = Rule>) -> Result<Self, RuleTableError> {
        let mut compiled = Vec::new();
        for (index, rule) in rules.into_iter().enumerate() {
            let pattern = Pattern::compile(&rule.pattern).map_err(|source| {
                tracing::error!(
                    index,
                    pattern = %rule.pattern,
                    error = %source,
                    "rule table compilation failed"
                );
                RuleTableError::Compile {
                    index,
                    pattern: rule.pattern.clone(),
                    source,
                }
            })?;
            compiled.push(CompiledRule {
                pattern,
                repo_spec: rule.repo_spec,
            });
        }
        tracing::debug!(rule_count = compiled.len(), "rule table compiled");
        Ok(Self { rules: compiled })
    }

    /// Number of rules in the table.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the table has no rules (everything is `NOT_FOUND`).
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Look up the `repoSpec` selected by a component identity.
    ///
    /// Extracts `name` from `identity`, scans rules in order, and returns
    /// the first matching `repoSpec` (§4.B).
    ///
    /// # Errors
    ///
    /// - [`CoreErrorCode::MalformedIdentity`] if `identity` has no `name`.
    /// - [`CoreErrorCode::NotFound`] if no rule matches.
    pub fn get_repo_spec(&self, identity: &ComponentIdentity) -> Result<RepoSpec, CoreError> {
        let name = identity.name()?;
        for rule in &self.rules {
            if rule.pattern.matches(name) {
                tracing::debug!(name, pattern = rule.pattern.as_str(), "rule matched");
                return Ok(rule.repo_spec.clone());
            }
        }
        tracing::debug!(name, "no rule matched");
        Err(CoreError::new(
            CoreErrorCode::NotFound,
            format!("no rule matches component name \"{name}\""),
        )
        .with_context("name", name))
    }

    /// Returns `true` if `spec` canonicalises to one already present in the
    /// table.
    ///
    /// Used by the repository resolver (§4.C) to admit only specs that were
    /// reachable through a configured rule, preventing arbitrary spec
    /// injection.
    pub fn contains_spec(&self, spec: &RepoSpec) -> bool {
        self.rules
            .iter()
            .any(|r| r.repo_spec.canonical_bytes() == spec.canonical_bytes())
    }
}

/// Errors constructing a [`RuleTable`].
#[derive(Debug, thiserror::Error)]
pub enum RuleTableError {
    /// A pattern at `index` failed to compile.
    #[error("rule {index} pattern \"{pattern}\" failed to compile: {source}")]
    Compile {
        /// Index of the offending rule.
        index: usize,
        /// The offending pattern text.
        pattern: String,
        /// Underlying compilation error.
        #[source]
        source: PatternError,
    },
}

impl fmt::Display for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuleTable({} rules)", self.rules.len())
    }
}
