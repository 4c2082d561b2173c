// SPDX-License-Identifier: MIT OR Apache-2.0
//! A single uncompiled routing rule: `{pattern, repoSpec}`.

use crate::RepoSpec;

/// A routing rule pairing a glob pattern with the [`RepoSpec`] it selects.
///
/// Patterns are compiled (and validated) by `cvr-pattern` / `cvr-provider`;
/// this type is the plain data the rule table is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Glob-style pattern matched against a component's `name` attribute.
    pub pattern: String,
    /// Repository descriptor selected when `pattern` matches.
    pub repo_spec: RepoSpec,
}

impl Rule {
    /// Construct a new rule.
    pub fn new(pattern: impl Into<String>, repo_spec: RepoSpec) -> Self {
        Self {
            pattern: pattern.into(),
            repo_spec,
        }
    }
}
