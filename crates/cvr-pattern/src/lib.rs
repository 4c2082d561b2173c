// SPDX-License-Identifier: MIT OR Apache-2.0
//! cvr-pattern
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Glob-style pattern compilation and matching for component names (§4.A).
//!
//! `*` matches any single non-separator segment, `**` matches any path,
//! `[abc]`-style character classes are supported, and the empty pattern
//! matches nothing. Matching is case-sensitive; `/` is the separator.
//! Compilation happens once, at rule-table construction time — a malformed
//! pattern is a fatal construction error, never a runtime surprise.

use globset::{Glob, GlobBuilder, GlobMatcher};

/// A single compiled glob pattern.
///
/// `Pattern::matches` is deterministic and stateless: it never allocates and
/// never mutates shared state, so a compiled table of `Pattern`s can be
/// shared freely across reconciler tasks.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    matcher: Option<GlobMatcher>,
}

impl Pattern {
    /// Compile a glob pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::Invalid`] if `raw` is not a well-formed glob.
    /// The empty string is a valid pattern that simply never matches.
    pub fn compile(raw: impl Into<String>) -> Result<Self, PatternError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Ok(Self { raw, matcher: None });
        }
        let glob: Glob = GlobBuilder::new(&raw)
            .literal_separator(true)
            .build()
            .map_err(|source| PatternError::Invalid {
                pattern: raw.clone(),
                source,
            })?;
        Ok(Self {
            raw,
            matcher: Some(glob.compile_matcher()),
        })
    }

    /// Returns `true` if `name` matches this compiled pattern.
    ///
    /// The empty pattern always returns `false`.
    pub fn matches(&self, name: &str) -> bool {
        match &self.matcher {
            Some(m) => m.is_match(name),
            None => false,
        }
    }

    /// The original, uncompiled pattern text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Pattern {}

/// Errors raised while compiling a [`Pattern`].
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// The pattern text could not be compiled as a glob.
    #[error("invalid glob pattern \"{pattern}\": {source}")]
    Invalid {
        /// The offending pattern text.
        pattern: String,
        /// Underlying `globset` compilation error.
        #[source]
        source: globset::Error,
    },
}
