// SPDX-License-Identifier: MIT OR Apache-2.0
//! Unified error taxonomy for the component-version resolver core.
//!
//! Every [`CoreError`] carries a stable [`CoreErrorCode`] (a machine-readable
//! tag an embedder can match on without string comparison), a human-readable
//! message, an optional boxed cause, and arbitrary structured context.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Broad family that a [`CoreErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreErrorCategory {
    /// Spec-provider lookup failures (§4.B).
    Provider,
    /// Worker-pool scheduling failures (§4.E).
    Scheduling,
    /// Errors surfaced by an upstream repository.
    Upstream,
    /// Credential-graph failures.
    Credential,
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl fmt::Display for CoreErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Provider => "provider",
            Self::Scheduling => "scheduling",
            Self::Upstream => "upstream",
            Self::Credential => "credential",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Machine-readable, stable error code.
///
/// Serialises to a `SCREAMING_SNAKE_CASE` string that does not change across
/// patch releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoreErrorCode {
    /// The component identity is missing a `name` attribute.
    MalformedIdentity,
    /// No rule in the table matched the requested component name.
    NotFound,
    /// A resolution for this key is already enqueued or executing.
    ResolutionInProgress,
    /// The worker pool's bounded queue was saturated.
    QueueFull,
    /// `ResolveOptions::key_fn` failed to produce a fingerprint.
    KeyBuildFailed,
    /// The upstream repository reported the component/version does not exist.
    UpstreamNotFound,
    /// The upstream repository failed for a reason other than not-found.
    UpstreamError,
    /// The credential graph has no credentials for this consumer identity.
    CredentialNotFound,
    /// The credential graph failed for a reason other than not-found.
    CredentialError,
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl CoreErrorCode {
    /// Returns the broad [`CoreErrorCategory`] this code belongs to.
    pub fn category(&self) -> CoreErrorCategory {
        match self {
            Self::MalformedIdentity | Self::NotFound => CoreErrorCategory::Provider,
            Self::ResolutionInProgress | Self::QueueFull | Self::KeyBuildFailed => {
                CoreErrorCategory::Scheduling
            }
            Self::UpstreamNotFound | Self::UpstreamError => CoreErrorCategory::Upstream,
            Self::CredentialNotFound | Self::CredentialError => CoreErrorCategory::Credential,
            Self::Internal => CoreErrorCategory::Internal,
        }
    }

    /// Stable `&'static str` representation (e.g. `"QUEUE_FULL"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedIdentity => "MALFORMED_IDENTITY",
            Self::NotFound => "NOT_FOUND",
            Self::ResolutionInProgress => "RESOLUTION_IN_PROGRESS",
            Self::QueueFull => "QUEUE_FULL",
            Self::KeyBuildFailed => "KEY_BUILD_FAILED",
            Self::UpstreamNotFound => "UPSTREAM_NOT_FOUND",
            Self::UpstreamError => "UPSTREAM_ERROR",
            Self::CredentialNotFound => "CREDENTIAL_NOT_FOUND",
            Self::CredentialError => "CREDENTIAL_ERROR",
            Self::Internal => "INTERNAL",
        }
    }

    /// Returns `true` for errors that §7.1 says must never be cached.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Self::UpstreamNotFound | Self::UpstreamError)
    }
}

impl fmt::Display for CoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified core error.
///
/// # Examples
///
/// ```
/// use cvr_types::{CoreError, CoreErrorCode};
///
/// let err = CoreError::new(CoreErrorCode::QueueFull, "worker queue saturated")
///     .with_context("queue_capacity", 100);
/// assert_eq!(err.code, CoreErrorCode::QueueFull);
/// ```
pub struct CoreError {
    /// Machine-readable error code.
    pub code: CoreErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Optional underlying cause.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Arbitrary structured context for diagnostics.
    pub context: BTreeMap<String, serde_json::Value>,
}

impl CoreError {
    /// Create a new error with the given code and message.
    pub fn new(code: CoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
            context: BTreeMap::new(),
        }
    }

    /// Attach a key-value pair to the diagnostic context.
    ///
    /// The value is converted via [`serde_json::to_value`]; if serialisation
    /// fails, the entry is silently skipped.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Shorthand for `self.code.category()`.
    pub fn category(&self) -> CoreErrorCategory {
        self.code.category()
    }

    /// Shorthand for `self.code.is_cacheable()`.
    pub fn is_cacheable(&self) -> bool {
        self.code.is_cacheable()
    }
}

impl fmt::Debug for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("CoreError");
        d.field("code", &self.code);
        d.field("message", &self.message);
        if let Some(ref src) = self.source {
            d.field("source", &src.to_string());
        }
        if !self.context.is_empty() {
            d.field("context", &self.context);
        }
        d.finish()
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)?;
        if !self.context.is_empty() {
            // Deterministic output thanks to BTreeMap.
            if let Ok(ctx) = serde_json::to_string(&self.context) {
                write!(f, " {ctx}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl Clone for CoreError {
    /// Clones the code, message and context; the boxed `source` cannot be
    /// cloned generically, so its `Display` text is preserved as a synthetic
    /// [`std::io::Error`] instead. Used by the cache (§7.1) to hand the same
    /// logical error to every waiting requester.
    fn clone(&self) -> Self {
        Self {
            code: self.code,
            message: self.message.clone(),
            source: self
                .source
                .as_ref()
                .map(|s| -> Box<dyn std::error::Error + Send + Sync> {
                    Box::new(std::io::Error::other(s.to_string()))
                }),
            context: self.context.clone(),
        }
    }
}

/// Serialisable snapshot of a [`CoreError`] (without the opaque source).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoreErrorDto {
    /// Error code.
    pub code: CoreErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Structured context.
    pub context: BTreeMap<String, serde_json::Value>,
    /// String representation of the source error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_message: Option<String>,
}

impl From<&CoreError> for CoreErrorDto {
    fn from(err: &CoreError) -> Self {
        Self {
            code: err.code,
            message: err.message.clone(),
            context: err.context.clone(),
            source_message: err.source.as_ref().map(|s| s.to_string()),
        }
    }
}
