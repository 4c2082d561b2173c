// SPDX-License-Identifier: MIT OR Apache-2.0
//! cvr-types
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Shared data model (`RepoSpec`, `ComponentIdentity`, `Rule`, `Fingerprint`,
//! `RequesterId`) and the unified error taxonomy (`CoreError`) used across
//! every crate in the component-version resolver core.

mod context;
mod descriptor;
mod error;
mod fingerprint;
mod identity;
mod repo_spec;
mod rule;

pub use context::{CancellationToken, RequestContext};
pub use descriptor::ComponentDescriptor;
pub use error::{CoreError, CoreErrorCategory, CoreErrorCode, CoreErrorDto};
pub use fingerprint::{Fingerprint, RequesterId, FINGERPRINT_HEX_LEN};
pub use identity::ComponentIdentity;
pub use repo_spec::{canonical_json_bytes, RepoSpec, RepoSpecError};
pub use rule::Rule;

/// Opaque byte string representing all configuration inputs that can
/// invalidate cache entries (credentials, rule table, etc). The core never
/// interprets its contents, only hashes them into the fingerprint (§3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ConfigHash(Vec<u8>);

impl ConfigHash {
    /// Wrap an opaque byte string.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Borrow the underlying bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for ConfigHash {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes().to_vec())
    }
}
