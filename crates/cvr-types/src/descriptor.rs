// SPDX-License-Identifier: MIT OR Apache-2.0
//! Component-version descriptors returned by a repository.

use serde_json::Value;
use std::fmt;

/// An immutable descriptor for a resolved `(component, version)` pair, as
/// returned by a repository's `getComponentVersion`.
///
/// Like [`RepoSpec`](crate::RepoSpec), the descriptor's payload is treated as
/// an opaque JSON document by the core — callers downstream (e.g. the
/// signature-verification subsystem) interpret its contents; the core only
/// ever moves it around and caches it by value.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ComponentDescriptor {
    /// The component name this descriptor was resolved for.
    pub component: String,
    /// The version this descriptor was resolved for.
    pub version: String,
    /// Opaque, repository-defined payload (references to resources/sources,
    /// etc).
    pub payload: Value,
}

impl ComponentDescriptor {
    /// Build a descriptor with an empty JSON object payload.
    pub fn new(component: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            version: version.into(),
            payload: Value::Object(serde_json::Map::new()),
        }
    }

    /// Attach a payload, replacing any existing one.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}

impl fmt::Display for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.component, self.version)
    }
}
