// SPDX-License-Identifier: MIT OR Apache-2.0
//! Component identity — the attribute bag a reconciler hands the core.

use crate::{CoreError, CoreErrorCode};
use std::collections::BTreeMap;

/// Mapping from attribute name to string value, describing the component
/// being resolved. Must contain a `"name"` attribute; the full identity is
/// kept for diagnostics, but only `name` participates in rule matching.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComponentIdentity {
    attributes: BTreeMap<String, String>,
}

impl ComponentIdentity {
    /// Construct an identity from just a `name`.
    pub fn named(name: impl Into<String>) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert("name".to_string(), name.into());
        Self { attributes }
    }

    /// Construct an identity from an arbitrary attribute map.
    pub fn from_attributes(attributes: BTreeMap<String, String>) -> Self {
        Self { attributes }
    }

    /// Set an additional attribute, returning `self` for chaining.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Return the `name` attribute.
    ///
    /// # Errors
    ///
    /// Returns [`CoreErrorCode::MalformedIdentity`] if no `name` attribute
    /// is present.
    pub fn name(&self) -> Result<&str, CoreError> {
        self.attributes.get("name").map(String::as_str).ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::MalformedIdentity,
                "component identity is missing a \"name\" attribute",
            )
        })
    }

    /// Look up an arbitrary attribute by key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Iterate over all attributes in deterministic (key-sorted) order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_exposes_name() {
        let id = ComponentIdentity::named("example.com/foo");
        assert_eq!(id.name().unwrap(), "example.com/foo");
    }

    #[test]
    fn missing_name_is_malformed() {
        let id = ComponentIdentity::default();
        let err = id.name().unwrap_err();
        assert_eq!(err.code, CoreErrorCode::MalformedIdentity);
    }

    #[test]
    fn with_attribute_preserves_name() {
        let id = ComponentIdentity::named("x").with_attribute("namespace", "team-a");
        assert_eq!(id.name().unwrap(), "x");
        assert_eq!(id.attribute("namespace"), Some("team-a"));
    }

    #[test]
    fn attributes_are_sorted() {
        let id = ComponentIdentity::named("x")
            .with_attribute("zeta", "1")
            .with_attribute("alpha", "2");
        let keys: Vec<&str> = id.attributes().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["alpha", "name", "zeta"]);
    }
}
