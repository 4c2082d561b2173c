// SPDX-License-Identifier: MIT OR Apache-2.0
//! cvr-fingerprint
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! The Fingerprinter (§4.D): derives a stable, 64-bit-wide hex cache key from
//! everything that can invalidate a cached resolution.
//!
//! ```text
//! fingerprint(configHash, repoSpec, component, version, ext?) =
//!     hex( H( configHash
//!           ∥ canonicalJSON(repoSpec)
//!           ∥ utf8(component)
//!           ∥ utf8(version)
//!           ∥ canonicalJSON(ext) ) )
//! ```
//!
//! Rather than concatenating raw byte fields (which needs explicit length
//! prefixing to stay unambiguous), every input is folded into one JSON
//! envelope object and that envelope is canonicalised as a whole — the
//! canonical-JSON form already disambiguates variable-length fields, so no
//! separate length prefixing is needed.

use cvr_types::{canonical_json_bytes, ConfigHash, Fingerprint, RepoSpec};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// Compute the fingerprint for a resolution request.
///
/// `ext` is the optional per-call extension block (e.g. verification
/// context). Per the design notes, "no extension" and "extension = empty"
/// are different inputs: omit the `ext` field from the envelope entirely
/// when `ext` is `None` rather than hashing a placeholder empty value, so
/// callers that never pass an extension can never collide with one that
/// passes an empty-but-present one.
pub fn fingerprint(
    config_hash: &ConfigHash,
    repo_spec: &RepoSpec,
    component: &str,
    version: &str,
    ext: Option<&Value>,
) -> Fingerprint {
    let mut envelope = json!({
        "config_hash": hex_encode(config_hash.as_bytes()),
        "repo_spec": repo_spec.as_value(),
        "component": component,
        "version": version,
    });
    if let Some(ext) = ext {
        envelope
            .as_object_mut()
            .expect("envelope is always an object")
            .insert("ext".to_string(), ext.clone());
    }

    let bytes = canonical_json_bytes(&envelope);
    let digest = Sha256::digest(bytes);
    Fingerprint::from_hex(hex_encode(&digest[..8]))
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(out, "{b:02x}").expect("writing to a String never fails");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn spec(json_str: &str) -> RepoSpec {
        RepoSpec::from_json_str(json_str).unwrap()
    }

    #[test]
    fn fingerprint_is_16_lowercase_hex_chars() {
        let fp = fingerprint(
            &ConfigHash::from("cfg-1"),
            &RepoSpec::new("oci", Map::new()),
            "example.com/foo",
            "v1",
            None,
        );
        assert_eq!(fp.as_str().len(), 16);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn field_order_and_whitespace_do_not_affect_fingerprint() {
        // Field-order and whitespace variations must canonicalise identically.
        let a = spec(r#"{"kind":"oci","host":"example.com","insecure":false}"#);
        let b = spec(r#"{"insecure":false,"host":"example.com","kind":"oci"}"#);
        let fp_a = fingerprint(&ConfigHash::from("cfg"), &a, "c", "v1", None);
        let fp_b = fingerprint(&ConfigHash::from("cfg"), &b, "c", "v1", None);
        assert_eq!(fp_a, fp_b);
    }

    #[test]
    fn distinct_config_hash_changes_fingerprint() {
        // Distinct config hashes must yield distinct fingerprints.
        let spec = RepoSpec::new("oci", Map::new());
        let a = fingerprint(&ConfigHash::from("cfg-a"), &spec, "c", "v1", None);
        let b = fingerprint(&ConfigHash::from("cfg-b"), &spec, "c", "v1", None);
        assert_ne!(a, b);
    }

    #[test]
    fn distinct_repo_spec_changes_fingerprint() {
        let cfg = ConfigHash::from("cfg");
        let a = fingerprint(&cfg, &spec(r#"{"kind":"oci","host":"a"}"#), "c", "v1", None);
        let b = fingerprint(&cfg, &spec(r#"{"kind":"oci","host":"b"}"#), "c", "v1", None);
        assert_ne!(a, b);
    }

    #[test]
    fn distinct_component_changes_fingerprint() {
        let cfg = ConfigHash::from("cfg");
        let s = RepoSpec::new("oci", Map::new());
        let a = fingerprint(&cfg, &s, "component-a", "v1", None);
        let b = fingerprint(&cfg, &s, "component-b", "v1", None);
        assert_ne!(a, b);
    }

    #[test]
    fn distinct_version_changes_fingerprint() {
        let cfg = ConfigHash::from("cfg");
        let s = RepoSpec::new("oci", Map::new());
        let a = fingerprint(&cfg, &s, "c", "v1", None);
        let b = fingerprint(&cfg, &s, "c", "v2", None);
        assert_ne!(a, b);
    }

    #[test]
    fn no_extension_differs_from_empty_extension() {
        let cfg = ConfigHash::from("cfg");
        let s = RepoSpec::new("oci", Map::new());
        let without = fingerprint(&cfg, &s, "c", "v1", None);
        let with_empty = fingerprint(&cfg, &s, "c", "v1", Some(&json!({})));
        assert_ne!(without, with_empty);
    }

    #[test]
    fn distinct_extensions_change_fingerprint() {
        let cfg = ConfigHash::from("cfg");
        let s = RepoSpec::new("oci", Map::new());
        let a = fingerprint(&cfg, &s, "c", "v1", Some(&json!({"verify": "a"})));
        let b = fingerprint(&cfg, &s, "c", "v1", Some(&json!({"verify": "b"})));
        assert_ne!(a, b);
    }

    #[test]
    fn is_deterministic() {
        let cfg = ConfigHash::from("cfg");
        let s = RepoSpec::new("oci", Map::new());
        let a = fingerprint(&cfg, &s, "c", "v1", None);
        let b = fingerprint(&cfg, &s, "c", "v1", None);
        assert_eq!(a, b);
    }
}
