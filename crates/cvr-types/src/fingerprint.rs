// SPDX-License-Identifier: MIT OR Apache-2.0
//! The stable cache-key type produced by the fingerprinter (`cvr-fingerprint`).

use std::fmt;

/// A lowercase-hex, fixed-length cache key derived from everything that can
/// invalidate a cached resolution (§3 "Fingerprint").
///
/// `Fingerprint` is an opaque newtype over the hex string so callers cannot
/// accidentally compare a fingerprint against an unrelated string without an
/// explicit conversion.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint(String);

/// Wire-format length in hex characters (64-bit digest → 16 hex chars).
pub const FINGERPRINT_HEX_LEN: usize = 16;

impl Fingerprint {
    /// Wrap a precomputed hex string.
    ///
    /// # Panics
    ///
    /// Panics if `hex` is not exactly [`FINGERPRINT_HEX_LEN`] lowercase hex
    /// characters — this is only ever called by `cvr-fingerprint` on its own
    /// output, so a mismatch indicates a programming error, not bad input.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        let hex = hex.into();
        debug_assert_eq!(
            hex.len(),
            FINGERPRINT_HEX_LEN,
            "fingerprint hex length mismatch: {hex}"
        );
        debug_assert!(
            hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()),
            "fingerprint must be lowercase hex: {hex}"
        );
        Self(hex)
    }

    /// Borrow the underlying hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifies the reconciler that should be woken when a pending resolution
/// completes (§3 "ResolveOptions.requester").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequesterId(String);

impl RequesterId {
    /// Wrap an arbitrary requester identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequesterId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RequesterId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
