// SPDX-License-Identifier: MIT OR Apache-2.0
//! TTL-bounded result cache (§3 "CacheEntry", §7.1 "Error caching policy").

use cvr_types::{ComponentDescriptor, CoreError};
use std::time::Duration;

/// The outcome stored per fingerprint: either the resolved descriptor or the
/// error the last resolution attempt produced.
pub type CacheOutcome = Result<ComponentDescriptor, CoreError>;

/// Wraps a TTL-bounded concurrent cache keyed by fingerprint hex string.
///
/// Successful outcomes live for the full TTL. Errors are evicted immediately
/// after the first read that observes them (§7.1) so the next caller
/// triggers a fresh resolution instead of being poisoned by a transient
/// failure for the rest of the TTL window.
pub struct ResultCache {
    inner: moka::future::Cache<String, CacheOutcome>,
}

impl ResultCache {
    /// Build a cache with the given time-to-live.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: moka::future::Cache::builder().time_to_live(ttl).build(),
        }
    }

    /// Look up `key`. If the stored outcome is an error, it is invalidated
    /// before returning so the next lookup is a miss.
    pub async fn get(&self, key: &str) -> Option<CacheOutcome> {
        let outcome = self.inner.get(key).await;
        if let Some(Err(_)) = &outcome {
            self.inner.invalidate(key).await;
        }
        outcome
    }

    /// Store an outcome for `key`, replacing any existing entry.
    pub async fn put(&self, key: String, outcome: CacheOutcome) {
        self.inner.insert(key, outcome).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvr_types::CoreErrorCode;

    #[tokio::test]
    async fn successful_outcome_survives_repeated_reads() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache
            .put("k1".to_string(), Ok(ComponentDescriptor::new("c", "v1")))
            .await;

        assert!(cache.get("k1").await.unwrap().is_ok());
        assert!(cache.get("k1").await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn error_outcome_is_evicted_after_first_read() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache
            .put(
                "k1".to_string(),
                Err(CoreError::new(CoreErrorCode::UpstreamError, "timeout")),
            )
            .await;

        assert!(cache.get("k1").await.unwrap().is_err());
        assert!(cache.get("k1").await.is_none());
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let cache = ResultCache::new(Duration::from_secs(60));
        assert!(cache.get("absent").await.is_none());
    }
}
