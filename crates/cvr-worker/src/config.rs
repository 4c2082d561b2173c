// SPDX-License-Identifier: MIT OR Apache-2.0
//! Worker pool tuning knobs (§4.E "Configuration").

use std::time::Duration;

/// Serde helper for `Duration` as milliseconds, matching the internal
/// tunables convention used elsewhere in this codebase.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(val: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        val.as_millis().serialize(ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        let ms: u64 = u64::deserialize(de)?;
        Ok(Duration::from_millis(ms))
    }
}

/// Tunables for a [`WorkerPool`](crate::WorkerPool).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WorkerPoolConfig {
    /// Number of worker tasks kept running for the pool's lifetime. Must be
    /// at least 1.
    pub worker_count: usize,
    /// Capacity of the bounded work queue. Must be at least 1.
    pub queue_capacity: usize,
    /// Time-to-live for cache entries, successes and errors alike.
    #[serde(with = "duration_millis")]
    pub cache_ttl: Duration,
    /// Maximum buffered completion events before new ones are dropped.
    pub event_channel_capacity: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 10,
            queue_capacity: 100,
            cache_ttl: Duration::from_secs(300),
            event_channel_capacity: 128,
        }
    }
}

impl From<cvr_config::WorkerPoolSettings> for WorkerPoolConfig {
    fn from(settings: cvr_config::WorkerPoolSettings) -> Self {
        Self {
            worker_count: settings.worker_count,
            queue_capacity: settings.queue_capacity,
            cache_ttl: settings.cache_ttl,
            event_channel_capacity: settings.event_channel_capacity,
        }
    }
}

impl WorkerPoolConfig {
    /// Validate that every field is within its allowed range.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message naming the offending field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be at least 1".to_string());
        }
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be at least 1".to_string());
        }
        if self.event_channel_capacity == 0 {
            return Err("event_channel_capacity must be at least 1".to_string());
        }
        Ok(())
    }
}
