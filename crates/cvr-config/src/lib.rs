// SPDX-License-Identifier: MIT OR Apache-2.0
//! cvr-config
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Loading and validation for the core's own internal tunables — worker
//! count, queue capacity, cache TTL. This does **not** cover loading the
//! cluster API's controller configuration or custom resources; that surface
//! stays with the embedder (§1 Non-goals).

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Errors that can occur while loading or validating [`WorkerPoolSettings`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found or not readable.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },
    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },
    /// Semantic validation failed.
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(val: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        val.as_secs().serialize(ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        let secs: u64 = u64::deserialize(de)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Internal tunables for the Worker Pool (§4.E "Configuration").
///
/// Constructed directly with `..Default::default()`, or loaded from a TOML
/// file via [`load`] when the embedder wants file-based tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerPoolSettings {
    /// Number of worker tasks kept running for the pool's lifetime.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Capacity of the bounded work queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Time-to-live for cache entries, in seconds.
    #[serde(default = "default_cache_ttl", with = "duration_secs")]
    pub cache_ttl: Duration,
    /// Maximum buffered completion events before new ones are dropped.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

fn default_worker_count() -> usize {
    10
}

fn default_queue_capacity() -> usize {
    100
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(300)
}

fn default_event_channel_capacity() -> usize {
    128
}

impl Default for WorkerPoolSettings {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            queue_capacity: default_queue_capacity(),
            cache_ttl: default_cache_ttl(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

const MAX_QUEUE_CAPACITY: usize = 100_000;
const MAX_WORKER_COUNT: usize = 1_000;

impl WorkerPoolSettings {
    /// Validate every field, returning actionable messages rather than
    /// panicking.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming every problem found
    /// (not just the first).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut reasons = Vec::new();

        if self.worker_count == 0 {
            reasons.push("worker_count must be at least 1".to_string());
        } else if self.worker_count > MAX_WORKER_COUNT {
            reasons.push(format!(
                "worker_count {} exceeds maximum of {MAX_WORKER_COUNT}",
                self.worker_count
            ));
        }

        if self.queue_capacity == 0 {
            reasons.push("queue_capacity must be at least 1".to_string());
        } else if self.queue_capacity > MAX_QUEUE_CAPACITY {
            reasons.push(format!(
                "queue_capacity {} exceeds maximum of {MAX_QUEUE_CAPACITY}",
                self.queue_capacity
            ));
        }

        if self.event_channel_capacity == 0 {
            reasons.push("event_channel_capacity must be at least 1".to_string());
        }

        if self.cache_ttl.is_zero() {
            reasons.push("cache_ttl must be greater than zero".to_string());
        }

        if reasons.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationError { reasons })
        }
    }
}

/// Parse [`WorkerPoolSettings`] from a TOML string.
///
/// # Errors
///
/// Returns [`ConfigError::ParseError`] on malformed TOML.
pub fn parse_toml(content: &str) -> Result<WorkerPoolSettings, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

/// Load and validate [`WorkerPoolSettings`] from an optional TOML file.
///
/// `None` returns [`WorkerPoolSettings::default`] without touching the
/// filesystem.
///
/// # Errors
///
/// [`ConfigError::FileNotFound`], [`ConfigError::ParseError`], or
/// [`ConfigError::ValidationError`].
pub fn load(path: Option<&Path>) -> Result<WorkerPoolSettings, ConfigError> {
    let settings = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => WorkerPoolSettings::default(),
    };
    settings.validate()?;
    Ok(settings)
}
