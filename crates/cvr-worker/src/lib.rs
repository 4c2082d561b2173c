// SPDX-License-Identifier: MIT OR Apache-2.0
//! cvr-worker
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! The Worker Pool (§4.E): a bounded work queue backed by a fixed fan-out of
//! worker tasks, with single-flight deduplication, a TTL-bounded result
//! cache, and non-blocking completion-event fan-out.

mod cache;
mod config;
mod pool;
mod stats;

pub use config::WorkerPoolConfig;
pub use pool::{CompletionEvent, ResolveOptions, WorkerPool};
pub use stats::WorkerPoolStatsSnapshot;
