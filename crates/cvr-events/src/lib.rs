// SPDX-License-Identifier: MIT OR Apache-2.0
//! cvr-events
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! The Event Source (§4.F): forwards worker-pool completion events to
//! whichever external wake-up queue the embedder supplies.

use async_trait::async_trait;
use cvr_types::RequesterId;
use cvr_worker::CompletionEvent;
use tokio::sync::mpsc;

/// The external wake-up queue (§6 "Consumed external contracts" item 4):
/// told which reconciler should re-run after a resolution completes.
#[async_trait]
pub trait CompletionQueue: Send + Sync {
    /// Enqueue a wake-up request for `requester`.
    async fn enqueue(&self, requester: RequesterId);
}

#[async_trait]
impl<T: CompletionQueue + ?Sized> CompletionQueue for std::sync::Arc<T> {
    async fn enqueue(&self, requester: RequesterId) {
        (**self).enqueue(requester).await
    }
}

/// Drains a worker pool's completion-event channel, forwarding every
/// requester in every event to a [`CompletionQueue`].
///
/// Holds no state of its own beyond the queue handle — cheap to construct,
/// and safe to drop and recreate across reconciliation cycles if the
/// embedder rebinds its wake-up queue.
pub struct EventSource<Q> {
    queue: Q,
}

impl<Q: CompletionQueue> EventSource<Q> {
    /// Build an event source forwarding to `queue`.
    pub fn new(queue: Q) -> Self {
        Self { queue }
    }

    /// Run until `events` closes, forwarding every requester of every event.
    ///
    /// Exits cleanly (returns) when the channel closes — there is no
    /// restart; the caller constructs a new [`EventSource`] if it needs to
    /// resume forwarding.
    pub async fn run(&self, mut events: mpsc::Receiver<CompletionEvent>) {
        while let Some(event) = events.recv().await {
            for requester in event.requesters {
                self.queue.enqueue(requester).await;
            }
        }
        tracing::debug!("completion-event channel closed, event source exiting");
    }
}
