// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cancellation shared between a caller's own request and the worker pool's
//! lifetime.
//!
//! A submitter's [`RequestContext`] must only ever govern that submitter's
//! own call; it must never reach into work the worker pool has already
//! queued on behalf of other callers. The pool instead hands queued work a
//! context derived from its own lifetime token, so cancelling one caller's
//! request can't cancel another caller's in-flight resolution.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Shared, cloneable signal that flips exactly once, from "live" to
/// "cancelled".
///
/// Every clone observes the same flip: there is one `Arc<Signal>` underneath
/// all of them, so cancelling through any handle is visible to every other
/// handle immediately.
#[derive(Clone)]
pub struct CancellationToken {
    signal: Arc<Signal>,
}

struct Signal {
    tripped: AtomicBool,
    waiters: Notify,
}

impl CancellationToken {
    /// A fresh token, not yet cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            signal: Arc::new(Signal {
                tripped: AtomicBool::new(false),
                waiters: Notify::new(),
            }),
        }
    }

    /// Returns `true` once this token (or any clone of it) has been
    /// cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.signal.tripped.load(Ordering::SeqCst)
    }

    /// Trip the signal. Safe to call more than once; only the first call has
    /// any effect, every call after that is a no-op.
    pub fn cancel(&self) {
        self.signal.tripped.store(true, Ordering::SeqCst);
        self.signal.waiters.notify_waiters();
    }

    /// Waits until this token is cancelled, resolving immediately if it
    /// already has been.
    ///
    /// `Notify::notify_waiters` only wakes tasks already parked on
    /// `notified()`, so the already-cancelled check has to come first on
    /// every loop iteration — otherwise a task that calls this after
    /// `cancel()` has already run would park forever.
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            self.signal.waiters.notified().await;
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// A context threaded through a single resolver or repository call.
///
/// Carries the [`CancellationToken`] that call should honour — either a
/// fresh one for a one-off call, or the worker pool's lifetime token for
/// work the pool owns.
#[derive(Clone, Debug)]
pub struct RequestContext {
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Wrap an existing token.
    pub fn new(cancellation: CancellationToken) -> Self {
        Self { cancellation }
    }

    /// A context backed by a fresh, live token — for calls with no
    /// surrounding cancellation scope.
    pub fn background() -> Self {
        Self::new(CancellationToken::new())
    }

    /// The token backing this context.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Shorthand for `self.cancellation().is_cancelled()`.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_live() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancelling_one_clone_cancels_every_clone() {
        let a = CancellationToken::new();
        let b = a.clone();
        a.cancel();
        assert!(b.is_cancelled());
    }

    #[test]
    fn cancel_is_idempotent() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn default_token_matches_new() {
        let token = CancellationToken::default();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn background_context_starts_live() {
        let ctx = RequestContext::background();
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn context_reflects_its_underlying_token() {
        let token = CancellationToken::new();
        let ctx = RequestContext::new(token.clone());
        assert!(!ctx.is_cancelled());
        token.cancel();
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_wakes_a_task_parked_before_cancel() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });
        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_returns_immediately_when_already_tripped() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancelled().await;
    }
}
