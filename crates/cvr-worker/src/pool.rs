// SPDX-License-Identifier: MIT OR Apache-2.0
//! Worker Pool (§4.E): bounded queue, fixed fan-out, single-flight dedup,
//! TTL cache, completion-event fan-out.

use crate::cache::ResultCache;
use crate::config::WorkerPoolConfig;
use crate::stats::{WorkerPoolStats, WorkerPoolStatsSnapshot};
use cvr_resolver::Repository;
use cvr_types::{ComponentDescriptor, CoreError, CoreErrorCode, Fingerprint, RequestContext, RequesterId};
use dashmap::{DashMap, DashSet};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{mpsc, Mutex as TokioMutex};
use tokio::task::JoinHandle;

/// A unit of queued work: everything a worker needs to run one resolution
/// independently of the submitter that triggered it.
struct WorkItem {
    ctx: RequestContext,
    key: Fingerprint,
    component: String,
    version: String,
    repository: Arc<dyn Repository>,
}

/// Arguments for a single `getComponentVersion` call.
///
/// `key_fn` is evaluated lazily, once, inside the call — this lets callers
/// fold dynamic per-call context (e.g. a verification extension) into the
/// fingerprint without computing it on every cache hit.
pub struct ResolveOptions<F>
where
    F: FnOnce() -> Result<Fingerprint, CoreError>,
{
    /// The component name being resolved.
    pub component: String,
    /// The version being resolved.
    pub version: String,
    /// The repository handle (already resolved via §4.C) to call on a cache
    /// miss.
    pub repository: Arc<dyn Repository>,
    /// Lazily computes the cache key for this call.
    pub key_fn: F,
    /// The reconciler to wake when this resolution completes.
    pub requester: RequesterId,
}

/// Fan-out to every registered requester once a resolution completes.
#[derive(Debug, Clone)]
pub struct CompletionEvent {
    /// Requesters to wake, in registration order. May contain duplicates if
    /// the same requester called in while a resolution was already running;
    /// waking a requester twice is harmless.
    pub requesters: Vec<RequesterId>,
}

/// Bounded, fixed-size pool of worker tasks resolving component versions on
/// behalf of the cache-backed repository adapter (§4.G).
///
/// One-shot: once [`shutdown`](Self::shutdown) completes, the pool cannot be
/// restarted. Construct a new one instead.
pub struct WorkerPool {
    queue_tx: StdMutex<Option<mpsc::Sender<WorkItem>>>,
    events_tx: StdMutex<Option<mpsc::Sender<CompletionEvent>>>,
    in_progress: DashSet<String>,
    requesters: DashMap<String, Vec<RequesterId>>,
    cache: ResultCache,
    stats: WorkerPoolStats,
    pool_ctx: RequestContext,
    worker_handles: StdMutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawn a pool with `config.worker_count` worker tasks, returning the
    /// pool handle and the receiving half of its completion-event channel.
    pub fn spawn(config: WorkerPoolConfig) -> (Arc<Self>, mpsc::Receiver<CompletionEvent>) {
        let (queue_tx, queue_rx) = mpsc::channel::<WorkItem>(config.queue_capacity);
        let (events_tx, events_rx) = mpsc::channel::<CompletionEvent>(config.event_channel_capacity);

        let pool = Arc::new(Self {
            queue_tx: StdMutex::new(Some(queue_tx)),
            events_tx: StdMutex::new(Some(events_tx)),
            in_progress: DashSet::new(),
            requesters: DashMap::new(),
            cache: ResultCache::new(config.cache_ttl),
            stats: WorkerPoolStats::default(),
            pool_ctx: RequestContext::background(),
            worker_handles: StdMutex::new(Vec::new()),
        });

        let queue_rx = Arc::new(TokioMutex::new(queue_rx));
        let mut handles = Vec::with_capacity(config.worker_count);
        for _ in 0..config.worker_count {
            let worker_pool = Arc::clone(&pool);
            let queue_rx = Arc::clone(&queue_rx);
            handles.push(tokio::spawn(async move {
                worker_pool.worker_loop(queue_rx).await;
            }));
        }
        *pool.worker_handles.lock().expect("worker_handles lock poisoned") = handles;

        (pool, events_rx)
    }

    /// Resolve a single `(component, version)` pair through the pool.
    ///
    /// Returns the descriptor on a cache hit; otherwise registers the caller
    /// as a requester and returns one of `RESOLUTION_IN_PROGRESS`,
    /// `QUEUE_FULL`, or `KEY_BUILD_FAILED` per §4.E.
    pub async fn get_component_version<F>(
        &self,
        options: ResolveOptions<F>,
    ) -> Result<ComponentDescriptor, CoreError>
    where
        F: FnOnce() -> Result<Fingerprint, CoreError>,
    {
        let key = (options.key_fn)().map_err(|source| {
            CoreError::new(CoreErrorCode::KeyBuildFailed, source.message.clone()).with_source(source)
        })?;
        let key_str = key.as_str();

        if let Some(outcome) = self.cache.get(key_str).await {
            self.stats.record_cache_hit();
            return outcome;
        }
        self.stats.record_cache_miss();

        self.requesters
            .entry(key_str.to_string())
            .or_default()
            .push(options.requester);

        if !self.in_progress.insert(key_str.to_string()) {
            self.stats.record_in_progress_collapse();
            return Err(CoreError::new(
                CoreErrorCode::ResolutionInProgress,
                format!("resolution for key {key_str} is already in progress"),
            ));
        }

        let queue_tx = self.queue_tx.lock().expect("queue_tx lock poisoned").clone();
        let Some(queue_tx) = queue_tx else {
            self.in_progress.remove(key_str);
            return Err(CoreError::new(
                CoreErrorCode::Internal,
                "worker pool is shut down",
            ));
        };

        let item = WorkItem {
            ctx: self.pool_ctx.clone(),
            key: key.clone(),
            component: options.component,
            version: options.version,
            repository: options.repository,
        };

        if queue_tx.try_send(item).is_err() {
            self.in_progress.remove(key_str);
            self.stats.record_queue_full();
            return Err(CoreError::new(
                CoreErrorCode::QueueFull,
                format!("work queue is saturated, key {key_str}"),
            ));
        }

        Err(CoreError::new(
            CoreErrorCode::ResolutionInProgress,
            format!("resolution for key {key_str} enqueued"),
        ))
    }

    /// A live snapshot of the pool's counters.
    pub fn stats(&self) -> WorkerPoolStatsSnapshot {
        self.stats.snapshot()
    }

    /// Cancel the pool's lifetime context, close the work queue, and wait
    /// for every worker to drain its remaining buffered items and exit.
    /// Finally closes the completion-event channel.
    ///
    /// Idempotent: calling twice is harmless (the second call observes an
    /// already-empty queue and handle list).
    pub async fn shutdown(&self) {
        self.pool_ctx.cancellation().cancel();
        self.queue_tx.lock().expect("queue_tx lock poisoned").take();

        let handles = std::mem::take(&mut *self.worker_handles.lock().expect("worker_handles lock poisoned"));
        for handle in handles {
            let _ = handle.await;
        }

        self.events_tx.lock().expect("events_tx lock poisoned").take();
    }

    async fn worker_loop(&self, queue_rx: Arc<TokioMutex<mpsc::Receiver<WorkItem>>>) {
        loop {
            let item = {
                let mut rx = queue_rx.lock().await;
                tokio::select! {
                    item = rx.recv() => item,
                    _ = self.pool_ctx.cancellation().cancelled() => {
                        // Shutdown has closed the queue; drain whatever is
                        // already buffered before this worker exits, rather
                        // than racing a buffered item out from under it.
                        rx.try_recv().ok()
                    }
                }
            };
            match item {
                Some(item) => self.process(item).await,
                None => return,
            }
        }
    }

    async fn process(&self, item: WorkItem) {
        let started = std::time::Instant::now();
        let outcome = item
            .repository
            .get_component_version(&item.ctx, &item.component, &item.version)
            .await;
        let elapsed = started.elapsed();
        tracing::debug!(
            key = item.key.as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
            ok = outcome.is_ok(),
            "resolution completed"
        );

        self.cache.put(item.key.as_str().to_string(), outcome).await;

        let requesters = self
            .requesters
            .remove(item.key.as_str())
            .map(|(_, v)| v)
            .unwrap_or_default();
        self.in_progress.remove(item.key.as_str());
        self.stats.record_completed_resolution();

        if !requesters.is_empty() {
            self.emit_completion(CompletionEvent { requesters });
        }
    }

    fn emit_completion(&self, event: CompletionEvent) {
        let tx = self.events_tx.lock().expect("events_tx lock poisoned").clone();
        if let Some(tx) = tx {
            if tx.try_send(event).is_err() {
                self.stats.record_dropped_completion_event();
            }
        }
    }
}
