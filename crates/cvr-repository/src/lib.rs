// SPDX-License-Identifier: MIT OR Apache-2.0
//! cvr-repository
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! The Cache-Backed Repository (§4.G): implements the full repository
//! contract, routing `getComponentVersion` through the Worker Pool and
//! everything else straight through the Repository Resolver.

use async_trait::async_trait;
use cvr_fingerprint::fingerprint;
use cvr_provider::RuleTable;
use cvr_resolver::{Repository, RepositoryResolver};
use cvr_types::{ComponentDescriptor, ComponentIdentity, ConfigHash, CoreError, RepoSpec, RequestContext, RequesterId};
use cvr_worker::{ResolveOptions, WorkerPool};
use std::sync::{Arc, Mutex as StdMutex};

/// Identity used to resolve the adapter's "base" repository for operations
/// that are not keyed by a component name — local resources/sources and
/// health checks (§4.G). Not matched against any rule's pattern directly;
/// it only needs a stable `name` so credential resolution has something to
/// key on.
const BASE_IDENTITY_NAME: &str = "__cvr_base__";

/// Produces the [`RequesterId`] to register for the call currently in
/// flight. Rebound by the embedder once per reconciliation cycle so the
/// right reconciler is woken (§4.G).
pub trait RequesterFn: Fn() -> RequesterId + Send + Sync {}
impl<T: Fn() -> RequesterId + Send + Sync> RequesterFn for T {}

/// Implements the uniform repository contract on top of the Repository
/// Resolver (§4.C) and Worker Pool (§4.E).
pub struct CacheBackedRepository {
    rule_table: Arc<RuleTable>,
    resolver: Arc<RepositoryResolver>,
    pool: Arc<WorkerPool>,
    config_hash: ConfigHash,
    base_repo_spec: RepoSpec,
    requester_fn: StdMutex<Arc<dyn RequesterFn>>,
}

impl CacheBackedRepository {
    /// Build an adapter over an already-constructed resolver and worker
    /// pool. `base_repo_spec` must canonicalise to a spec already present in
    /// `rule_table` (it is resolved the same way any other spec is).
    pub fn new(
        rule_table: Arc<RuleTable>,
        resolver: Arc<RepositoryResolver>,
        pool: Arc<WorkerPool>,
        config_hash: ConfigHash,
        base_repo_spec: RepoSpec,
        requester_fn: Arc<dyn RequesterFn>,
    ) -> Self {
        Self {
            rule_table,
            resolver,
            pool,
            config_hash,
            base_repo_spec,
            requester_fn: StdMutex::new(requester_fn),
        }
    }

    /// Rebind the requester callback, typically once per reconciliation
    /// cycle.
    pub fn set_requester_fn(&self, requester_fn: Arc<dyn RequesterFn>) {
        *self.requester_fn.lock().expect("requester_fn lock poisoned") = requester_fn;
    }

    fn current_requester(&self) -> RequesterId {
        (self.requester_fn.lock().expect("requester_fn lock poisoned"))()
    }

    async fn repository_for_component(
        &self,
        ctx: &RequestContext,
        component: &str,
    ) -> Result<Arc<dyn Repository>, CoreError> {
        let identity = ComponentIdentity::named(component);
        self.resolver.repository_for(ctx, &identity).await
    }

    async fn base_repository(&self, ctx: &RequestContext) -> Result<Arc<dyn Repository>, CoreError> {
        let identity = ComponentIdentity::named(BASE_IDENTITY_NAME);
        self.resolver
            .repository_for_spec(ctx, &self.base_repo_spec, &identity)
            .await
    }
}

#[async_trait]
impl Repository for CacheBackedRepository {
    async fn get_component_version(
        &self,
        ctx: &RequestContext,
        component: &str,
        version: &str,
    ) -> Result<ComponentDescriptor, CoreError> {
        let identity = ComponentIdentity::named(component);
        let repo_spec = self.rule_table.get_repo_spec(&identity)?;
        let repository = self
            .resolver
            .repository_for_spec(ctx, &repo_spec, &identity)
            .await?;

        let config_hash = self.config_hash.clone();
        let component_owned = component.to_string();
        let version_owned = version.to_string();

        self.pool
            .get_component_version(ResolveOptions {
                component: component.to_string(),
                version: version.to_string(),
                repository,
                key_fn: move || {
                    Ok(fingerprint(
                        &config_hash,
                        &repo_spec,
                        &component_owned,
                        &version_owned,
                        None,
                    ))
                },
                requester: self.current_requester(),
            })
            .await
    }

    async fn list_component_versions(
        &self,
        ctx: &RequestContext,
        component: &str,
    ) -> Result<Vec<String>, CoreError> {
        let repository = self.repository_for_component(ctx, component).await?;
        repository.list_component_versions(ctx, component).await
    }

    async fn add_component_version(
        &self,
        ctx: &RequestContext,
        descriptor: &ComponentDescriptor,
    ) -> Result<(), CoreError> {
        let repository = self.repository_for_component(ctx, &descriptor.component).await?;
        repository.add_component_version(ctx, descriptor).await
    }

    async fn get_local_resource(
        &self,
        ctx: &RequestContext,
        reference: &str,
    ) -> Result<Vec<u8>, CoreError> {
        let repository = self.base_repository(ctx).await?;
        repository.get_local_resource(ctx, reference).await
    }

    async fn add_local_resource(
        &self,
        ctx: &RequestContext,
        reference: &str,
        data: &[u8],
    ) -> Result<(), CoreError> {
        let repository = self.base_repository(ctx).await?;
        repository.add_local_resource(ctx, reference, data).await
    }

    async fn get_local_source(
        &self,
        ctx: &RequestContext,
        reference: &str,
    ) -> Result<Vec<u8>, CoreError> {
        let repository = self.base_repository(ctx).await?;
        repository.get_local_source(ctx, reference).await
    }

    async fn add_local_source(
        &self,
        ctx: &RequestContext,
        reference: &str,
        data: &[u8],
    ) -> Result<(), CoreError> {
        let repository = self.base_repository(ctx).await?;
        repository.add_local_source(ctx, reference, data).await
    }

    fn supports_health_check(&self) -> bool {
        true
    }

    async fn check_health(&self, ctx: &RequestContext) -> Result<(), CoreError> {
        let repository = self.base_repository(ctx).await?;
        if !repository.supports_health_check() {
            return Ok(());
        }
        repository.check_health(ctx).await
    }
}
