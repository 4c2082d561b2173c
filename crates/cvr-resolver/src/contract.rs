// SPDX-License-Identifier: MIT OR Apache-2.0
//! The external contracts the resolver consumes and the one it produces.
//!
//! §6 "Consumed external contracts" items 1–3: the repository contract
//! itself, the repository factory, and the credential graph.

use async_trait::async_trait;
use cvr_types::{ComponentDescriptor, CoreError, RepoSpec, RequestContext};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The uniform repository contract every concrete backend (OCI, CTF, ...)
/// presents to the core. The core never knows which concrete backend it is
/// talking to.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Fetch a single component version's descriptor.
    ///
    /// `NOT_FOUND` must be distinguishable from other failures — implementors
    /// signal this with [`CoreError`]'s `UPSTREAM_NOT_FOUND` code.
    async fn get_component_version(
        &self,
        ctx: &RequestContext,
        component: &str,
        version: &str,
    ) -> Result<ComponentDescriptor, CoreError>;

    /// List all known versions of `component`. Never cached by the core
    /// (§4.E "List operations") — callers need fresh liveness.
    async fn list_component_versions(
        &self,
        ctx: &RequestContext,
        component: &str,
    ) -> Result<Vec<String>, CoreError>;

    /// Publish a new component version.
    async fn add_component_version(
        &self,
        ctx: &RequestContext,
        descriptor: &ComponentDescriptor,
    ) -> Result<(), CoreError>;

    /// Fetch a local resource blob by reference.
    async fn get_local_resource(
        &self,
        ctx: &RequestContext,
        reference: &str,
    ) -> Result<Vec<u8>, CoreError>;

    /// Store a local resource blob under `reference`.
    async fn add_local_resource(
        &self,
        ctx: &RequestContext,
        reference: &str,
        data: &[u8],
    ) -> Result<(), CoreError>;

    /// Fetch a local source blob by reference.
    async fn get_local_source(
        &self,
        ctx: &RequestContext,
        reference: &str,
    ) -> Result<Vec<u8>, CoreError>;

    /// Store a local source blob under `reference`.
    async fn add_local_source(
        &self,
        ctx: &RequestContext,
        reference: &str,
        data: &[u8],
    ) -> Result<(), CoreError>;

    /// Returns `true` if this backend implements a real health check.
    ///
    /// Defaults to `false`; the cache-backed adapter (§4.G) treats a
    /// backend that answers `false` here as trivially healthy instead of
    /// calling [`check_health`](Self::check_health).
    fn supports_health_check(&self) -> bool {
        false
    }

    /// Perform a backend-specific health check.
    ///
    /// Only called when [`supports_health_check`](Self::supports_health_check)
    /// returns `true`.
    async fn check_health(&self, _ctx: &RequestContext) -> Result<(), CoreError> {
        Ok(())
    }
}

impl std::fmt::Debug for dyn Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Repository")
    }
}

/// Opaque credential bag resolved for a consumer identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials(BTreeMap<String, String>);

impl Credentials {
    /// The empty credential set — used when the credential graph reports
    /// `NOT_FOUND`, which is non-fatal per §4.C.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build credentials from a key-value map.
    pub fn from_map(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }

    /// Look up a credential field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns `true` if no credentials are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Errors from the credential graph, distinguishing the non-fatal
/// "not found" case from everything else (§4.C "Failure modes").
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// No credentials exist for this consumer. Non-fatal: the resolver
    /// proceeds with [`Credentials::empty`].
    #[error("no credentials found for consumer")]
    NotFound,
    /// Any other credential-graph failure. Fatal: surfaced to the caller.
    #[error(transparent)]
    Other(#[from] CoreError),
}

/// The external credential graph (§6 item 3).
#[async_trait]
pub trait CredentialGraph: Send + Sync {
    /// Resolve credentials for the given consumer identity.
    async fn resolve(
        &self,
        ctx: &RequestContext,
        consumer: &cvr_types::ComponentIdentity,
    ) -> Result<Credentials, CredentialError>;
}

/// The external repository factory (§6 item 2): materialises a concrete
/// [`Repository`] handle from a spec and resolved credentials.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Construct a repository handle for `spec`.
    async fn create(
        &self,
        ctx: &RequestContext,
        spec: &RepoSpec,
        credentials: &Credentials,
    ) -> Result<Arc<dyn Repository>, CoreError>;
}
