// SPDX-License-Identifier: MIT OR Apache-2.0
//! Repository Resolver (§4.C): lazy, memoised materialisation of repository
//! handles from compiled rules.

use crate::contract::{CredentialError, CredentialGraph, Credentials, Repository, RepositoryFactory};
use cvr_provider::RuleTable;
use cvr_types::{ComponentIdentity, CoreError, CoreErrorCode, RepoSpec, RequestContext};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Resolves `(component, version)` pairs to repository handles, materialising
/// each distinct canonical `repoSpec` at most once and reusing the handle for
/// every subsequent caller (§4.C "Behaviour").
///
/// Credentials are resolved once per canonical spec, using the identity of
/// whichever caller first causes that spec to be materialised; later callers
/// for the same spec never re-resolve credentials, since the handle is
/// already cached. This follows from the map being append-only for the
/// resolver's lifetime (no invalidation path exists in this core — see spec
/// Non-goals).
pub struct RepositoryResolver {
    rule_table: Arc<RuleTable>,
    factory: Arc<dyn RepositoryFactory>,
    credentials: Arc<dyn CredentialGraph>,
    handles: RwLock<HashMap<String, Arc<dyn Repository>>>,
}

impl RepositoryResolver {
    /// Build a resolver over a compiled rule table, a factory, and a
    /// credential graph.
    pub fn new(
        rule_table: Arc<RuleTable>,
        factory: Arc<dyn RepositoryFactory>,
        credentials: Arc<dyn CredentialGraph>,
    ) -> Self {
        Self {
            rule_table,
            factory,
            credentials,
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve the repository handle for a component identity, looking up
    /// its `repoSpec` via the rule table first.
    ///
    /// # Errors
    ///
    /// Propagates the rule table's `MALFORMED_IDENTITY`/`NOT_FOUND`, or any
    /// error from credential resolution / factory construction.
    pub async fn repository_for(
        &self,
        ctx: &RequestContext,
        identity: &ComponentIdentity,
    ) -> Result<Arc<dyn Repository>, CoreError> {
        let spec = self.rule_table.get_repo_spec(identity)?;
        self.materialize(ctx, &spec, identity).await
    }

    /// Resolve the repository handle for an explicit `repoSpec`.
    ///
    /// The spec is only admitted if it canonicalises to one already reachable
    /// through a configured rule (§4.C "spec-injection guard") — otherwise
    /// this returns `NOT_FOUND` without ever invoking the factory.
    pub async fn repository_for_spec(
        &self,
        ctx: &RequestContext,
        spec: &RepoSpec,
        identity: &ComponentIdentity,
    ) -> Result<Arc<dyn Repository>, CoreError> {
        if !self.rule_table.contains_spec(spec) {
            return Err(CoreError::new(
                CoreErrorCode::NotFound,
                "repo spec is not reachable through any configured rule",
            ));
        }
        self.materialize(ctx, spec, identity).await
    }

    async fn materialize(
        &self,
        ctx: &RequestContext,
        spec: &RepoSpec,
        identity: &ComponentIdentity,
    ) -> Result<Arc<dyn Repository>, CoreError> {
        let key = spec.canonical_string();

        if let Some(handle) = self.handles.read().await.get(&key) {
            return Ok(Arc::clone(handle));
        }

        let mut handles = self.handles.write().await;
        if let Some(handle) = handles.get(&key) {
            return Ok(Arc::clone(handle));
        }

        let credentials = match self.credentials.resolve(ctx, identity).await {
            Ok(creds) => creds,
            Err(CredentialError::NotFound) => {
                tracing::debug!(
                    spec = %spec,
                    "no credentials found for repo spec's consumer, proceeding with none"
                );
                Credentials::empty()
            }
            Err(CredentialError::Other(err)) => return Err(err),
        };

        let handle = self.factory.create(ctx, spec, &credentials).await?;
        handles.insert(key, Arc::clone(&handle));
        tracing::debug!(spec = %spec, "materialised repository handle");
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::Repository as RepositoryTrait;
    use async_trait::async_trait;
    use cvr_types::ComponentDescriptor;
    use cvr_types::Rule;
    use serde_json::Map;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubRepository;

    #[async_trait]
    impl RepositoryTrait for StubRepository {
        async fn get_component_version(
            &self,
            _ctx: &RequestContext,
            component: &str,
            version: &str,
        ) -> Result<ComponentDescriptor, CoreError> {
            Ok(ComponentDescriptor::new(component, version))
        }

        async fn list_component_versions(
            &self,
            _ctx: &RequestContext,
            _component: &str,
        ) -> Result<Vec<String>, CoreError> {
            Ok(Vec::new())
        }

        async fn add_component_version(
            &self,
            _ctx: &RequestContext,
            _descriptor: &ComponentDescriptor,
        ) -> Result<(), CoreError> {
            Ok(())
        }

        async fn get_local_resource(
            &self,
            _ctx: &RequestContext,
            _reference: &str,
        ) -> Result<Vec<u8>, CoreError> {
            Ok(Vec::new())
        }

        async fn add_local_resource(
            &self,
            _ctx: &RequestContext,
            _reference: &str,
            _data: &[u8],
        ) -> Result<(), CoreError> {
            Ok(())
        }

        async fn get_local_source(
            &self,
            _ctx: &RequestContext,
            _reference: &str,
        ) -> Result<Vec<u8>, CoreError> {
            Ok(Vec::new())
        }

        async fn add_local_source(
            &self,
            _ctx: &RequestContext,
            _reference: &str,
            _data: &[u8],
        ) -> Result<(), CoreError> {
            Ok(())
        }
    }

    struct CountingFactory {
        calls: AtomicUsize,
    }

    impl CountingFactory {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RepositoryFactory for CountingFactory {
        async fn create(
            &self,
            _ctx: &RequestContext,
            _spec: &RepoSpec,
            _credentials: &Credentials,
        ) -> Result<Arc<dyn Repository>, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(StubRepository))
        }
    }

    struct NotFoundCredentials;

    #[async_trait]
    impl CredentialGraph for NotFoundCredentials {
        async fn resolve(
            &self,
            _ctx: &RequestContext,
            _consumer: &ComponentIdentity,
        ) -> Result<Credentials, CredentialError> {
            Err(CredentialError::NotFound)
        }
    }

    struct FailingCredentials;

    #[async_trait]
    impl CredentialGraph for FailingCredentials {
        async fn resolve(
            &self,
            _ctx: &RequestContext,
            _consumer: &ComponentIdentity,
        ) -> Result<Credentials, CredentialError> {
            Err(CredentialError::Other(CoreError::new(
                CoreErrorCode::CredentialError,
                "credential backend unreachable",
            )))
        }
    }

    fn spec(kind: &str) -> RepoSpec {
        RepoSpec::new(kind, Map::new())
    }

    fn table_with(kind: &str) -> Arc<RuleTable> {
        Arc::new(RuleTable::compile([Rule::new("example.com/*", spec(kind))]).unwrap())
    }

    #[tokio::test]
    async fn repository_for_materialises_lazily_and_only_once() {
        let factory = Arc::new(CountingFactory::new());
        let resolver = RepositoryResolver::new(
            table_with("oci"),
            factory.clone(),
            Arc::new(NotFoundCredentials),
        );
        let ctx = RequestContext::background();
        let identity = ComponentIdentity::named("example.com/foo");

        resolver.repository_for(&ctx, &identity).await.unwrap();
        resolver.repository_for(&ctx, &identity).await.unwrap();

        assert_eq!(factory.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn credential_not_found_proceeds_with_empty_credentials() {
        let factory = Arc::new(CountingFactory::new());
        let resolver = RepositoryResolver::new(
            table_with("oci"),
            factory,
            Arc::new(NotFoundCredentials),
        );
        let ctx = RequestContext::background();
        let identity = ComponentIdentity::named("example.com/foo");

        let handle = resolver.repository_for(&ctx, &identity).await;
        assert!(handle.is_ok());
    }

    #[tokio::test]
    async fn other_credential_errors_are_fatal() {
        let factory = Arc::new(CountingFactory::new());
        let resolver =
            RepositoryResolver::new(table_with("oci"), factory, Arc::new(FailingCredentials));
        let ctx = RequestContext::background();
        let identity = ComponentIdentity::named("example.com/foo");

        let err = resolver.repository_for(&ctx, &identity).await.unwrap_err();
        assert_eq!(err.code, CoreErrorCode::CredentialError);
    }

    #[tokio::test]
    async fn repository_for_spec_rejects_specs_outside_the_rule_table() {
        let factory = Arc::new(CountingFactory::new());
        let resolver = RepositoryResolver::new(
            table_with("oci"),
            factory.clone(),
            Arc::new(NotFoundCredentials),
        );
        let ctx = RequestContext::background();
        let identity = ComponentIdentity::named("example.com/foo");
        let injected = spec("ctf");

        let err = resolver
            .repository_for_spec(&ctx, &injected, &identity)
            .await
            .unwrap_err();
        assert_eq!(err.code, CoreErrorCode::NotFound);
        assert_eq!(factory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn repository_for_spec_admits_specs_present_in_the_rule_table() {
        let factory = Arc::new(CountingFactory::new());
        let resolver = RepositoryResolver::new(
            table_with("oci"),
            factory,
            Arc::new(NotFoundCredentials),
        );
        let ctx = RequestContext::background();
        let identity = ComponentIdentity::named("example.com/foo");

        let admitted = spec("oci");
        assert!(resolver
            .repository_for_spec(&ctx, &admitted, &identity)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn concurrent_first_touches_for_the_same_spec_produce_a_single_handle() {
        let factory = Arc::new(CountingFactory::new());
        let resolver = Arc::new(RepositoryResolver::new(
            table_with("oci"),
            factory.clone(),
            Arc::new(NotFoundCredentials),
        ));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let resolver = Arc::clone(&resolver);
            tasks.push(tokio::spawn(async move {
                let ctx = RequestContext::background();
                let identity = ComponentIdentity::named("example.com/foo");
                resolver.repository_for(&ctx, &identity).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(factory.calls.load(Ordering::SeqCst), 1);
    }
}
