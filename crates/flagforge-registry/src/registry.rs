use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{info, instrument, warn};

use flagforge_core::{
    config::RuntimeConfig, provider_identity, EvaluationContext, FlagForgeError, NoopProvider,
    OperationContext, Provider, ProviderEvent, ProviderEventType, Result, Status,
};
use flagforge_events::EventExecutor;
use flagforge_hooks::Hook;

use crate::lifecycle::{init_error_code, run_init, run_shutdown};

/// Default binding key, used for the client with no bound domain.
pub const DEFAULT_KEY: &str = "";

/// Provider registry and lifecycle state machine.
///
/// Holds the default and domain-keyed provider bindings, the global hook
/// list, the global evaluation context, and the [`EventExecutor`] that backs
/// status tracking. Always held behind an `Arc` by its owner, mirroring
/// [`EventExecutor`]: background initialization/shutdown tasks need to call
/// back into the registry.
pub struct ProviderRegistry {
    bindings: RwLock<HashMap<String, Arc<dyn Provider>>>,
    executor: Arc<EventExecutor>,
    global_hooks: RwLock<Vec<Arc<dyn Hook>>>,
    global_context: RwLock<EvaluationContext>,
    config: RuntimeConfig,
}

impl ProviderRegistry {
    pub fn new() -> Arc<Self> {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Arc<Self> {
        let executor = EventExecutor::new();
        let mut bindings = HashMap::new();
        let noop: Arc<dyn Provider> = Arc::new(NoopProvider::new());
        executor.bind(DEFAULT_KEY, noop.clone());
        // The no-op provider exposes no lifecycle capability, so per the
        // registry's own init algorithm it is ready immediately; synthesize
        // that event rather than leaving the default binding NOT_READY
        // forever until some caller binds a real provider.
        executor.dispatch(DEFAULT_KEY, ProviderEvent::new(noop.metadata().name, ProviderEventType::Ready));
        bindings.insert(DEFAULT_KEY.to_string(), noop);

        Arc::new(Self {
            bindings: RwLock::new(bindings),
            executor,
            global_hooks: RwLock::new(Vec::new()),
            global_context: RwLock::new(EvaluationContext::empty()),
            config,
        })
    }

    pub fn executor(&self) -> Arc<EventExecutor> {
        self.executor.clone()
    }

    pub fn add_global_hook(&self, hook: Arc<dyn Hook>) {
        self.global_hooks.write().unwrap().push(hook);
    }

    pub fn set_global_context(&self, ctx: EvaluationContext) {
        *self.global_context.write().unwrap() = ctx;
    }

    pub fn global_context(&self) -> EvaluationContext {
        self.global_context.read().unwrap().clone()
    }

    /// Binds the default provider.
    #[instrument(skip(self, provider))]
    pub async fn set_provider(self: &Arc<Self>, provider: Arc<dyn Provider>, wait_for_ready: bool) -> Result<()> {
        self.bind_and_init(DEFAULT_KEY, provider, None, wait_for_ready).await
    }

    /// Binds a provider to a named domain.
    #[instrument(skip(self, provider))]
    pub async fn set_named_provider(
        self: &Arc<Self>,
        domain: &str,
        provider: Arc<dyn Provider>,
        wait_for_ready: bool,
    ) -> Result<()> {
        if domain.is_empty() {
            return Err(FlagForgeError::EmptyDomain);
        }
        self.bind_and_init(domain, provider, None, wait_for_ready).await
    }

    /// Binds the default provider, passing `ctx` through to its `init` hook.
    pub async fn set_provider_with_context(
        self: &Arc<Self>,
        ctx: OperationContext,
        provider: Arc<dyn Provider>,
        wait_for_ready: bool,
    ) -> Result<()> {
        self.bind_and_init(DEFAULT_KEY, provider, Some(ctx), wait_for_ready).await
    }

    /// Binds a provider to a named domain, passing `ctx` through to its
    /// `init` hook.
    pub async fn set_named_provider_with_context(
        self: &Arc<Self>,
        domain: &str,
        ctx: OperationContext,
        provider: Arc<dyn Provider>,
        wait_for_ready: bool,
    ) -> Result<()> {
        if domain.is_empty() {
            return Err(FlagForgeError::EmptyDomain);
        }
        self.bind_and_init(domain, provider, Some(ctx), wait_for_ready).await
    }

    async fn bind_and_init(
        self: &Arc<Self>,
        key: &str,
        provider: Arc<dyn Provider>,
        op_ctx: Option<OperationContext>,
        wait_for_ready: bool,
    ) -> Result<()> {
        // Step 1: swap under the registry's writer lock, then release it
        // before doing anything that could block.
        let old = {
            let mut bindings = self.bindings.write().unwrap();
            bindings.insert(key.to_string(), provider.clone())
        };
        self.executor.bind(key, provider.clone());

        // Step 2: shut the old provider down on a background task unless it
        // is still bound to some other key.
        if let Some(old_provider) = old {
            if !self.is_referenced_elsewhere(&old_provider) {
                let registry = self.clone();
                let deadline = self.config.shutdown_deadline;
                tokio::spawn(async move {
                    if let Err(e) = run_shutdown(&old_provider, None, deadline).await {
                        warn!(error = %e, "rebinding shutdown of superseded provider failed");
                    }
                    drop(registry);
                });
            }
        }

        // Step 3: schedule initialization on a background task.
        let (tx, rx) = tokio::sync::oneshot::channel();
        let key_owned = key.to_string();
        let provider_for_init = provider.clone();
        let executor = self.executor.clone();
        tokio::spawn(async move {
            let result = run_init(&provider_for_init, op_ctx).await;
            let event = match &result {
                Ok(()) => ProviderEvent::new(provider_for_init.metadata().name, ProviderEventType::Ready),
                Err(e) => ProviderEvent::new(provider_for_init.metadata().name, ProviderEventType::Error)
                    .with_error_code(init_error_code(e))
                    .with_message(e.to_string()),
            };
            info!(key = %key_owned, status = ?result.is_ok(), "provider initialization completed");
            executor.dispatch(&key_owned, event);
            let _ = tx.send(result);
        });

        // Step 4: block the caller iff requested.
        if wait_for_ready {
            rx.await.unwrap_or(Ok(()))
        } else {
            Ok(())
        }
    }

    fn is_referenced_elsewhere(&self, provider: &Arc<dyn Provider>) -> bool {
        let id = provider_identity(provider);
        self.bindings.read().unwrap().values().any(|p| provider_identity(p) == id)
    }

    /// Shuts down every uniquely-bound provider. Never fails; errors from
    /// individual providers are logged, not surfaced.
    #[instrument(skip_all)]
    pub async fn shutdown(&self) {
        for provider in self.unique_providers() {
            if let Err(e) = run_shutdown(&provider, None, self.config.shutdown_deadline).await {
                warn!(provider = %provider.metadata().name, error = %e, "provider shutdown failed (swallowed)");
            }
        }
    }

    /// Shuts down every uniquely-bound provider, passing `ctx` through.
    /// Aggregates and returns every provider's shutdown error instead of
    /// swallowing them.
    #[instrument(skip_all)]
    pub async fn shutdown_with_context(&self, ctx: OperationContext) -> Result<()> {
        let mut errors = Vec::new();
        for provider in self.unique_providers() {
            if let Err(e) = run_shutdown(&provider, Some(&ctx), self.config.shutdown_deadline).await {
                errors.push(e);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(FlagForgeError::ShutdownAggregate(errors))
        }
    }

    fn unique_providers(&self) -> Vec<Arc<dyn Provider>> {
        let bindings = self.bindings.read().unwrap();
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for provider in bindings.values() {
            let id = provider_identity(provider);
            if seen.insert(id) {
                out.push(provider.clone());
            }
        }
        out
    }

    pub fn provider_metadata(&self) -> flagforge_core::ProviderMetadata {
        self.named_provider_metadata(DEFAULT_KEY)
    }

    /// Returns the default provider's metadata when `domain` is unknown.
    pub fn named_provider_metadata(&self, domain: &str) -> flagforge_core::ProviderMetadata {
        let bindings = self.bindings.read().unwrap();
        bindings
            .get(domain)
            .or_else(|| bindings.get(DEFAULT_KEY))
            .map(|p| p.metadata())
            .unwrap_or_else(|| flagforge_core::ProviderMetadata::new("No-op Provider"))
    }

    /// Resolves the provider, global hook list, and global evaluation
    /// context used by the client for one evaluation.
    pub fn for_evaluation(&self, domain: Option<&str>) -> (Arc<dyn Provider>, Vec<Arc<dyn Hook>>, EvaluationContext) {
        let key = domain.unwrap_or(DEFAULT_KEY);
        let bindings = self.bindings.read().unwrap();
        let provider = bindings
            .get(key)
            .or_else(|| bindings.get(DEFAULT_KEY))
            .cloned()
            .expect("default binding always present");
        drop(bindings);
        (provider, self.global_hooks.read().unwrap().clone(), self.global_context())
    }

    /// Binding-level status, as last observed via events.
    pub fn status(&self, domain: Option<&str>) -> Status {
        self.executor.status(domain.unwrap_or(DEFAULT_KEY))
    }
}
