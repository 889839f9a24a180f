use std::sync::{Arc, OnceLock};

use flagforge_core::{EvaluationContext, Provider, Result, Status};
use flagforge_client::{Client, EvaluationOptions};
use flagforge_hooks::Hook;
use flagforge_registry::ProviderRegistry;

/// A standalone evaluation runtime: a registry plus one default client bound
/// to it. Most applications want exactly one of these per process, which is
/// what the free functions below provide via [`runtime`]; construct one
/// directly when you need an isolated runtime instead, e.g. in a test.
pub struct Runtime {
    registry: Arc<ProviderRegistry>,
    client: Client,
}

impl Runtime {
    pub fn new() -> Self {
        let registry = ProviderRegistry::new();
        let client = Client::new("flagforge", registry.clone());
        Self { registry, client }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// The process-wide runtime, created on first access.
pub fn runtime() -> &'static Runtime {
    RUNTIME.get_or_init(Runtime::new)
}

/// The default client bound to the process-wide runtime.
pub fn client() -> &'static Client {
    runtime().client()
}

pub async fn set_provider(provider: Arc<dyn Provider>, wait_for_ready: bool) -> Result<()> {
    runtime().registry().clone().set_provider(provider, wait_for_ready).await
}

pub async fn set_named_provider(domain: &str, provider: Arc<dyn Provider>, wait_for_ready: bool) -> Result<()> {
    runtime().registry().clone().set_named_provider(domain, provider, wait_for_ready).await
}

pub fn add_global_hook(hook: Arc<dyn Hook>) {
    runtime().registry().add_global_hook(hook);
}

pub fn set_global_context(ctx: EvaluationContext) {
    runtime().registry().set_global_context(ctx);
}

pub fn status(domain: Option<&str>) -> Status {
    runtime().registry().status(domain)
}

pub async fn shutdown() {
    runtime().registry().shutdown().await;
}

/// A client bound to `domain` off the process-wide runtime's registry,
/// independent of the default client returned by [`client`].
pub fn client_for_domain(name: impl Into<String>, domain: impl Into<String>) -> Client {
    Client::for_domain(name, domain, runtime().registry().clone())
}

pub(crate) fn default_options() -> EvaluationOptions {
    EvaluationOptions::new()
}
