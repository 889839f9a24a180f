use std::sync::{Arc, RwLock};

use serde_json::Value as Json;
use tracing::instrument;

use flagforge_core::{EvaluationContext, FlagValue, ResolutionDetails, Status};
use flagforge_hooks::Hook;
use flagforge_registry::ProviderRegistry;

use crate::options::EvaluationOptions;
use crate::pipeline::run_pipeline;

/// A typed flag-evaluation facade bound to an optional domain.
///
/// Immutable in identity (name, domain, and the registry it reads from) but
/// mutable in its own hook list and evaluation context; the effective
/// provider is always whatever the registry currently has bound for
/// `domain`.
pub struct Client {
    name: String,
    domain: Option<String>,
    registry: Arc<ProviderRegistry>,
    hooks: RwLock<Vec<Arc<dyn Hook>>>,
    context: RwLock<EvaluationContext>,
}

impl Client {
    pub fn new(name: impl Into<String>, registry: Arc<ProviderRegistry>) -> Self {
        Self {
            name: name.into(),
            domain: None,
            registry,
            hooks: RwLock::new(Vec::new()),
            context: RwLock::new(EvaluationContext::empty()),
        }
    }

    pub fn for_domain(name: impl Into<String>, domain: impl Into<String>, registry: Arc<ProviderRegistry>) -> Self {
        Self {
            name: name.into(),
            domain: Some(domain.into()),
            registry,
            hooks: RwLock::new(Vec::new()),
            context: RwLock::new(EvaluationContext::empty()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn add_hook(&self, hook: Arc<dyn Hook>) {
        self.hooks.write().unwrap().push(hook);
    }

    pub fn hooks(&self) -> Vec<Arc<dyn Hook>> {
        self.hooks.read().unwrap().clone()
    }

    pub fn set_context(&self, ctx: EvaluationContext) {
        *self.context.write().unwrap() = ctx;
    }

    pub fn context(&self) -> EvaluationContext {
        self.context.read().unwrap().clone()
    }

    /// Binding-level status this client's domain currently reports. Gates
    /// every evaluation (`NOT_READY`/`FATAL` short-circuit to the default).
    pub fn state(&self) -> Status {
        self.registry.status(self.domain())
    }

    #[instrument(skip_all, fields(client = %self.name, domain = ?self.domain))]
    pub async fn evaluate_bool(
        &self,
        flag_key: impl AsRef<[u8]>,
        default_value: bool,
        ctx: EvaluationContext,
        opts: EvaluationOptions,
    ) -> ResolutionDetails<bool> {
        run_pipeline(self, flag_key, default_value, ctx, opts).await
    }

    #[instrument(skip_all, fields(client = %self.name, domain = ?self.domain))]
    pub async fn evaluate_string(
        &self,
        flag_key: impl AsRef<[u8]>,
        default_value: String,
        ctx: EvaluationContext,
        opts: EvaluationOptions,
    ) -> ResolutionDetails<String> {
        run_pipeline(self, flag_key, default_value, ctx, opts).await
    }

    #[instrument(skip_all, fields(client = %self.name, domain = ?self.domain))]
    pub async fn evaluate_int(
        &self,
        flag_key: impl AsRef<[u8]>,
        default_value: i64,
        ctx: EvaluationContext,
        opts: EvaluationOptions,
    ) -> ResolutionDetails<i64> {
        run_pipeline(self, flag_key, default_value, ctx, opts).await
    }

    #[instrument(skip_all, fields(client = %self.name, domain = ?self.domain))]
    pub async fn evaluate_float(
        &self,
        flag_key: impl AsRef<[u8]>,
        default_value: f64,
        ctx: EvaluationContext,
        opts: EvaluationOptions,
    ) -> ResolutionDetails<f64> {
        run_pipeline(self, flag_key, default_value, ctx, opts).await
    }

    #[instrument(skip_all, fields(client = %self.name, domain = ?self.domain))]
    pub async fn evaluate_object(
        &self,
        flag_key: impl AsRef<[u8]>,
        default_value: Json,
        ctx: EvaluationContext,
        opts: EvaluationOptions,
    ) -> ResolutionDetails<Json> {
        run_pipeline(self, flag_key, default_value, ctx, opts).await
    }

    /// The one genuinely dynamically-kinded evaluation entry point: always
    /// resolves through the provider's opaque `resolve_object` op and checks
    /// the result's shape against `default_value`'s kind, surfacing
    /// `TYPE_MISMATCH` on disagreement.
    #[instrument(skip_all, fields(client = %self.name, domain = ?self.domain))]
    pub async fn evaluate_generic(
        &self,
        flag_key: impl AsRef<[u8]>,
        default_value: FlagValue,
        ctx: EvaluationContext,
        opts: EvaluationOptions,
    ) -> ResolutionDetails<FlagValue> {
        run_pipeline(self, flag_key, default_value, ctx, opts).await
    }

    /// Forwards to the provider's tracker capability, merging contexts as in
    /// evaluation; a no-op if the provider does not expose tracking.
    #[instrument(skip_all, fields(client = %self.name, event_name = %event_name))]
    pub async fn track(
        &self,
        event_name: &str,
        ctx: EvaluationContext,
        details: flagforge_core::TrackingEventDetails,
    ) {
        let (provider, _hooks, global_ctx) = self.registry.for_evaluation(self.domain());
        let Some(tracker) = provider.as_tracker() else { return };
        let merged = EvaluationContext::merge(&[
            global_ctx,
            crate::transaction::transaction_context().unwrap_or_default(),
            self.context(),
            ctx,
        ]);
        tracker.track(event_name, &merged.flatten(), &details).await;
    }
}
