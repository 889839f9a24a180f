use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use futures_util::future::join_all;
use serde_json::Value as Json;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::instrument;

use flagforge_core::{
    status_from_event, status_from_init_result, ContextAwareLifecycle, EvaluationContext,
    EventSource, FlagForgeError, FlagValue, FlattenedContext, LifecycleAware, OperationContext,
    Provider, ProviderEvent, ProviderEventType, ProviderMetadata, Result, ResolutionDetails,
    Status, Tracker, TrackingEventDetails,
};
use flagforge_hooks::{ClientMetadata, FlagType, Hook, HookContext, HookHints};

use crate::status::StatusTracker;
use crate::strategy;
use crate::types::{Strategy, SubProvider};

struct EventForward {
    run: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl Drop for EventForward {
    fn drop(&mut self) {
        self.run.store(false, Ordering::SeqCst);
        self.task.abort();
    }
}

/// Combines several named sub-providers behind a single [`Provider`],
/// dispatching each evaluation through a configured [`Strategy`] and folding
/// sub-provider status/events into one aggregate stream.
pub struct MultiProvider {
    subs: Vec<SubProvider>,
    strategy: Strategy,
    global_hooks: Vec<Arc<dyn Hook>>,
    status: StatusTracker,
    outbound: broadcast::Sender<ProviderEvent>,
    forwarders: RwLock<Vec<EventForward>>,
}

impl MultiProvider {
    pub(crate) fn new(subs: Vec<SubProvider>, strategy: Strategy, global_hooks: Vec<Arc<dyn Hook>>) -> Arc<Self> {
        let (outbound, _rx) = broadcast::channel(256);
        let status = StatusTracker::new(subs.iter().map(|s| s.name.clone()));
        let this = Arc::new(Self {
            subs,
            strategy,
            global_hooks,
            status,
            outbound,
            forwarders: RwLock::new(Vec::new()),
        });
        this.spawn_event_forwarders();
        this
    }

    fn spawn_event_forwarders(self: &Arc<Self>) {
        let mut forwarders = Vec::new();
        for sub in &self.subs {
            let Some(source) = sub.provider.as_event_source() else { continue };
            let mut receiver = source.subscribe();
            let run = Arc::new(AtomicBool::new(true));
            let run_for_task = run.clone();
            let this = self.clone();
            let name = sub.name.clone();
            let task = tokio::spawn(async move {
                while run_for_task.load(Ordering::SeqCst) {
                    match receiver.recv().await {
                        Ok(event) => this.handle_sub_event(&name, event),
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            });
            forwarders.push(EventForward { run, task });
        }
        *self.forwarders.write().unwrap() = forwarders;
    }

    /// Folds one sub-provider's event into the aggregate status and
    /// republishes it, tagged with the sub-provider's name, whenever the
    /// overall status actually moves or the event is a configuration change
    /// (which never carries a status transition of its own but still needs
    /// to reach subscribers watching for flag changes).
    fn handle_sub_event(&self, name: &str, event: ProviderEvent) {
        let before = self.status.overall();
        let after = self.status.record(name, status_from_event(&event));
        if after != before || event.event_type == ProviderEventType::ConfigurationChanged {
            let mut tagged = event;
            tagged.provider_name = format!("{} ({name})", tagged.provider_name);
            let _ = self.outbound.send(tagged);
        }
    }

    fn build_hook_ctx(&self, flag_key: &str, flag_type: FlagType, default_value: FlagValue, ctx: &FlattenedContext) -> HookContext {
        HookContext {
            flag_key: flag_key.to_string(),
            flag_type,
            default_value,
            client_metadata: ClientMetadata { name: self.metadata().name, domain: None },
            provider_metadata: self.metadata(),
            evaluation_context: evaluation_context_from_flattened(ctx),
        }
    }
}

fn evaluation_context_from_flattened(ctx: &FlattenedContext) -> EvaluationContext {
    EvaluationContext::new(ctx.targeting_key().unwrap_or_default(), ctx.as_map().clone())
}

#[async_trait]
impl Provider for MultiProvider {
    fn metadata(&self) -> ProviderMetadata {
        let mut names: Vec<&str> = self.subs.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        let inner = names.iter().map(|n| format!("name: {n}")).collect::<Vec<_>>().join(", ");
        ProviderMetadata::new(format!("MultiProvider {{{inner}}}"))
    }

    #[instrument(skip_all, fields(flag_key = %flag_key))]
    async fn resolve_bool(&self, flag_key: &str, default_value: bool, ctx: &FlattenedContext) -> ResolutionDetails<bool> {
        let hook_ctx = self.build_hook_ctx(flag_key, FlagType::Bool, FlagValue::Bool(default_value), ctx);
        strategy::resolve(&self.strategy, &self.subs, &self.global_hooks, flag_key, default_value, &hook_ctx, &HookHints::new()).await
    }

    async fn resolve_string(&self, flag_key: &str, default_value: String, ctx: &FlattenedContext) -> ResolutionDetails<String> {
        let hook_ctx = self.build_hook_ctx(flag_key, FlagType::String, FlagValue::String(default_value.clone()), ctx);
        strategy::resolve(&self.strategy, &self.subs, &self.global_hooks, flag_key, default_value, &hook_ctx, &HookHints::new()).await
    }

    async fn resolve_int(&self, flag_key: &str, default_value: i64, ctx: &FlattenedContext) -> ResolutionDetails<i64> {
        let hook_ctx = self.build_hook_ctx(flag_key, FlagType::Int, FlagValue::Int(default_value), ctx);
        strategy::resolve(&self.strategy, &self.subs, &self.global_hooks, flag_key, default_value, &hook_ctx, &HookHints::new()).await
    }

    async fn resolve_float(&self, flag_key: &str, default_value: f64, ctx: &FlattenedContext) -> ResolutionDetails<f64> {
        let hook_ctx = self.build_hook_ctx(flag_key, FlagType::Float, FlagValue::Float(default_value), ctx);
        strategy::resolve(&self.strategy, &self.subs, &self.global_hooks, flag_key, default_value, &hook_ctx, &HookHints::new()).await
    }

    async fn resolve_object(&self, flag_key: &str, default_value: Json, ctx: &FlattenedContext) -> ResolutionDetails<Json> {
        let hook_ctx = self.build_hook_ctx(flag_key, FlagType::Object, FlagValue::Object(default_value.clone()), ctx);
        strategy::resolve(&self.strategy, &self.subs, &self.global_hooks, flag_key, default_value, &hook_ctx, &HookHints::new()).await
    }

    fn as_lifecycle(&self) -> Option<&dyn LifecycleAware> {
        Some(self)
    }

    fn as_event_source(&self) -> Option<&dyn EventSource> {
        Some(self)
    }

    fn as_tracker(&self) -> Option<&dyn Tracker> {
        Some(self)
    }
}

#[async_trait]
impl LifecycleAware for MultiProvider {
    #[instrument(skip_all, fields(sub_providers = self.subs.len()))]
    async fn init(&self) -> Result<()> {
        let results = join_all(self.subs.iter().map(|sub| async move {
            let outcome = if let Some(lifecycle) = sub.provider.as_lifecycle() {
                lifecycle.init().await
            } else if let Some(ctx_lifecycle) = sub.provider.as_context_aware_lifecycle() {
                ctx_lifecycle.init_with_context(&OperationContext::new()).await
            } else {
                Ok(())
            };
            self.status.record(&sub.name, status_from_init_result(&outcome));
            outcome
        }))
        .await;

        let errors: Vec<FlagForgeError> = results.into_iter().filter_map(|r| r.err()).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(FlagForgeError::InitAggregate(errors))
        }
    }

    #[instrument(skip_all, fields(sub_providers = self.subs.len()))]
    async fn shutdown(&self) {
        self.forwarders.write().unwrap().clear();
        join_all(self.subs.iter().map(|sub| async move {
            if let Some(lifecycle) = sub.provider.as_lifecycle() {
                lifecycle.shutdown().await;
            } else if let Some(ctx_lifecycle) = sub.provider.as_context_aware_lifecycle() {
                let _ = ctx_lifecycle.shutdown_with_context(&OperationContext::new()).await;
            }
            self.status.record(&sub.name, Status::NotReady);
        }))
        .await;
    }
}

impl EventSource for MultiProvider {
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.outbound.subscribe()
    }
}

#[async_trait]
impl Tracker for MultiProvider {
    async fn track(&self, event_name: &str, ctx: &FlattenedContext, details: &TrackingEventDetails) {
        join_all(self.subs.iter().filter_map(|sub| {
            sub.provider.as_tracker().map(|tracker| async move {
                tracker.track(event_name, ctx, details).await;
            })
        }))
        .await;
    }
}

/// Ergonomic construction of a [`MultiProvider`], mirroring the client
/// facade's builder style.
#[derive(Default)]
pub struct MultiProviderBuilder {
    subs: Vec<SubProvider>,
    global_hooks: Vec<Arc<dyn Hook>>,
    fallback: Option<Arc<dyn Provider>>,
    comparator: Option<crate::types::Comparator>,
}

impl MultiProviderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sub_provider(mut self, name: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        self.subs.push(SubProvider::new(name, provider));
        self
    }

    pub fn with_provider_hooks(mut self, name: &str, hooks: Vec<Arc<dyn Hook>>) -> Self {
        if let Some(sub) = self.subs.iter_mut().find(|s| s.name == name) {
            sub.hooks = hooks;
        }
        self
    }

    pub fn with_global_hooks(mut self, hooks: Vec<Arc<dyn Hook>>) -> Self {
        self.global_hooks = hooks;
        self
    }

    pub fn with_fallback_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.fallback = Some(provider);
        self
    }

    pub fn with_comparator(mut self, comparator: crate::types::Comparator) -> Self {
        self.comparator = Some(comparator);
        self
    }

    pub fn build(self, strategy_kind: MultiStrategyKind) -> std::result::Result<Arc<MultiProvider>, FlagForgeError> {
        let strategy = match strategy_kind {
            MultiStrategyKind::FirstMatch => Strategy::FirstMatch,
            MultiStrategyKind::FirstSuccess => Strategy::FirstSuccess,
            MultiStrategyKind::Comparison => Strategy::Comparison { fallback: self.fallback, comparator: self.comparator },
            MultiStrategyKind::Custom(f) => Strategy::Custom(f),
        };
        crate::types::validate(&self.subs, &strategy)?;
        Ok(MultiProvider::new(self.subs, strategy, self.global_hooks))
    }
}

/// Selects which [`Strategy`] variant [`MultiProviderBuilder::build`]
/// constructs, without requiring the caller to pre-assemble fallback and
/// comparator fields by hand for every kind.
pub enum MultiStrategyKind {
    FirstMatch,
    FirstSuccess,
    Comparison,
    Custom(crate::types::CustomStrategyFn),
}
