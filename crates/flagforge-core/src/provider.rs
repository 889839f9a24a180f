use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value as Json;
use tokio::sync::{broadcast, Notify};

use crate::context::FlattenedContext;
use crate::error::{FlagForgeError, Result};
use crate::resolution::ResolutionDetails;
use crate::status::ProviderEvent;
use crate::value::AttributeValue;

/// Stable metadata describing a provider.
///
/// `name` is the sole authoritative field; there is no separate `domain`
/// alias to keep in sync with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMetadata {
    pub name: String,
}

impl ProviderMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A cancellation/timeout handle threaded into context-aware lifecycle and
/// resolve operations.
///
/// Rust has no ambient `context.Context` equivalent, so this is the explicit
/// handle: a deadline plus a cooperative cancel signal. `init`/`shutdown` use
/// their own [`OperationContext`]; the hook chain itself is never cancelled
/// mid-call.
#[derive(Clone)]
pub struct OperationContext {
    deadline: Option<Instant>,
    cancel: Arc<Notify>,
    canceled: Arc<std::sync::atomic::AtomicBool>,
}

impl OperationContext {
    pub fn new() -> Self {
        Self {
            deadline: None,
            cancel: Arc::new(Notify::new()),
            canceled: Arc::new(std::sync::atomic::AtomicBool::new(false)),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            ..Self::new()
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.canceled.store(true, std::sync::atomic::Ordering::SeqCst);
        self.cancel.notify_waiters();
    }

    /// Race `fut` against this context's deadline/cancellation.
    ///
    /// Returns `InitDeadlineExceeded`/`InitCanceled` if the context fires
    /// before `fut` completes.
    pub async fn race<T>(&self, fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
        let cancel = self.cancel.clone();
        let canceled_flag = self.canceled.clone();
        let wait_cancel = async {
            if canceled_flag.load(std::sync::atomic::Ordering::SeqCst) {
                return;
            }
            cancel.notified().await;
        };

        match self.deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                tokio::select! {
                    res = fut => res,
                    _ = tokio::time::sleep(remaining) => Err(FlagForgeError::InitDeadlineExceeded),
                    _ = wait_cancel => Err(FlagForgeError::InitCanceled),
                }
            }
            None => {
                tokio::select! {
                    res = fut => res,
                    _ = wait_cancel => Err(FlagForgeError::InitCanceled),
                }
            }
        }
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Optional lifecycle capability: `init`/`shutdown` without a cancellation
/// handle.
#[async_trait]
pub trait LifecycleAware: Send + Sync {
    async fn init(&self) -> Result<()>;
    async fn shutdown(&self);
}

/// Optional lifecycle capability: context-aware `init`/`shutdown` that honor
/// an [`OperationContext`].
#[async_trait]
pub trait ContextAwareLifecycle: Send + Sync {
    async fn init_with_context(&self, ctx: &OperationContext) -> Result<()>;
    async fn shutdown_with_context(&self, ctx: &OperationContext) -> Result<()>;
}

/// Optional event-source capability: a one-way stream of provider events.
///
/// `subscribe` hands back a fresh `broadcast::Receiver`; the event executor
/// calls it at most once per provider, so a single internal sender is enough
/// even though `broadcast` itself supports many.
pub trait EventSource: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// Details passed to a [`Tracker`] call.
#[derive(Debug, Clone, Default)]
pub struct TrackingEventDetails {
    pub value: Option<f64>,
    pub attributes: HashMap<String, AttributeValue>,
}

/// Optional tracker capability: receives named tracking calls.
#[async_trait]
pub trait Tracker: Send + Sync {
    async fn track(&self, event_name: &str, ctx: &FlattenedContext, details: &TrackingEventDetails);
}

/// The provider contract.
///
/// Required: `metadata()` plus one typed resolve op per flag type. Optional
/// capabilities are detected at registration time via the `as_*` accessor
/// methods below, each defaulting to `None` — a capability-accessor pattern
/// instead of a runtime `dyn Any` downcast.
#[async_trait]
pub trait Provider: Send + Sync {
    fn metadata(&self) -> ProviderMetadata;

    async fn resolve_bool(
        &self,
        flag_key: &str,
        default_value: bool,
        ctx: &FlattenedContext,
    ) -> ResolutionDetails<bool>;

    async fn resolve_string(
        &self,
        flag_key: &str,
        default_value: String,
        ctx: &FlattenedContext,
    ) -> ResolutionDetails<String>;

    async fn resolve_int(
        &self,
        flag_key: &str,
        default_value: i64,
        ctx: &FlattenedContext,
    ) -> ResolutionDetails<i64>;

    async fn resolve_float(
        &self,
        flag_key: &str,
        default_value: f64,
        ctx: &FlattenedContext,
    ) -> ResolutionDetails<f64>;

    async fn resolve_object(
        &self,
        flag_key: &str,
        default_value: Json,
        ctx: &FlattenedContext,
    ) -> ResolutionDetails<Json>;

    fn as_lifecycle(&self) -> Option<&dyn LifecycleAware> {
        None
    }

    fn as_context_aware_lifecycle(&self) -> Option<&dyn ContextAwareLifecycle> {
        None
    }

    fn as_event_source(&self) -> Option<&dyn EventSource> {
        None
    }

    fn as_tracker(&self) -> Option<&dyn Tracker> {
        None
    }
}

/// A stable surrogate for provider identity, answering "is this provider
/// bound elsewhere." `Arc`-held trait objects give us a real pointer-equality
/// primitive via [`Arc::as_ptr`], so we use that directly rather than
/// inventing a surrogate key; see DESIGN.md for the writeup.
pub fn provider_identity(provider: &Arc<dyn Provider>) -> usize {
    Arc::as_ptr(provider) as *const () as usize
}
