use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use flagforge_core::{
    event_type_matches_status, provider_identity, status_from_event, Provider, ProviderEvent,
    ProviderEventType, Status,
};

use crate::handler::{EventHandler, HandlerId};

struct Subscription {
    run: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run.store(false, Ordering::SeqCst);
        self.task.abort();
    }
}

type HandlerList = Vec<(HandlerId, Arc<dyn EventHandler>)>;

/// De-duplicates upstream provider event subscriptions and fans events out to
/// API- and domain-scoped handler registries, replaying current state to late
/// subscribers.
///
/// Always held behind an `Arc` by its owner (see [`EventExecutor::bind`]):
/// the consumer task spawned for a provider's event channel needs to call
/// back into the executor to dispatch to every key currently bound to that
/// provider, not just the key that triggered the subscription.
#[derive(Default)]
pub struct EventExecutor {
    api_handlers: DashMap<ProviderEventType, HandlerList>,
    domain_handlers: DashMap<String, DashMap<ProviderEventType, HandlerList>>,
    key_to_provider: DashMap<String, Arc<dyn Provider>>,
    states: DashMap<String, Status>,
    subscriptions: DashMap<usize, Subscription>,
    next_id: AtomicU64,
}

impl EventExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn status(&self, key: &str) -> Status {
        self.states.get(key).map(|s| *s).unwrap_or(Status::NotReady)
    }

    /// Bind `key` ("" for default, else a domain name) to `provider`.
    ///
    /// If `key` previously pointed at a different provider that is now
    /// unreferenced, its subscription is torn down. If `provider` is not
    /// already subscribed and exposes an event source, a consumer task is
    /// started that forwards every event, stamped with the key and provider
    /// name, to every key currently bound to this provider. A provider is
    /// subscribed to at most once regardless of how many keys reference it.
    pub fn bind(self: &Arc<Self>, key: &str, provider: Arc<dyn Provider>) {
        let new_id = provider_identity(&provider);
        let old = self.key_to_provider.insert(key.to_string(), provider.clone());
        self.states.insert(key.to_string(), Status::NotReady);

        if let Some(old_provider) = old {
            let old_id = provider_identity(&old_provider);
            if old_id != new_id && !self.is_referenced(old_id) {
                self.unsubscribe(old_id);
            }
        }

        if self.subscriptions.contains_key(&new_id) {
            return;
        }
        let Some(source) = provider.as_event_source() else {
            return;
        };
        let mut receiver = source.subscribe();
        let run = Arc::new(AtomicBool::new(true));
        let run_for_task = run.clone();
        let executor = self.clone();
        let task = tokio::spawn(async move {
            while run_for_task.load(Ordering::SeqCst) {
                match receiver.recv().await {
                    Ok(event) => executor.dispatch_to_all_bound_keys(new_id, event),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        self.subscriptions.insert(new_id, Subscription { run, task });
    }

    fn is_referenced(&self, id: usize) -> bool {
        self.key_to_provider.iter().any(|e| provider_identity(e.value()) == id)
    }

    fn unsubscribe(&self, id: usize) {
        self.subscriptions.remove(&id);
    }

    fn dispatch_to_all_bound_keys(&self, provider_id: usize, event: ProviderEvent) {
        let keys: Vec<String> = self
            .key_to_provider
            .iter()
            .filter(|e| provider_identity(e.value()) == provider_id)
            .map(|e| e.key().clone())
            .collect();
        for key in keys {
            self.dispatch(&key, event.clone());
        }
    }

    /// Update `states[key]` and invoke every matching API and domain handler
    /// for `event`. Also used by the registry to feed synthetic init-outcome
    /// events through the same pipeline.
    pub fn dispatch(&self, key: &str, event: ProviderEvent) {
        let new_status = status_from_event(&event);
        self.states.insert(key.to_string(), new_status);

        if let Some(list) = self.api_handlers.get(&event.event_type) {
            for (_, handler) in list.iter() {
                invoke_guarded(handler.as_ref(), &event);
            }
        }
        if let Some(scope) = self.domain_handlers.get(key) {
            if let Some(list) = scope.get(&event.event_type) {
                for (_, handler) in list.iter() {
                    invoke_guarded(handler.as_ref(), &event);
                }
            }
        }
    }

    /// Register a global (API-scoped) handler for `event_type`, replaying
    /// once per currently-bound key whose state matches.
    pub fn register_api_handler(
        &self,
        event_type: ProviderEventType,
        handler: Arc<dyn EventHandler>,
    ) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.api_handlers.entry(event_type).or_default().push((id, handler.clone()));
        self.replay_if_matching(None, event_type, handler.as_ref());
        id
    }

    pub fn remove_api_handler(&self, event_type: ProviderEventType, id: HandlerId) {
        if let Some(mut list) = self.api_handlers.get_mut(&event_type) {
            list.retain(|(hid, _)| *hid != id);
        }
    }

    /// Register a domain-scoped handler bound to `key`, replaying once if the
    /// current binding for `key` already matches.
    pub fn register_domain_handler(
        &self,
        key: &str,
        event_type: ProviderEventType,
        handler: Arc<dyn EventHandler>,
    ) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.domain_handlers
            .entry(key.to_string())
            .or_default()
            .entry(event_type)
            .or_default()
            .push((id, handler.clone()));
        self.replay_if_matching(Some(key), event_type, handler.as_ref());
        id
    }

    pub fn remove_domain_handler(&self, key: &str, event_type: ProviderEventType, id: HandlerId) {
        if let Some(scope) = self.domain_handlers.get(key) {
            if let Some(mut list) = scope.get_mut(&event_type) {
                list.retain(|(hid, _)| *hid != id);
            }
        }
    }

    fn replay_if_matching(&self, key: Option<&str>, event_type: ProviderEventType, handler: &dyn EventHandler) {
        let keys: Vec<String> = match key {
            Some(k) => vec![k.to_string()],
            None => self.key_to_provider.iter().map(|e| e.key().clone()).collect(),
        };
        for k in keys {
            let Some(status) = self.states.get(&k).map(|s| *s) else { continue };
            if !event_type_matches_status(event_type, status) {
                continue;
            }
            let Some(provider) = self.key_to_provider.get(&k) else { continue };
            let synthetic = synthesize_event(&provider, event_type);
            invoke_guarded(handler, &synthetic);
            debug!(key = %k, "replayed current state to late subscriber");
        }
    }
}

pub fn synthesize_event(provider: &Arc<dyn Provider>, event_type: ProviderEventType) -> ProviderEvent {
    ProviderEvent::new(provider.metadata().name, event_type)
}

fn invoke_guarded(handler: &dyn EventHandler, event: &ProviderEvent) {
    if std::panic::catch_unwind(AssertUnwindSafe(|| handler.handle(event))).is_err() {
        warn!(provider = %event.provider_name, "event handler panicked; isolated from siblings");
    }
}
