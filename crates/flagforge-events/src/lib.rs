//! Event distribution fabric: de-duplicates upstream provider subscriptions
//! and fans events out to API- and domain-scoped handler registries, with
//! late-subscriber replay.

pub mod executor;
pub mod handler;

pub use executor::{synthesize_event, EventExecutor};
pub use handler::{EventHandler, HandlerId};

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::Value as Json;
    use tokio::sync::broadcast;

    use flagforge_core::{
        ContextAwareLifecycle, EventSource, FlattenedContext, LifecycleAware, Provider,
        ProviderEvent, ProviderEventType, ProviderMetadata, ResolutionDetails, Tracker,
    };

    use super::*;

    struct TestProvider {
        name: String,
        tx: broadcast::Sender<ProviderEvent>,
    }

    impl TestProvider {
        fn new(name: &str) -> (Arc<Self>, broadcast::Sender<ProviderEvent>) {
            let (tx, _rx) = broadcast::channel(16);
            let provider = Arc::new(Self { name: name.to_string(), tx: tx.clone() });
            (provider, tx)
        }
    }

    #[async_trait]
    impl Provider for TestProvider {
        fn metadata(&self) -> ProviderMetadata {
            ProviderMetadata::new(self.name.clone())
        }
        async fn resolve_bool(&self, _: &str, default_value: bool, _: &FlattenedContext) -> ResolutionDetails<bool> {
            ResolutionDetails::success(default_value, flagforge_core::Reason::Default)
        }
        async fn resolve_string(&self, _: &str, default_value: String, _: &FlattenedContext) -> ResolutionDetails<String> {
            ResolutionDetails::success(default_value, flagforge_core::Reason::Default)
        }
        async fn resolve_int(&self, _: &str, default_value: i64, _: &FlattenedContext) -> ResolutionDetails<i64> {
            ResolutionDetails::success(default_value, flagforge_core::Reason::Default)
        }
        async fn resolve_float(&self, _: &str, default_value: f64, _: &FlattenedContext) -> ResolutionDetails<f64> {
            ResolutionDetails::success(default_value, flagforge_core::Reason::Default)
        }
        async fn resolve_object(&self, _: &str, default_value: Json, _: &FlattenedContext) -> ResolutionDetails<Json> {
            ResolutionDetails::success(default_value, flagforge_core::Reason::Default)
        }
        fn as_event_source(&self) -> Option<&dyn EventSource> {
            Some(self)
        }
    }

    impl EventSource for TestProvider {
        fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
            self.tx.subscribe()
        }
    }

    // Silence "unused trait" warnings for capability traits not exercised by
    // TestProvider but required to stay in scope for the `as_*` defaults.
    #[allow(dead_code)]
    fn _assert_traits_in_scope(
        _l: &dyn LifecycleAware,
        _c: &dyn ContextAwareLifecycle,
        _t: &dyn Tracker,
    ) {
    }

    #[tokio::test]
    async fn late_subscriber_replay_after_ready() {
        let executor = EventExecutor::new();
        let (provider, tx) = TestProvider::new("p1");
        executor.bind("", provider.clone());

        executor.dispatch("", ProviderEvent::new("p1", ProviderEventType::Ready));
        assert_eq!(executor.status(""), flagforge_core::Status::Ready);

        let received = Arc::new(AtomicUsize::new(0));
        let received_clone = received.clone();
        executor.register_api_handler(
            ProviderEventType::Ready,
            Arc::new(move |_event: &ProviderEvent| {
                received_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert_eq!(received.load(Ordering::SeqCst), 1, "late subscriber should be replayed once");

        let _ = tx; // keep sender alive for the duration of the test
    }

    #[tokio::test]
    async fn handler_panic_does_not_suppress_siblings() {
        let executor = EventExecutor::new();
        let (provider, _tx) = TestProvider::new("p2");
        executor.bind("", provider);

        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        executor.register_api_handler(
            ProviderEventType::Ready,
            Arc::new(|_e: &ProviderEvent| panic!("boom")),
        );
        executor.register_api_handler(
            ProviderEventType::Ready,
            Arc::new(move |_e: &ProviderEvent| {
                hits_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        executor.dispatch("", ProviderEvent::new("p2", ProviderEventType::Ready));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn subscription_deduplicated_across_keys_and_fanned_out() {
        let executor = EventExecutor::new();
        let (provider, tx) = TestProvider::new("shared");
        executor.bind("", provider.clone());
        executor.bind("tenant-a", provider.clone());

        let domain_hits = Arc::new(AtomicUsize::new(0));
        let domain_hits_clone = domain_hits.clone();
        executor.register_domain_handler(
            "tenant-a",
            ProviderEventType::Ready,
            Arc::new(move |_e: &ProviderEvent| {
                domain_hits_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let default_hits = Arc::new(AtomicUsize::new(0));
        let default_hits_clone = default_hits.clone();
        executor.register_domain_handler(
            "",
            ProviderEventType::Ready,
            Arc::new(move |_e: &ProviderEvent| {
                default_hits_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        tx.send(ProviderEvent::new("shared", ProviderEventType::Ready)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(domain_hits.load(Ordering::SeqCst), 1);
        assert_eq!(default_hits.load(Ordering::SeqCst), 1);
        assert_eq!(executor.status("tenant-a"), flagforge_core::Status::Ready);
        assert_eq!(executor.status(""), flagforge_core::Status::Ready);
    }
}
