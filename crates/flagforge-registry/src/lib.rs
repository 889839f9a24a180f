//! Registration and lifecycle state machine that sits between the client
//! facade and a set of bound providers.
//!
//! A [`ProviderRegistry`] owns the default and domain-keyed bindings, runs
//! each provider's `init`/`shutdown` on a background task, and republishes
//! provider events (and synthetic init-outcome events) through the shared
//! [`flagforge_events::EventExecutor`].

pub mod lifecycle;
pub mod registry;

pub use registry::{ProviderRegistry, DEFAULT_KEY};

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::Value as Json;

    use flagforge_core::{
        ContextAwareLifecycle, FlagForgeError, FlattenedContext, LifecycleAware, OperationContext,
        Provider, ProviderMetadata, Reason, ResolutionDetails, Result, Status,
    };

    use super::*;

    struct ImmediateProvider {
        name: &'static str,
    }

    #[async_trait]
    impl Provider for ImmediateProvider {
        fn metadata(&self) -> ProviderMetadata {
            ProviderMetadata::new(self.name)
        }
        async fn resolve_bool(&self, _k: &str, d: bool, _c: &FlattenedContext) -> ResolutionDetails<bool> {
            ResolutionDetails::success(d, Reason::Static)
        }
        async fn resolve_string(&self, _k: &str, d: String, _c: &FlattenedContext) -> ResolutionDetails<String> {
            ResolutionDetails::success(d, Reason::Static)
        }
        async fn resolve_int(&self, _k: &str, d: i64, _c: &FlattenedContext) -> ResolutionDetails<i64> {
            ResolutionDetails::success(d, Reason::Static)
        }
        async fn resolve_float(&self, _k: &str, d: f64, _c: &FlattenedContext) -> ResolutionDetails<f64> {
            ResolutionDetails::success(d, Reason::Static)
        }
        async fn resolve_object(&self, _k: &str, d: Json, _c: &FlattenedContext) -> ResolutionDetails<Json> {
            ResolutionDetails::success(d, Reason::Static)
        }
    }

    struct SlowInitProvider {
        name: &'static str,
        delay: Duration,
        shutdown_count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Provider for SlowInitProvider {
        fn metadata(&self) -> ProviderMetadata {
            ProviderMetadata::new(self.name)
        }
        async fn resolve_bool(&self, _k: &str, d: bool, _c: &FlattenedContext) -> ResolutionDetails<bool> {
            ResolutionDetails::success(d, Reason::Static)
        }
        async fn resolve_string(&self, _k: &str, d: String, _c: &FlattenedContext) -> ResolutionDetails<String> {
            ResolutionDetails::success(d, Reason::Static)
        }
        async fn resolve_int(&self, _k: &str, d: i64, _c: &FlattenedContext) -> ResolutionDetails<i64> {
            ResolutionDetails::success(d, Reason::Static)
        }
        async fn resolve_float(&self, _k: &str, d: f64, _c: &FlattenedContext) -> ResolutionDetails<f64> {
            ResolutionDetails::success(d, Reason::Static)
        }
        async fn resolve_object(&self, _k: &str, d: Json, _c: &FlattenedContext) -> ResolutionDetails<Json> {
            ResolutionDetails::success(d, Reason::Static)
        }
        fn as_lifecycle(&self) -> Option<&dyn LifecycleAware> {
            Some(self)
        }
    }

    #[async_trait]
    impl LifecycleAware for SlowInitProvider {
        async fn init(&self) -> Result<()> {
            tokio::time::sleep(self.delay).await;
            Ok(())
        }
        async fn shutdown(&self) {
            self.shutdown_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FatalProvider;

    #[async_trait]
    impl Provider for FatalProvider {
        fn metadata(&self) -> ProviderMetadata {
            ProviderMetadata::new("fatal")
        }
        async fn resolve_bool(&self, _k: &str, d: bool, _c: &FlattenedContext) -> ResolutionDetails<bool> {
            ResolutionDetails::success(d, Reason::Static)
        }
        async fn resolve_string(&self, _k: &str, d: String, _c: &FlattenedContext) -> ResolutionDetails<String> {
            ResolutionDetails::success(d, Reason::Static)
        }
        async fn resolve_int(&self, _k: &str, d: i64, _c: &FlattenedContext) -> ResolutionDetails<i64> {
            ResolutionDetails::success(d, Reason::Static)
        }
        async fn resolve_float(&self, _k: &str, d: f64, _c: &FlattenedContext) -> ResolutionDetails<f64> {
            ResolutionDetails::success(d, Reason::Static)
        }
        async fn resolve_object(&self, _k: &str, d: Json, _c: &FlattenedContext) -> ResolutionDetails<Json> {
            ResolutionDetails::success(d, Reason::Static)
        }
        fn as_lifecycle(&self) -> Option<&dyn LifecycleAware> {
            Some(self)
        }
    }

    #[async_trait]
    impl LifecycleAware for FatalProvider {
        async fn init(&self) -> Result<()> {
            Err(FlagForgeError::InitFatal("boom".into()))
        }
        async fn shutdown(&self) {}
    }

    #[tokio::test]
    async fn default_binding_is_noop_and_ready_until_set() {
        let registry = ProviderRegistry::new();
        let meta = registry.provider_metadata();
        assert_eq!(meta.name, "No-op Provider");
        assert_eq!(registry.status(None), Status::Ready);
    }

    #[tokio::test]
    async fn set_provider_wait_for_ready_resolves_after_init() {
        let registry = ProviderRegistry::new();
        let provider: Arc<dyn Provider> = Arc::new(ImmediateProvider { name: "p1" });
        registry.set_provider(provider, true).await.unwrap();
        assert_eq!(registry.status(None), Status::Ready);
        assert_eq!(registry.provider_metadata().name, "p1");
    }

    #[tokio::test]
    async fn set_named_provider_rejects_empty_domain() {
        let registry = ProviderRegistry::new();
        let provider: Arc<dyn Provider> = Arc::new(ImmediateProvider { name: "p1" });
        let err = registry.set_named_provider("", provider, false).await.unwrap_err();
        assert!(matches!(err, FlagForgeError::EmptyDomain));
    }

    #[tokio::test]
    async fn fatal_init_surfaces_as_fatal_status() {
        let registry = ProviderRegistry::new();
        let provider: Arc<dyn Provider> = Arc::new(FatalProvider);
        let err = registry.set_provider(provider, true).await.unwrap_err();
        assert!(matches!(err, FlagForgeError::InitFatal(_)));
        assert_eq!(registry.status(None), Status::Fatal);
    }

    #[tokio::test]
    async fn rebinding_shuts_down_superseded_provider() {
        let registry = ProviderRegistry::new();
        let shutdown_count = Arc::new(AtomicUsize::new(0));
        let first: Arc<dyn Provider> = Arc::new(SlowInitProvider {
            name: "first",
            delay: Duration::from_millis(1),
            shutdown_count: shutdown_count.clone(),
        });
        registry.set_provider(first, true).await.unwrap();

        let second: Arc<dyn Provider> = Arc::new(ImmediateProvider { name: "second" });
        registry.set_provider(second, true).await.unwrap();

        // The superseded provider's shutdown runs on a background task.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(shutdown_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn shutdown_with_context_aggregates_errors() {
        struct AlwaysFailsShutdown;
        #[async_trait]
        impl Provider for AlwaysFailsShutdown {
            fn metadata(&self) -> ProviderMetadata {
                ProviderMetadata::new("fails")
            }
            async fn resolve_bool(&self, _k: &str, d: bool, _c: &FlattenedContext) -> ResolutionDetails<bool> {
                ResolutionDetails::success(d, Reason::Static)
            }
            async fn resolve_string(&self, _k: &str, d: String, _c: &FlattenedContext) -> ResolutionDetails<String> {
                ResolutionDetails::success(d, Reason::Static)
            }
            async fn resolve_int(&self, _k: &str, d: i64, _c: &FlattenedContext) -> ResolutionDetails<i64> {
                ResolutionDetails::success(d, Reason::Static)
            }
            async fn resolve_float(&self, _k: &str, d: f64, _c: &FlattenedContext) -> ResolutionDetails<f64> {
                ResolutionDetails::success(d, Reason::Static)
            }
            async fn resolve_object(&self, _k: &str, d: Json, _c: &FlattenedContext) -> ResolutionDetails<Json> {
                ResolutionDetails::success(d, Reason::Static)
            }
            fn as_context_aware_lifecycle(&self) -> Option<&dyn ContextAwareLifecycle> {
                Some(self)
            }
        }
        #[async_trait]
        impl ContextAwareLifecycle for AlwaysFailsShutdown {
            async fn init_with_context(&self, _ctx: &OperationContext) -> Result<()> {
                Ok(())
            }
            async fn shutdown_with_context(&self, _ctx: &OperationContext) -> Result<()> {
                Err(FlagForgeError::Shutdown("disk full".into()))
            }
        }

        let registry = ProviderRegistry::new();
        let provider: Arc<dyn Provider> = Arc::new(AlwaysFailsShutdown);
        registry.set_provider(provider, true).await.unwrap();

        let err = registry.shutdown_with_context(OperationContext::new()).await.unwrap_err();
        assert!(matches!(err, FlagForgeError::ShutdownAggregate(errs) if errs.len() == 1));
    }
}
