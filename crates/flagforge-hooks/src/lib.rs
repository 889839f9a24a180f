//! Hook contract and chain-ordering runner shared by the client pipeline and
//! the multi-provider aggregator's hook isolator.

pub mod chain;
pub mod hook;
pub mod types;

pub use chain::{run_after, run_before, run_error, run_finally, HookChain};
pub use hook::Hook;
pub use types::{ClientMetadata, FlagType, HookContext, HookError, HookHints, HookResolutionDetails};

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use flagforge_core::{EvaluationContext, FlagValue, ProviderMetadata, Reason, ResolutionDetails};

    use super::*;

    struct Recorder {
        order: Arc<std::sync::Mutex<Vec<&'static str>>>,
        name: &'static str,
    }

    #[async_trait]
    impl Hook for Recorder {
        async fn before(
            &self,
            _ctx: &HookContext,
            _hints: &HookHints,
        ) -> Result<Option<EvaluationContext>, HookError> {
            self.order.lock().unwrap().push(self.name);
            Ok(None)
        }

        async fn after(
            &self,
            _ctx: &HookContext,
            _details: &HookResolutionDetails,
            _hints: &HookHints,
        ) -> Result<(), HookError> {
            self.order.lock().unwrap().push(self.name);
            Ok(())
        }

        async fn finally(
            &self,
            _ctx: &HookContext,
            _details: &HookResolutionDetails,
            _hints: &HookHints,
        ) {
            self.order.lock().unwrap().push(self.name);
        }
    }

    fn ctx() -> HookContext {
        HookContext {
            flag_key: "flag".to_string(),
            flag_type: FlagType::Bool,
            default_value: FlagValue::Bool(false),
            client_metadata: ClientMetadata::default(),
            provider_metadata: ProviderMetadata::new("test"),
            evaluation_context: EvaluationContext::empty(),
        }
    }

    #[tokio::test]
    async fn before_forward_after_reverse() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let chain = HookChain {
            global: vec![Arc::new(Recorder { order: order.clone(), name: "global" })],
            client: vec![Arc::new(Recorder { order: order.clone(), name: "client" })],
            invocation: vec![Arc::new(Recorder { order: order.clone(), name: "invocation" })],
            provider: vec![Arc::new(Recorder { order: order.clone(), name: "provider" })],
        };

        let hook_ctx = ctx();
        let hints = HookHints::new();
        let before = chain.before_order();
        run_before(&before, &hook_ctx, &hints).await;
        assert_eq!(*order.lock().unwrap(), vec!["global", "client", "invocation", "provider"]);

        order.lock().unwrap().clear();
        let details = ResolutionDetails::success(FlagValue::Bool(true), Reason::Static);
        let reverse = chain.reverse_order();
        run_after(&reverse, &hook_ctx, &details, &hints).await;
        assert_eq!(*order.lock().unwrap(), vec!["provider", "invocation", "client", "global"]);
    }

    struct PanicBefore;

    #[async_trait]
    impl Hook for PanicBefore {
        async fn before(
            &self,
            _ctx: &HookContext,
            _hints: &HookHints,
        ) -> Result<Option<EvaluationContext>, HookError> {
            panic!("boom");
        }
    }

    struct NeverRuns(Arc<AtomicUsize>);

    #[async_trait]
    impl Hook for NeverRuns {
        async fn before(
            &self,
            _ctx: &HookContext,
            _hints: &HookHints,
        ) -> Result<Option<EvaluationContext>, HookError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    #[tokio::test]
    async fn panicking_before_hook_surfaces_as_error_and_stops_chain() {
        let calls = Arc::new(AtomicUsize::new(0));
        let hooks: Vec<Arc<dyn Hook>> = vec![Arc::new(PanicBefore), Arc::new(NeverRuns(calls.clone()))];
        let (_ctx, err) = run_before(&hooks, &ctx(), &HookHints::new()).await;
        assert!(matches!(err, Some(HookError::BeforeHookFailed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
