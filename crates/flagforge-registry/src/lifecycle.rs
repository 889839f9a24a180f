use std::sync::Arc;

use flagforge_core::{ErrorCode, FlagForgeError, OperationContext, Provider, Result};

/// Run a provider's `init`, preferring the context-aware variant when the
/// provider implements [`flagforge_core::ContextAwareLifecycle`] (using the
/// caller's [`OperationContext`] if supplied, else a fresh untimed one);
/// otherwise fall back to the plain [`flagforge_core::LifecycleAware::init`].
/// Providers exposing neither lifecycle capability are considered ready
/// immediately.
pub async fn run_init(provider: &Arc<dyn Provider>, op_ctx: Option<OperationContext>) -> Result<()> {
    if let Some(aware) = provider.as_context_aware_lifecycle() {
        let ctx = op_ctx.unwrap_or_else(OperationContext::new);
        return ctx.race(aware.init_with_context(&ctx)).await;
    }
    if let Some(lifecycle) = provider.as_lifecycle() {
        return lifecycle.init().await;
    }
    Ok(())
}

/// Shut a single provider down, preferring the context-aware variant. The
/// plain path never fails; the context-aware path applies the default
/// deadline when `ctx` carries none and surfaces errors.
pub async fn run_shutdown(
    provider: &Arc<dyn Provider>,
    op_ctx: Option<&OperationContext>,
    default_deadline: std::time::Duration,
) -> Result<()> {
    if let Some(aware) = provider.as_context_aware_lifecycle() {
        let ctx = match op_ctx {
            Some(ctx) if ctx.deadline().is_some() => ctx.clone(),
            _ => OperationContext::with_timeout(default_deadline),
        };
        return ctx
            .race(aware.shutdown_with_context(&ctx))
            .await
            .map_err(|e| FlagForgeError::Shutdown(e.to_string()));
    }
    if let Some(lifecycle) = provider.as_lifecycle() {
        lifecycle.shutdown().await;
    }
    Ok(())
}

/// Map an init failure's error class into the event error code used when
/// publishing the synthetic `ERROR` event.
pub fn init_error_code(err: &FlagForgeError) -> ErrorCode {
    match err {
        FlagForgeError::InitFatal(_) => ErrorCode::ProviderFatal,
        _ => ErrorCode::General,
    }
}
