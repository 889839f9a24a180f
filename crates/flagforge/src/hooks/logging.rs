use async_trait::async_trait;
use tracing::{info, warn};

use flagforge_core::EvaluationContext;
use flagforge_hooks::{Hook, HookContext, HookError, HookHints, HookResolutionDetails};

/// Emits a `tracing` event for every hook stage. Useful as a drop-in
/// diagnostic hook; attach it globally or per-client the same as any other
/// [`Hook`].
#[derive(Debug, Clone, Default)]
pub struct LoggingHook;

impl LoggingHook {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Hook for LoggingHook {
    async fn before(
        &self,
        ctx: &HookContext,
        _hints: &HookHints,
    ) -> Result<Option<EvaluationContext>, HookError> {
        info!(flag_key = %ctx.flag_key, provider = %ctx.provider_metadata.name, "evaluation starting");
        Ok(None)
    }

    async fn after(
        &self,
        ctx: &HookContext,
        details: &HookResolutionDetails,
        _hints: &HookHints,
    ) -> Result<(), HookError> {
        info!(
            flag_key = %ctx.flag_key,
            reason = ?details.reason,
            variant = ?details.variant,
            "evaluation resolved"
        );
        Ok(())
    }

    async fn error(&self, ctx: &HookContext, err: &HookError, _hints: &HookHints) {
        warn!(flag_key = %ctx.flag_key, error = %err, "evaluation failed");
    }

    async fn finally(&self, ctx: &HookContext, details: &HookResolutionDetails, _hints: &HookHints) {
        info!(flag_key = %ctx.flag_key, is_error = details.is_error(), "evaluation finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flagforge_core::{FlagValue, ProviderMetadata, Reason, ResolutionDetails};
    use flagforge_hooks::{ClientMetadata, FlagType};

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
    async fn every_stage_runs_without_erroring() {
        let hook = LoggingHook::new();
        let hints = HookHints::new();
        assert!(hook.before(&ctx(), &hints).await.unwrap().is_none());
        let details = ResolutionDetails::success(FlagValue::Bool(true), Reason::Static);
        assert!(hook.after(&ctx(), &details, &hints).await.is_ok());
        hook.error(&ctx(), &HookError::BeforeHookFailed("x".to_string()), &hints).await;
        hook.finally(&ctx(), &details, &hints).await;
    }
}
