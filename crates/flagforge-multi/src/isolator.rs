use std::sync::Arc;

use flagforge_core::{Provider, ResolutionDetails};
use flagforge_hooks::{run_after, run_before, run_error, run_finally, Hook, HookChain, HookContext, HookHints};

use crate::aggregate::AggregatableValue;
use crate::types::SubProvider;

/// Resolves one sub-provider's flag, isolating its hook chain from every
/// other sub-provider's: a fresh copy of the incoming context is presented
/// to this chain only, the sub-provider's own hooks plus any
/// aggregator-configured extra hooks run around the call, and a hook
/// failure converts into an error [`ResolutionDetails`] rather than
/// propagating.
pub async fn resolve_isolated<T: AggregatableValue>(
    sub: &SubProvider,
    extra_hooks: &[Arc<dyn Hook>],
    flag_key: &str,
    default_value: T,
    base_hook_ctx: &HookContext,
    hints: &HookHints,
) -> ResolutionDetails<T> {
    if sub.hooks.is_empty() && extra_hooks.is_empty() {
        let flattened = base_hook_ctx.evaluation_context.flatten();
        return T::resolve_from(sub.provider.as_ref(), flag_key, default_value, &flattened).await;
    }

    let mut hook_ctx = base_hook_ctx.clone();
    hook_ctx.provider_metadata = sub.provider.metadata();
    // (a) fresh copy the isolator owns for the remainder of this call.
    hook_ctx.evaluation_context = base_hook_ctx.evaluation_context.clone();

    let chain = HookChain {
        global: extra_hooks.to_vec(),
        client: sub.hooks.clone(),
        invocation: Vec::new(),
        provider: Vec::new(),
    };
    let before = chain.before_order();
    let reverse = chain.reverse_order();

    let (merged_ctx, before_err) = run_before(&before, &hook_ctx, hints).await;
    hook_ctx.evaluation_context = merged_ctx;
    if let Some(err) = before_err {
        let details = ResolutionDetails::error(default_value, err.error_code(), Some(err.to_string()));
        run_error(&reverse, &hook_ctx, &err, hints).await;
        let generic = details.clone().map(T::into_flag_value);
        run_finally(&reverse, &hook_ctx, &generic, hints).await;
        return details;
    }

    let flattened = hook_ctx.evaluation_context.flatten();
    let details = T::resolve_from(sub.provider.as_ref(), flag_key, default_value, &flattened).await;
    let generic_details = details.clone().map(T::into_flag_value);

    if details.is_error() {
        let code = details.error_code.unwrap_or(flagforge_core::ErrorCode::General);
        let err = flagforge_hooks::HookError::ProviderError { code, message: details.error_message.clone().unwrap_or_default() };
        run_error(&reverse, &hook_ctx, &err, hints).await;
        run_finally(&reverse, &hook_ctx, &generic_details, hints).await;
        return details;
    }

    if let Some(err) = run_after(&reverse, &hook_ctx, &generic_details, hints).await {
        let fallback_details = ResolutionDetails::error(details.value.clone(), err.error_code(), Some(err.to_string()));
        run_error(&reverse, &hook_ctx, &err, hints).await;
        let generic_fallback = fallback_details.clone().map(T::into_flag_value);
        run_finally(&reverse, &hook_ctx, &generic_fallback, hints).await;
        return fallback_details;
    }

    run_finally(&reverse, &hook_ctx, &generic_details, hints).await;
    details
}
