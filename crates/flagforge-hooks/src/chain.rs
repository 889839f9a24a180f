use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::warn;

use flagforge_core::EvaluationContext;

use crate::hook::Hook;
use crate::types::{HookContext, HookError, HookHints, HookResolutionDetails};

/// The four hook lists contributing to one evaluation, already resolved from
/// their respective scopes.
#[derive(Clone, Default)]
pub struct HookChain {
    pub global: Vec<Arc<dyn Hook>>,
    pub client: Vec<Arc<dyn Hook>>,
    pub invocation: Vec<Arc<dyn Hook>>,
    pub provider: Vec<Arc<dyn Hook>>,
}

impl HookChain {
    /// Before order: global + client + invocation + provider.
    pub fn before_order(&self) -> Vec<Arc<dyn Hook>> {
        self.global
            .iter()
            .chain(self.client.iter())
            .chain(self.invocation.iter())
            .chain(self.provider.iter())
            .cloned()
            .collect()
    }

    /// After/error/finally order: the reverse of before order, so the
    /// outermost hook post-processes last and sees errors first.
    pub fn reverse_order(&self) -> Vec<Arc<dyn Hook>> {
        let mut order = self.before_order();
        order.reverse();
        order
    }
}

async fn guarded<T>(fut: impl std::future::Future<Output = T>) -> Result<T, String> {
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(v) => Ok(v),
        Err(payload) => Err(panic_message(payload)),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "hook panicked with a non-string payload".to_string()
    }
}

/// Run before hooks in forward order.
///
/// Each hook's returned partial context is merged into the running one with
/// the returned values taking precedence. Stops at the first raise (or
/// panic, surfaced as a [`HookError::BeforeHookFailed`]) and reports the
/// context as it stood at that point.
pub async fn run_before(
    hooks: &[Arc<dyn Hook>],
    base_ctx: &HookContext,
    hints: &HookHints,
) -> (EvaluationContext, Option<HookError>) {
    let mut running = base_ctx.evaluation_context.clone();
    for hook in hooks {
        let mut stage_ctx = base_ctx.clone();
        stage_ctx.evaluation_context = running.clone();
        match guarded(hook.before(&stage_ctx, hints)).await {
            Ok(Ok(Some(partial))) => {
                running = EvaluationContext::merge(&[running, partial]);
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => return (running, Some(e)),
            Err(panic_msg) => return (running, Some(HookError::BeforeHookFailed(panic_msg))),
        }
    }
    (running, None)
}

/// Run after hooks in reverse order. Returns the first raise/panic, if any,
/// so the caller can jump to error hooks.
pub async fn run_after(
    hooks_reverse: &[Arc<dyn Hook>],
    ctx: &HookContext,
    details: &HookResolutionDetails,
    hints: &HookHints,
) -> Option<HookError> {
    for hook in hooks_reverse {
        match guarded(hook.after(ctx, details, hints)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Some(e),
            Err(panic_msg) => return Some(HookError::AfterHookFailed(panic_msg)),
        }
    }
    None
}

/// Run error hooks in reverse order. Every raise/panic is swallowed.
pub async fn run_error(hooks_reverse: &[Arc<dyn Hook>], ctx: &HookContext, err: &HookError, hints: &HookHints) {
    for hook in hooks_reverse {
        if guarded(hook.error(ctx, err, hints)).await.is_err() {
            warn!(flag_key = %ctx.flag_key, "error hook panicked; ignoring");
        }
    }
}

/// Run finally hooks in reverse order. Always runs; every raise/panic is
/// swallowed.
pub async fn run_finally(
    hooks_reverse: &[Arc<dyn Hook>],
    ctx: &HookContext,
    details: &HookResolutionDetails,
    hints: &HookHints,
) {
    for hook in hooks_reverse {
        if guarded(hook.finally(ctx, details, hints)).await.is_err() {
            warn!(flag_key = %ctx.flag_key, "finally hook panicked; ignoring");
        }
    }
}
