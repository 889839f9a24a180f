use flagforge_core::EvaluationContext;

tokio::task_local! {
    static TRANSACTION_CONTEXT: std::cell::RefCell<EvaluationContext>;
}

/// Runs `fut` with `ctx` installed as the ambient transaction-scoped context,
/// readable by any evaluation performed inside `fut` via
/// [`transaction_context`]. Mirrors the request-scoped handle a server
/// framework stashes on its per-request task.
pub async fn with_transaction_context<F, R>(ctx: EvaluationContext, fut: F) -> R
where
    F: std::future::Future<Output = R>,
{
    TRANSACTION_CONTEXT.scope(std::cell::RefCell::new(ctx), fut).await
}

/// Merges `ctx` on top of the currently installed transaction context, or
/// installs it as-is if none is set for the remainder of `fut`.
pub async fn merge_transaction_context<F, R>(ctx: EvaluationContext, fut: F) -> R
where
    F: std::future::Future<Output = R>,
{
    let merged = transaction_context().unwrap_or_default().merged_with(&ctx);
    with_transaction_context(merged, fut).await
}

/// The currently installed transaction context, if any evaluation calling
/// this is running inside [`with_transaction_context`].
pub fn transaction_context() -> Option<EvaluationContext> {
    TRANSACTION_CONTEXT.try_with(|c| c.borrow().clone()).ok()
}
