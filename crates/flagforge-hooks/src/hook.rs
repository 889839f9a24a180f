use async_trait::async_trait;
use flagforge_core::EvaluationContext;

use crate::types::{HookContext, HookError, HookHints, HookResolutionDetails};

/// Cross-cutting extension running before/after/error/finally an evaluation.
/// Every stage is optional; the default implementation is a no-op so a hook
/// only needs to implement the stages it cares about.
#[async_trait]
pub trait Hook: Send + Sync {
    /// May return a partial context to merge into the running one. Raising
    /// aborts the remaining before hooks and jumps straight to error hooks.
    async fn before(
        &self,
        _ctx: &HookContext,
        _hints: &HookHints,
    ) -> Result<Option<EvaluationContext>, HookError> {
        Ok(None)
    }

    /// Observes the typed result. Raising jumps to error hooks.
    async fn after(
        &self,
        _ctx: &HookContext,
        _details: &HookResolutionDetails,
        _hints: &HookHints,
    ) -> Result<(), HookError> {
        Ok(())
    }

    /// Observes a surfaced error. Raising here is swallowed.
    async fn error(&self, _ctx: &HookContext, _err: &HookError, _hints: &HookHints) {}

    /// Always runs, regardless of path. Raising here is swallowed.
    async fn finally(
        &self,
        _ctx: &HookContext,
        _details: &HookResolutionDetails,
        _hints: &HookHints,
    ) {
    }
}
