use std::sync::Arc;

use flagforge_hooks::{Hook, HookHints};

/// Invocation-scoped options accepted by a single evaluation call.
#[derive(Clone, Default)]
pub struct EvaluationOptions {
    pub hooks: Vec<Arc<dyn Hook>>,
    pub hook_hints: HookHints,
}

impl EvaluationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hook(mut self, hook: Arc<dyn Hook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn with_hint(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.hook_hints.insert(key.into(), value);
        self
    }
}
