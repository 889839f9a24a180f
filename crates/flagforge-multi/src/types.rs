use std::sync::Arc;

use flagforge_core::{FlagForgeError, FlagValue, Provider, ResolutionDetails};
use flagforge_hooks::Hook;

/// One named member of a [`crate::multi::MultiProvider`].
#[derive(Clone)]
pub struct SubProvider {
    pub name: String,
    pub provider: Arc<dyn Provider>,
    /// Hooks configured at the aggregator for this one sub-provider
    /// (`withProviderHooks`), isolated from every other sub-provider's hook
    /// chain.
    pub hooks: Vec<Arc<dyn Hook>>,
}

impl SubProvider {
    pub fn new(name: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        Self { name: name.into(), provider, hooks: Vec::new() }
    }

    pub fn with_hooks(mut self, hooks: Vec<Arc<dyn Hook>>) -> Self {
        self.hooks = hooks;
        self
    }
}

/// A user-supplied comparator for the COMPARISON strategy, invoked on the
/// `FlagValue` form of two successful results.
pub type Comparator = Arc<dyn Fn(&FlagValue, &FlagValue) -> bool + Send + Sync>;

/// A user-supplied CUSTOM strategy: given the flag key, every sub-provider's
/// already-resolved result (name-keyed, in configuration order) and the
/// caller's default, produce the final resolution.
pub type CustomStrategyFn =
    Arc<dyn Fn(&str, &[(String, ResolutionDetails<FlagValue>)], &FlagValue) -> ResolutionDetails<FlagValue> + Send + Sync>;

/// Evaluation strategy driving how sub-provider results combine into one.
#[derive(Clone)]
pub enum Strategy {
    FirstMatch,
    FirstSuccess,
    Comparison {
        fallback: Option<Arc<dyn Provider>>,
        comparator: Option<Comparator>,
    },
    Custom(CustomStrategyFn),
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::FirstMatch => "first-match",
            Strategy::FirstSuccess => "first-success",
            Strategy::Comparison { .. } => "comparison",
            Strategy::Custom(_) => "custom",
        }
    }
}

/// Construction-time validation: rejects an empty sub-provider list or any
/// sub-provider with an empty name. A CUSTOM strategy's closure is required
/// by its type (not an `Option`), so there is nothing further to check
/// there; a COMPARISON strategy's comparator requirement for object flags is
/// only meaningful once an evaluation actually compares two object results,
/// so it is enforced lazily at evaluation time instead of here.
pub fn validate(subs: &[SubProvider], _strategy: &Strategy) -> Result<(), FlagForgeError> {
    if subs.is_empty() {
        return Err(FlagForgeError::EmptyProviderList);
    }
    if subs.iter().any(|s| s.name.is_empty()) {
        return Err(FlagForgeError::EmptyProviderName);
    }
    Ok(())
}
