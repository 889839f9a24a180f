use std::collections::HashMap;

use serde_json::Value as Json;
use thiserror::Error;

use flagforge_core::{EvaluationContext, ErrorCode, FlagValue, ProviderMetadata, ResolutionDetails};

/// The static flag type of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagType {
    Bool,
    String,
    Int,
    Float,
    Object,
}

/// Opaque string→any hints forwarded to every hook stage. Represented as
/// JSON values so hooks stay decoupled from any particular domain struct.
pub type HookHints = HashMap<String, Json>;

/// Immutable per-evaluation context handed to every hook stage.
#[derive(Debug, Clone)]
pub struct HookContext {
    pub flag_key: String,
    pub flag_type: FlagType,
    pub default_value: FlagValue,
    pub client_metadata: ClientMetadata,
    pub provider_metadata: ProviderMetadata,
    pub evaluation_context: EvaluationContext,
}

/// Stable identity for the client that started the evaluation (name + the
/// domain it is bound to, if any).
#[derive(Debug, Clone, Default)]
pub struct ClientMetadata {
    pub name: String,
    pub domain: Option<String>,
}

/// Raised by a before/after hook, or synthesized by the pipeline itself on a
/// gate/type-mismatch/provider failure, and observed by error hooks.
#[derive(Debug, Clone, Error)]
pub enum HookError {
    #[error("before hook failed: {0}")]
    BeforeHookFailed(String),
    #[error("after hook failed: {0}")]
    AfterHookFailed(String),
    #[error("provider error ({code:?}): {message}")]
    ProviderError { code: ErrorCode, message: String },
}

impl HookError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            HookError::BeforeHookFailed(_) | HookError::AfterHookFailed(_) => ErrorCode::General,
            HookError::ProviderError { code, .. } => *code,
        }
    }
}

/// The typed resolution observed by after/finally hooks, wrapped generically
/// over [`FlagValue`].
pub type HookResolutionDetails = ResolutionDetails<FlagValue>;
