use thiserror::Error;

/// Errors surfaced directly to callers of registration and lifecycle APIs.
///
/// These never appear on the evaluation hot path — an evaluation always
/// returns a [`crate::resolution::ResolutionDetails`] instead of a `Result`,
/// per the "evaluation never propagates an exception" invariant.
#[derive(Debug, Error)]
pub enum FlagForgeError {
    #[error("provider must not be null")]
    NullProvider,

    #[error("domain must not be empty")]
    EmptyDomain,

    #[error("strategy configuration invalid: {0}")]
    InvalidStrategyConfig(String),

    #[error("provider initialization timed out")]
    InitDeadlineExceeded,

    #[error("provider initialization canceled")]
    InitCanceled,

    #[error("provider initialization failed: {0}")]
    Init(String),

    #[error("provider initialization failed fatally: {0}")]
    InitFatal(String),

    #[error("provider shutdown failed: {0}")]
    Shutdown(String),

    #[error("{} provider(s) failed during shutdown", .0.len())]
    ShutdownAggregate(Vec<FlagForgeError>),

    #[error("{} sub-provider(s) failed to initialize", .0.len())]
    InitAggregate(Vec<FlagForgeError>),

    #[error("multi-provider requires at least one sub-provider")]
    EmptyProviderList,

    #[error("multi-provider sub-provider name must not be empty")]
    EmptyProviderName,
}

pub type Result<T> = std::result::Result<T, FlagForgeError>;
