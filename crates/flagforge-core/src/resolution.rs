use serde::{Deserialize, Serialize};

use crate::value::FlagMetadata;

/// Why a flag resolved to the value it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    Default,
    TargetingMatch,
    Split,
    Disabled,
    Static,
    Cached,
    Unknown,
    Error,
    /// Multi-provider addition: every sub-provider agreed.
    Aggregated,
    /// Multi-provider addition: sub-providers disagreed and a configured
    /// fallback provider's result was used instead.
    AggregatedFallback,
}

impl Reason {
    /// Lower-cased string used by the telemetry event builder.
    pub fn as_telemetry_str(&self) -> &'static str {
        match self {
            Reason::Default => "default",
            Reason::TargetingMatch => "targeting_match",
            Reason::Split => "split",
            Reason::Disabled => "disabled",
            Reason::Static => "static",
            Reason::Cached => "cached",
            Reason::Unknown => "unknown",
            Reason::Error => "error",
            Reason::Aggregated => "aggregated",
            Reason::AggregatedFallback => "aggregated_fallback",
        }
    }
}

/// Error taxonomy. At most one code per resolution; no code means success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ProviderNotReady,
    ProviderFatal,
    FlagNotFound,
    ParseError,
    TypeMismatch,
    TargetingKeyMissing,
    InvalidContext,
    General,
}

/// A typed resolution: value plus reason, variant, error code/message, and
/// flag metadata. Generic over `T` so the same shape serves
/// `bool`/`i64`/`f64`/`String`/[`crate::value::FlagValue`] resolutions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionDetails<T> {
    pub value: T,
    pub variant: Option<String>,
    pub reason: Option<Reason>,
    pub error_code: Option<ErrorCode>,
    pub error_message: Option<String>,
    pub flag_metadata: FlagMetadata,
}

impl<T> ResolutionDetails<T> {
    pub fn success(value: T, reason: Reason) -> Self {
        Self {
            value,
            variant: None,
            reason: Some(reason),
            error_code: None,
            error_message: None,
            flag_metadata: FlagMetadata::default(),
        }
    }

    pub fn success_with_variant(value: T, reason: Reason, variant: impl Into<String>) -> Self {
        Self {
            variant: Some(variant.into()),
            ..Self::success(value, reason)
        }
    }

    pub fn error(value: T, code: ErrorCode, message: Option<String>) -> Self {
        Self {
            value,
            variant: None,
            reason: Some(Reason::Error),
            error_code: Some(code),
            error_message: message,
            flag_metadata: FlagMetadata::default(),
        }
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    pub fn with_metadata(mut self, metadata: FlagMetadata) -> Self {
        self.flag_metadata = metadata;
        self
    }

    pub fn is_error(&self) -> bool {
        self.error_code.is_some()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResolutionDetails<U> {
        ResolutionDetails {
            value: f(self.value),
            variant: self.variant,
            reason: self.reason,
            error_code: self.error_code,
            error_message: self.error_message,
            flag_metadata: self.flag_metadata,
        }
    }
}
