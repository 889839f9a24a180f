use serde::{Deserialize, Serialize};

use crate::error::FlagForgeError;
use crate::resolution::ErrorCode;

/// Binding-level readiness of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    NotReady,
    Ready,
    Stale,
    Error,
    Fatal,
}

impl Status {
    /// Total order used by the multi-provider aggregator to pick the overall
    /// status: worst of `READY < STALE < ERROR`, with `FATAL` and `NOT_READY`
    /// extending that ordering at the edges so a single function serves both
    /// the registry and the aggregator.
    pub fn severity(&self) -> u8 {
        match self {
            Status::Ready => 0,
            Status::Stale => 1,
            Status::Error => 2,
            Status::Fatal => 3,
            Status::NotReady => 4,
        }
    }

    pub fn worse_of(a: Status, b: Status) -> Status {
        if a.severity() >= b.severity() {
            a
        } else {
            b
        }
    }
}

/// The kind of lifecycle/event-source event a provider can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderEventType {
    Ready,
    ConfigurationChanged,
    Stale,
    Error,
}

/// An event emitted by a provider's event source, or synthesized by the
/// registry from an initialization outcome.
#[derive(Debug, Clone)]
pub struct ProviderEvent {
    pub provider_name: String,
    pub event_type: ProviderEventType,
    pub message: Option<String>,
    pub flag_changes: Vec<String>,
    pub metadata: crate::value::FlagMetadata,
    pub error_code: Option<ErrorCode>,
}

impl ProviderEvent {
    pub fn new(provider_name: impl Into<String>, event_type: ProviderEventType) -> Self {
        Self {
            provider_name: provider_name.into(),
            event_type,
            message: None,
            flag_changes: Vec::new(),
            metadata: Default::default(),
            error_code: None,
        }
    }

    pub fn with_error_code(mut self, code: ErrorCode) -> Self {
        self.error_code = Some(code);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Status derivation from an event.
pub fn status_from_event(event: &ProviderEvent) -> Status {
    match event.event_type {
        ProviderEventType::Ready | ProviderEventType::ConfigurationChanged => Status::Ready,
        ProviderEventType::Stale => Status::Stale,
        ProviderEventType::Error => {
            if event.error_code == Some(ErrorCode::ProviderFatal) {
                Status::Fatal
            } else {
                Status::Error
            }
        }
    }
}

/// Status derivation from an `init` outcome.
pub fn status_from_init_result(result: &Result<(), FlagForgeError>) -> Status {
    match result {
        Ok(()) => Status::Ready,
        Err(FlagForgeError::InitFatal(_)) => Status::Fatal,
        Err(_) => Status::Error,
    }
}

/// Whether the event type corresponds to the state category a late-subscriber
/// handler should be replayed for.
pub fn event_type_matches_status(event_type: ProviderEventType, status: Status) -> bool {
    matches!(
        (event_type, status),
        (ProviderEventType::Ready, Status::Ready)
            | (ProviderEventType::ConfigurationChanged, Status::Ready)
            | (ProviderEventType::Stale, Status::Stale)
            | (ProviderEventType::Error, Status::Error)
            | (ProviderEventType::Error, Status::Fatal)
    )
}
