//! Data model, provider contract, and error taxonomy shared by every
//! FlagForge crate.
//!
//! This crate has no async runtime loop of its own — it is the vocabulary
//! the registry, event executor, client, and multi-provider aggregator all
//! speak.

pub mod config;
pub mod context;
pub mod error;
pub mod noop;
pub mod provider;
pub mod resolution;
pub mod status;
pub mod value;

pub use context::{EvaluationContext, FlattenedContext};
pub use error::{FlagForgeError, Result};
pub use noop::NoopProvider;
pub use provider::{
    provider_identity, ContextAwareLifecycle, EventSource, LifecycleAware, OperationContext,
    Provider, ProviderMetadata, Tracker, TrackingEventDetails,
};
pub use resolution::{ErrorCode, Reason, ResolutionDetails};
pub use status::{status_from_event, status_from_init_result, event_type_matches_status, ProviderEvent, ProviderEventType, Status};
pub use value::{AttributeValue, FlagMetadata, FlagValue, MetadataValue};
