//! Composition root for the FlagForge feature-flag runtime: re-exports the
//! data model, provider contract, registry, event fabric, evaluation
//! pipeline, multi-provider aggregator, and telemetry builder from their own
//! crates, and adds the process-wide singleton runtime, built-in providers,
//! a logging hook, and typed convenience wrappers that most applications
//! reach for first.

pub mod hooks;
pub mod providers;
pub mod runtime;
pub mod values;

pub use flagforge_client::{Client, EvaluationOptions};
pub use flagforge_core::{
    provider_identity, AttributeValue, ContextAwareLifecycle, ErrorCode, EvaluationContext,
    EventSource, FlagForgeError, FlagMetadata, FlagValue, FlattenedContext, LifecycleAware,
    MetadataValue, OperationContext, Provider, ProviderEvent, ProviderEventType, ProviderMetadata,
    Reason, Result, ResolutionDetails, Status, Tracker, TrackingEventDetails,
};
pub use flagforge_events::{EventExecutor, EventHandler, HandlerId};
pub use flagforge_hooks::{Hook, HookChain, HookContext, HookError, HookHints, HookResolutionDetails};
pub use flagforge_multi::{Comparator, CustomStrategyFn, MultiProvider, MultiProviderBuilder, MultiStrategyKind, Strategy, SubProvider};
pub use flagforge_registry::ProviderRegistry;
pub use flagforge_telemetry::{build_event, TelemetryEvent, EVENT_NAME};

pub use hooks::LoggingHook;
pub use providers::{InMemoryProvider, NoopProvider};
pub use runtime::{
    add_global_hook, client, client_for_domain, runtime, set_global_context, set_named_provider,
    set_provider, shutdown, status, Runtime,
};
pub use values::{
    bool_value, bool_value_details, float_value, float_value_details, int_value,
    int_value_details, object_value, object_value_details, string_value, string_value_details,
};
