//! Runtime tunables with sensible defaults: named constants plus a
//! `Default`-able struct for the handful of values callers may reasonably
//! want to override.

use std::time::Duration;

/// Applied to `shutdown_with_context` calls whose context carries no deadline
/// of its own.
pub const DEFAULT_SHUTDOWN_DEADLINE: Duration = Duration::from_secs(10);

/// Buffer capacity for a provider's outbound event channel. Large enough to
/// absorb a short burst without blocking the provider's emitter.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Variant name returned by the built-in no-op provider and used whenever a
/// provider resolves a flag without reporting a variant of its own.
pub const DEFAULT_VARIANT_NAME: &str = "default-variant";

/// Reserved attribute name for the targeting key inside a flattened context.
pub const TARGETING_KEY_ATTRIBUTE: &str = "targetingKey";

/// Runtime-wide tunables, grouped so a host application can override them in
/// one place instead of threading individual constants through call sites.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub shutdown_deadline: Duration,
    pub event_channel_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            shutdown_deadline: DEFAULT_SHUTDOWN_DEADLINE,
            event_channel_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}
