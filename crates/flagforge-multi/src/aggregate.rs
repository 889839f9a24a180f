use async_trait::async_trait;
use serde_json::Value as Json;

use flagforge_core::{FlagValue, FlattenedContext, Provider, ResolutionDetails};

/// Bridges a concrete evaluation type to the single provider call the
/// aggregator's strategies resolve through, mirroring the client pipeline's
/// `TypedResolve` but kept local to this crate: the aggregator is itself a
/// `Provider` implementation and must not depend on the client crate that
/// consumes providers.
#[async_trait]
pub trait AggregatableValue: Clone + PartialEq + Send + Sync + 'static {
    async fn resolve_from(provider: &dyn Provider, flag_key: &str, default: Self, ctx: &FlattenedContext) -> ResolutionDetails<Self>;
    fn into_flag_value(self) -> FlagValue;
    fn from_flag_value(value: FlagValue) -> Option<Self>;

    /// Object-valued flags have no well-defined equality, so a COMPARISON
    /// strategy needs an explicit comparator before it can judge whether two
    /// sub-providers agree. Every other type compares with plain `==`.
    fn requires_explicit_comparator() -> bool {
        false
    }
}

#[async_trait]
impl AggregatableValue for bool {
    async fn resolve_from(provider: &dyn Provider, flag_key: &str, default: bool, ctx: &FlattenedContext) -> ResolutionDetails<bool> {
        provider.resolve_bool(flag_key, default, ctx).await
    }
    fn into_flag_value(self) -> FlagValue {
        FlagValue::Bool(self)
    }
    fn from_flag_value(value: FlagValue) -> Option<Self> {
        value.as_bool()
    }
}

#[async_trait]
impl AggregatableValue for String {
    async fn resolve_from(provider: &dyn Provider, flag_key: &str, default: String, ctx: &FlattenedContext) -> ResolutionDetails<String> {
        provider.resolve_string(flag_key, default, ctx).await
    }
    fn into_flag_value(self) -> FlagValue {
        FlagValue::String(self)
    }
    fn from_flag_value(value: FlagValue) -> Option<Self> {
        value.as_string()
    }
}

#[async_trait]
impl AggregatableValue for i64 {
    async fn resolve_from(provider: &dyn Provider, flag_key: &str, default: i64, ctx: &FlattenedContext) -> ResolutionDetails<i64> {
        provider.resolve_int(flag_key, default, ctx).await
    }
    fn into_flag_value(self) -> FlagValue {
        FlagValue::Int(self)
    }
    fn from_flag_value(value: FlagValue) -> Option<Self> {
        value.as_i64()
    }
}

#[async_trait]
impl AggregatableValue for f64 {
    async fn resolve_from(provider: &dyn Provider, flag_key: &str, default: f64, ctx: &FlattenedContext) -> ResolutionDetails<f64> {
        provider.resolve_float(flag_key, default, ctx).await
    }
    fn into_flag_value(self) -> FlagValue {
        FlagValue::Float(self)
    }
    fn from_flag_value(value: FlagValue) -> Option<Self> {
        value.as_f64()
    }
}

#[async_trait]
impl AggregatableValue for Json {
    async fn resolve_from(provider: &dyn Provider, flag_key: &str, default: Json, ctx: &FlattenedContext) -> ResolutionDetails<Json> {
        provider.resolve_object(flag_key, default, ctx).await
    }
    fn into_flag_value(self) -> FlagValue {
        FlagValue::Object(self)
    }
    fn from_flag_value(value: FlagValue) -> Option<Self> {
        Some(value.as_json())
    }
    fn requires_explicit_comparator() -> bool {
        true
    }
}
