use async_trait::async_trait;
use serde_json::Value as Json;

use crate::config::DEFAULT_VARIANT_NAME;
use crate::context::FlattenedContext;
use crate::provider::{Provider, ProviderMetadata};
use crate::resolution::{Reason, ResolutionDetails};

/// The minimal provider the registry substitutes when no provider has been
/// configured for a binding: the default binding is never null. Always
/// returns the caller's default value with reason `DEFAULT` and the standard
/// default variant name.
///
/// This is a thin shell; a more fully-featured, documented re-export lives
/// in the `flagforge` facade crate.
#[derive(Debug, Clone, Default)]
pub struct NoopProvider;

impl NoopProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Provider for NoopProvider {
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata::new("No-op Provider")
    }

    async fn resolve_bool(&self, _flag_key: &str, default_value: bool, _ctx: &FlattenedContext) -> ResolutionDetails<bool> {
        ResolutionDetails::success(default_value, Reason::Default).with_variant(DEFAULT_VARIANT_NAME)
    }

    async fn resolve_string(&self, _flag_key: &str, default_value: String, _ctx: &FlattenedContext) -> ResolutionDetails<String> {
        ResolutionDetails::success(default_value, Reason::Default).with_variant(DEFAULT_VARIANT_NAME)
    }

    async fn resolve_int(&self, _flag_key: &str, default_value: i64, _ctx: &FlattenedContext) -> ResolutionDetails<i64> {
        ResolutionDetails::success(default_value, Reason::Default).with_variant(DEFAULT_VARIANT_NAME)
    }

    async fn resolve_float(&self, _flag_key: &str, default_value: f64, _ctx: &FlattenedContext) -> ResolutionDetails<f64> {
        ResolutionDetails::success(default_value, Reason::Default).with_variant(DEFAULT_VARIANT_NAME)
    }

    async fn resolve_object(&self, _flag_key: &str, default_value: Json, _ctx: &FlattenedContext) -> ResolutionDetails<Json> {
        ResolutionDetails::success(default_value, Reason::Default).with_variant(DEFAULT_VARIANT_NAME)
    }
}
