use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value as Json;

use flagforge_core::{ErrorCode, FlattenedContext, Provider, ProviderMetadata, ResolutionDetails};

/// A `DashMap`-backed provider for tests and for callers who don't yet have
/// a real flag-management backend wired up. Flags are plain JSON values
/// keyed by flag key; a missing key resolves as `FLAG_NOT_FOUND`, a present
/// key whose JSON shape doesn't match the requested primitive resolves as
/// `TYPE_MISMATCH`.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    name: String,
    flags: DashMap<String, Json>,
}

impl InMemoryProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), flags: DashMap::new() }
    }

    pub fn set(&self, flag_key: impl Into<String>, value: impl Into<Json>) {
        self.flags.insert(flag_key.into(), value.into());
    }

    pub fn remove(&self, flag_key: &str) {
        self.flags.remove(flag_key);
    }

    fn lookup<T>(&self, flag_key: &str, default_value: T, shape: impl Fn(&Json) -> Option<T>) -> ResolutionDetails<T> {
        match self.flags.get(flag_key) {
            None => ResolutionDetails::error(
                default_value,
                ErrorCode::FlagNotFound,
                Some(format!("no flag named '{flag_key}'")),
            ),
            Some(stored) => match shape(&stored) {
                Some(value) => ResolutionDetails::success(value, flagforge_core::Reason::Static),
                None => ResolutionDetails::error(
                    default_value,
                    ErrorCode::TypeMismatch,
                    Some(format!("flag '{flag_key}' is not of the requested type")),
                ),
            },
        }
    }
}

#[async_trait]
impl Provider for InMemoryProvider {
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata::new(self.name.clone())
    }

    async fn resolve_bool(&self, flag_key: &str, default_value: bool, _ctx: &FlattenedContext) -> ResolutionDetails<bool> {
        self.lookup(flag_key, default_value, Json::as_bool)
    }

    async fn resolve_string(&self, flag_key: &str, default_value: String, _ctx: &FlattenedContext) -> ResolutionDetails<String> {
        self.lookup(flag_key, default_value, |j| j.as_str().map(str::to_string))
    }

    async fn resolve_int(&self, flag_key: &str, default_value: i64, _ctx: &FlattenedContext) -> ResolutionDetails<i64> {
        self.lookup(flag_key, default_value, Json::as_i64)
    }

    async fn resolve_float(&self, flag_key: &str, default_value: f64, _ctx: &FlattenedContext) -> ResolutionDetails<f64> {
        self.lookup(flag_key, default_value, Json::as_f64)
    }

    async fn resolve_object(&self, flag_key: &str, default_value: Json, _ctx: &FlattenedContext) -> ResolutionDetails<Json> {
        self.lookup(flag_key, default_value, |j| Some(j.clone()))
    }
}
