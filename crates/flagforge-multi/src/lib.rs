//! Combines several independently-bound providers behind one [`Provider`]
//! implementation, so the registry and client see an ordinary single
//! binding while evaluations fan out across every sub-provider.

pub mod aggregate;
pub mod isolator;
pub mod multi;
pub mod status;
pub mod strategy;
pub mod types;

pub use multi::{MultiProvider, MultiProviderBuilder, MultiStrategyKind};
pub use types::{Comparator, CustomStrategyFn, Strategy, SubProvider};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::Value as Json;

    use flagforge_core::{
        ErrorCode, FlagForgeError, FlattenedContext, LifecycleAware, MetadataValue, Provider,
        ProviderMetadata, Reason, ResolutionDetails,
    };

    use super::*;

    struct FixedBoolProvider {
        name: &'static str,
        value: Option<bool>,
    }

    #[async_trait]
    impl Provider for FixedBoolProvider {
        fn metadata(&self) -> ProviderMetadata {
            ProviderMetadata::new(self.name)
        }
        async fn resolve_bool(&self, _k: &str, d: bool, _c: &FlattenedContext) -> ResolutionDetails<bool> {
            match self.value {
                Some(v) => ResolutionDetails::success(v, Reason::Static),
                None => ResolutionDetails::error(d, ErrorCode::FlagNotFound, None),
            }
        }
        async fn resolve_string(&self, _k: &str, d: String, _c: &FlattenedContext) -> ResolutionDetails<String> {
            ResolutionDetails::success(d, Reason::Static)
        }
        async fn resolve_int(&self, _k: &str, d: i64, _c: &FlattenedContext) -> ResolutionDetails<i64> {
            ResolutionDetails::success(d, Reason::Static)
        }
        async fn resolve_float(&self, _k: &str, d: f64, _c: &FlattenedContext) -> ResolutionDetails<f64> {
            ResolutionDetails::success(d, Reason::Static)
        }
        async fn resolve_object(&self, _k: &str, d: Json, _c: &FlattenedContext) -> ResolutionDetails<Json> {
            ResolutionDetails::success(d, Reason::Static)
        }
    }

    #[tokio::test]
    async fn first_match_skips_not_found_and_names_the_winner() {
        let provider = MultiProviderBuilder::new()
            .with_sub_provider("a", Arc::new(FixedBoolProvider { name: "a", value: None }))
            .with_sub_provider("b", Arc::new(FixedBoolProvider { name: "b", value: Some(true) }))
            .build(MultiStrategyKind::FirstMatch)
            .unwrap();

        let details = provider.resolve_bool("flag", false, &FlattenedContext::default()).await;
        assert!(details.value);
        assert_eq!(details.flag_metadata.get("successful-provider-name").unwrap(), &MetadataValue::String("b".into()));
        assert_eq!(details.flag_metadata.get("strategy-used").unwrap(), &MetadataValue::String("first-match".into()));
    }

    #[tokio::test]
    async fn comparison_disagreement_falls_back() {
        let provider = MultiProviderBuilder::new()
            .with_sub_provider("a", Arc::new(FixedBoolProvider { name: "a", value: Some(true) }))
            .with_sub_provider("b", Arc::new(FixedBoolProvider { name: "b", value: Some(false) }))
            .with_fallback_provider(Arc::new(FixedBoolProvider { name: "fallback", value: Some(true) }))
            .build(MultiStrategyKind::Comparison)
            .unwrap();

        let details = provider.resolve_bool("flag", false, &FlattenedContext::default()).await;
        assert!(details.value);
        assert_eq!(details.reason, Some(Reason::AggregatedFallback));
        assert_eq!(
            details.flag_metadata.get("successful-provider-name").unwrap(),
            &MetadataValue::String("fallback".into())
        );
    }

    #[tokio::test]
    async fn comparison_one_success_one_not_found_returns_the_success() {
        let provider = MultiProviderBuilder::new()
            .with_sub_provider("a", Arc::new(FixedBoolProvider { name: "a", value: Some(true) }))
            .with_sub_provider("b", Arc::new(FixedBoolProvider { name: "b", value: None }))
            .build(MultiStrategyKind::Comparison)
            .unwrap();

        let details = provider.resolve_bool("flag", false, &FlattenedContext::default()).await;
        assert!(details.value);
        assert_eq!(details.reason, Some(Reason::Aggregated));
    }

    #[tokio::test]
    async fn comparison_all_not_found_returns_default_with_flag_not_found() {
        let provider = MultiProviderBuilder::new()
            .with_sub_provider("a", Arc::new(FixedBoolProvider { name: "a", value: None }))
            .with_sub_provider("b", Arc::new(FixedBoolProvider { name: "b", value: None }))
            .build(MultiStrategyKind::Comparison)
            .unwrap();

        let details = provider.resolve_bool("flag", false, &FlattenedContext::default()).await;
        assert!(!details.value);
        assert_eq!(details.error_code, Some(ErrorCode::FlagNotFound));
    }

    struct ErrorBoolProvider {
        name: &'static str,
        code: ErrorCode,
    }

    #[async_trait]
    impl Provider for ErrorBoolProvider {
        fn metadata(&self) -> ProviderMetadata {
            ProviderMetadata::new(self.name)
        }
        async fn resolve_bool(&self, _k: &str, d: bool, _c: &FlattenedContext) -> ResolutionDetails<bool> {
            ResolutionDetails::error(d, self.code, Some("boom".into()))
        }
        async fn resolve_string(&self, _k: &str, d: String, _c: &FlattenedContext) -> ResolutionDetails<String> {
            ResolutionDetails::success(d, Reason::Static)
        }
        async fn resolve_int(&self, _k: &str, d: i64, _c: &FlattenedContext) -> ResolutionDetails<i64> {
            ResolutionDetails::success(d, Reason::Static)
        }
        async fn resolve_float(&self, _k: &str, d: f64, _c: &FlattenedContext) -> ResolutionDetails<f64> {
            ResolutionDetails::success(d, Reason::Static)
        }
        async fn resolve_object(&self, _k: &str, d: Json, _c: &FlattenedContext) -> ResolutionDetails<Json> {
            ResolutionDetails::success(d, Reason::Static)
        }
    }

    #[tokio::test]
    async fn first_match_hard_error_names_none_as_successful_provider() {
        let provider = MultiProviderBuilder::new()
            .with_sub_provider("a", Arc::new(ErrorBoolProvider { name: "a", code: ErrorCode::TypeMismatch }))
            .build(MultiStrategyKind::FirstMatch)
            .unwrap();

        let details = provider.resolve_bool("flag", false, &FlattenedContext::default()).await;
        assert_eq!(details.error_code, Some(ErrorCode::TypeMismatch));
        assert_eq!(details.flag_metadata.get("successful-provider-name").unwrap(), &MetadataValue::String("none".into()));
        assert_eq!(details.flag_metadata.get("strategy-used").unwrap(), &MetadataValue::String("first-match".into()));
    }

    #[tokio::test]
    async fn comparison_hard_error_is_coerced_to_general() {
        let provider = MultiProviderBuilder::new()
            .with_sub_provider("a", Arc::new(ErrorBoolProvider { name: "a", code: ErrorCode::ProviderNotReady }))
            .with_sub_provider("b", Arc::new(FixedBoolProvider { name: "b", value: Some(true) }))
            .build(MultiStrategyKind::Comparison)
            .unwrap();

        let details = provider.resolve_bool("flag", false, &FlattenedContext::default()).await;
        assert_eq!(details.error_code, Some(ErrorCode::General));
        assert!(!details.value);
    }

    #[tokio::test]
    async fn empty_sub_provider_list_is_rejected_at_construction() {
        let err = MultiProviderBuilder::new().build(MultiStrategyKind::FirstMatch).unwrap_err();
        assert!(matches!(err, FlagForgeError::EmptyProviderList));
    }

    #[tokio::test]
    async fn metadata_name_lists_sub_providers_sorted() {
        let provider = MultiProviderBuilder::new()
            .with_sub_provider("zeta", Arc::new(FixedBoolProvider { name: "zeta", value: Some(true) }))
            .with_sub_provider("alpha", Arc::new(FixedBoolProvider { name: "alpha", value: Some(true) }))
            .build(MultiStrategyKind::FirstSuccess)
            .unwrap();
        let meta = provider.metadata();
        assert_eq!(meta.name, "MultiProvider {name: alpha, name: zeta}");
    }

    #[tokio::test]
    async fn init_aggregates_sub_provider_lifecycle_errors() {
        struct FailsInit;
        #[async_trait]
        impl Provider for FailsInit {
            fn metadata(&self) -> ProviderMetadata {
                ProviderMetadata::new("fails")
            }
            async fn resolve_bool(&self, _k: &str, d: bool, _c: &FlattenedContext) -> ResolutionDetails<bool> {
                ResolutionDetails::success(d, Reason::Static)
            }
            async fn resolve_string(&self, _k: &str, d: String, _c: &FlattenedContext) -> ResolutionDetails<String> {
                ResolutionDetails::success(d, Reason::Static)
            }
            async fn resolve_int(&self, _k: &str, d: i64, _c: &FlattenedContext) -> ResolutionDetails<i64> {
                ResolutionDetails::success(d, Reason::Static)
            }
            async fn resolve_float(&self, _k: &str, d: f64, _c: &FlattenedContext) -> ResolutionDetails<f64> {
                ResolutionDetails::success(d, Reason::Static)
            }
            async fn resolve_object(&self, _k: &str, d: Json, _c: &FlattenedContext) -> ResolutionDetails<Json> {
                ResolutionDetails::success(d, Reason::Static)
            }
            fn as_lifecycle(&self) -> Option<&dyn LifecycleAware> {
                Some(self)
            }
        }
        #[async_trait]
        impl LifecycleAware for FailsInit {
            async fn init(&self) -> flagforge_core::Result<()> {
                Err(FlagForgeError::Init("boom".into()))
            }
            async fn shutdown(&self) {}
        }

        let provider = MultiProviderBuilder::new()
            .with_sub_provider("a", Arc::new(FixedBoolProvider { name: "a", value: Some(true) }))
            .with_sub_provider("b", Arc::new(FailsInit))
            .build(MultiStrategyKind::FirstMatch)
            .unwrap();

        let err = provider.init().await.unwrap_err();
        assert!(matches!(err, FlagForgeError::InitAggregate(errs) if errs.len() == 1));
    }
}
