//! Thin convenience wrappers over the process-wide client's generic resolve,
//! one pair (`_value`/`_value_details`) per [`flagforge_core::FlagValue`]
//! variant, for callers who don't want to construct an [`EvaluationContext`]
//! or [`EvaluationOptions`] for a one-off lookup.

use serde_json::Value as Json;

use flagforge_core::{EvaluationContext, ResolutionDetails};

use crate::runtime::{client, default_options};

pub async fn bool_value(flag_key: &str, default_value: bool) -> bool {
    bool_value_details(flag_key, default_value).await.value
}

pub async fn bool_value_details(flag_key: &str, default_value: bool) -> ResolutionDetails<bool> {
    client()
        .evaluate_bool(flag_key, default_value, EvaluationContext::empty(), default_options())
        .await
}

pub async fn string_value(flag_key: &str, default_value: impl Into<String>) -> String {
    string_value_details(flag_key, default_value).await.value
}

pub async fn string_value_details(flag_key: &str, default_value: impl Into<String>) -> ResolutionDetails<String> {
    client()
        .evaluate_string(flag_key, default_value.into(), EvaluationContext::empty(), default_options())
        .await
}

pub async fn int_value(flag_key: &str, default_value: i64) -> i64 {
    int_value_details(flag_key, default_value).await.value
}

pub async fn int_value_details(flag_key: &str, default_value: i64) -> ResolutionDetails<i64> {
    client()
        .evaluate_int(flag_key, default_value, EvaluationContext::empty(), default_options())
        .await
}

pub async fn float_value(flag_key: &str, default_value: f64) -> f64 {
    float_value_details(flag_key, default_value).await.value
}

pub async fn float_value_details(flag_key: &str, default_value: f64) -> ResolutionDetails<f64> {
    client()
        .evaluate_float(flag_key, default_value, EvaluationContext::empty(), default_options())
        .await
}

pub async fn object_value(flag_key: &str, default_value: Json) -> Json {
    object_value_details(flag_key, default_value).await.value
}

pub async fn object_value_details(flag_key: &str, default_value: Json) -> ResolutionDetails<Json> {
    client()
        .evaluate_object(flag_key, default_value, EvaluationContext::empty(), default_options())
        .await
}
