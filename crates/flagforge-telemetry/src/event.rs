use std::collections::HashMap;

use serde_json::Value as Json;

use flagforge_core::{ErrorCode, FlagMetadata, MetadataValue, Reason, ResolutionDetails};
use flagforge_hooks::HookContext;

pub const EVENT_NAME: &str = "feature_flag.evaluation";

/// A standard-schema evaluation event, ready to hand to any exporter that
/// accepts a flat name/attributes/body triple.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TelemetryEvent {
    pub name: String,
    pub attributes: HashMap<String, Json>,
    pub body: HashMap<String, Json>,
}

/// Build the telemetry event for one evaluation, given the hook context the
/// pipeline ran and the generic [`ResolutionDetails`] it produced.
pub fn build_event(ctx: &HookContext, details: &ResolutionDetails<flagforge_core::FlagValue>) -> TelemetryEvent {
    let mut attributes = HashMap::new();
    attributes.insert("feature_flag.key".to_string(), Json::String(ctx.flag_key.clone()));
    attributes.insert(
        "feature_flag.provider_name".to_string(),
        Json::String(ctx.provider_metadata.name.clone()),
    );

    let reason = details.reason.unwrap_or(Reason::Unknown);
    attributes.insert(
        "feature_flag.evaluation.reason".to_string(),
        Json::String(reason.as_telemetry_str().to_string()),
    );

    if let Some(variant) = &details.variant {
        attributes.insert("feature_flag.variant".to_string(), Json::String(variant.clone()));
    }

    if let Some(context_id) = context_id(ctx, &details.flag_metadata) {
        attributes.insert("feature_flag.context.id".to_string(), context_id);
    }
    if let Some(set_id) = metadata_json(&details.flag_metadata, "flagSetId") {
        attributes.insert("feature_flag.set.id".to_string(), set_id);
    }
    if let Some(version) = metadata_json(&details.flag_metadata, "version") {
        attributes.insert("feature_flag.version".to_string(), version);
    }

    if details.reason == Some(Reason::Error) {
        let code = details.error_code.unwrap_or(ErrorCode::General);
        attributes.insert(
            "error.type".to_string(),
            serde_json::to_value(code).expect("ErrorCode always serializes"),
        );
        if let Some(message) = &details.error_message {
            attributes.insert(
                "feature_flag.evaluation.error.message".to_string(),
                Json::String(message.clone()),
            );
        }
    }

    let mut body = HashMap::new();
    if details.variant.is_none() {
        body.insert("value".to_string(), details.value.as_json());
    }

    TelemetryEvent { name: EVENT_NAME.to_string(), attributes, body }
}

fn context_id(ctx: &HookContext, metadata: &FlagMetadata) -> Option<Json> {
    metadata_json(metadata, "contextId").or_else(|| {
        let key = ctx.evaluation_context.targeting_key();
        if key.is_empty() {
            None
        } else {
            Some(Json::String(key.to_string()))
        }
    })
}

fn metadata_json(metadata: &FlagMetadata, key: &str) -> Option<Json> {
    metadata.get(key).map(|v| match v {
        MetadataValue::Bool(b) => Json::Bool(*b),
        MetadataValue::Int(i) => Json::from(*i),
        MetadataValue::Float(f) => Json::from(*f),
        MetadataValue::String(s) => Json::String(s.clone()),
    })
}
