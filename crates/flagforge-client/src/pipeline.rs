use async_trait::async_trait;
use serde_json::Value as Json;
use tracing::instrument;

use flagforge_core::{
    ErrorCode, EvaluationContext, FlagValue, FlattenedContext, Provider, ResolutionDetails, Status,
};
use flagforge_hooks::{
    run_after, run_before, run_error, run_finally, ClientMetadata, FlagType, HookChain, HookContext,
    HookError, HookResolutionDetails,
};

use crate::client::Client;
use crate::options::EvaluationOptions;
use crate::transaction::transaction_context;

/// Bridges a concrete evaluation result type to the dynamically-kinded
/// [`FlagValue`] the hook chain and telemetry operate on, and supplies the
/// one provider call each type resolves through.
///
/// The four primitive implementations each call their own
/// `Provider::resolve_*` method, which by construction can never disagree
/// with the requested type — Rust's type system already rules out the
/// mismatch a dynamically-typed SDK has to check for. [`FlagValue`] is the
/// one implementation where a real mismatch is observable: it always goes
/// through `resolve_object` (the provider's opaque/dynamic resolve op) and
/// compares the returned JSON's shape against the caller's requested kind.
#[async_trait]
pub trait TypedResolve: Clone + Send + Sync + 'static {
    fn flag_type(&self) -> FlagType;

    async fn resolve_via(
        &self,
        provider: &dyn Provider,
        flag_key: &str,
        ctx: &FlattenedContext,
    ) -> ResolutionDetails<Self>;

    fn into_flag_value(self) -> FlagValue;
}

#[async_trait]
impl TypedResolve for bool {
    fn flag_type(&self) -> FlagType {
        FlagType::Bool
    }
    async fn resolve_via(&self, provider: &dyn Provider, flag_key: &str, ctx: &FlattenedContext) -> ResolutionDetails<bool> {
        provider.resolve_bool(flag_key, *self, ctx).await
    }
    fn into_flag_value(self) -> FlagValue {
        FlagValue::Bool(self)
    }
}

#[async_trait]
impl TypedResolve for String {
    fn flag_type(&self) -> FlagType {
        FlagType::String
    }
    async fn resolve_via(&self, provider: &dyn Provider, flag_key: &str, ctx: &FlattenedContext) -> ResolutionDetails<String> {
        provider.resolve_string(flag_key, self.clone(), ctx).await
    }
    fn into_flag_value(self) -> FlagValue {
        FlagValue::String(self)
    }
}

#[async_trait]
impl TypedResolve for i64 {
    fn flag_type(&self) -> FlagType {
        FlagType::Int
    }
    async fn resolve_via(&self, provider: &dyn Provider, flag_key: &str, ctx: &FlattenedContext) -> ResolutionDetails<i64> {
        provider.resolve_int(flag_key, *self, ctx).await
    }
    fn into_flag_value(self) -> FlagValue {
        FlagValue::Int(self)
    }
}

#[async_trait]
impl TypedResolve for f64 {
    fn flag_type(&self) -> FlagType {
        FlagType::Float
    }
    async fn resolve_via(&self, provider: &dyn Provider, flag_key: &str, ctx: &FlattenedContext) -> ResolutionDetails<f64> {
        provider.resolve_float(flag_key, *self, ctx).await
    }
    fn into_flag_value(self) -> FlagValue {
        FlagValue::Float(self)
    }
}

#[async_trait]
impl TypedResolve for Json {
    fn flag_type(&self) -> FlagType {
        FlagType::Object
    }
    async fn resolve_via(&self, provider: &dyn Provider, flag_key: &str, ctx: &FlattenedContext) -> ResolutionDetails<Json> {
        provider.resolve_object(flag_key, self.clone(), ctx).await
    }
    fn into_flag_value(self) -> FlagValue {
        FlagValue::Object(self)
    }
}

#[async_trait]
impl TypedResolve for FlagValue {
    fn flag_type(&self) -> FlagType {
        match self {
            FlagValue::Bool(_) => FlagType::Bool,
            FlagValue::Int(_) => FlagType::Int,
            FlagValue::Float(_) => FlagType::Float,
            FlagValue::String(_) => FlagType::String,
            FlagValue::Object(_) => FlagType::Object,
        }
    }

    async fn resolve_via(&self, provider: &dyn Provider, flag_key: &str, ctx: &FlattenedContext) -> ResolutionDetails<FlagValue> {
        let details = provider.resolve_object(flag_key, self.as_json(), ctx).await;
        if details.is_error() {
            return details.map(FlagValue::Object);
        }
        let resolved = FlagValue::Object(details.value.clone());
        if !self.same_kind(&resolved) {
            return ResolutionDetails::error(
                self.clone(),
                ErrorCode::TypeMismatch,
                Some("provider's resolved value does not match the requested flag type".to_string()),
            );
        }
        let value = match self {
            FlagValue::Bool(_) => FlagValue::Bool(details.value.as_bool().expect("same_kind checked")),
            FlagValue::Int(_) => FlagValue::Int(details.value.as_i64().expect("same_kind checked")),
            FlagValue::Float(_) => FlagValue::Float(details.value.as_f64().expect("same_kind checked")),
            FlagValue::String(_) => FlagValue::String(details.value.as_str().expect("same_kind checked").to_string()),
            FlagValue::Object(_) => resolved,
        };
        ResolutionDetails { value, ..details }
    }

    fn into_flag_value(self) -> FlagValue {
        self
    }
}

fn gate_error(status: Status) -> Option<HookError> {
    match status {
        Status::NotReady => Some(HookError::ProviderError {
            code: ErrorCode::ProviderNotReady,
            message: "provider is not yet ready".to_string(),
        }),
        Status::Fatal => Some(HookError::ProviderError {
            code: ErrorCode::ProviderFatal,
            message: "provider entered a fatal state".to_string(),
        }),
        Status::Ready | Status::Stale | Status::Error => None,
    }
}

fn error_details<T: TypedResolve>(default: &T, err: &HookError) -> ResolutionDetails<T> {
    ResolutionDetails::error(default.clone(), err.error_code(), Some(err.to_string()))
}

/// Runs the full evaluation pipeline for one typed flag resolution: context
/// merge, status gate, before/after/error/finally hook ordering, and
/// defaulting on any failure path.
#[instrument(skip_all)]
pub async fn run_pipeline<T: TypedResolve>(
    client: &Client,
    flag_key: impl AsRef<[u8]>,
    default_value: T,
    invocation_ctx: EvaluationContext,
    opts: EvaluationOptions,
) -> ResolutionDetails<T> {
    let (provider, global_hooks, global_ctx) = client.registry().for_evaluation(client.domain());
    let chain = HookChain {
        global: global_hooks,
        client: client.hooks(),
        invocation: opts.hooks.clone(),
        // Provider-contributed hooks are not a core Provider capability in
        // this runtime; see DESIGN.md.
        provider: Vec::new(),
    };
    let before_hooks = chain.before_order();
    let reverse_hooks = chain.reverse_order();
    let hints = opts.hook_hints;

    let merged_ctx = EvaluationContext::merge(&[
        global_ctx,
        transaction_context().unwrap_or_default(),
        client.context(),
        invocation_ctx,
    ]);

    let hook_ctx_base = HookContext {
        flag_key: String::from_utf8_lossy(flag_key.as_ref()).into_owned(),
        flag_type: default_value.flag_type(),
        default_value: default_value.clone().into_flag_value(),
        client_metadata: ClientMetadata { name: client.name().to_string(), domain: client.domain().map(str::to_string) },
        provider_metadata: provider.metadata(),
        evaluation_context: merged_ctx,
    };

    macro_rules! fail {
        ($err:expr, $ctx:expr) => {{
            let err = $err;
            let hook_ctx = $ctx;
            run_error(&reverse_hooks, &hook_ctx, &err, &hints).await;
            let details = error_details(&default_value, &err);
            let generic: HookResolutionDetails = details.clone().map(TypedResolve::into_flag_value);
            run_finally(&reverse_hooks, &hook_ctx, &generic, &hints).await;
            return details;
        }};
    }

    if std::str::from_utf8(flag_key.as_ref()).is_err() {
        fail!(
            HookError::ProviderError { code: ErrorCode::ParseError, message: "flag key is not valid UTF-8".to_string() },
            hook_ctx_base
        );
    }

    if let Some(err) = gate_error(client.registry().status(client.domain())) {
        fail!(err, hook_ctx_base);
    }

    let (merged_after_before, before_err) = run_before(&before_hooks, &hook_ctx_base, &hints).await;
    let mut hook_ctx = hook_ctx_base;
    hook_ctx.evaluation_context = merged_after_before;
    if let Some(err) = before_err {
        fail!(err, hook_ctx);
    }

    let flattened = hook_ctx.evaluation_context.flatten();
    let details = default_value.resolve_via(provider.as_ref(), &hook_ctx.flag_key, &flattened).await;

    if details.is_error() {
        let code = details.error_code.unwrap_or(ErrorCode::General);
        let message = details.error_message.clone().unwrap_or_default();
        fail!(HookError::ProviderError { code, message }, hook_ctx);
    }

    let generic_details: HookResolutionDetails = details.clone().map(TypedResolve::into_flag_value);
    if let Some(err) = run_after(&reverse_hooks, &hook_ctx, &generic_details, &hints).await {
        fail!(err, hook_ctx);
    }

    run_finally(&reverse_hooks, &hook_ctx, &generic_details, &hints).await;
    details
}
