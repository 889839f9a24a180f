use std::sync::Arc;

use flagforge_core::{ErrorCode, MetadataValue, Provider, Reason, ResolutionDetails};
use flagforge_hooks::{Hook, HookContext, HookHints};

use crate::aggregate::AggregatableValue;
use crate::isolator::resolve_isolated;
use crate::types::{Comparator, CustomStrategyFn, Strategy, SubProvider};

fn with_metadata<T>(mut details: ResolutionDetails<T>, pairs: &[(&str, MetadataValue)]) -> ResolutionDetails<T> {
    for (k, v) in pairs {
        details.flag_metadata.insert(k.to_string(), v.clone());
    }
    details
}

/// FIRST_MATCH: try sub-providers in configuration order, skipping any that
/// answer FLAG_NOT_FOUND, and returning the first successful (or otherwise
/// failing) result.
pub async fn first_match<T: AggregatableValue>(
    subs: &[SubProvider],
    extra_hooks: &[Arc<dyn Hook>],
    flag_key: &str,
    default_value: T,
    base_ctx: &HookContext,
    hints: &HookHints,
) -> ResolutionDetails<T> {
    for sub in subs {
        let details = resolve_isolated(sub, extra_hooks, flag_key, default_value.clone(), base_ctx, hints).await;
        if details.error_code == Some(ErrorCode::FlagNotFound) {
            continue;
        }
        if details.is_error() {
            return with_metadata(
                details,
                &[("successful-provider-name", "none".into()), ("strategy-used", "first-match".into())],
            );
        }
        return with_metadata(
            details,
            &[("successful-provider-name", sub.name.as_str().into()), ("strategy-used", "first-match".into())],
        );
    }
    ResolutionDetails::error(default_value, ErrorCode::FlagNotFound, Some("no sub-provider matched".into()))
}

/// FIRST_SUCCESS: try sub-providers in configuration order, returning the
/// first successful result. Any error (including FLAG_NOT_FOUND) just means
/// "keep going"; the last error seen is returned only if every sub-provider
/// fails.
pub async fn first_success<T: AggregatableValue>(
    subs: &[SubProvider],
    extra_hooks: &[Arc<dyn Hook>],
    flag_key: &str,
    default_value: T,
    base_ctx: &HookContext,
    hints: &HookHints,
) -> ResolutionDetails<T> {
    let mut last_error: Option<ResolutionDetails<T>> = None;
    for sub in subs {
        let details = resolve_isolated(sub, extra_hooks, flag_key, default_value.clone(), base_ctx, hints).await;
        if !details.is_error() {
            return with_metadata(
                details,
                &[("successful-provider-name", sub.name.as_str().into()), ("strategy-used", "first-success".into())],
            );
        }
        last_error = Some(details);
    }
    last_error.unwrap_or_else(|| {
        ResolutionDetails::error(default_value, ErrorCode::FlagNotFound, Some("no sub-providers configured".into()))
    })
}

/// COMPARISON: resolve every sub-provider concurrently. If every successful
/// result agrees (via `==`, or the configured comparator for object flags),
/// return it with an AGGREGATED reason. On disagreement, fall back to a
/// configured fallback provider (AGGREGATED_FALLBACK) or fail with GENERAL.
/// Sub-providers answering FLAG_NOT_FOUND are excluded from the agreement
/// check; a non-FLAG_NOT_FOUND error from any sub-provider cancels the rest
/// and is returned directly.
#[allow(clippy::too_many_arguments)]
pub async fn comparison<T: AggregatableValue>(
    subs: &[SubProvider],
    extra_hooks: &[Arc<dyn Hook>],
    flag_key: &str,
    default_value: T,
    base_ctx: &HookContext,
    hints: &HookHints,
    fallback: &Option<Arc<dyn Provider>>,
    comparator: &Option<Comparator>,
) -> ResolutionDetails<T> {
    let mut set = tokio::task::JoinSet::new();
    for sub in subs.to_vec() {
        let extra = extra_hooks.to_vec();
        let key = flag_key.to_string();
        let default = default_value.clone();
        let ctx = base_ctx.clone();
        let hints = hints.clone();
        set.spawn(async move {
            let details = resolve_isolated(&sub, &extra, &key, default, &ctx, &hints).await;
            (sub.name, details)
        });
    }

    let mut successes: Vec<(String, ResolutionDetails<T>)> = Vec::new();
    let mut hard_error: Option<ResolutionDetails<T>> = None;
    while let Some(joined) = set.join_next().await {
        let Ok((name, details)) = joined else { continue };
        if details.is_error() {
            if details.error_code != Some(ErrorCode::FlagNotFound) && hard_error.is_none() {
                hard_error = Some(details);
                set.abort_all();
                break;
            }
            continue;
        }
        successes.push((name, details));
    }

    if let Some(err) = hard_error {
        let message = err
            .error_message
            .unwrap_or_else(|| format!("sub-provider failed with {:?}", err.error_code));
        return ResolutionDetails::error(default_value, ErrorCode::General, Some(message));
    }
    if successes.is_empty() {
        return ResolutionDetails::error(
            default_value,
            ErrorCode::FlagNotFound,
            Some("no sub-provider resolved the flag".into()),
        );
    }

    if agreement_check::<T>(&successes, comparator) {
        successes.sort_by(|(a, _), (b, _)| a.cmp(b));
        let names: Vec<&str> = successes.iter().map(|(n, _)| n.as_str()).collect();
        let names_joined = names.join(",");
        let (_, winner) = successes.into_iter().next().unwrap();
        let mut winner = with_metadata(
            winner,
            &[("strategy-used", "comparison".into()), ("successful-provider-name", names_joined.into())],
        );
        winner.reason = Some(Reason::Aggregated);
        return winner;
    }

    if let Some(fallback_provider) = fallback {
        let flattened = base_ctx.evaluation_context.flatten();
        let details = T::resolve_from(fallback_provider.as_ref(), flag_key, default_value, &flattened).await;
        if !details.is_error() {
            let mut details = with_metadata(
                details,
                &[("strategy-used", "comparison".into()), ("fallback-used", true.into()), ("successful-provider-name", "fallback".into())],
            );
            details.reason = Some(Reason::AggregatedFallback);
            return details;
        }
        return details;
    }

    ResolutionDetails::error(
        default_value,
        ErrorCode::General,
        Some("sub-providers disagreed and no fallback is configured".into()),
    )
}

fn agreement_check<T: AggregatableValue>(successes: &[(String, ResolutionDetails<T>)], comparator: &Option<Comparator>) -> bool {
    if successes.len() <= 1 {
        return true;
    }
    if T::requires_explicit_comparator() {
        let Some(cmp) = comparator else { return false };
        let first = successes[0].1.value.clone().into_flag_value();
        let first_variant = &successes[0].1.variant;
        return successes[1..]
            .iter()
            .all(|(_, d)| cmp(&first, &d.value.clone().into_flag_value()) && &d.variant == first_variant);
    }
    let first = &successes[0].1.value;
    let first_variant = &successes[0].1.variant;
    successes[1..].iter().all(|(_, d)| &d.value == first && &d.variant == first_variant)
}

/// CUSTOM: resolve every sub-provider concurrently, then hand the user's
/// closure the complete name-keyed result set (in configuration order) plus
/// the caller's default, and trust its decision outright.
pub async fn custom<T: AggregatableValue>(
    subs: &[SubProvider],
    extra_hooks: &[Arc<dyn Hook>],
    flag_key: &str,
    default_value: T,
    base_ctx: &HookContext,
    hints: &HookHints,
    strategy_fn: &CustomStrategyFn,
) -> ResolutionDetails<T> {
    let mut set = tokio::task::JoinSet::new();
    for (index, sub) in subs.iter().cloned().enumerate() {
        let extra = extra_hooks.to_vec();
        let key = flag_key.to_string();
        let default = default_value.clone();
        let ctx = base_ctx.clone();
        let hints = hints.clone();
        set.spawn(async move {
            let details = resolve_isolated(&sub, &extra, &key, default, &ctx, &hints).await;
            (index, sub.name, details.map(AggregatableValue::into_flag_value))
        });
    }

    let mut results = Vec::with_capacity(subs.len());
    while let Some(joined) = set.join_next().await {
        if let Ok(entry) = joined {
            results.push(entry);
        }
    }
    results.sort_by_key(|(index, _, _)| *index);
    let results: Vec<_> = results.into_iter().map(|(_, name, details)| (name, details)).collect();

    let default_flag_value = default_value.clone().into_flag_value();
    let generic = strategy_fn(flag_key, &results, &default_flag_value);
    generic.map(|v| T::from_flag_value(v).unwrap_or(default_value))
}

/// Dispatches to the strategy named by `strategy`.
pub async fn resolve<T: AggregatableValue>(
    strategy: &Strategy,
    subs: &[SubProvider],
    extra_hooks: &[Arc<dyn Hook>],
    flag_key: &str,
    default_value: T,
    base_ctx: &HookContext,
    hints: &HookHints,
) -> ResolutionDetails<T> {
    match strategy {
        Strategy::FirstMatch => first_match(subs, extra_hooks, flag_key, default_value, base_ctx, hints).await,
        Strategy::FirstSuccess => first_success(subs, extra_hooks, flag_key, default_value, base_ctx, hints).await,
        Strategy::Comparison { fallback, comparator } => {
            comparison(subs, extra_hooks, flag_key, default_value, base_ctx, hints, fallback, comparator).await
        }
        Strategy::Custom(f) => custom(subs, extra_hooks, flag_key, default_value, base_ctx, hints, f).await,
    }
}
