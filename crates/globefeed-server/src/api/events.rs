use std::time::Instant;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use globefeed_sources::{normalize, NewsQuery, Provider};
use globefeed_synth::synthesize_events;

use crate::middleware::RequestId;

use super::{map_source_error, map_synth_error, normalize_limit, ApiFailure, ApiSuccess, AppState};

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 50;
const DEFAULT_LLM_LIMIT: usize = 8;
const MAX_LLM_LIMIT: usize = 20;

#[derive(Debug, Default, Deserialize)]
pub(super) struct EventParams {
    pub limit: Option<usize>,
    pub page: Option<usize>,
    pub symbols: Option<String>,
    pub exchanges: Option<String>,
    pub countries: Option<String>,
    pub must_have_entities: Option<bool>,
    pub published_after: Option<String>,
    pub published_before: Option<String>,
    /// How many articles feed the model; the rest are dropped after fetch.
    pub llm_limit: Option<usize>,
    pub entity_types: Option<String>,
    pub min_match_score: Option<f64>,
    pub filter_entities: Option<bool>,
}

pub(super) async fn get_events(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<EventParams>,
) -> Result<Json<ApiSuccess<Value>>, ApiFailure> {
    serve_events(state, req_id, params).await
}

pub(super) async fn post_events(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(params): Json<EventParams>,
) -> Result<Json<ApiSuccess<Value>>, ApiFailure> {
    serve_events(state, req_id, params).await
}

async fn serve_events(
    state: AppState,
    req_id: RequestId,
    params: EventParams,
) -> Result<Json<ApiSuccess<Value>>, ApiFailure> {
    let Some(provider) = state.provider.clone() else {
        tracing::error!("event route called without a configured provider API key");
        return Err(ApiFailure::internal("market news provider is not configured"));
    };

    let limit = normalize_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let llm_limit = normalize_limit(params.llm_limit, DEFAULT_LLM_LIMIT, MAX_LLM_LIMIT);

    // Every field forwarded to the provider belongs in the key; otherwise
    // two requests differing only in a pass-through filter share a slot.
    let cache_key = format!(
        "event:{limit}:{llm_limit}:{}:{}:{}:{:?}:{}:{}:{}:{:?}:{:?}:{:?}",
        params.symbols.as_deref().unwrap_or(""),
        params.exchanges.as_deref().unwrap_or(""),
        params.countries.as_deref().unwrap_or(""),
        params.must_have_entities,
        params.published_after.as_deref().unwrap_or(""),
        params.published_before.as_deref().unwrap_or(""),
        params.entity_types.as_deref().unwrap_or(""),
        params.min_match_score,
        params.filter_entities,
        params.page,
    );
    if let Some(cached) = state.cache.get(&cache_key).await {
        let count = cached.as_array().map_or(0, Vec::len);
        return Ok(Json(ApiSuccess::with_meta(
            cached,
            serde_json::json!({ "request_id": req_id.0, "count": count, "cached": true }),
        )));
    }

    let query = NewsQuery {
        symbols: params.symbols.clone(),
        exchanges: params.exchanges.clone(),
        countries: params.countries.clone(),
        must_have_entities: params.must_have_entities,
        published_after: params.published_after.clone(),
        published_before: params.published_before.clone(),
        published_on: None,
        entity_types: params.entity_types.clone(),
        min_match_score: params.min_match_score,
        filter_entities: params.filter_entities,
        limit: Some(limit),
        page: params.page,
    };

    let fetch_started = Instant::now();
    let raw = provider.news(&query).await.map_err(|e| map_source_error(&e))?;
    let fetch_ms = u64::try_from(fetch_started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let fetched_at = Utc::now();
    let items: Vec<_> = raw
        .into_iter()
        .filter_map(|r| normalize(r, Provider::Market, fetched_at))
        .take(llm_limit)
        .collect();

    let synth_started = Instant::now();
    let events = synthesize_events(&state.llm, &items)
        .await
        .map_err(|e| map_synth_error(&e))?;
    let synth_ms = u64::try_from(synth_started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let data = serde_json::to_value(&events)
        .map_err(|e| {
            tracing::error!(error = %e, "event serialization failed");
            ApiFailure::internal("failed to serialize market events")
        })?;
    state.cache.insert(&cache_key, data.clone()).await;

    Ok(Json(ApiSuccess::with_meta(
        data,
        serde_json::json!({
            "request_id": req_id.0,
            "count": events.len(),
            "cached": false,
            "timings_ms": { "fetch": fetch_ms, "synthesis": synth_ms },
        }),
    )))
}
