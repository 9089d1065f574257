use std::sync::OnceLock;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use globefeed_sources::{normalize, NewsQuery, Provider};
use globefeed_synth::synthesize_with_fallback;

use super::{map_source_error, ApiFailure, AppState};

/// Articles fetched per historical date. Fallback mode runs one model call
/// per pair of articles, so this bounds the call count per request.
const ARTICLE_LIMIT: usize = 6;

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date pattern"))
}

#[derive(Debug, Deserialize)]
pub(super) struct TimeMachineParams {
    pub date: String,
    /// Optional ISO-2 code steering heuristic event placement.
    pub countries: Option<String>,
}

/// Historical events for one calendar day, as a bare JSON array.
///
/// Unlike the other routes this one never wraps its payload: an empty day is
/// `[]`, and fallback-mode synthesis guarantees one event per fetched
/// article, so a non-empty day always renders something.
pub(super) async fn get_time_machine(
    State(state): State<AppState>,
    Query(params): Query<TimeMachineParams>,
) -> Result<Json<Value>, ApiFailure> {
    if !date_pattern().is_match(&params.date) {
        return Err(ApiFailure::bad_request(
            "invalid date",
            format!("date must be YYYY-MM-DD, got '{}'", params.date),
        ));
    }
    let date = NaiveDate::parse_from_str(&params.date, "%Y-%m-%d").map_err(|_| {
        ApiFailure::bad_request(
            "invalid date",
            format!("'{}' is not a real calendar date", params.date),
        )
    })?;

    let Some(provider) = state.provider.clone() else {
        tracing::error!("time-machine route called without a configured provider API key");
        return Err(ApiFailure::internal("market news provider is not configured"));
    };

    let cache_key = format!(
        "time-machine:{date}:{}",
        params.countries.as_deref().unwrap_or("")
    );
    if let Some(cached) = state.cache.get(&cache_key).await {
        return Ok(Json(cached));
    }

    let query = NewsQuery {
        countries: params.countries.clone(),
        must_have_entities: Some(true),
        published_on: Some(date),
        limit: Some(ARTICLE_LIMIT),
        ..NewsQuery::default()
    };
    let raw = provider.news(&query).await.map_err(|e| map_source_error(&e))?;

    let fetched_at = Utc::now();
    let items: Vec<_> = raw
        .into_iter()
        .filter_map(|r| normalize(r, Provider::Market, fetched_at))
        .collect();
    if items.is_empty() {
        return Ok(Json(Value::Array(Vec::new())));
    }

    // The first requested country hints heuristic event placement.
    let country_hint = params
        .countries
        .as_deref()
        .and_then(|c| c.split(',').next())
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let events = synthesize_with_fallback(&state.llm, &items, country_hint).await;

    let data = serde_json::to_value(&events).map_err(|e| {
        tracing::error!(error = %e, "event serialization failed");
        ApiFailure::internal("failed to serialize market events")
    })?;
    state.cache.insert(&cache_key, data.clone()).await;
    Ok(Json(data))
}
