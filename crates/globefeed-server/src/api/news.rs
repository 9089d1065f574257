use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;

use globefeed_sources::{AggregateOptions, SourceSet};

use crate::middleware::RequestId;

use super::{normalize_limit, ApiFailure, ApiSuccess, AppState};

const DEFAULT_LIMIT: usize = 30;
const MAX_LIMIT: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub(super) struct NewsParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub category: Option<String>,
    /// Comma-separated adapter names (`rss,forum,linkagg`); all when absent.
    pub sources: Option<String>,
    /// POST only: substring filters against each item's symbols.
    #[serde(default)]
    pub symbols: Vec<String>,
}

pub(super) async fn get_news(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<NewsParams>,
) -> Result<Json<ApiSuccess<Value>>, ApiFailure> {
    serve_news(state, req_id, params).await
}

pub(super) async fn post_news(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(params): Json<NewsParams>,
) -> Result<Json<ApiSuccess<Value>>, ApiFailure> {
    serve_news(state, req_id, params).await
}

async fn serve_news(
    state: AppState,
    req_id: RequestId,
    params: NewsParams,
) -> Result<Json<ApiSuccess<Value>>, ApiFailure> {
    let limit = normalize_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);
    let sources = params
        .sources
        .as_deref()
        .map_or_else(SourceSet::default, SourceSet::parse);

    let cache_key = format!(
        "news:{limit}:{offset}:{}:{}:{}",
        params.category.as_deref().unwrap_or(""),
        params.sources.as_deref().unwrap_or(""),
        params.symbols.join(",")
    );

    if let Some(cached) = state.cache.get(&cache_key).await {
        let count = cached.as_array().map_or(0, Vec::len);
        return Ok(Json(ApiSuccess::with_meta(
            cached,
            serde_json::json!({ "request_id": req_id.0, "count": count, "cached": true }),
        )));
    }

    let options = AggregateOptions {
        // Fetch enough to survive the offset slice.
        limit: limit + offset,
        sources,
        category: params.category.clone(),
        symbols: params.symbols.clone(),
    };
    let items: Vec<_> = state
        .sources
        .aggregate(&options)
        .await
        .into_iter()
        .skip(offset)
        .collect();

    let data = serde_json::to_value(&items)
        .map_err(|e| {
            tracing::error!(error = %e, "news serialization failed");
            ApiFailure::internal("failed to serialize news items")
        })?;
    state.cache.insert(&cache_key, data.clone()).await;

    Ok(Json(ApiSuccess::with_meta(
        data,
        serde_json::json!({ "request_id": req_id.0, "count": items.len(), "cached": false }),
    )))
}
