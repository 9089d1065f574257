mod events;
mod llm;
mod news;
mod time_machine;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use globefeed_core::AppConfig;
use globefeed_sources::{MarketNewsClient, NewsSources, SourceError};
use globefeed_synth::{LlmClient, SynthError};

use crate::cache::ResponseCache;
use crate::middleware::request_id;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub cache: Arc<ResponseCache>,
    pub sources: Arc<NewsSources>,
    /// Absent when no provider API key is configured; the routes that need
    /// it fail with a clear error instead of panicking.
    pub provider: Option<Arc<MarketNewsClient>>,
    pub llm: Arc<LlmClient>,
}

#[derive(Debug, Serialize)]
pub struct ApiSuccess<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl<T: Serialize> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: None,
        }
    }

    pub fn with_meta(data: T, meta: Value) -> Self {
        Self {
            success: true,
            data,
            meta: Some(meta),
        }
    }
}

/// Error envelope: `{error, details?}` with the mapped status code.
#[derive(Debug)]
pub struct ApiFailure {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
struct FailureBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApiFailure {
    pub fn bad_request(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: error.into(),
            details: Some(details.into()),
        }
    }

    pub fn internal(error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: error.into(),
            details: None,
        }
    }

    pub fn rate_limited(details: impl Into<String>) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            error: "upstream rate limit exceeded".to_string(),
            details: Some(details.into()),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> axum::response::Response {
        (
            self.status,
            Json(FailureBody {
                error: self.error,
                details: self.details,
            }),
        )
            .into_response()
    }
}

/// Maps a source-layer error onto the HTTP envelope. Upstream rate limiting
/// keeps its own status so clients can back off; everything else is a 500
/// with a generic message (upstream bodies are logged, never echoed).
pub(super) fn map_source_error(error: &SourceError) -> ApiFailure {
    match error {
        SourceError::RateLimited(note) => {
            tracing::warn!(note = %note, "provider rate limited");
            ApiFailure::rate_limited(note.clone())
        }
        other => {
            tracing::error!(error = %other, "news fetch failed");
            ApiFailure::internal("failed to fetch news from provider")
        }
    }
}

pub(super) fn map_synth_error(error: &SynthError) -> ApiFailure {
    tracing::error!(error = %error, "event synthesis failed");
    ApiFailure::internal("failed to synthesize market events")
}

pub(super) fn normalize_limit(limit: Option<usize>, default: usize, max: usize) -> usize {
    limit.unwrap_or(default).clamp(1, max)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/news", get(news::get_news).post(news::post_news))
        .route(
            "/api/event",
            get(events::get_events).post(events::post_events),
        )
        .route("/api/time-machine", get(time_machine::get_time_machine))
        .route("/api/llm", post(llm::generate))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    env: String,
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<ApiSuccess<HealthData>> {
    Json(ApiSuccess::new(HealthData {
        status: "ok",
        env: state.config.env.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn normalize_limit_applies_defaults_and_bounds() {
        assert_eq!(normalize_limit(None, 30, 100), 30);
        assert_eq!(normalize_limit(Some(0), 30, 100), 1);
        assert_eq!(normalize_limit(Some(1_000), 30, 100), 100);
        assert_eq!(normalize_limit(Some(25), 30, 100), 25);
    }

    #[tokio::test]
    async fn failure_envelope_omits_absent_details() {
        let response = ApiFailure::internal("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: Value = serde_json::from_slice(&body).expect("json parse");
        assert_eq!(json["error"].as_str(), Some("boom"));
        assert!(json.get("details").is_none());
    }

    #[test]
    fn rate_limited_source_error_maps_to_429_with_note() {
        let failure = map_source_error(&SourceError::RateLimited("quota reached".to_string()));
        assert_eq!(failure.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(failure.details.as_deref(), Some("quota reached"));
    }

    #[test]
    fn other_source_errors_map_to_500_without_upstream_body() {
        let failure =
            map_source_error(&SourceError::Provider("status 500 with secrets".to_string()));
        assert_eq!(failure.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(failure.details.is_none());
    }

    // -------------------------------------------------------------------------
    // Route integration tests against wiremock upstreams
    // -------------------------------------------------------------------------

    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use globefeed_core::Environment;
    use tower::ServiceExt;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "gemini-test";

    const FEED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Mock Markets Wire</title>
    <item>
      <title>Stocks rally into the close</title>
      <link>https://example.com/rally</link>
      <description>Equities finished higher.</description>
      <pubDate>Wed, 01 May 2024 20:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

    fn test_state(upstream: &MockServer) -> AppState {
        let base = upstream.uri();
        let config = Arc::new(AppConfig {
            env: Environment::Test,
            bind_addr: "127.0.0.1:0".parse().expect("addr"),
            log_level: "warn".to_string(),
            rss_feeds: vec![format!("{base}/feed.xml")],
            forum_base_url: base.clone(),
            forum_community: "mock".to_string(),
            linkagg_base_url: base.clone(),
            provider_base_url: base.clone(),
            provider_api_key: Some("provider-key".to_string()),
            llm_base_url: base.clone(),
            llm_model: MODEL.to_string(),
            llm_api_key: "llm-key".to_string(),
            cache_ttl_secs: 60,
            request_timeout_secs: 5,
            llm_max_retries: 0,
            llm_retry_backoff_ms: 0,
        });
        let sources = Arc::new(
            NewsSources::new(
                config.rss_feeds.clone(),
                &config.forum_base_url,
                &config.forum_community,
                &config.linkagg_base_url,
                config.request_timeout_secs,
            )
            .expect("sources"),
        );
        let provider = Arc::new(
            MarketNewsClient::with_base_url(
                "provider-key",
                config.request_timeout_secs,
                &config.provider_base_url,
            )
            .expect("provider"),
        );
        let llm = Arc::new(
            LlmClient::with_base_url("llm-key", MODEL, 5, 0, 0, &base).expect("llm"),
        );
        AppState {
            config,
            cache: Arc::new(ResponseCache::new(Duration::from_secs(60))),
            sources,
            provider: Some(provider),
            llm,
        }
    }

    async fn send(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: Value = serde_json::from_slice(&body).expect("json parse");
        (status, json)
    }

    fn provider_article_for(url: &str) -> Value {
        serde_json::json!({
            "data": [{
                "uuid": "u-1",
                "title": "Chipmakers slide on export news",
                "description": "Semis fell broadly after the announcement.",
                "url": url,
                "image_url": null,
                "published_at": "2024-05-01T12:00:00Z",
                "source": "Example Wire",
                "entities": [
                    { "symbol": "NVDA", "sentiment_score": -0.4 }
                ]
            }]
        })
    }

    fn provider_article_body() -> Value {
        provider_article_for("https://example.com/semis")
    }

    fn model_body_for(article_link: &str) -> Value {
        let event = serde_json::json!({
            "title": "Chip export controls rattle semis",
            "summary": "New export rules hit chipmakers.",
            "category": "Stocks",
            "article_link": article_link,
            "image_url": null,
            "coordinates": { "lat": 37.77, "lng": -122.41 },
            "country_code": "US",
            "impact_score": 72,
            "relevant_stocks": [ { "ticker": "NVDA", "name": "NVIDIA" } ],
            "event_date": "2024-05-01T12:00:00Z"
        });
        serde_json::json!({
            "candidates": [
                { "content": { "parts": [ { "text": format!("```json\n[{event}]\n```") } ] } }
            ]
        })
    }

    #[tokio::test]
    async fn health_returns_success_envelope() {
        let server = MockServer::start().await;
        let app = build_app(test_state(&server));
        let (status, json) = send(app, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"].as_bool(), Some(true));
        assert_eq!(json["data"]["status"].as_str(), Some("ok"));
    }

    #[tokio::test]
    async fn news_route_serves_second_request_from_cache() {
        let server = MockServer::start().await;
        // expect(1) proves the second request never reaches the upstream.
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED_XML))
            .expect(1)
            .mount(&server)
            .await;

        let state = test_state(&server);
        let app = build_app(state.clone());
        let (status, first) = send(app, "/api/news?limit=5&sources=rss").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["success"].as_bool(), Some(true));
        assert_eq!(first["meta"]["cached"].as_bool(), Some(false));
        assert_eq!(first["data"].as_array().map(Vec::len), Some(1));

        let app = build_app(state);
        let (status, second) = send(app, "/api/news?limit=5&sources=rss").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["meta"]["cached"].as_bool(), Some(true));
        assert_eq!(second["data"], first["data"]);
    }

    #[tokio::test]
    async fn news_route_tolerates_dead_adapters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED_XML))
            .mount(&server)
            .await;
        // forum and linkagg are not mounted: both 404, the response still
        // carries the RSS contribution.
        let app = build_app(test_state(&server));
        let (status, json) = send(app, "/api/news?limit=9").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn event_route_synthesizes_from_provider_articles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news/all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(provider_article_body()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("/v1beta/models/{MODEL}:generateContent")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(model_body_for("https://example.com/semis")),
            )
            .mount(&server)
            .await;

        let app = build_app(test_state(&server));
        let (status, json) = send(app, "/api/event?symbols=NVDA").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"].as_bool(), Some(true));
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["impact_color"].as_str(), Some("red"));
        assert!(json["meta"]["timings_ms"]["synthesis"].is_u64());
    }

    #[tokio::test]
    async fn event_cache_distinguishes_provider_pass_through_filters() {
        let server = MockServer::start().await;
        // Provider and model both answer per entity type, so a collision
        // would surface as the wrong article_link on the second request.
        for kind in ["equity", "index"] {
            Mock::given(method("GET"))
                .and(path("/news/all"))
                .and(query_param("entity_types", kind))
                .respond_with(ResponseTemplate::new(200).set_body_json(provider_article_for(
                    &format!("https://example.com/{kind}"),
                )))
                .mount(&server)
                .await;
            Mock::given(method("POST"))
                .and(path(format!("/v1beta/models/{MODEL}:generateContent")))
                .and(body_string_contains(format!("example.com/{kind}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(model_body_for(
                    &format!("https://example.com/{kind}"),
                )))
                .mount(&server)
                .await;
        }

        let state = test_state(&server);
        for kind in ["equity", "index"] {
            let app = build_app(state.clone());
            let response = app
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/event")
                        .header("content-type", "application/json")
                        .body(Body::from(format!(r#"{{"entity_types":"{kind}"}}"#)))
                        .expect("request"),
                )
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::OK);
            let body = to_bytes(response.into_body(), usize::MAX)
                .await
                .expect("body bytes");
            let json: Value = serde_json::from_slice(&body).expect("json parse");
            assert_eq!(
                json["data"][0]["article_link"].as_str(),
                Some(format!("https://example.com/{kind}").as_str()),
                "each entity type must hit its own cache slot"
            );
        }
    }

    #[tokio::test]
    async fn event_route_forwards_upstream_rate_limit_as_429() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news/all"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "code": "rate_limit", "message": "Daily request quota reached" }
            })))
            .mount(&server)
            .await;

        let app = build_app(test_state(&server));
        let (status, json) = send(app, "/api/event").await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["details"].as_str(), Some("Daily request quota reached"));
    }

    #[tokio::test]
    async fn event_route_surfaces_unparseable_model_output_as_500() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news/all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(provider_article_body()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("/v1beta/models/{MODEL}:generateContent")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [ { "content": { "parts": [ { "text": "no json here" } ] } } ]
            })))
            .mount(&server)
            .await;

        let app = build_app(test_state(&server));
        let (status, json) = send(app, "/api/event").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn time_machine_rejects_malformed_date_naming_the_format() {
        let server = MockServer::start().await;
        let app = build_app(test_state(&server));
        let (status, json) = send(app, "/api/time-machine?date=May-1-2024").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            json["details"]
                .as_str()
                .is_some_and(|d| d.contains("YYYY-MM-DD")),
            "details must name the expected format: {json}"
        );
    }

    #[tokio::test]
    async fn time_machine_returns_bare_empty_array_for_a_quiet_day() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news/all"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })),
            )
            .mount(&server)
            .await;

        let app = build_app(test_state(&server));
        let (status, json) = send(app, "/api/time-machine?date=2024-05-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!([]), "payload is a bare array");
    }

    #[tokio::test]
    async fn time_machine_covers_every_article_even_when_the_model_is_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news/all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(provider_article_body()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("/v1beta/models/{MODEL}:generateContent")))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let app = build_app(test_state(&server));
        let (status, json) = send(app, "/api/time-machine?date=2024-05-01").await;
        assert_eq!(status, StatusCode::OK);
        let events = json.as_array().expect("bare array");
        assert_eq!(events.len(), 1, "heuristic event per article");
        assert_eq!(
            events[0]["article_link"].as_str(),
            Some("https://example.com/semis")
        );
    }

    #[tokio::test]
    async fn llm_route_proxies_prompt_to_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1beta/models/{MODEL}:generateContent")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [ { "content": { "parts": [ { "text": "markets are calm" } ] } } ]
            })))
            .mount(&server)
            .await;

        let app = build_app(test_state(&server));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/llm")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"prompt":"how are markets?"}"#))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: Value = serde_json::from_slice(&body).expect("json parse");
        assert_eq!(json["success"].as_bool(), Some(true));
        assert_eq!(json["response"].as_str(), Some("markets are calm"));
    }

    #[tokio::test]
    async fn llm_route_rejects_empty_prompt() {
        let server = MockServer::start().await;
        let app = build_app(test_state(&server));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/llm")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"prompt":"  "}"#))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
