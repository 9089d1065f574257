//! Market-news provider client.
//!
//! Wraps the commercial news API used by the event routes: typed query
//! filters, API-key management, and normalization of provider articles —
//! including entity sentiment scores — into raw items. Upstream rate limiting
//! (HTTP 429) surfaces as a typed error so the HTTP layer can forward it
//! instead of collapsing it into a generic 500.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::error::SourceError;
use crate::normalize::RawItem;

/// Filters accepted by the provider's article search.
#[derive(Debug, Clone, Default)]
pub struct NewsQuery {
    /// Comma-separated tickers, passed through verbatim.
    pub symbols: Option<String>,
    pub exchanges: Option<String>,
    /// Comma-separated ISO-2 country codes.
    pub countries: Option<String>,
    pub must_have_entities: Option<bool>,
    pub published_after: Option<String>,
    pub published_before: Option<String>,
    /// Exact publish date (YYYY-MM-DD); used by the time-machine route.
    pub published_on: Option<NaiveDate>,
    /// Comma-separated entity types (e.g. `equity,index`).
    pub entity_types: Option<String>,
    pub min_match_score: Option<f64>,
    pub filter_entities: Option<bool>,
    pub limit: Option<usize>,
    pub page: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct NewsEnvelope {
    data: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    uuid: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    image_url: Option<String>,
    published_at: Option<DateTime<Utc>>,
    source: Option<String>,
    #[serde(default)]
    entities: Vec<Entity>,
}

#[derive(Debug, Deserialize)]
struct Entity {
    symbol: Option<String>,
    sentiment_score: Option<f64>,
}

/// Client for the market-news provider REST API.
pub struct MarketNewsClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl MarketNewsClient {
    /// Creates a client with a custom base URL (wiremock in tests, the real
    /// provider in production).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`SourceError::Provider`] if `base_url` is
    /// not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("globefeed/0.1 (news-aggregation)")
            .build()?;

        // Ensure exactly one trailing slash so join() appends rather than
        // replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| SourceError::Provider(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Searches provider articles with the given filters.
    ///
    /// Each article's tagged entities supply its symbols and sentiment
    /// scores.
    ///
    /// # Errors
    ///
    /// - [`SourceError::RateLimited`] when the provider answers 429.
    /// - [`SourceError::Provider`] on another non-2xx status.
    /// - [`SourceError::Http`] on network failure.
    /// - [`SourceError::Deserialize`] when the body shape is unexpected.
    pub async fn news(&self, query: &NewsQuery) -> Result<Vec<RawItem>, SourceError> {
        let url = self
            .base_url
            .join("news/all")
            .map_err(|e| SourceError::Provider(format!("invalid endpoint: {e}")))?;

        let mut params: Vec<(&str, String)> = vec![("api_token", self.api_key.clone())];
        if let Some(symbols) = &query.symbols {
            params.push(("symbols", symbols.clone()));
        }
        if let Some(exchanges) = &query.exchanges {
            params.push(("exchanges", exchanges.clone()));
        }
        if let Some(countries) = &query.countries {
            params.push(("countries", countries.clone()));
        }
        if let Some(must) = query.must_have_entities {
            params.push(("must_have_entities", must.to_string()));
        }
        if let Some(after) = &query.published_after {
            params.push(("published_after", after.clone()));
        }
        if let Some(before) = &query.published_before {
            params.push(("published_before", before.clone()));
        }
        if let Some(on) = query.published_on {
            params.push(("published_on", on.format("%Y-%m-%d").to_string()));
        }
        if let Some(types) = &query.entity_types {
            params.push(("entity_types", types.clone()));
        }
        if let Some(score) = query.min_match_score {
            params.push(("min_match_score", score.to_string()));
        }
        if let Some(filter) = query.filter_entities {
            params.push(("filter_entities", filter.to_string()));
        }
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(page) = query.page {
            params.push(("page", page.to_string()));
        }

        let response = self.client.get(url).query(&params).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let note = response.text().await.unwrap_or_default();
            return Err(SourceError::RateLimited(upstream_note(&note)));
        }
        if !status.is_success() {
            return Err(SourceError::Provider(format!(
                "news search failed with status {status}"
            )));
        }

        let body = response.text().await?;
        let envelope: NewsEnvelope =
            serde_json::from_str(&body).map_err(|e| SourceError::Deserialize {
                context: "provider news envelope".to_string(),
                source: e,
            })?;

        Ok(envelope.data.into_iter().map(to_raw_item).collect())
    }
}

fn to_raw_item(article: Article) -> RawItem {
    let symbols: Vec<String> = article
        .entities
        .iter()
        .filter_map(|e| e.symbol.clone())
        .filter(|s| !s.is_empty())
        .collect();
    let sentiment_scores: Vec<f64> = article
        .entities
        .iter()
        .filter_map(|e| e.sentiment_score)
        .collect();
    RawItem {
        id: article.uuid,
        title: article.title,
        description: article.description,
        url: article.url,
        published_at: article.published_at,
        source: article.source,
        symbols,
        sentiment_scores,
        image_url: article.image_url,
    }
}

/// Extract the provider's human-readable note from a rate-limit body, falling
/// back to a fixed message when the body is not the expected JSON.
fn upstream_note(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str())
                .map(ToOwned::to_owned)
        })
        .unwrap_or_else(|| "upstream rate limit exceeded".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_entities_become_symbols_and_scores() {
        let article = Article {
            uuid: Some("u-1".to_string()),
            title: Some("Chipmakers slide".to_string()),
            description: Some("Semis fell broadly.".to_string()),
            url: Some("https://example.com/semis".to_string()),
            image_url: None,
            published_at: None,
            source: Some("Example Wire".to_string()),
            entities: vec![
                Entity {
                    symbol: Some("NVDA".to_string()),
                    sentiment_score: Some(-0.4),
                },
                Entity {
                    symbol: Some("AMD".to_string()),
                    sentiment_score: Some(-0.2),
                },
            ],
        };
        let raw = to_raw_item(article);
        assert_eq!(raw.symbols, vec!["NVDA".to_string(), "AMD".to_string()]);
        assert_eq!(raw.sentiment_scores, vec![-0.4, -0.2]);
        assert_eq!(raw.id.as_deref(), Some("u-1"));
    }

    #[test]
    fn upstream_note_prefers_structured_message() {
        let note = upstream_note(r#"{"error":{"code":"rate_limit","message":"Daily quota reached"}}"#);
        assert_eq!(note, "Daily quota reached");
        let flat = upstream_note(r#"{"message":"slow down"}"#);
        assert_eq!(flat, "slow down");
        assert_eq!(upstream_note("<html>429</html>"), "upstream rate limit exceeded");
    }
}
