//! Link-aggregator adapter.
//!
//! Fetches a ranked id list, resolves each id to an item concurrently, and
//! keeps items whose title matches a finance-keyword allowlist. A single
//! failed item resolution is logged and skipped, never fatal.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Deserialize;

use crate::error::SourceError;
use crate::normalize::RawItem;

/// How many ranked ids to resolve before allowlist filtering. The finance
/// allowlist rejects most general-tech stories, so resolving only `limit`
/// ids would starve the result.
const CANDIDATE_POOL: usize = 30;

/// Titles must contain one of these to survive the filter.
const FINANCE_ALLOWLIST: &[&str] = &[
    "stock", "market", "econom", "fed", "bank", "crypto", "bitcoin", "inflation", "invest",
    "trading", "finance", "financial", "ipo", "earnings", "valuation", "fund", "acquisition",
    "merger", "startup", "revenue",
];

#[derive(Debug, Deserialize)]
struct Item {
    id: i64,
    title: Option<String>,
    url: Option<String>,
    text: Option<String>,
    time: Option<i64>,
    by: Option<String>,
}

/// Client for a Hacker News-style ranked item API.
pub struct LinkAggClient {
    client: reqwest::Client,
    base_url: String,
}

impl LinkAggClient {
    /// Creates a client against `base_url` (overridable for wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches top-ranked finance-relevant items, capped at `limit`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::LinkAgg`] if the id list cannot be fetched or
    /// parsed; individual item failures are skipped.
    pub async fn fetch_top(&self, limit: usize) -> Result<Vec<RawItem>, SourceError> {
        let url = format!("{}/topstories.json", self.base_url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::LinkAgg(format!(
                "id list fetch failed with status {}",
                response.status()
            )));
        }
        let ids: Vec<i64> = response
            .json()
            .await
            .map_err(|e| SourceError::LinkAgg(format!("id list parse error: {e}")))?;

        let candidates = &ids[..ids.len().min(CANDIDATE_POOL)];
        let fetches = candidates.iter().map(|&id| self.fetch_item(id));
        let resolved = join_all(fetches).await;

        let items: Vec<RawItem> = resolved
            .into_iter()
            .flatten()
            .filter(|raw| {
                raw.title
                    .as_deref()
                    .is_some_and(is_finance_relevant)
            })
            .take(limit)
            .collect();

        tracing::debug!(
            candidates = candidates.len(),
            kept = items.len(),
            "collected link-aggregator items"
        );

        Ok(items)
    }

    /// Resolve one id; failures log a warning and yield `None`.
    async fn fetch_item(&self, id: i64) -> Option<RawItem> {
        let url = format!("{}/item/{id}.json", self.base_url);
        let item: Item = match self.client.get(&url).send().await {
            Ok(resp) => match resp.json().await {
                Ok(item) => item,
                Err(e) => {
                    tracing::warn!(id, error = %e, "link-aggregator item parse failed");
                    return None;
                }
            },
            Err(e) => {
                tracing::warn!(id, error = %e, "link-aggregator item fetch failed");
                return None;
            }
        };

        let published_at = item
            .time
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

        Some(RawItem {
            id: Some(item.id.to_string()),
            title: item.title,
            description: item.text,
            url: item.url,
            published_at,
            source: item.by.map(|by| format!("Link Aggregator ({by})")),
            ..RawItem::default()
        })
    }
}

/// Allowlist check over the lowercased title.
fn is_finance_relevant(title: &str) -> bool {
    let lower = title.to_lowercase();
    FINANCE_ALLOWLIST.iter().any(|kw| lower.contains(kw))
}
