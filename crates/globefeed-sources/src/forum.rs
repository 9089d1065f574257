//! Discussion-forum adapter: ranked posts from a named community.
//!
//! Pulls the community's public ranked listing, keeps link-bearing or
//! text-bearing posts, and extracts ticker candidates (dollar-prefixed or
//! bare-uppercase tokens) against the shared stopword blacklist.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::classify::extract_symbols;
use crate::error::SourceError;
use crate::normalize::RawItem;

/// Ranked-listing envelope.
#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct Post {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    id: Option<String>,
    title: Option<String>,
    selftext: Option<String>,
    url: Option<String>,
    permalink: Option<String>,
    created_utc: Option<f64>,
    stickied: Option<bool>,
    thumbnail: Option<String>,
}

/// Client for one community's ranked post listing.
pub struct ForumClient {
    client: reqwest::Client,
    base_url: String,
    community: String,
}

impl ForumClient {
    /// Creates a client for `community` under `base_url` (overridable so
    /// wiremock can stand in for the real service).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(base_url: &str, community: &str, timeout_secs: u64) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("globefeed/0.1 (news-aggregation)")
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            community: community.to_string(),
        })
    }

    /// Fetches up to `limit` ranked posts as raw items.
    ///
    /// Stickied posts and posts with neither a link nor body text are
    /// filtered out.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Forum`] on a non-2xx listing response or an
    /// unexpected payload shape, [`SourceError::Http`] on network failure.
    pub async fn fetch_ranked(&self, limit: usize) -> Result<Vec<RawItem>, SourceError> {
        let url = format!("{}/r/{}/hot.json", self.base_url, self.community);
        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit.to_string()), ("raw_json", "1".to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Forum(format!(
                "listing for r/{} failed with status {}",
                self.community,
                response.status()
            )));
        }

        let body = response.text().await?;
        let listing: Listing =
            serde_json::from_str(&body).map_err(|e| SourceError::Deserialize {
                context: format!("forum listing r/{}", self.community),
                source: e,
            })?;

        let items: Vec<RawItem> = listing
            .data
            .children
            .into_iter()
            .filter_map(|post| to_raw_item(post.data, &self.community))
            .take(limit)
            .collect();

        tracing::debug!(
            community = %self.community,
            count = items.len(),
            "collected forum posts"
        );

        Ok(items)
    }
}

/// Convert one post into a raw item, or drop it.
///
/// Keeps posts that carry an external link or non-empty body text; the
/// canonical URL is the external link when present, else the permalink.
fn to_raw_item(post: PostData, community: &str) -> Option<RawItem> {
    if post.stickied.unwrap_or(false) {
        return None;
    }
    let title = post.title.as_deref().map(str::trim).filter(|t| !t.is_empty())?;

    let body = post
        .selftext
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty() && *b != "[deleted]" && *b != "[removed]");

    let external = post
        .url
        .as_deref()
        .filter(|u| u.starts_with("http") && !u.contains("/comments/"));

    // A post must bring either a link or some text to be worth normalizing.
    if external.is_none() && body.is_none() {
        return None;
    }

    let url = match external {
        Some(u) => u.to_string(),
        None => format!("https://www.reddit.com{}", post.permalink?),
    };

    let snippet: String = body.unwrap_or("").chars().take(280).collect();
    let symbols = extract_symbols(&format!("{title} {snippet}"));

    #[allow(clippy::cast_possible_truncation)]
    let published_at = post
        .created_utc
        .and_then(|secs| DateTime::from_timestamp(secs as i64, 0));

    Some(RawItem {
        id: post.id,
        title: Some(title.to_string()),
        description: Some(snippet),
        url: Some(url),
        published_at,
        source: Some(format!("r/{community}")),
        symbols,
        image_url: post
            .thumbnail
            .filter(|t| t.starts_with("http")),
        ..RawItem::default()
    })
}
