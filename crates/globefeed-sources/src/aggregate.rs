//! Fan-out aggregation across all enabled adapters.
//!
//! Adapter calls launch concurrently; a failing adapter contributes an empty
//! list and a warning rather than aborting the batch. The merge step is a
//! pure function so ordering, truncation, and filtering stay unit-testable
//! without any network.

use std::time::Duration;

use chrono::Utc;

use globefeed_core::NewsItem;

use crate::forum::ForumClient;
use crate::linkagg::LinkAggClient;
use crate::normalize::{normalize, Provider};
use crate::rss;

/// Which adapters an aggregation request enables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSet {
    pub rss: bool,
    pub forum: bool,
    pub linkagg: bool,
}

impl Default for SourceSet {
    fn default() -> Self {
        Self {
            rss: true,
            forum: true,
            linkagg: true,
        }
    }
}

impl SourceSet {
    /// Parse a comma-separated `sources` parameter (`rss,forum,linkagg`).
    ///
    /// Unknown tokens are ignored; an empty or all-unknown value enables
    /// everything, matching the no-parameter default.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut set = Self {
            rss: false,
            forum: false,
            linkagg: false,
        };
        for token in raw.split(',').map(str::trim) {
            match token {
                "rss" => set.rss = true,
                "forum" => set.forum = true,
                "linkagg" => set.linkagg = true,
                _ => {}
            }
        }
        if set.enabled_count() == 0 {
            return Self::default();
        }
        set
    }

    #[must_use]
    pub fn enabled_count(self) -> usize {
        usize::from(self.rss) + usize::from(self.forum) + usize::from(self.linkagg)
    }
}

/// Options for one aggregation call.
#[derive(Debug, Clone, Default)]
pub struct AggregateOptions {
    pub limit: usize,
    pub sources: SourceSet,
    /// Case-insensitive substring match against each item's category.
    pub category: Option<String>,
    /// Case-insensitive substring match against each item's symbols.
    pub symbols: Vec<String>,
}

/// The three adapters plus the shared HTTP client for feed fetches.
pub struct NewsSources {
    http: reqwest::Client,
    rss_feeds: Vec<String>,
    forum: ForumClient,
    linkagg: LinkAggClient,
}

impl NewsSources {
    /// Builds all adapters from their endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SourceError::Http`] if an HTTP client cannot be
    /// constructed.
    pub fn new(
        rss_feeds: Vec<String>,
        forum_base_url: &str,
        forum_community: &str,
        linkagg_base_url: &str,
        timeout_secs: u64,
    ) -> Result<Self, crate::SourceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("globefeed/0.1 (news-aggregation)")
            .build()?;
        Ok(Self {
            http,
            rss_feeds,
            forum: ForumClient::new(forum_base_url, forum_community, timeout_secs)?,
            linkagg: LinkAggClient::new(linkagg_base_url, timeout_secs)?,
        })
    }

    /// Fan out to every enabled adapter, then merge.
    ///
    /// The total limit is apportioned evenly across enabled sources (and
    /// across feeds within the RSS source). Partial failure is tolerated by
    /// construction: each arm degrades to an empty contribution.
    pub async fn aggregate(&self, options: &AggregateOptions) -> Vec<NewsItem> {
        let enabled = options.sources.enabled_count();
        let per_source = (options.limit / enabled.max(1)).max(1);
        let fetched_at = Utc::now();

        let rss_fut = async {
            if !options.sources.rss {
                return Vec::new();
            }
            let per_feed = (per_source / self.rss_feeds.len().max(1)).max(1);
            let fetches = self
                .rss_feeds
                .iter()
                .map(|feed| rss::fetch_feed(&self.http, feed, per_feed));
            let mut items = Vec::new();
            for (feed, result) in self.rss_feeds.iter().zip(futures::future::join_all(fetches).await)
            {
                match result {
                    Ok(raw) => {
                        items.extend(
                            raw.into_iter()
                                .filter_map(|r| normalize(r, Provider::Rss, fetched_at)),
                        );
                    }
                    Err(e) => {
                        tracing::warn!(source = "rss", feed = %feed, error = %e, "feed fetch failed");
                    }
                }
            }
            items
        };

        let forum_fut = async {
            if !options.sources.forum {
                return Vec::new();
            }
            match self.forum.fetch_ranked(per_source).await {
                Ok(raw) => raw
                    .into_iter()
                    .filter_map(|r| normalize(r, Provider::Forum, fetched_at))
                    .collect(),
                Err(e) => {
                    tracing::warn!(source = "forum", error = %e, "forum fetch failed");
                    Vec::new()
                }
            }
        };

        let linkagg_fut = async {
            if !options.sources.linkagg {
                return Vec::new();
            }
            match self.linkagg.fetch_top(per_source).await {
                Ok(raw) => raw
                    .into_iter()
                    .filter_map(|r| normalize(r, Provider::LinkAgg, fetched_at))
                    .collect(),
                Err(e) => {
                    tracing::warn!(source = "linkagg", error = %e, "link-aggregator fetch failed");
                    Vec::new()
                }
            }
        };

        let (rss_items, forum_items, linkagg_items) =
            futures::join!(rss_fut, forum_fut, linkagg_fut);

        merge_items(
            vec![rss_items, forum_items, linkagg_items],
            options.limit,
            options.category.as_deref(),
            &options.symbols,
        )
    }
}

/// Merge adapter batches: drop invariant violators, stable-sort by recency,
/// truncate to `limit`, then apply the category and symbol filters.
///
/// The sort is stable so items with identical timestamps keep their batch
/// order, making results deterministic for a fixed input batching.
#[must_use]
pub fn merge_items(
    batches: Vec<Vec<NewsItem>>,
    limit: usize,
    category_filter: Option<&str>,
    symbols_filter: &[String],
) -> Vec<NewsItem> {
    let mut items: Vec<NewsItem> = batches
        .into_iter()
        .flatten()
        .filter(|item| !item.title.is_empty() && !item.url.is_empty())
        .collect();

    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    items.truncate(limit);

    if let Some(filter) = category_filter {
        let needle = filter.to_lowercase();
        items.retain(|item| item.category.as_str().to_lowercase().contains(&needle));
    }

    if !symbols_filter.is_empty() {
        let needles: Vec<String> = symbols_filter.iter().map(|s| s.to_lowercase()).collect();
        items.retain(|item| {
            item.symbols.iter().any(|sym| {
                let sym = sym.to_lowercase();
                needles.iter().any(|n| sym.contains(n.as_str()))
            })
        });
    }

    items
}
