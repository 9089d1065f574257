//! Normalization of raw provider records into unified [`NewsItem`]s.

use chrono::{DateTime, Utc};

use globefeed_core::{Category, NewsItem};

use crate::classify;

/// Which upstream a raw record came from. Decides the id prefix, the
/// human-readable source fallback, and the default category bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Rss,
    Forum,
    LinkAgg,
    Market,
}

impl Provider {
    #[must_use]
    pub fn id_prefix(self) -> &'static str {
        match self {
            Provider::Rss => "rss",
            Provider::Forum => "forum",
            Provider::LinkAgg => "linkagg",
            Provider::Market => "market",
        }
    }

    #[must_use]
    pub fn default_source(self) -> &'static str {
        match self {
            Provider::Rss => "RSS Feed",
            Provider::Forum => "Community Forum",
            Provider::LinkAgg => "Link Aggregator",
            Provider::Market => "Market Wire",
        }
    }

    /// Generic bucket used when no categorization keyword matches.
    #[must_use]
    pub fn default_category(self) -> Category {
        match self {
            Provider::Rss | Provider::Market => Category::Financial,
            Provider::Forum => Category::Discussion,
            Provider::LinkAgg => Category::TechFinance,
        }
    }
}

/// Intermediate record shape shared by all adapters.
///
/// Every field an upstream might omit is optional; the normalizer decides
/// what is fatal (missing title/url) and what gets a default.
#[derive(Debug, Clone, Default)]
pub struct RawItem {
    /// Provider-native id, when one exists.
    pub id: Option<String>,
    pub title: Option<String>,
    /// May contain HTML; stripped during normalization.
    pub description: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    /// Human-readable site/feed name, when the upstream supplies one.
    pub source: Option<String>,
    /// Provider-tagged symbols; when empty the extractor runs over the text.
    pub symbols: Vec<String>,
    /// Per-entity sentiment scores in [-1, 1], when the provider has them.
    pub sentiment_scores: Vec<f64>,
    pub image_url: Option<String>,
}

/// Map a raw record into a unified [`NewsItem`].
///
/// Returns `None` (item dropped) when title or url is missing or empty.
/// `fetched_at` stands in for a missing publish timestamp so ordering stays
/// total.
#[must_use]
pub fn normalize(raw: RawItem, provider: Provider, fetched_at: DateTime<Utc>) -> Option<NewsItem> {
    let title = raw.title.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
    let url = raw.url.as_deref().map(str::trim).filter(|u| !u.is_empty())?;

    let description = raw
        .description
        .as_deref()
        .map(strip_html)
        .unwrap_or_default();

    let id = match &raw.id {
        Some(native) => format!("{}-{native}", provider.id_prefix()),
        None => format!("{}-{url}", provider.id_prefix()),
    };

    let haystack = format!("{title} {description}");
    let category = classify::categorize(&haystack, provider.default_category());

    let mut seen = std::collections::HashSet::new();
    let mut symbols = raw.symbols;
    symbols.retain(|s| !s.is_empty() && seen.insert(s.clone()));
    symbols.truncate(3);
    if symbols.is_empty() {
        symbols = classify::extract_symbols(&haystack);
    }

    Some(NewsItem {
        id,
        title: title.to_string(),
        description,
        url: url.to_string(),
        published_at: raw.published_at.unwrap_or(fetched_at),
        source: raw
            .source
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| provider.default_source().to_string()),
        category,
        sentiment: classify::sentiment_from_scores(&raw.sentiment_scores),
        symbols,
        image_url: raw.image_url.filter(|u| !u.is_empty()),
    })
}

/// Strip HTML tags from a string and normalize whitespace.
#[must_use]
pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
