//! Deterministic heuristic fallback for items the model failed to cover.

use globefeed_core::{geo, impact_color, MarketEvent, NewsItem, RelevantStock, Sentiment};

/// Placeholder stock used when an item carries no extracted symbols, so a
/// fallback event still satisfies the non-empty `relevant_stocks` invariant.
const INDEX_PLACEHOLDER: (&str, &str) = ("SPX", "S&P 500 Index");

/// Impact scores assigned by sentiment. Fixed values keep fallback output
/// reproducible for a given input.
fn sentiment_impact(sentiment: Option<Sentiment>) -> u8 {
    match sentiment {
        Some(Sentiment::Negative) => 65,
        Some(Sentiment::Positive) => 40,
        Some(Sentiment::Neutral) => 50,
        None => 45,
    }
}

/// Manufacture a deterministic event from a news item.
///
/// Coordinates come from the country-centroid table via `country_hint`
/// (defaulting to the US centroid), impact from the item's sentiment, and
/// stocks from its extracted symbols with an index placeholder when empty.
#[must_use]
pub fn fallback_event(item: &NewsItem, country_hint: Option<&str>) -> MarketEvent {
    let impact_score = sentiment_impact(item.sentiment);

    let relevant_stocks: Vec<RelevantStock> = if item.symbols.is_empty() {
        vec![RelevantStock {
            ticker: INDEX_PLACEHOLDER.0.to_string(),
            name: INDEX_PLACEHOLDER.1.to_string(),
        }]
    } else {
        item.symbols
            .iter()
            .map(|s| RelevantStock {
                ticker: s.clone(),
                name: s.clone(),
            })
            .collect()
    };

    let summary = if item.description.is_empty() {
        item.title.clone()
    } else {
        item.description.chars().take(280).collect()
    };

    MarketEvent {
        title: item.title.clone(),
        summary,
        category: item.category.as_str().to_string(),
        article_link: item.url.clone(),
        image_url: item.image_url.clone(),
        coordinates: geo::centroid_or_default(country_hint),
        country_code: country_hint.map(str::to_uppercase),
        impact_score,
        impact_color: impact_color(impact_score),
        relevant_stocks,
        event_date: item.published_at,
    }
}
