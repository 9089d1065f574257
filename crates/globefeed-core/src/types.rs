use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse category vocabulary assigned by keyword matching.
///
/// Never authoritative: categorization is a best-effort scan over title and
/// description, and downstream filters treat it as a plain string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Stocks,
    Market,
    Economic,
    Crypto,
    Commodities,
    Forex,
    Discussion,
    Financial,
    #[serde(rename = "Tech/Finance")]
    TechFinance,
}

impl Category {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Stocks => "Stocks",
            Category::Market => "Market",
            Category::Economic => "Economic",
            Category::Crypto => "Crypto",
            Category::Commodities => "Commodities",
            Category::Forex => "Forex",
            Category::Discussion => "Discussion",
            Category::Financial => "Financial",
            Category::TechFinance => "Tech/Finance",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Article-level sentiment derived from provider entity scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Unified, provider-agnostic news record.
///
/// Invariant: `title` and `url` are non-empty. Items violating this are
/// dropped during normalization, so every `NewsItem` in circulation holds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    /// Unique per item; synthesized from provider + original id/url.
    pub id: String,
    pub title: String,
    /// HTML-stripped free text.
    pub description: String,
    pub url: String,
    /// Defaults to fetch time when the source omits it.
    pub published_at: DateTime<Utc>,
    /// Human-readable provider/site name.
    pub source: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    /// Heuristically extracted ticker-like tokens, deduplicated, capped at 3.
    pub symbols: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Geographic anchor for a market event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A stock affected by a market event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevantStock {
    pub ticker: String,
    pub name: String,
}

/// Traffic-light rendering of an impact score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactColor {
    Green,
    Yellow,
    Red,
}

/// Model-synthesized (or heuristic-fallback) market event.
///
/// An event is only emitted after validation: all required fields present,
/// `relevant_stocks` non-empty, and `impact_color` consistent with
/// `impact_score` per [`impact_color`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketEvent {
    pub title: String,
    pub summary: String,
    pub category: String,
    pub article_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub coordinates: Coordinates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    /// Bounded to 0..=100.
    pub impact_score: u8,
    pub impact_color: ImpactColor,
    pub relevant_stocks: Vec<RelevantStock>,
    pub event_date: DateTime<Utc>,
}

/// Map an impact score on the canonical 0–100 scale to its color band.
///
/// Deterministic, monotonic step function: [0,30) green, [30,70) yellow,
/// [70,100] red. Scores above 100 clamp to red.
#[must_use]
pub fn impact_color(score: u8) -> ImpactColor {
    match score {
        0..=29 => ImpactColor::Green,
        30..=69 => ImpactColor::Yellow,
        _ => ImpactColor::Red,
    }
}
