//! Keyword categorization, symbol extraction, and sentiment mapping.
//!
//! Pure functions with no network entanglement, so their false-positive rate
//! can be tested against fixed text corpora. Results are best-effort: the
//! categorizer is a priority-ordered keyword scan and the symbol extractor is
//! a capital-letter regex filtered by a common-word blacklist, not a lookup
//! against any canonical exchange list.

use std::sync::OnceLock;

use regex::Regex;

use globefeed_core::{Category, Sentiment};

/// Priority-ordered categorization rules; the first matching rule wins.
///
/// More specific vocabularies (crypto, commodities) outrank the generic
/// stock/market buckets so "bitcoin ETF" lands in Crypto, not Stocks.
const CATEGORY_RULES: &[(Category, &[&str])] = &[
    (
        Category::Crypto,
        &["bitcoin", "crypto", "ethereum", "btc", "blockchain", "stablecoin"],
    ),
    (
        Category::Commodities,
        &["oil", "gold", "crude", "copper", "commodity", "commodities", "opec"],
    ),
    (
        Category::Forex,
        &["forex", "currency", "exchange rate", "yen", "euro zone", "devaluation"],
    ),
    (
        Category::Economic,
        &[
            "fed",
            "inflation",
            "gdp",
            "interest rate",
            "central bank",
            "unemployment",
            "recession",
            "tariff",
        ],
    ),
    (
        Category::Stocks,
        &["stock", "shares", "earnings", "ipo", "dividend", "nasdaq", "shareholder"],
    ),
    (
        Category::Market,
        &["market", "trading", "index", "rally", "selloff", "s&p", "dow jones"],
    ),
];

/// Uppercase tokens that look like tickers but are ordinary words or finance
/// jargon. Kept deliberately broad; dropping a real ticker here only costs a
/// best-effort tag.
const SYMBOL_BLACKLIST: &[&str] = &[
    "THE", "AND", "FOR", "ARE", "BUT", "NOT", "YOU", "ALL", "NEW", "NOW", "HAS", "WAS", "ITS",
    "OUT", "TOP", "BIG", "CEO", "CFO", "IPO", "ETF", "USA", "GDP", "FED", "SEC", "NYSE", "USD",
    "EPS", "API", "URL", "HTML", "WSB", "YOLO", "HODL", "EDIT", "THIS", "THAT", "WITH", "FROM",
    "WILL", "JUST", "ONLY", "OVER", "MORE", "LESS", "NEWS", "READ",
];

fn symbol_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$?\b[A-Z]{2,5}\b").expect("symbol regex compiles"))
}

/// Classify free text into a coarse category.
///
/// Scans lowercased `text` against [`CATEGORY_RULES`] in priority order and
/// returns the first hit, or `default` when nothing matches.
#[must_use]
pub fn categorize(text: &str, default: Category) -> Category {
    let lower = text.to_lowercase();
    for (category, keywords) in CATEGORY_RULES {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return *category;
        }
    }
    default
}

/// Extract up to 3 ticker-like tokens from free text.
///
/// Accepts dollar-prefixed or bare runs of 2–5 capitals, drops blacklisted
/// common words, deduplicates preserving first-seen order.
#[must_use]
pub fn extract_symbols(text: &str) -> Vec<String> {
    let mut symbols = Vec::new();
    for m in symbol_regex().find_iter(text) {
        let token = m.as_str().trim_start_matches('$');
        if SYMBOL_BLACKLIST.contains(&token) {
            continue;
        }
        // A bare token must appear in the source text fully uppercase;
        // the regex already guarantees that, so only dedup remains.
        if !symbols.iter().any(|s| s == token) {
            symbols.push(token.to_string());
        }
        if symbols.len() == 3 {
            break;
        }
    }
    symbols
}

/// Map provider-supplied entity sentiment scores to an article sentiment.
///
/// Mean score above 0.1 is positive, below -0.1 negative, otherwise neutral.
/// Returns `None` when the provider supplied no scores at all.
#[must_use]
pub fn sentiment_from_scores(scores: &[f64]) -> Option<Sentiment> {
    if scores.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    Some(if mean > 0.1 {
        Sentiment::Positive
    } else if mean < -0.1 {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    })
}
