//! Strict parsing and validation of model output.
//!
//! Models routinely wrap their JSON in Markdown code fences or surround it
//! with prose, so payload location is lenient: strip fences, else take the
//! outermost `[`..`]` slice. Parsing itself is strict — a payload that is not
//! a JSON array of objects is a typed error, never silently-partial data.
//! Validation then drops individual events violating the required-fields
//! invariant.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use globefeed_core::{impact_color, Coordinates, MarketEvent, RelevantStock};

use crate::error::SynthError;

/// Model-emitted event before validation: every field optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub category: Option<String>,
    pub article_link: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub coordinates: Option<RawCoordinates>,
    #[serde(default)]
    pub country_code: Option<String>,
    pub impact_score: Option<i64>,
    #[serde(default)]
    pub relevant_stocks: Vec<RawStock>,
    pub event_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCoordinates {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStock {
    pub ticker: Option<String>,
    pub name: Option<String>,
}

/// Locate the JSON array payload inside raw model text.
///
/// Tries Markdown fence stripping first (```json ... ``` or ``` ... ```),
/// then the slice between the first `[` and the last `]`.
fn locate_json_array(text: &str) -> Option<&str> {
    let defenced = strip_code_fences(text);
    let start = defenced.find('[')?;
    let end = defenced.rfind(']')?;
    (end > start).then(|| &defenced[start..=end])
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag after the opening fence, if any.
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse raw model text into unvalidated events.
///
/// # Errors
///
/// - [`SynthError::NoJsonArray`] when the text contains no array at all.
/// - [`SynthError::Parse`] when the located payload is not a valid JSON
///   array of event objects.
pub fn parse_events(text: &str, context: &str) -> Result<Vec<RawEvent>, SynthError> {
    let payload =
        locate_json_array(text).ok_or_else(|| SynthError::NoJsonArray(context.to_string()))?;
    serde_json::from_str(payload).map_err(|e| SynthError::Parse {
        context: context.to_string(),
        source: e,
    })
}

/// Validate one raw event against the required-fields invariant.
///
/// Returns `None` (event discarded) when any required field is absent, the
/// impact score is out of the 0–100 range, or no stock entry survives the
/// null-ticker drop. `impact_color` is always recomputed from the score, so
/// emitted events are band-consistent by construction. A missing or
/// unparseable `event_date` falls back to `default_date`.
#[must_use]
pub fn validate_event(raw: RawEvent, default_date: DateTime<Utc>) -> Option<MarketEvent> {
    let title = raw.title.filter(|s| !s.is_empty())?;
    let summary = raw.summary.filter(|s| !s.is_empty())?;
    let category = raw.category.filter(|s| !s.is_empty())?;
    let article_link = raw.article_link.filter(|s| !s.is_empty())?;

    let coords = raw.coordinates?;
    let coordinates = Coordinates {
        lat: coords.lat?,
        lng: coords.lng?,
    };

    let score = raw.impact_score?;
    if !(0..=100).contains(&score) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let impact_score = score as u8;

    let relevant_stocks: Vec<RelevantStock> = raw
        .relevant_stocks
        .into_iter()
        .filter_map(|s| {
            let ticker = s.ticker.filter(|t| !t.is_empty())?;
            let name = s.name.unwrap_or_else(|| ticker.clone());
            Some(RelevantStock { ticker, name })
        })
        .collect();
    if relevant_stocks.is_empty() {
        return None;
    }

    let event_date = raw
        .event_date
        .as_deref()
        .and_then(parse_event_date)
        .unwrap_or(default_date);

    Some(MarketEvent {
        title,
        summary,
        category,
        article_link,
        image_url: raw.image_url.filter(|u| !u.is_empty()),
        coordinates,
        country_code: raw.country_code.filter(|c| !c.is_empty()),
        impact_score,
        impact_color: impact_color(impact_score),
        relevant_stocks,
        event_date,
    })
}

/// Accept full RFC 3339 timestamps or bare dates.
fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}
