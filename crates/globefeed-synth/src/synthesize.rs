//! The two synthesis modes: strict batch and per-small-batch with fallback.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures::future::join_all;

use globefeed_core::{MarketEvent, NewsItem};

use crate::client::LlmClient;
use crate::error::SynthError;
use crate::fallback::fallback_event;
use crate::parse::{parse_events, validate_event};
use crate::prompt::build_events_prompt;

/// Sub-batch size for fallback mode. Small batches keep each prompt short
/// and bound the blast radius of one failed model call.
const FALLBACK_BATCH_SIZE: usize = 2;

/// Batch mode: one model call over the whole batch, strict validation.
///
/// Events failing validation are dropped; an unusable full response is a
/// request-level error because there is no fallback partition to degrade to.
///
/// # Errors
///
/// - [`SynthError::Api`] / [`SynthError::Http`] when the model call fails.
/// - [`SynthError::Parse`] / [`SynthError::NoJsonArray`] when the response
///   is not a JSON array of events.
pub async fn synthesize_events(
    client: &LlmClient,
    items: &[NewsItem],
) -> Result<Vec<MarketEvent>, SynthError> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let prompt = build_events_prompt(items);
    let response = client.generate(&prompt).await?;
    let raw_events = parse_events(&response, "event batch")?;

    let publish_dates: HashMap<&str, DateTime<Utc>> = items
        .iter()
        .map(|item| (item.url.as_str(), item.published_at))
        .collect();
    let now = Utc::now();

    let total = raw_events.len();
    let events: Vec<MarketEvent> = raw_events
        .into_iter()
        .filter_map(|raw| {
            // Default a missing event date to the source article's publish
            // date when the event links back to one of our inputs.
            let default_date = raw
                .article_link
                .as_deref()
                .and_then(|link| publish_dates.get(link).copied())
                .unwrap_or(now);
            validate_event(raw, default_date)
        })
        .collect();

    tracing::debug!(
        input_items = items.len(),
        raw_events = total,
        valid_events = events.len(),
        "synthesized event batch"
    );

    Ok(events)
}

/// Fallback mode: partition into batches of two, call the model once per
/// batch concurrently, and manufacture a heuristic event for every input the
/// model failed to cover.
///
/// Results merge in batch-creation order, so output order is deterministic
/// for a fixed input regardless of network completion order. Guarantee:
/// exactly one output event per input item.
pub async fn synthesize_with_fallback(
    client: &LlmClient,
    items: &[NewsItem],
    country_hint: Option<&str>,
) -> Vec<MarketEvent> {
    let batches: Vec<&[NewsItem]> = items.chunks(FALLBACK_BATCH_SIZE).collect();
    let calls = batches.iter().map(|batch| synthesize_batch(client, batch));
    let results = join_all(calls).await;

    // First model-derived event per input URL wins; extra events for the
    // same URL or for URLs outside the input are discarded.
    let mut by_url: HashMap<String, MarketEvent> = HashMap::new();
    let mut model_failures = 0usize;
    for result in results {
        match result {
            Ok(events) => {
                for event in events {
                    by_url.entry(event.article_link.clone()).or_insert(event);
                }
            }
            Err(e) => {
                model_failures += 1;
                tracing::warn!(error = %e, "model sub-batch failed; degrading to heuristics");
            }
        }
    }

    let mut heuristic = 0usize;
    let events: Vec<MarketEvent> = items
        .iter()
        .map(|item| {
            by_url.remove(item.url.as_str()).unwrap_or_else(|| {
                heuristic += 1;
                fallback_event(item, country_hint)
            })
        })
        .collect();

    tracing::debug!(
        input_items = items.len(),
        model_failures,
        heuristic_events = heuristic,
        "synthesized events with fallback"
    );

    events
}

async fn synthesize_batch(
    client: &LlmClient,
    batch: &[NewsItem],
) -> Result<Vec<MarketEvent>, SynthError> {
    let prompt = build_events_prompt(batch);
    let response = client.generate(&prompt).await?;
    let raw_events = parse_events(&response, "event sub-batch")?;

    let publish_dates: HashMap<&str, DateTime<Utc>> = batch
        .iter()
        .map(|item| (item.url.as_str(), item.published_at))
        .collect();
    let now = Utc::now();

    Ok(raw_events
        .into_iter()
        .filter_map(|raw| {
            let default_date = raw
                .article_link
                .as_deref()
                .and_then(|link| publish_dates.get(link).copied())
                .unwrap_or(now);
            validate_event(raw, default_date)
        })
        .collect())
}
