//! Market-event synthesis from normalized news items.
//!
//! A batch of [`globefeed_core::NewsItem`]s is turned into
//! [`globefeed_core::MarketEvent`]s by an external generative model. Two modes
//! exist with different failure semantics:
//!
//! - **batch**: one model call over the whole batch, strict parse-then-validate,
//!   an unusable response is a hard error (there is nothing to degrade to);
//! - **fallback**: fixed-size sub-batches run concurrently, any input the model
//!   fails to cover yields a deterministic heuristic event, so every input item
//!   produces exactly one output event.

pub mod client;
pub mod error;
pub mod fallback;
pub mod parse;
pub mod prompt;
mod retry;
pub mod synthesize;

pub use client::LlmClient;
pub use error::SynthError;
pub use fallback::fallback_event;
pub use synthesize::{synthesize_events, synthesize_with_fallback};
