//! News source adapters and the aggregation pipeline.
//!
//! Three independent adapters (RSS/Atom feeds, a ranked discussion community,
//! a link aggregator) plus a market-news provider client, each converting one
//! upstream's payload into the intermediate [`RawItem`] shape. The normalizer
//! maps raw items into [`globefeed_core::NewsItem`] values, dropping anything
//! without a title and url; the aggregator fans out to all enabled adapters
//! concurrently and merges, sorts, and truncates the results.
//!
//! Adapters return `Result` and the aggregator absorbs failures: one dead
//! upstream contributes an empty list and a warning, never an aborted batch.

pub mod aggregate;
pub mod classify;
pub mod error;
pub mod forum;
pub mod linkagg;
pub mod normalize;
pub mod provider;
pub mod rss;

pub use aggregate::{merge_items, AggregateOptions, NewsSources, SourceSet};
pub use error::SourceError;
pub use forum::ForumClient;
pub use linkagg::LinkAggClient;
pub use normalize::{normalize, Provider, RawItem};
pub use provider::{MarketNewsClient, NewsQuery};
