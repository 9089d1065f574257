//! Shared domain types and configuration for globefeed.
//!
//! Everything here is pure data: the unified [`NewsItem`] record the source
//! adapters normalize into, the [`MarketEvent`] record the synthesizer emits,
//! the impact-score banding, the country centroid table used by the heuristic
//! fallback, and the env-driven application config.

mod app_config;
mod config;
pub mod geo;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use types::{
    impact_color, Category, Coordinates, ImpactColor, MarketEvent, NewsItem, RelevantStock,
    Sentiment,
};
