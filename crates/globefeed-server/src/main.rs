mod api;
mod cache;
mod middleware;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use globefeed_sources::{MarketNewsClient, NewsSources};
use globefeed_synth::LlmClient;

use crate::api::{build_app, AppState};
use crate::cache::ResponseCache;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(globefeed_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let sources = Arc::new(NewsSources::new(
        config.rss_feeds.clone(),
        &config.forum_base_url,
        &config.forum_community,
        &config.linkagg_base_url,
        config.request_timeout_secs,
    )?);

    let provider = match &config.provider_api_key {
        Some(key) => Some(Arc::new(MarketNewsClient::with_base_url(
            key,
            config.request_timeout_secs,
            &config.provider_base_url,
        )?)),
        None => {
            tracing::warn!(
                "GLOBEFEED_PROVIDER_API_KEY not set; /api/event and /api/time-machine will refuse requests"
            );
            None
        }
    };

    let llm = Arc::new(LlmClient::with_base_url(
        &config.llm_api_key,
        &config.llm_model,
        config.request_timeout_secs,
        config.llm_max_retries,
        config.llm_retry_backoff_ms,
        &config.llm_base_url,
    )?);

    let cache = Arc::new(ResponseCache::new(Duration::from_secs(
        config.cache_ttl_secs,
    )));

    let state = AppState {
        config: Arc::clone(&config),
        cache,
        sources,
        provider,
        llm,
    };
    let app = build_app(state);

    tracing::info!(addr = %config.bind_addr, env = %config.env, "starting server");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
