use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// RSS feed URLs, fanned out by the aggregator.
    pub rss_feeds: Vec<String>,
    pub forum_base_url: String,
    /// Community whose ranked posts the forum adapter pulls.
    pub forum_community: String,
    pub linkagg_base_url: String,
    pub provider_base_url: String,
    /// Optional: provider-backed routes degrade gracefully when absent.
    pub provider_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    /// Required at startup; event synthesis cannot degrade without it.
    pub llm_api_key: String,
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub llm_max_retries: u32,
    pub llm_retry_backoff_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("rss_feeds", &self.rss_feeds)
            .field("forum_base_url", &self.forum_base_url)
            .field("forum_community", &self.forum_community)
            .field("linkagg_base_url", &self.linkagg_base_url)
            .field("provider_base_url", &self.provider_base_url)
            .field(
                "provider_api_key",
                &self.provider_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_model", &self.llm_model)
            .field("llm_api_key", &"[redacted]")
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("llm_max_retries", &self.llm_max_retries)
            .field("llm_retry_backoff_ms", &self.llm_retry_backoff_ms)
            .finish()
    }
}
