use thiserror::Error;

/// Errors raised by source adapters and the provider client.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed feed XML.
    #[error("feed parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The forum listing endpoint returned an error or unusable payload.
    #[error("forum API error: {0}")]
    Forum(String),

    /// The link-aggregator endpoint returned an error or unusable payload.
    #[error("link aggregator error: {0}")]
    LinkAgg(String),

    /// The market-news provider returned an application-level error.
    #[error("provider API error: {0}")]
    Provider(String),

    /// The provider rejected the request with HTTP 429.
    #[error("provider rate limited: {0}")]
    RateLimited(String),

    /// A response body did not match the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
