use thiserror::Error;

/// Errors returned by the event synthesizer.
#[derive(Debug, Error)]
pub enum SynthError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The model API returned a non-2xx status or an empty candidate list.
    #[error("model API error: {0}")]
    Api(String),

    /// The model output could not be parsed as the expected JSON array.
    #[error("model output parse error for {context}: {source}")]
    Parse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The model output contained no JSON array at all.
    #[error("model output for {0} contained no JSON array")]
    NoJsonArray(String),
}
