//! Error types for range queries.

/// Failure reported by a [`Transport`](crate::transport::Transport) before any
/// HTTP response was obtained.
pub type TransportFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum RangeError {
    #[error("Failed to reach range server at {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportFailure,
    },

    #[error("Got {status} response code from {url}")]
    Protocol { status: u16, url: String },

    #[error("Range server error: {0}")]
    Server(String),

    #[error("Collapse did not settle after {passes} passes")]
    NotConverged { passes: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, RangeError>;
