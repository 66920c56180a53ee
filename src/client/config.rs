use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::{RangeError, Result};

/// Longest expression sent in a single request by default
pub const DEFAULT_MAX_CHARS: usize = 7500;
pub const DEFAULT_HOST: &str = "localhost:80";
const REQUEST_TIMEOUT: u64 = 30; // seconds
const CONNECTION_TIMEOUT: u64 = 10; // seconds
const MAX_CONCURRENT_REQUESTS: usize = 4;
const MAX_COLLAPSE_PASSES: usize = 64;

/// Configuration for a [`QueryExpander`](crate::QueryExpander).
#[derive(Debug, Clone)]
pub struct RangeConfig {
    /// Range server as `host:port`
    pub host: String,
    /// Program name reported in the User-Agent, defaults to the running binary
    pub user_agent: Option<String>,
    /// Longest expression sent in one GET
    pub max_chars: usize,

    // HTTP client configuration
    pub request_timeout: Duration,
    pub connection_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,

    /// Chunk requests in flight at once during a split query
    pub max_concurrent_requests: usize,
    /// Upper bound on split-collapse passes, `None` keeps going until the
    /// result stops changing
    pub max_collapse_passes: Option<usize>,
}

impl RangeConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Sets the program name used in the User-Agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the longest expression sent in a single request
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    pub fn with_pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Sets how many chunk requests may be in flight at once (1 = sequential)
    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max;
        self
    }

    /// Caps the number of split-collapse passes, `None` removes the cap
    pub fn with_max_collapse_passes(mut self, passes: Option<usize>) -> Self {
        self.max_collapse_passes = passes;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(RangeError::Config("host cannot be empty".to_string()));
        }
        if self.max_chars == 0 {
            return Err(RangeError::Config("max_chars must be positive".to_string()));
        }
        if self.max_concurrent_requests == 0 {
            return Err(RangeError::Config("max_concurrent_requests must be positive".to_string()));
        }
        if self.max_collapse_passes == Some(0) {
            return Err(RangeError::Config("max_collapse_passes must be positive".to_string()));
        }
        Ok(())
    }

    /// Loads configuration from defaults, an optional TOML file and
    /// `RANGE__*` environment variables, in increasing precedence.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("host", DEFAULT_HOST)?
            .set_default("max_chars", DEFAULT_MAX_CHARS as i64)?
            .set_default("request_timeout_secs", REQUEST_TIMEOUT as i64)?
            .set_default("connect_timeout_secs", CONNECTION_TIMEOUT as i64)?
            .set_default("max_concurrent_requests", MAX_CONCURRENT_REQUESTS as i64)?
            .set_default("max_collapse_passes", MAX_COLLAPSE_PASSES as i64)?;

        if let Some(path) = path {
            if !path.exists() {
                return Err(RangeError::Config(format!("Config file not found: {}", path.display())));
            }
            debug!("Loading range configuration from {}", path.display());
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(Environment::with_prefix("RANGE").separator("__").try_parsing(true));

        let settings: Settings = builder.build()?.try_deserialize()?;
        let config = settings.into_config();
        config.validate()?;
        Ok(config)
    }
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            user_agent: None,
            max_chars: DEFAULT_MAX_CHARS,
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT),
            connection_timeout: Duration::from_secs(CONNECTION_TIMEOUT),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            max_concurrent_requests: MAX_CONCURRENT_REQUESTS,
            max_collapse_passes: Some(MAX_COLLAPSE_PASSES),
        }
    }
}

/// On-disk form of [`RangeConfig`]. A pass limit of 0 means unbounded.
#[derive(Debug, Deserialize)]
struct Settings {
    host: String,
    user_agent: Option<String>,
    max_chars: usize,
    request_timeout_secs: u64,
    connect_timeout_secs: u64,
    max_concurrent_requests: usize,
    max_collapse_passes: usize,
}

impl Settings {
    fn into_config(self) -> RangeConfig {
        RangeConfig {
            host: self.host,
            user_agent: self.user_agent,
            max_chars: self.max_chars,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connection_timeout: Duration::from_secs(self.connect_timeout_secs),
            max_concurrent_requests: self.max_concurrent_requests,
            max_collapse_passes: (self.max_collapse_passes > 0).then_some(self.max_collapse_passes),
            ..RangeConfig::default()
        }
    }
}
