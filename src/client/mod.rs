//! Client for the range query webservice.
//!
//! The server only accepts GET requests, which are capped in length. The
//! [`QueryExpander`] hides that limit: expressions longer than the endpoint's
//! `max_chars` are partitioned into chunks, each chunk is queried on its own
//! and the answers are merged back together.

pub mod config;
pub mod user_agent;


use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::{RangeError, Result};
use crate::expression::{char_len, partition, Expression, SplitBatch, ATOM_SEPARATOR};
use crate::transport::{HttpResponse, HttpTransport, Transport, RANGE_EXCEPTION_HEADER};

pub use config::{RangeConfig, DEFAULT_MAX_CHARS};
pub use user_agent::UserAgent;

/// Which server view of an expression to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One name per line, from `/range/list`
    List,
    /// A compact expression, from `/range/expand`
    Collapsed,
}

impl OutputFormat {
    fn path(self) -> &'static str {
        match self {
            OutputFormat::List => "list",
            OutputFormat::Collapsed => "expand",
        }
    }
}

/// Range server location plus the longest expression it is sent at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    max_chars: usize,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, max_chars: usize) -> Result<Self> {
        let host = host.into();
        if max_chars == 0 {
            return Err(RangeError::Config("max_chars must be positive".to_string()));
        }
        let parsed = Url::parse(&format!("http://{}/", host))
            .map_err(|e| RangeError::Config(format!("Invalid range host '{}': {}", host, e)))?;
        if parsed.host_str().is_none() || parsed.path() != "/" || parsed.query().is_some() {
            return Err(RangeError::Config(format!("Range host must be host[:port], got '{}'", host)));
        }
        Ok(Self { host, max_chars })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Request URL for `expr`. The expression is percent-encoded as a query
    /// component, leaving `/` alone.
    pub fn url(&self, format: OutputFormat, expr: &str) -> String {
        let encoded = urlencoding::encode(expr).replace("%2F", "/");
        format!("http://{}/range/{}?{}", self.host, format.path(), encoded)
    }
}

/// Result of [`QueryExpander::query`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RangeOutput {
    List(Vec<String>),
    /// Per-chunk lists of a split expansion, in chunk order
    Chunked(Vec<Vec<String>>),
    Collapsed(String),
}

/// Result of [`QueryExpander::expand`].
///
/// Expressions too long for one request come back as one sorted list per
/// chunk. The lists are not merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Expansion {
    Single(Vec<String>),
    Chunked(Vec<Vec<String>>),
}

impl Expansion {
    pub fn is_chunked(&self) -> bool {
        matches!(self, Expansion::Chunked(_))
    }

    /// All names, chunk by chunk
    pub fn flatten(self) -> Vec<String> {
        match self {
            Expansion::Single(names) => names,
            Expansion::Chunked(chunks) => chunks.into_iter().flatten().collect(),
        }
    }
}

impl From<Expansion> for RangeOutput {
    fn from(expansion: Expansion) -> Self {
        match expansion {
            Expansion::Single(names) => RangeOutput::List(names),
            Expansion::Chunked(chunks) => RangeOutput::Chunked(chunks),
        }
    }
}

/// Expands and collapses range expressions against one range server.
pub struct QueryExpander {
    endpoint: Endpoint,
    user_agent: UserAgent,
    headers: Vec<(String, String)>,
    transport: Arc<dyn Transport>,
    max_concurrent_requests: usize,
    max_collapse_passes: Option<usize>,
}

impl QueryExpander {
    /// Client for `host` with default settings
    pub fn new(host: impl Into<String>) -> Result<Self> {
        Self::from_config(RangeConfig::new(host))
    }

    /// Client talking HTTP through `reqwest`
    pub fn from_config(config: RangeConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Client issuing its requests through `transport`
    pub fn with_transport(config: RangeConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let endpoint = Endpoint::new(config.host.clone(), config.max_chars)?;
        let user_agent = UserAgent::resolve(config.user_agent.as_deref());
        debug!("Range client for {} using User-Agent: {}", endpoint.host(), user_agent);

        Ok(Self {
            headers: vec![("User-Agent".to_string(), user_agent.to_string())],
            endpoint,
            user_agent,
            transport,
            max_concurrent_requests: config.max_concurrent_requests,
            max_collapse_passes: config.max_collapse_passes,
        })
    }

    /// Replaces the resolved User-Agent
    pub fn with_user_agent(mut self, user_agent: UserAgent) -> Self {
        self.headers = vec![("User-Agent".to_string(), user_agent.to_string())];
        self.user_agent = user_agent;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn user_agent(&self) -> &UserAgent {
        &self.user_agent
    }

    /// Headers sent with every request
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Queries `expr` in the requested format, splitting it across several
    /// requests when it is longer than the endpoint allows.
    pub async fn query(&self, expr: impl Into<Expression>, format: OutputFormat) -> Result<RangeOutput> {
        match format {
            OutputFormat::List => Ok(self.expand(expr).await?.into()),
            OutputFormat::Collapsed => Ok(RangeOutput::Collapsed(self.collapse(expr).await?)),
        }
    }

    /// Expands `expr` into a sorted list of names
    pub async fn expand(&self, expr: impl Into<Expression>) -> Result<Expansion> {
        let expr = expr.into().normalize();
        if self.is_oversized(&expr) {
            debug!(
                "Expression of {} chars exceeds {}, splitting expansion",
                char_len(&expr),
                self.endpoint.max_chars()
            );
            return Ok(Expansion::Chunked(self.split_and_expand(expr).await?));
        }
        Ok(Expansion::Single(self.fetch_list(&expr).await?))
    }

    /// Collapses `expr` into a compact range expression
    pub async fn collapse(&self, expr: impl Into<Expression>) -> Result<String> {
        let expr = expr.into().normalize();
        if self.is_oversized(&expr) {
            debug!(
                "Expression of {} chars exceeds {}, splitting collapse",
                char_len(&expr),
                self.endpoint.max_chars()
            );
            return self.split_and_collapse(expr).await;
        }
        self.fetch_collapsed(&expr).await
    }

    /// Partitions `expr` into chunks that fit this endpoint
    pub fn partition(&self, expr: &Expression) -> SplitBatch {
        partition(expr, self.endpoint.max_chars())
    }

    /// Expands every chunk of `expr` separately. Results stay grouped per
    /// chunk, in chunk order. The first failing chunk aborts the whole call.
    pub async fn split_and_expand(&self, expr: impl Into<Expression>) -> Result<Vec<Vec<String>>> {
        let batch = self.partition(&expr.into());
        info!("Expanding expression in {} chunks", batch.len());

        stream::iter(batch.joined())
            .map(|chunk| async move { self.fetch_list(&chunk).await })
            .buffered(self.max_concurrent_requests)
            .try_collect()
            .await
    }

    /// Collapses `expr` chunk by chunk, feeding the joined result back in
    /// until a pass leaves it unchanged.
    pub async fn split_and_collapse(&self, expr: impl Into<Expression>) -> Result<String> {
        let mut current = expr.into().normalize();
        let mut passes = 0;

        loop {
            if let Some(limit) = self.max_collapse_passes {
                if passes >= limit {
                    error!("Collapse still changing after {} passes", passes);
                    return Err(RangeError::NotConverged { passes });
                }
            }
            passes += 1;

            let batch = self.partition(&Expression::Literal(current.clone()));
            debug!("Collapse pass {} over {} chunks", passes, batch.len());
            let collapsed: Vec<String> = stream::iter(batch.joined())
                .map(|chunk| async move { self.fetch_collapsed(&chunk).await })
                .buffered(self.max_concurrent_requests)
                .try_collect()
                .await?;

            let next = collapsed
                .join(ATOM_SEPARATOR)
                .trim_start_matches(ATOM_SEPARATOR)
                .trim_end_matches(ATOM_SEPARATOR)
                .to_string();
            trace!("Collapse pass {}: {} -> {} chars", passes, char_len(&current), char_len(&next));
            if next == current {
                info!("Collapse settled after {} passes", passes);
                return Ok(current);
            }
            current = next;
        }
    }

    fn is_oversized(&self, expr: &str) -> bool {
        char_len(expr) > self.endpoint.max_chars()
    }

    async fn fetch_list(&self, expr: &str) -> Result<Vec<String>> {
        let resp = self.fetch(expr, OutputFormat::List).await?;
        let mut names: Vec<String> = split_lines(&resp.body)
            .into_iter()
            .map(|line| line.trim_end().to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn fetch_collapsed(&self, expr: &str) -> Result<String> {
        let resp = self.fetch(expr, OutputFormat::Collapsed).await?;
        Ok(resp.body)
    }

    /// Issues a single request. A `RangeException` header wins over the
    /// status code.
    async fn fetch(&self, expr: &str, format: OutputFormat) -> Result<HttpResponse> {
        let url = self.endpoint.url(format, expr);
        trace!("Querying {}", url);

        let resp = match self.transport.get(&url, &self.headers).await {
            Ok(r) => r,
            Err(e) => {
                error!("Failed to send request to {}: {}", url, e);
                return Err(RangeError::Transport { url, source: e });
            }
        };
        debug!("Response status: {}", resp.status);

        if let Some(message) = resp.header(RANGE_EXCEPTION_HEADER) {
            warn!("Range server rejected query: {}", message);
            return Err(RangeError::Server(message.to_string()));
        }
        if resp.status != 200 {
            error!("Got {} response code from {}", resp.status, url);
            return Err(RangeError::Protocol { status: resp.status, url });
        }
        Ok(resp)
    }
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Splits a response body into lines on every Unicode line boundary,
/// treating `\r\n` as one break. A trailing break adds no empty line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(j, '\n')) = chars.peek() {
                chars.next();
                start = j + 1;
            }
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}
