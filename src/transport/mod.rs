//! HTTP transport used to reach the range server.

pub mod http;

use async_trait::async_trait;

use crate::error::TransportFailure;

pub use http::HttpTransport;

/// Header the range server uses to report a query error
pub const RANGE_EXCEPTION_HEADER: &str = "RangeException";

/// A response as seen by the query layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Looks up a header value. Names compare ASCII case-insensitively since
    /// HTTP stacks are free to normalise them.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Issues GET requests on behalf of a [`QueryExpander`](crate::QueryExpander).
///
/// An `Err` means no HTTP response was obtained at all (connection refused,
/// DNS failure, timeout). Non-200 responses are returned as `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, TransportFailure>;
}
