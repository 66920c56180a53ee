use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, trace};

use crate::client::config::RangeConfig;
use crate::error::{RangeError, Result, TransportFailure};
use crate::transport::{HttpResponse, Transport};

/// [`Transport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds the underlying HTTP client with the timeouts from `config`
    pub fn new(config: &RangeConfig) -> Result<Self> {
        debug!(
            "Initializing HTTP client: timeout={:?}, connect_timeout={:?}",
            config.request_timeout, config.connection_timeout
        );
        let client = match Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connection_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to build HTTP client: {}", e);
                return Err(RangeError::Config(format!("Failed to build HTTP client: {}", e)));
            }
        };
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> std::result::Result<HttpResponse, TransportFailure> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        trace!("Sending GET {}", url);
        let resp = request.send().await?;
        let status = resp.status().as_u16();
        trace!("Response headers: {:?}", resp.headers());

        let headers = resp
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = resp.text().await?;

        Ok(HttpResponse { status, headers, body })
    }
}
