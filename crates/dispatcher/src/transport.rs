//! HTTP transports
//!
//! `ReqwestTransport` delivers requests for real; `MockTransport` records them
//! and can inject failures for tests and dry runs.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::{ContractError, HttpRequest, HttpResponse, HttpTransport};
use reqwest::header::CONTENT_TYPE;
use tracing::{instrument, trace};

use crate::error::DispatcherError;

/// Per-call timeout; an expired call counts as a transport failure
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a transport with the default 10 s timeout
    pub fn new() -> Result<Self, DispatcherError> {
        Self::with_timeout(HTTP_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, DispatcherError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("telemetry-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DispatcherError::client_build(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl HttpTransport for ReqwestTransport {
    #[instrument(name = "http_post", skip(self, request), fields(url = %request.url, bytes = request.body.len()))]
    async fn post(&self, request: &HttpRequest) -> Result<HttpResponse, ContractError> {
        let mut builder = self
            .client
            .post(&request.url)
            .header(CONTENT_TYPE, "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    timeout_message(self.timeout)
                } else {
                    e.to_string()
                };
                ContractError::transport("http", message)
            })?;

        let status = response.status().as_u16();
        trace!(status, "response received");
        Ok(HttpResponse { status })
    }
}

fn timeout_message(timeout: Duration) -> String {
    format!("timed out after {}ms", timeout.as_millis())
}

/// Mock transport configuration
#[derive(Debug, Clone, Default)]
pub struct MockTransportConfig {
    /// Requests whose URL contains one of these answer HTTP 500
    pub fail_urls: Vec<String>,
    /// Requests whose URL contains one of these never get a response
    pub unreachable_urls: Vec<String>,
    /// Zero-based request indices that answer HTTP 500
    pub fail_requests: HashSet<usize>,
    /// Zero-based request indices that fail without a response
    pub unreachable_requests: HashSet<usize>,
}

/// Recording transport
#[derive(Debug, Default)]
pub struct MockTransport {
    config: MockTransportConfig,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    /// Every request succeeds with 200
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MockTransportConfig) -> Self {
        Self {
            config,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request recorded so far, in order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.recorded().clone()
    }

    /// Recorded requests whose URL contains `fragment`
    pub fn requests_to(&self, fragment: &str) -> Vec<HttpRequest> {
        self.recorded()
            .iter()
            .filter(|r| r.url.contains(fragment))
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.recorded().len()
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<HttpRequest>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HttpTransport for MockTransport {
    async fn post(&self, request: &HttpRequest) -> Result<HttpResponse, ContractError> {
        let index = {
            let mut requests = self.recorded();
            requests.push(request.clone());
            requests.len() - 1
        };

        let matches = |urls: &[String]| urls.iter().any(|u| request.url.contains(u.as_str()));
        if matches(&self.config.unreachable_urls) || self.config.unreachable_requests.contains(&index)
        {
            return Err(ContractError::transport("http", "connection refused"));
        }
        if matches(&self.config.fail_urls) || self.config.fail_requests.contains(&index) {
            return Ok(HttpResponse { status: 500 });
        }
        Ok(HttpResponse { status: 200 })
    }
}
