//! HttpTransport trait - Dispatcher output interface
//!
//! The sinks only build requests; delivering them is the transport's job.

use crate::ContractError;

/// Outbound POST request with a JSON body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// POST with a serialized JSON body
    pub fn json<T: serde::Serialize>(url: impl Into<String>, body: &T) -> Result<Self, ContractError> {
        Ok(Self {
            url: url.into(),
            headers: Vec::new(),
            body: serde_json::to_vec(body)?,
        })
    }

    /// Attach a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Response status of a delivered request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
}

impl HttpResponse {
    /// Any 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP transport trait
///
/// All transports (reqwest, test doubles) implement this trait.
#[trait_variant::make(HttpTransport: Send)]
pub trait LocalHttpTransport {
    /// POST the request and return the response status
    ///
    /// # Errors
    /// Returns `ContractError::Transport` when no response was received
    /// (connection failure, timeout). A non-2xx status is NOT an error here.
    async fn post(&self, request: &HttpRequest) -> Result<HttpResponse, ContractError>;
}
