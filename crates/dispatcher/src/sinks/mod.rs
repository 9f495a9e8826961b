//! Sink implementations
//!
//! Contains WebhookSink and MonitorSink. Both only build requests; delivery
//! goes through an `HttpTransport`.

mod monitor;
mod webhook;

pub use self::monitor::MonitorSink;
pub use self::webhook::{embed_style, WebhookSink};

use contracts::{ContractError, HttpRequest, HttpResponse, HttpTransport};
use observability::record_http_call;

/// POST through the transport; non-2xx becomes `ContractError::HttpStatus`
///
/// Errors are attributed to `sink_name`.
async fn deliver<T: HttpTransport + Sync>(
    transport: &T,
    sink_name: &str,
    request: &HttpRequest,
) -> Result<HttpResponse, ContractError> {
    let response = match transport.post(request).await {
        Ok(response) => response,
        Err(ContractError::Transport { message, .. }) => {
            record_http_call(sink_name, None, false);
            return Err(ContractError::transport(sink_name, message));
        }
        Err(other) => {
            record_http_call(sink_name, None, false);
            return Err(other);
        }
    };

    record_http_call(sink_name, Some(response.status), response.is_success());
    if response.is_success() {
        Ok(response)
    } else {
        Err(ContractError::http_status(sink_name, response.status))
    }
}
