use crate::domain::error::DomainError;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

pub(crate) fn client() -> Result<Client, DomainError> {
    Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(|e| DomainError::Config(format!("HTTP client: {e}")))
}

/// Turn a non-2xx response into an error. Throttling and server errors are
/// transient; everything else goes through `permanent`.
pub(crate) async fn check_status(
    resp: Response,
    service: &str,
    permanent: fn(String) -> DomainError,
) -> Result<Response, DomainError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = format!("{service} {status}: {body}");
    if is_transient(status) {
        Err(DomainError::Transient(message))
    } else {
        Err(permanent(message))
    }
}

/// Connection-level failures are worth another attempt; the rest are not.
pub(crate) fn send_error(e: reqwest::Error, service: &str, permanent: fn(String) -> DomainError) -> DomainError {
    if e.is_timeout() || e.is_connect() || e.is_request() {
        DomainError::Transient(format!("{service}: {e}"))
    } else {
        permanent(format!("{service}: {e}"))
    }
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}
