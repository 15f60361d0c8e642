use crate::domain::errors::PipelineError;
use reqwest::{Client, Response};
use std::time::Duration;

/// Request timeout applied when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Creates a plain HTTP client with an explicit request timeout.
    ///
    /// No retry middleware: a failed request surfaces immediately and the
    /// refresh loop decides whether to try again. A client that cannot carry
    /// the timeout is an error, never a silent fallback to an unbounded one.
    pub fn create_client(timeout: Duration) -> Result<Client, PipelineError> {
        if timeout.is_zero() {
            return Err(PipelineError::invalid_request(
                "HTTP request timeout must be greater than zero",
            ));
        }

        Client::builder()
            .user_agent(concat!("candlecast/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(5)
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| {
                PipelineError::invalid_request(format!("HTTP client construction failed: {}", e))
            })
    }
}

/// Maps a reqwest failure onto the pipeline taxonomy.
///
/// Body decoding failures are payload problems; everything else is transport.
pub fn map_request_error(source_name: &str, err: reqwest::Error) -> PipelineError {
    if err.is_decode() {
        PipelineError::bad_response(source_name, err.to_string())
    } else if err.is_timeout() {
        PipelineError::network(format!("{} request timed out: {}", source_name, err))
    } else {
        PipelineError::network(format!("{}: {}", source_name, err))
    }
}

/// Reads the body of a successful response, failing with `BadResponse` otherwise.
pub async fn read_success_body(
    source_name: &str,
    response: Response,
) -> Result<String, PipelineError> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(PipelineError::bad_response(
            source_name,
            format!("HTTP {}: {}", status, truncate(&error_text, 200)),
        ));
    }

    response
        .text()
        .await
        .map_err(|e| map_request_error(source_name, e))
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }

    #[test]
    fn test_client_builds_with_short_timeout() {
        assert!(HttpClientFactory::create_client(Duration::from_millis(250)).is_ok());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let err = HttpClientFactory::create_client(Duration::ZERO).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest { .. }));
    }
}
