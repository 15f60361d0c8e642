use thiserror::Error;

/// Recoverable failures of the refresh pipeline.
///
/// Every variant is handled at symbol (or feed) granularity by the refresh loop:
/// the failing unit is skipped for the current cycle and the rest continues.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Network error: {reason}")]
    Network { reason: String },

    #[error("Bad response from {source_name}: {reason}")]
    BadResponse { source_name: String, reason: String },

    #[error("Insufficient data for {symbol}: need {required} observations, got {available}")]
    InsufficientData {
        symbol: String,
        required: usize,
        available: usize,
    },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Forecast model failed: {reason}")]
    Model { reason: String },
}

impl PipelineError {
    pub fn network(reason: impl Into<String>) -> Self {
        Self::Network {
            reason: reason.into(),
        }
    }

    pub fn bad_response(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BadResponse {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub fn model(reason: impl Into<String>) -> Self {
        Self::Model {
            reason: reason.into(),
        }
    }

    /// Transport failures; the only kind retried within a cycle.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}
