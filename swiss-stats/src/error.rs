use stats_px::PxError;
use stats_sdmx::SdmxError;
use thiserror::Error;

/// Errors surfaced by the high-level statistics client
#[derive(Error, Debug)]
pub enum StatsError {
    /// Malformed caller input (bad language code, empty dataset id),
    /// rejected before any network call
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The dataset identifier matched no backend declaration, or a
    /// filtered query legitimately matched zero observations
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// The upstream asked us to slow down (HTTP 429)
    #[error("Rate limited by upstream: {message}")]
    RateLimited { message: String },

    /// Non-success status, timeout, or a payload that failed to parse
    /// into the expected shape
    #[error("Upstream error: {message}")]
    Upstream { message: String },
}

impl StatsError {
    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new upstream error
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }
}

impl From<PxError> for StatsError {
    fn from(err: PxError) -> Self {
        match err {
            PxError::ApiError { status: 429, message } => Self::RateLimited { message },
            PxError::ApiError { status: 404, message } => Self::NotFound {
                message: format!("table not found upstream: {message}"),
            },
            other => Self::Upstream {
                message: other.to_string(),
            },
        }
    }
}

impl From<SdmxError> for StatsError {
    fn from(err: SdmxError) -> Self {
        match err {
            SdmxError::NoRecords => Self::NotFound {
                message: "no observations matched the query; check the filter values".to_string(),
            },
            SdmxError::ApiError { status: 429, message } => Self::RateLimited { message },
            other => Self::Upstream {
                message: other.to_string(),
            },
        }
    }
}

/// Type alias for Results using StatsError
pub type Result<T> = std::result::Result<T, StatsError>;
