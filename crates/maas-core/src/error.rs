//! Error types for MAAS operations.
//!
//! This module provides the error type shared by every MAAS client crate,
//! including the HTTP status code mapping helpers used by the transports.

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for MAAS operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// MAAS region controller is unreachable or temporarily unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Failed to parse a MAAS response body
    #[error("Failed to parse MAAS response: {0}")]
    ParseError(String),

    /// API key is malformed
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Request timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request was rejected before reaching the resource (authentication, permissions)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Remote validation rejected the request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Local validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Request conflicts with the current state of the resource
    #[error("Conflict: {0}")]
    Conflict(String),

    /// No machine satisfies the allocation constraints
    #[error("No eligible machine: {0}")]
    NoEligibleMachine(String),

    /// Allocation constraints were rejected as invalid
    #[error("Invalid constraint: {0}")]
    InvalidConstraint(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Specialized result type for MAAS operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::InvalidCredentials(_) => "INVALID_CREDENTIALS",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::NoEligibleMachine(_) => "NO_ELIGIBLE_MACHINE",
            Self::InvalidConstraint(_) => "INVALID_CONSTRAINT",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
        }
    }

    /// Returns true if this error should be logged as a serious error.
    ///
    /// Remote validation failures are expected outcomes and only warrant
    /// debug-level logging.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::ConfigError(_)
                | Self::ServiceUnavailable(_)
                | Self::Timeout(_)
                | Self::ParseError(_)
        )
    }
}

/// Default mapping from an unsuccessful HTTP status to an [`Error`].
///
/// `context` names the operation and is used as a message prefix for the
/// variants whose body alone would be ambiguous.
#[must_use]
pub fn map_status_to_error(context: &str, status: StatusCode, text: String) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(text),
        StatusCode::BAD_REQUEST => Error::BadRequest(text),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::InvalidRequest(format!("{context}: authentication failed: {text}"))
        }
        StatusCode::CONFLICT => Error::Conflict(text),
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            Error::ServiceUnavailable(format!("{context}: temporarily unavailable: {text}"))
        }
        status if status.is_server_error() => {
            Error::ServiceUnavailable(format!("{context}: server error {status}: {text}"))
        }
        _ => Error::HttpError(format!("{context}: error {status}: {text}")),
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}
