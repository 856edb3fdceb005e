/*
[INPUT]:  Error sources (credentials, clock, HTTP transport, exchange payloads, serialization)
[OUTPUT]: Structured error types with retry hints and exchange error codes
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Main error type for the Binance spot adapter
#[derive(Error, Debug)]
pub enum BinanceError {
    /// Signed request attempted without both credential halves
    #[error("Missing credentials: signed requests need both an API key and a secret key")]
    Credentials,

    /// Signed request attempted before the clock was ever synchronized
    #[error("Clock not synchronized with the exchange, call sync_time first")]
    ClockNotSynced,

    /// Exchange answered with a non-success status; body is kept verbatim
    #[error("Exchange error (status {status}): {body}")]
    Exchange { status: u16, body: String },

    /// Network-level failure (DNS, timeout, connection reset)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Query string encoding failed
    #[error("Query encoding error: {0}")]
    Query(#[from] serde_urlencoded::ser::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error payload Binance returns alongside non-success statuses
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExchangeErrorBody {
    pub code: i64,
    pub msg: String,
}

impl BinanceError {
    /// Check if the error is retryable by the caller
    ///
    /// Nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            BinanceError::Transport(_) => true,
            BinanceError::Exchange { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
                    || *status >= StatusCode::INTERNAL_SERVER_ERROR.as_u16()
            }
            _ => false,
        }
    }

    /// Check if error indicates an authentication problem
    pub fn is_auth_error(&self) -> bool {
        match self {
            BinanceError::Credentials | BinanceError::ClockNotSynced => true,
            BinanceError::Exchange { status, .. } => {
                *status == StatusCode::UNAUTHORIZED.as_u16()
                    || *status == StatusCode::FORBIDDEN.as_u16()
            }
            _ => false,
        }
    }

    /// Parse the exchange's `{code, msg}` payload, if this is an exchange error carrying one
    pub fn exchange_body(&self) -> Option<ExchangeErrorBody> {
        match self {
            BinanceError::Exchange { body, .. } => serde_json::from_str(body).ok(),
            _ => None,
        }
    }

    /// Exchange error code (e.g. -1021 for an out-of-window timestamp)
    pub fn exchange_code(&self) -> Option<i64> {
        self.exchange_body().map(|body| body.code)
    }

    /// Create an exchange error from status code and raw body
    pub fn exchange_error(status: StatusCode, body: impl Into<String>) -> Self {
        BinanceError::Exchange {
            status: status.as_u16(),
            body: body.into(),
        }
    }
}

/// Result type alias for Binance operations
pub type Result<T> = std::result::Result<T, BinanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        let throttled = BinanceError::exchange_error(StatusCode::TOO_MANY_REQUESTS, "{}");
        assert!(throttled.is_retryable());

        let bad_request = BinanceError::exchange_error(StatusCode::BAD_REQUEST, "{}");
        assert!(!bad_request.is_retryable());
        assert!(!BinanceError::ClockNotSynced.is_retryable());
    }

    #[test]
    fn test_error_is_auth_error() {
        assert!(BinanceError::Credentials.is_auth_error());
        assert!(BinanceError::ClockNotSynced.is_auth_error());
        assert!(BinanceError::exchange_error(StatusCode::UNAUTHORIZED, "").is_auth_error());
        assert!(!BinanceError::Config("x".to_string()).is_auth_error());
    }

    #[test]
    fn test_exchange_error_keeps_body_verbatim() {
        let raw = r#"{"code":-1021,"msg":"Timestamp for this request is outside of the recvWindow."}"#;
        let err = BinanceError::exchange_error(StatusCode::BAD_REQUEST, raw);
        match &err {
            BinanceError::Exchange { status, body } => {
                assert_eq!(*status, 400);
                assert_eq!(body, raw);
            }
            _ => panic!("Expected Exchange error variant"),
        }
        assert_eq!(err.exchange_code(), Some(-1021));
    }

    #[test]
    fn test_exchange_code_absent_for_non_json_body() {
        let err = BinanceError::exchange_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(err.exchange_code(), None);
        assert!(err.is_retryable());
    }
}
