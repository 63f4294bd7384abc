//! Client error types.
//!
//! This module provides [`ClientError`], the error type for every
//! [`HttpClient`](crate::HttpClient) operation, and [`ApiError`], the payload
//! carried when the server answers with a non-success status.

use http::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A non-success response from the server.
///
/// `body` is the server's own JSON payload, exactly as it was parsed from the
/// response (after response interceptors ran). By convention the dashboard
/// backend sends `{"message": ..., "code": ...}`, but nothing here enforces
/// that shape.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiError {
    /// HTTP status of the final response envelope.
    pub status: StatusCode,
    /// Parsed JSON error body.
    pub body: Value,
}

impl ApiError {
    /// Create a new API error from a status and a parsed body.
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    /// The conventional `message` field of the error body, if present.
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    /// Deserialize the error body into an application-specific type.
    pub fn body_as<E: DeserializeOwned>(&self) -> Result<E, serde_json::Error> {
        E::deserialize(&self.body)
    }

    /// Consume the error and return the raw payload.
    pub fn into_body(self) -> Value {
        self.body
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.message() {
            Some(message) => write!(f, "HTTP {}: {}", self.status, message),
            None => write!(f, "HTTP {}: {}", self.status, self.body),
        }
    }
}

/// Errors returned by the client.
///
/// Every failure path surfaces here; the client never swallows or retries an
/// error on its own.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("{0}")]
    Api(ApiError),

    /// Transport-level error (DNS, connection reset, TLS, etc.).
    #[error("transport error: {0}")]
    Transport(String),

    /// The request body could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),

    /// The response body was not JSON, or did not match the expected type.
    #[error("decode error (HTTP {status}): {message}")]
    Decode { status: StatusCode, message: String },

    /// The request URL could not be resolved.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// A header name or value is not valid HTTP.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The client or a retry policy was configured with unusable values.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An interceptor aborted the call.
    #[error("interceptor error: {0}")]
    Interceptor(String),
}

impl ClientError {
    /// Create an error for an interceptor that wants to abort the call.
    pub fn interceptor<S: Into<String>>(message: S) -> Self {
        ClientError::Interceptor(message.into())
    }

    /// Get the API error, if the server answered with a non-success status.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Get the HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api(err) => Some(err.status),
            ClientError::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get a human-readable message.
    ///
    /// For API errors this is the body's `message` field when present.
    pub fn message(&self) -> Option<&str> {
        match self {
            ClientError::Api(err) => err.message(),
            ClientError::Decode { message, .. }
            | ClientError::Transport(message)
            | ClientError::Encode(message)
            | ClientError::InvalidUrl(message)
            | ClientError::InvalidHeader(message)
            | ClientError::Config(message)
            | ClientError::Interceptor(message) => Some(message),
        }
    }

    /// Returns whether this error indicates a transient condition that may
    /// be resolved by retrying.
    ///
    /// Transport errors are retryable, as are API errors with status 408,
    /// 429, 502, 503 or 504.
    ///
    /// # Example
    ///
    /// ```
    /// use basefetch::{ApiError, ClientError};
    /// use http::StatusCode;
    ///
    /// let err = ClientError::Transport("connection reset".into());
    /// assert!(err.is_retryable());
    ///
    /// let err = ClientError::Api(ApiError::new(StatusCode::NOT_FOUND, serde_json::Value::Null));
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::Api(err) => matches!(
                err.status,
                StatusCode::REQUEST_TIMEOUT
                    | StatusCode::TOO_MANY_REQUESTS
                    | StatusCode::BAD_GATEWAY
                    | StatusCode::SERVICE_UNAVAILABLE
                    | StatusCode::GATEWAY_TIMEOUT
            ),
            _ => false,
        }
    }
}

impl From<ApiError> for ClientError {
    fn from(err: ApiError) -> Self {
        ClientError::Api(err)
    }
}
