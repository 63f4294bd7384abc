//! Built-in interceptors.
//!
//! - [`HeaderInterceptor`]: inserts a fixed header on every request, e.g. an
//!   auth token
//! - [`TraceRequests`] / [`TraceResponses`]: log calls through `tracing`
//!   (requires the `tracing` feature)
//!
//! # Example
//!
//! ```ignore
//! use basefetch::{HeaderInterceptor, HttpClient};
//!
//! let client = HttpClient::with_base_url("https://api.example.com")?;
//! client
//!     .request_interceptors()
//!     .add(HeaderInterceptor::bearer("token123")?);
//! ```

use http::{HeaderName, HeaderValue};

use crate::interceptor::{BoxFuture, Interceptor};
use crate::{ClientError, RequestDescriptor};

/// A request interceptor that sets a header on every request.
///
/// The header replaces any value the caller already set under the same name.
#[derive(Clone, Debug)]
pub struct HeaderInterceptor {
    name: HeaderName,
    value: HeaderValue,
}

impl HeaderInterceptor {
    /// Create a new header interceptor.
    ///
    /// # Panics
    ///
    /// Panics if the header name or value is invalid.
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.parse().expect("invalid header name"),
            value: value.parse().expect("invalid header value"),
        }
    }

    /// Try to create a new header interceptor, returning an error if invalid.
    pub fn try_new(name: &str, value: &str) -> Result<Self, ClientError> {
        let name = name
            .parse()
            .map_err(|_| ClientError::InvalidHeader(format!("invalid header name: {}", name)))?;
        let value = value
            .parse()
            .map_err(|_| ClientError::InvalidHeader(format!("invalid header value: {}", value)))?;
        Ok(Self { name, value })
    }

    /// Create an `Authorization: Bearer <token>` interceptor.
    ///
    /// The value is marked sensitive so it is redacted from `Debug` output.
    pub fn bearer(token: &str) -> Result<Self, ClientError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ClientError::InvalidHeader("invalid bearer token".to_string()))?;
        value.set_sensitive(true);
        Ok(Self {
            name: http::header::AUTHORIZATION,
            value,
        })
    }

    /// Create a new header interceptor from pre-parsed values.
    pub fn from_parts(name: HeaderName, value: HeaderValue) -> Self {
        Self { name, value }
    }
}

impl Interceptor<RequestDescriptor> for HeaderInterceptor {
    fn intercept(
        &self,
        mut request: RequestDescriptor,
    ) -> BoxFuture<'_, Result<RequestDescriptor, ClientError>> {
        request
            .headers
            .insert(self.name.clone(), self.value.clone());
        Box::pin(std::future::ready(Ok(request)))
    }
}

#[cfg(feature = "tracing")]
pub use self::trace::{TraceRequests, TraceResponses};

#[cfg(feature = "tracing")]
mod trace {
    use serde_json::Value;

    use crate::interceptor::{BoxFuture, Interceptor};
    use crate::{ClientError, RequestDescriptor, ResponseEnvelope};

    /// Logs every outgoing request at `DEBUG` level.
    #[derive(Clone, Debug, Default)]
    pub struct TraceRequests;

    impl Interceptor<RequestDescriptor> for TraceRequests {
        fn intercept(
            &self,
            request: RequestDescriptor,
        ) -> BoxFuture<'_, Result<RequestDescriptor, ClientError>> {
            tracing::debug!(
                method = %request.method,
                params = request.params.len(),
                has_body = request.body.is_some(),
                "sending request"
            );
            Box::pin(std::future::ready(Ok(request)))
        }
    }

    /// Logs every response at `DEBUG` level, or `WARN` for non-success status.
    #[derive(Clone, Debug, Default)]
    pub struct TraceResponses;

    impl Interceptor<ResponseEnvelope<Value>> for TraceResponses {
        fn intercept(
            &self,
            response: ResponseEnvelope<Value>,
        ) -> BoxFuture<'_, Result<ResponseEnvelope<Value>, ClientError>> {
            if response.ok() {
                tracing::debug!(
                    method = %response.request.method,
                    url = %response.url,
                    status = response.status.as_u16(),
                    "received response"
                );
            } else {
                tracing::warn!(
                    method = %response.request.method,
                    url = %response.url,
                    status = response.status.as_u16(),
                    body = %response.data,
                    "received error response"
                );
            }
            Box::pin(std::future::ready(Ok(response)))
        }
    }
}
