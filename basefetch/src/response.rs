//! Response envelope returned by [`HttpClient::request`](crate::HttpClient::request).

use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::ops::Deref;
use url::Url;

use crate::{ClientError, RequestDescriptor};

/// The inbound result of one call.
///
/// Carries the parsed body together with the status, the response headers,
/// the final URL and the resolved descriptor that produced it. Response
/// interceptors see it as `ResponseEnvelope<serde_json::Value>`; the caller
/// receives it converted to its own type.
///
/// # Example
///
/// ```ignore
/// let envelope = client.request::<Campaign>("/campaigns/42", RequestDescriptor::default()).await?;
///
/// println!("{} -> {}", envelope.url, envelope.status);
/// let campaign = envelope.into_data();
/// ```
#[derive(Debug, Clone)]
pub struct ResponseEnvelope<T> {
    /// Parsed response body.
    pub data: T,
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// The URL the request was sent to, query included.
    pub url: Url,
    /// The descriptor after all request interceptors ran.
    pub request: RequestDescriptor,
}

impl<T> ResponseEnvelope<T> {
    /// Whether the status is in the 2xx range.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    /// Extract the body, discarding everything else.
    pub fn into_data(self) -> T {
        self.data
    }

    /// Transform the body, preserving the rest of the envelope.
    pub fn map<U, F>(self, f: F) -> ResponseEnvelope<U>
    where
        F: FnOnce(T) -> U,
    {
        ResponseEnvelope {
            data: f(self.data),
            status: self.status,
            headers: self.headers,
            url: self.url,
            request: self.request,
        }
    }

    /// Get a response header as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl ResponseEnvelope<Value> {
    /// Deserialize the JSON body into `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<ResponseEnvelope<T>, ClientError> {
        let status = self.status;
        let data = serde_json::from_value(self.data).map_err(|e| ClientError::Decode {
            status,
            message: e.to_string(),
        })?;
        Ok(ResponseEnvelope {
            data,
            status,
            headers: self.headers,
            url: self.url,
            request: self.request,
        })
    }
}

impl<T> Deref for ResponseEnvelope<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
