//! JSON HTTP client with composable request and response interceptors.
//!
//! [`HttpClient`] is the single chokepoint a dashboard front end talks to its
//! REST backend through. Cross-cutting behavior (auth-header injection,
//! error normalization, logging) lives in two ordered async interceptor
//! chains instead of at every call site.
//!
//! ## Example
//!
//! ```ignore
//! use basefetch::{HeaderInterceptor, HttpClient, RequestDescriptor};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Campaign {
//!     id: u64,
//!     name: String,
//! }
//!
//! let client = HttpClient::with_base_url("https://api.example.com")?;
//! client
//!     .request_interceptors()
//!     .add(HeaderInterceptor::bearer(&token)?);
//!
//! let active: Vec<Campaign> = client
//!     .get_with("/campaigns", RequestDescriptor::default().param("status", "active"))
//!     .await?;
//! ```
//!
//! ## Request Lifecycle
//!
//! 1. Request interceptors run in registration order, each awaiting the
//!    previous one. The first error aborts the call.
//! 2. The URL is resolved: an absolute path is used as-is, a relative one is
//!    appended to the base URL with exactly one `/`, and params become query
//!    pairs in insertion order.
//! 3. The [`Transport`] performs the exchange.
//! 4. The body is parsed as JSON. An empty body is `null`; anything that is
//!    not JSON fails with [`ClientError::Decode`].
//! 5. Response interceptors run over the [`ResponseEnvelope`].
//! 6. A non-2xx status fails with [`ClientError::Api`], whose
//!    [`ApiError::body`] is the server's JSON payload. Otherwise the data is
//!    deserialized into the caller's type.
//!
//! The client never retries, times out or swallows an error on its own.
//! Wrap calls in [`retry`] / [`retry_with_policy`] for transient failures.
//!
//! ## Interceptors
//!
//! ```ignore
//! use basefetch::{ClientError, RequestDescriptor, ResponseEnvelope};
//! use serde_json::Value;
//!
//! let handle = client.request_interceptors().add_fn(|req: RequestDescriptor| async move {
//!     Ok::<_, ClientError>(req.header("x-client", "dashboard"))
//! });
//!
//! // Unwrap `{"data": ...}` payloads for every caller
//! client.response_interceptors().add_fn(|res: ResponseEnvelope<Value>| async move {
//!     Ok::<_, ClientError>(res.map(|mut body| body["data"].take()))
//! });
//!
//! client.request_interceptors().eject(handle);
//! ```
//!
//! Ejecting leaves an inert slot behind, so other handles stay valid.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `tls` (default) | `tls-ring` + `tls-native-roots` |
//! | `tls-ring` / `tls-aws-lc` | rustls crypto provider |
//! | `tls-native-roots` / `tls-webpki-roots` | Root certificates |
//! | `tracing` | A `debug` span per request, retry logs, [`TraceRequests`] / [`TraceResponses`] |

mod builder;
mod client;
pub mod config;
mod cookie;
mod error;
pub mod interceptor;
pub mod request;
pub mod response;
pub mod transport;

#[cfg(test)]
mod testing;

pub use builder::ClientBuilder;
pub use client::HttpClient;
pub use cookie::{get_cookies, parse_cookies};
pub use error::{ApiError, ClientError};

pub use config::{ExponentialBackoff, HeaderInterceptor, RetryPolicy, retry, retry_with_policy};
#[cfg(feature = "tracing")]
pub use config::{TraceRequests, TraceResponses};

pub use interceptor::{BoxFuture, Interceptor, InterceptorChain, InterceptorFn, InterceptorHandle};
pub use request::{Params, RequestDescriptor};
pub use response::ResponseEnvelope;

pub use transport::{HyperTransport, HyperTransportBuilder, TlsClientConfig, Transport, TransportBody};
