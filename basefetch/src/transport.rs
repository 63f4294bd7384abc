//! HTTP transport layer.
//!
//! [`Transport`] is the network primitive [`HttpClient`](crate::HttpClient)
//! calls once per request, after the request interceptors and before the
//! response interceptors. Requests and responses are fully buffered.
//!
//! [`HyperTransport`] is the default implementation:
//!
//! - HTTP/1.1 and HTTP/2 with ALPN negotiation
//! - TLS with rustls (feature-gated)
//! - Connection pooling
//!
//! # Feature Flags
//!
//! - `tls` (default) - Enables `tls-ring` + `tls-native-roots`
//! - `tls-ring` / `tls-aws-lc` - Crypto providers
//! - `tls-native-roots` / `tls-webpki-roots` - Root certificates
//!
//! # Custom transports
//!
//! ```ignore
//! use basefetch::{BoxFuture, ClientError, Transport};
//! use bytes::Bytes;
//!
//! struct Offline;
//!
//! impl Transport for Offline {
//!     fn send(
//!         &self,
//!         _request: http::Request<Bytes>,
//!     ) -> BoxFuture<'_, Result<http::Response<Bytes>, ClientError>> {
//!         Box::pin(async { Err(ClientError::Transport("offline".into())) })
//!     }
//! }
//! ```

mod body;
mod connector;
mod hyper;

use bytes::Bytes;

use crate::ClientError;
use crate::interceptor::BoxFuture;

pub use body::TransportBody;
pub use connector::{build_https_connector, default_tls_config, has_tls_support};
pub use hyper::{HyperTransport, HyperTransportBuilder};

pub use rustls::ClientConfig as TlsClientConfig;

/// Sends a fully buffered HTTP request and returns the fully buffered response.
///
/// A non-success status is not an error at this layer; only failures to
/// complete the exchange are.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: http::Request<Bytes>,
    ) -> BoxFuture<'_, Result<http::Response<Bytes>, ClientError>>;
}
