//! Builder for [`HttpClient`].

use std::sync::Arc;

use serde_json::Value;
use url::Url;

use crate::client::HttpClient;
use crate::interceptor::{Interceptor, InterceptorChain};
use crate::transport::{HyperTransportBuilder, Transport};
use crate::{ClientError, RequestDescriptor, ResponseEnvelope};

/// Builder for creating an [`HttpClient`].
///
/// # Example
///
/// ```ignore
/// use basefetch::{ClientBuilder, HeaderInterceptor, HyperTransportBuilder};
/// use std::time::Duration;
///
/// let client = ClientBuilder::new()
///     .base_url_from_env("DASHBOARD_API_URL")?
///     .hyper(HyperTransportBuilder::new().pool_idle_timeout(Duration::from_secs(30)))
///     .with_request_interceptor(HeaderInterceptor::new("x-client", "dashboard"))
///     .build()?;
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    hyper: Option<HyperTransportBuilder>,
    request_interceptors: Vec<Arc<dyn Interceptor<RequestDescriptor>>>,
    response_interceptors: Vec<Arc<dyn Interceptor<ResponseEnvelope<Value>>>>,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("transport", &self.transport.is_some())
            .field("hyper", &self.hyper)
            .field("request_interceptors", &self.request_interceptors.len())
            .field("response_interceptors", &self.response_interceptors.len())
            .finish()
    }
}

impl ClientBuilder {
    /// Create a builder with no base URL and the default hyper transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `base_url`.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Read the base URL from the environment variable `var`.
    pub fn base_url_from_env(self, var: &str) -> Result<Self, ClientError> {
        let base_url = std::env::var(var).map_err(|e| {
            ClientError::Config(format!("environment variable {}: {}", var, e))
        })?;
        Ok(self.base_url(base_url))
    }

    /// Send requests through a custom transport.
    ///
    /// Takes precedence over [`hyper`](Self::hyper).
    pub fn transport<T: Transport + 'static>(self, transport: T) -> Self {
        self.transport_arc(Arc::new(transport))
    }

    /// Send requests through a shared transport.
    pub fn transport_arc(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Configure the default hyper transport.
    pub fn hyper(mut self, builder: HyperTransportBuilder) -> Self {
        self.hyper = Some(builder);
        self
    }

    /// Register a request interceptor at build time.
    pub fn with_request_interceptor<I>(mut self, interceptor: I) -> Self
    where
        I: Interceptor<RequestDescriptor> + 'static,
    {
        self.request_interceptors.push(Arc::new(interceptor));
        self
    }

    /// Register a response interceptor at build time.
    pub fn with_response_interceptor<I>(mut self, interceptor: I) -> Self
    where
        I: Interceptor<ResponseEnvelope<Value>> + 'static,
    {
        self.response_interceptors.push(Arc::new(interceptor));
        self
    }

    /// Build the client.
    ///
    /// Fails if the base URL is not an absolute `http` or `https` URL, or if
    /// the default transport cannot be created.
    pub fn build(self) -> Result<HttpClient, ClientError> {
        if let Some(base_url) = &self.base_url {
            validate_base_url(base_url)?;
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(self.hyper.unwrap_or_default().build()?),
        };

        let request_interceptors = InterceptorChain::new();
        for interceptor in self.request_interceptors {
            request_interceptors.add_arc(interceptor);
        }
        let response_interceptors = InterceptorChain::new();
        for interceptor in self.response_interceptors {
            response_interceptors.add_arc(interceptor);
        }

        Ok(HttpClient::from_parts(
            self.base_url,
            transport,
            request_interceptors,
            response_interceptors,
        ))
    }
}

fn validate_base_url(base_url: &str) -> Result<(), ClientError> {
    let url = Url::parse(base_url)
        .map_err(|e| ClientError::InvalidUrl(format!("base URL {}: {}", base_url, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ClientError::InvalidUrl(format!(
            "base URL {}: unsupported scheme {}",
            base_url, scheme
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HeaderInterceptor;
    use crate::testing::StubTransport;

    #[test]
    fn test_rejects_invalid_base_url() {
        let stub = StubTransport::json(200, "{}");
        let err = ClientBuilder::new()
            .base_url("api.test/v1")
            .transport_arc(stub.clone())
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));

        let err = ClientBuilder::new()
            .base_url("ftp://files.test")
            .transport_arc(stub)
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }

    #[test]
    fn test_base_url_from_missing_env() {
        let err = ClientBuilder::new()
            .base_url_from_env("BASEFETCH_TEST_UNSET_VARIABLE")
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(ref m) if m.contains("BASEFETCH_TEST_UNSET_VARIABLE")));
    }

    #[tokio::test]
    async fn test_initial_interceptors_run_in_order() {
        let stub = StubTransport::json(200, r#"{"ok": true}"#);
        let client = ClientBuilder::new()
            .base_url("https://api.test")
            .transport_arc(stub.clone())
            .with_request_interceptor(HeaderInterceptor::new("x-tenant", "first"))
            .with_request_interceptor(HeaderInterceptor::new("x-tenant", "second"))
            .with_response_interceptor(crate::InterceptorFn::new(
                |envelope: ResponseEnvelope<Value>| async move {
                    Ok::<_, ClientError>(envelope.map(|_| Value::from("rewritten")))
                },
            ))
            .build()
            .unwrap();

        assert_eq!(client.request_interceptors().len(), 2);
        assert_eq!(client.response_interceptors().len(), 1);

        let data: String = client.get("/me").await.unwrap();
        assert_eq!(data, "rewritten");
        assert_eq!(stub.requests()[0].headers["x-tenant"], "second");
    }

    #[cfg(any(feature = "tls-ring", feature = "tls-aws-lc"))]
    #[tokio::test]
    async fn test_default_transport() {
        let client = ClientBuilder::new()
            .base_url("http://localhost:3000")
            .hyper(HyperTransportBuilder::new().pool_max_idle_per_host(4))
            .build()
            .unwrap();
        assert_eq!(client.base_url(), Some("http://localhost:3000"));
    }
}
