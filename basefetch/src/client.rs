//! The [`HttpClient`] and its request lifecycle.

use std::sync::Arc;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::builder::ClientBuilder;
use crate::interceptor::InterceptorChain;
use crate::transport::Transport;
use crate::{ApiError, ClientError, RequestDescriptor, ResponseEnvelope};

const APPLICATION_JSON: &str = "application/json";

/// HTTP client with request and response interceptor chains.
///
/// Every call goes through the same lifecycle:
///
/// 1. the request chain transforms the [`RequestDescriptor`]
/// 2. the URL is resolved against the base URL and the params are appended
/// 3. the transport performs the exchange
/// 4. the body is parsed as JSON (an empty body is `null`)
/// 5. the response chain transforms the [`ResponseEnvelope`]
/// 6. a non-success status fails with [`ClientError::Api`] carrying the
///    parsed body; otherwise the data is deserialized into `T`
///
/// Clones share the transport and both chains, so an interceptor registered
/// through one clone applies to all of them.
///
/// # Example
///
/// ```ignore
/// use basefetch::{HeaderInterceptor, HttpClient};
///
/// let client = HttpClient::with_base_url("https://api.example.com")?;
/// client.request_interceptors().add(HeaderInterceptor::bearer(&token)?);
///
/// let campaigns: Vec<Campaign> = client.get("/campaigns").await?;
/// let created: Campaign = client.post("/campaigns", &new_campaign).await?;
/// ```
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    base_url: Option<String>,
    transport: Arc<dyn Transport>,
    request_interceptors: InterceptorChain<RequestDescriptor>,
    response_interceptors: InterceptorChain<ResponseEnvelope<Value>>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.inner.base_url)
            .field("request_interceptors", &self.inner.request_interceptors)
            .field("response_interceptors", &self.inner.response_interceptors)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a client without a base URL, so every path must be absolute.
    pub fn new() -> Result<Self, ClientError> {
        Self::builder().build()
    }

    /// Create a client that resolves relative paths against `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn from_parts(
        base_url: Option<String>,
        transport: Arc<dyn Transport>,
        request_interceptors: InterceptorChain<RequestDescriptor>,
        response_interceptors: InterceptorChain<ResponseEnvelope<Value>>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                base_url,
                transport,
                request_interceptors,
                response_interceptors,
            }),
        }
    }

    /// The base URL relative paths are resolved against.
    pub fn base_url(&self) -> Option<&str> {
        self.inner.base_url.as_deref()
    }

    /// Interceptors applied to every outgoing [`RequestDescriptor`].
    pub fn request_interceptors(&self) -> &InterceptorChain<RequestDescriptor> {
        &self.inner.request_interceptors
    }

    /// Interceptors applied to every parsed [`ResponseEnvelope`].
    pub fn response_interceptors(&self) -> &InterceptorChain<ResponseEnvelope<Value>> {
        &self.inner.response_interceptors
    }

    /// Perform a call and return the full envelope.
    ///
    /// # Errors
    ///
    /// - any error returned by a request or response interceptor, unchanged
    /// - [`ClientError::InvalidUrl`] if the URL cannot be resolved
    /// - [`ClientError::Transport`] if the exchange fails
    /// - [`ClientError::Decode`] if the body is not JSON or not a `T`
    /// - [`ClientError::Api`] if the final status is not 2xx
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        descriptor: RequestDescriptor,
    ) -> Result<ResponseEnvelope<T>, ClientError> {
        #[cfg(feature = "tracing")]
        let envelope = {
            use tracing::Instrument;

            let span = tracing::debug_span!(
                "http.request",
                http.method = %descriptor.method,
                http.path = %path,
                url.full = tracing::field::Empty,
                http.status = tracing::field::Empty,
            );
            self.dispatch(path, descriptor).instrument(span).await?
        };
        #[cfg(not(feature = "tracing"))]
        let envelope = self.dispatch(path, descriptor).await?;

        if !envelope.ok() {
            return Err(ApiError::new(envelope.status, envelope.data).into());
        }
        envelope.decode()
    }

    async fn dispatch(
        &self,
        path: &str,
        descriptor: RequestDescriptor,
    ) -> Result<ResponseEnvelope<Value>, ClientError> {
        let descriptor = self.inner.request_interceptors.run(descriptor).await?;
        let url = descriptor.resolve_url(path, self.base_url())?;

        #[cfg(feature = "tracing")]
        tracing::Span::current().record("url.full", tracing::field::display(&url));

        let request = build_http_request(&descriptor, &url)?;
        let response = self.inner.transport.send(request).await?;
        let (parts, body) = response.into_parts();

        #[cfg(feature = "tracing")]
        {
            tracing::Span::current().record("http.status", parts.status.as_u16());
            tracing::debug!(bytes = body.len(), "response received");
        }

        let envelope = ResponseEnvelope {
            data: parse_body(parts.status, &body)?,
            status: parts.status,
            headers: parts.headers,
            url,
            request: descriptor,
        };
        self.inner.response_interceptors.run(envelope).await
    }

    /// `GET path`, returning only the data.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.get_with(path, RequestDescriptor::default()).await
    }

    /// `GET path` with caller headers, params or base-URL override.
    pub async fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        descriptor: RequestDescriptor,
    ) -> Result<T, ClientError> {
        self.send_data(path, descriptor.method(Method::GET)).await
    }

    /// `POST path` with `body` serialized as JSON.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post_with(path, body, RequestDescriptor::default()).await
    }

    /// `POST path` with a JSON body and caller options.
    ///
    /// `Content-Type: application/json` is set unless the caller already set
    /// a content type.
    pub async fn post_with<B, T>(
        &self,
        path: &str,
        body: &B,
        descriptor: RequestDescriptor,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let descriptor = with_json_body(descriptor.method(Method::POST), body)?;
        self.send_data(path, descriptor).await
    }

    /// `PUT path` with `body` serialized as JSON.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.put_with(path, body, RequestDescriptor::default()).await
    }

    /// `PUT path` with a JSON body and caller options.
    pub async fn put_with<B, T>(
        &self,
        path: &str,
        body: &B,
        descriptor: RequestDescriptor,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let descriptor = with_json_body(descriptor.method(Method::PUT), body)?;
        self.send_data(path, descriptor).await
    }

    /// `DELETE path`, returning only the data.
    ///
    /// An empty response body decodes as `null`, so `T = ()` or
    /// `Option<_>` fits endpoints that answer `204 No Content`.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.delete_with(path, RequestDescriptor::default()).await
    }

    /// `DELETE path` with caller options.
    pub async fn delete_with<T: DeserializeOwned>(
        &self,
        path: &str,
        descriptor: RequestDescriptor,
    ) -> Result<T, ClientError> {
        self.send_data(path, descriptor.method(Method::DELETE)).await
    }

    async fn send_data<T: DeserializeOwned>(
        &self,
        path: &str,
        descriptor: RequestDescriptor,
    ) -> Result<T, ClientError> {
        self.request(path, descriptor)
            .await
            .map(ResponseEnvelope::into_data)
    }
}

fn with_json_body<B>(mut descriptor: RequestDescriptor, body: &B) -> Result<RequestDescriptor, ClientError>
where
    B: Serialize + ?Sized,
{
    let bytes = serde_json::to_vec(body).map_err(|e| ClientError::Encode(e.to_string()))?;
    if !descriptor.headers.contains_key(CONTENT_TYPE) {
        descriptor
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    }
    descriptor.body = Some(Bytes::from(bytes));
    Ok(descriptor)
}

fn build_http_request(
    descriptor: &RequestDescriptor,
    url: &Url,
) -> Result<http::Request<Bytes>, ClientError> {
    let mut request = http::Request::builder()
        .method(descriptor.method.clone())
        .uri(url.as_str())
        .body(descriptor.body.clone().unwrap_or_default())
        .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", url, e)))?;
    *request.headers_mut() = descriptor.headers.clone();
    Ok(request)
}

fn parse_body(status: StatusCode, body: &[u8]) -> Result<Value, ClientError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| ClientError::Decode {
        status,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubTransport;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn client(stub: &Arc<StubTransport>) -> HttpClient {
        HttpClient::builder()
            .base_url("https://api.test")
            .transport_arc(stub.clone())
            .build()
            .unwrap()
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Campaign {
        id: u64,
        name: String,
    }

    #[tokio::test]
    async fn test_url_is_base_plus_path_plus_params() {
        let stub = StubTransport::json(200, "[]");
        let client = client(&stub);

        let descriptor = RequestDescriptor::default().param("a", "1").param("b", "2");
        let envelope = client.request::<Value>("/users", descriptor).await.unwrap();

        assert_eq!(envelope.url.as_str(), "https://api.test/users?a=1&b=2");
        let sent = stub.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::GET);
        assert_eq!(sent[0].uri, "https://api.test/users?a=1&b=2");
    }

    #[tokio::test]
    async fn test_post_sets_json_body_and_content_type() {
        let stub = StubTransport::json(201, r#"{"id": 7, "name": "Spring launch"}"#);
        let client = client(&stub);

        let created: Campaign = client
            .post("/campaigns", &json!({"name": "Spring launch"}))
            .await
            .unwrap();

        assert_eq!(created, Campaign { id: 7, name: "Spring launch".into() });
        let sent = stub.requests();
        assert_eq!(sent[0].method, Method::POST);
        assert_eq!(sent[0].headers[CONTENT_TYPE], APPLICATION_JSON);
        let body: Value = serde_json::from_slice(&sent[0].body).unwrap();
        assert_eq!(body, json!({"name": "Spring launch"}));
    }

    #[tokio::test]
    async fn test_post_keeps_caller_content_type() {
        let stub = StubTransport::json(201, r#"{"id": 8, "name": "Webinar"}"#);
        let client = client(&stub);

        let descriptor = RequestDescriptor::default()
            .header(CONTENT_TYPE, "application/vnd.dashboard+json")
            .header("x-tenant", "agency-42");
        let created: Campaign = client
            .post_with("/campaigns", &json!({"name": "Webinar"}), descriptor)
            .await
            .unwrap();

        assert_eq!(created.id, 8);
        let sent = stub.requests();
        assert_eq!(sent[0].method, Method::POST);
        assert_eq!(sent[0].headers.get_all(CONTENT_TYPE).iter().count(), 1);
        assert_eq!(sent[0].headers[CONTENT_TYPE], "application/vnd.dashboard+json");
        assert_eq!(sent[0].headers["x-tenant"], "agency-42");
        let body: Value = serde_json::from_slice(&sent[0].body).unwrap();
        assert_eq!(body, json!({"name": "Webinar"}));
    }

    #[tokio::test]
    async fn test_put_keeps_caller_content_type() {
        let stub = StubTransport::json(200, "{}");
        let client = client(&stub);

        let descriptor = RequestDescriptor::default()
            .header(CONTENT_TYPE, "application/merge-patch+json")
            .header("x-request-id", "r-1");
        let _: Value = client
            .put_with("/campaigns/7", &json!({"status": "paused"}), descriptor)
            .await
            .unwrap();

        let sent = stub.requests();
        assert_eq!(sent[0].method, Method::PUT);
        assert_eq!(sent[0].headers.get_all(CONTENT_TYPE).iter().count(), 1);
        assert_eq!(sent[0].headers[CONTENT_TYPE], "application/merge-patch+json");
        assert_eq!(sent[0].headers["x-request-id"], "r-1");
    }

    #[tokio::test]
    async fn test_failure_carries_parsed_body() {
        let stub = StubTransport::json(400, r#"{"message": "bad"}"#);
        let client = client(&stub);

        let err = client.get::<Value>("/campaigns").await.unwrap_err();

        let api = err.as_api().expect("api error");
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.body, json!({"message": "bad"}));
        assert_eq!(err.message(), Some("bad"));
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_independent() {
        let stub = StubTransport::new(|request| {
            let query = request.uri().query().unwrap_or_default().to_string();
            Ok(StubTransport::response(200, json!({ "query": query }).to_string()))
        });
        let client = client(&stub);
        client
            .request_interceptors()
            .add_fn(|descriptor: RequestDescriptor| async move {
                if descriptor.params.get("id") == Some("slow") {
                    tokio::time::sleep(Duration::from_millis(30)).await;
                }
                Ok::<_, ClientError>(descriptor)
            });

        let slow = client.get_with::<Value>("/reports", RequestDescriptor::default().param("id", "slow"));
        let fast = client.get_with::<Value>("/reports", RequestDescriptor::default().param("id", "fast"));
        let (slow, fast) = tokio::join!(slow, fast);

        assert_eq!(slow.unwrap(), json!({"query": "id=slow"}));
        assert_eq!(fast.unwrap(), json!({"query": "id=fast"}));
        assert_eq!(stub.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_non_json_body_fails_before_response_interceptors() {
        let stub = StubTransport::new(|_| Ok(StubTransport::response(502, "<html>Bad Gateway</html>")));
        let client = client(&stub);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        client.response_interceptors().add_fn(move |envelope| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, ClientError>(envelope) }
        });

        let err = client.get::<Value>("/campaigns").await.unwrap_err();

        assert!(matches!(err, ClientError::Decode { status, .. } if status == StatusCode::BAD_GATEWAY));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_body_is_null() {
        let stub = StubTransport::new(|_| Ok(StubTransport::response(204, "")));
        let client = client(&stub);

        let envelope = client
            .request::<Value>("/campaigns/7", RequestDescriptor::new(Method::DELETE))
            .await
            .unwrap();
        assert_eq!(envelope.status, StatusCode::NO_CONTENT);
        assert_eq!(envelope.data, Value::Null);

        client.delete::<()>("/campaigns/7").await.unwrap();
    }

    #[tokio::test]
    async fn test_base_url_override_and_absolute_path() {
        let stub = StubTransport::json(200, "{}");
        let client = client(&stub);

        let _: Value = client
            .get_with("deposits", RequestDescriptor::default().base_url("https://billing.test/v2/"))
            .await
            .unwrap();
        let _: Value = client.get("https://cdn.test/banner.json?v=3").await.unwrap();

        let sent = stub.requests();
        assert_eq!(sent[0].uri, "https://billing.test/v2/deposits");
        assert_eq!(sent[1].uri, "https://cdn.test/banner.json?v=3");
    }

    #[tokio::test]
    async fn test_colon_in_first_segment_uses_base_url() {
        let stub = StubTransport::json(200, "{}");
        let client = client(&stub);

        let _: Value = client.get("campaigns:export").await.unwrap();

        assert_eq!(stub.requests()[0].uri, "https://api.test/campaigns:export");
    }

    #[tokio::test]
    async fn test_relative_path_without_base_url() {
        let stub = StubTransport::json(200, "{}");
        let client = HttpClient::builder().transport_arc(stub.clone()).build().unwrap();

        let err = client.get::<Value>("/campaigns").await.unwrap_err();

        assert!(matches!(err, ClientError::InvalidUrl(_)));
        assert!(stub.requests().is_empty());
    }

    #[tokio::test]
    async fn test_request_interceptor_error_skips_transport() {
        let stub = StubTransport::json(200, "{}");
        let client = client(&stub);
        client.request_interceptors().add_fn(|_: RequestDescriptor| async move {
            Err::<RequestDescriptor, _>(ClientError::interceptor("session expired"))
        });

        let err = client.get::<Value>("/me").await.unwrap_err();

        assert!(matches!(err, ClientError::Interceptor(ref m) if m == "session expired"));
        assert!(stub.requests().is_empty());
    }

    #[tokio::test]
    async fn test_request_interceptors_see_and_modify_descriptor() {
        let stub = StubTransport::json(200, "{}");
        let client = client(&stub);
        let handle = client.request_interceptors().add_fn(|descriptor: RequestDescriptor| async move {
            Ok::<_, ClientError>(descriptor.header("x-tenant", "agency-42").param("locale", "en"))
        });

        let _: Value = client.get("/campaigns").await.unwrap();
        assert!(client.request_interceptors().eject(handle));
        let _: Value = client.get("/campaigns").await.unwrap();

        let sent = stub.requests();
        assert_eq!(sent[0].headers["x-tenant"], "agency-42");
        assert_eq!(sent[0].uri, "https://api.test/campaigns?locale=en");
        assert!(sent[1].headers.get("x-tenant").is_none());
        assert_eq!(sent[1].uri, "https://api.test/campaigns");
    }

    #[tokio::test]
    async fn test_response_interceptor_unwraps_data() {
        let stub = StubTransport::json(200, r#"{"data": {"id": 1, "name": "Launch"}, "meta": {}}"#);
        let client = client(&stub);
        client
            .response_interceptors()
            .add_fn(|envelope: ResponseEnvelope<Value>| async move {
                Ok::<_, ClientError>(envelope.map(|mut body| body["data"].take()))
            });

        let campaign: Campaign = client.get("/campaigns/1").await.unwrap();
        assert_eq!(campaign, Campaign { id: 1, name: "Launch".into() });
    }

    #[tokio::test]
    async fn test_response_interceptor_can_recover_failure() {
        let stub = StubTransport::json(404, r#"{"message": "no deposits"}"#);
        let client = client(&stub);
        client
            .response_interceptors()
            .add_fn(|mut envelope: ResponseEnvelope<Value>| async move {
                if envelope.status == StatusCode::NOT_FOUND {
                    envelope.status = StatusCode::OK;
                    envelope.data = json!([]);
                }
                Ok::<_, ClientError>(envelope)
            });

        let deposits: Vec<Value> = client.get("/deposits").await.unwrap();
        assert!(deposits.is_empty());
    }

    #[tokio::test]
    async fn test_envelope_keeps_resolved_request() {
        let stub = StubTransport::json(200, "{}");
        let client = client(&stub);
        client.request_interceptors().add_fn(|d: RequestDescriptor| async move {
            Ok::<_, ClientError>(d.header("x-trace", "t-1"))
        });

        let envelope = client
            .request::<Value>("/me", RequestDescriptor::default())
            .await
            .unwrap();
        assert_eq!(envelope.request.headers["x-trace"], "t-1");
        assert_eq!(envelope.header("content-type"), Some(APPLICATION_JSON));
    }

    #[tokio::test]
    async fn test_type_mismatch_is_decode_error() {
        let stub = StubTransport::json(200, r#"{"id": "not-a-number"}"#);
        let client = client(&stub);

        let err = client.get::<Campaign>("/campaigns/1").await.unwrap_err();
        assert!(matches!(err, ClientError::Decode { status, .. } if status == StatusCode::OK));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let stub = StubTransport::new(|_| Err(ClientError::Transport("connection refused".into())));
        let client = client(&stub);

        let err = client.get::<Value>("/campaigns").await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(ref m) if m == "connection refused"));
    }

    #[test]
    fn test_clones_share_interceptors() {
        let stub = StubTransport::json(200, "{}");
        let client = client(&stub);
        let other = client.clone();
        other
            .request_interceptors()
            .add_fn(|d: RequestDescriptor| async move { Ok::<_, ClientError>(d) });
        assert_eq!(client.request_interceptors().len(), 1);
        assert_eq!(client.base_url(), Some("https://api.test"));
    }
}
