//! In-memory [`Transport`] for unit tests.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};

use crate::ClientError;
use crate::interceptor::BoxFuture;
use crate::transport::Transport;

type Responder =
    Box<dyn Fn(&http::Request<Bytes>) -> Result<http::Response<Bytes>, ClientError> + Send + Sync>;

/// A request as the transport saw it.
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Records every request and answers through a closure.
pub(crate) struct StubTransport {
    requests: Mutex<Vec<RecordedRequest>>,
    responder: Responder,
}

impl StubTransport {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&http::Request<Bytes>) -> Result<http::Response<Bytes>, ClientError>
            + Send
            + Sync
            + 'static,
    {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        })
    }

    /// Always answer `status` with a JSON body.
    pub fn json(status: u16, body: &'static str) -> Arc<Self> {
        Self::new(move |_| Ok(Self::response(status, body)))
    }

    pub fn response(status: u16, body: impl Into<Bytes>) -> http::Response<Bytes> {
        let mut response = http::Response::new(body.into());
        *response.status_mut() = StatusCode::from_u16(status).unwrap();
        response.headers_mut().insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        response
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for StubTransport {
    fn send(
        &self,
        request: http::Request<Bytes>,
    ) -> BoxFuture<'_, Result<http::Response<Bytes>, ClientError>> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: request.method().clone(),
            uri: request.uri().to_string(),
            headers: request.headers().clone(),
            body: request.body().clone(),
        });
        Box::pin(std::future::ready((self.responder)(&request)))
    }
}
