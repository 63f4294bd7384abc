//! Outgoing request body for the hyper client.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};

use crate::ClientError;

/// A buffered request body.
///
/// Every request the client sends is fully buffered: JSON payloads and
/// caller-supplied raw bytes alike.
#[derive(Default)]
pub enum TransportBody {
    /// No body, used for requests without a payload.
    #[default]
    Empty,
    /// A single chunk, yielded once.
    Full(Option<Bytes>),
}

impl TransportBody {
    /// Create an empty body.
    pub fn empty() -> Self {
        TransportBody::Empty
    }

    /// Create a body with the given data. Empty data becomes [`TransportBody::Empty`].
    pub fn full(data: Bytes) -> Self {
        if data.is_empty() {
            TransportBody::Empty
        } else {
            TransportBody::Full(Some(data))
        }
    }
}

impl From<Option<Bytes>> for TransportBody {
    fn from(data: Option<Bytes>) -> Self {
        data.map(TransportBody::full).unwrap_or_default()
    }
}

impl Body for TransportBody {
    type Data = Bytes;
    type Error = ClientError;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            TransportBody::Empty => Poll::Ready(None),
            TransportBody::Full(data) => Poll::Ready(data.take().map(|d| Ok(Frame::data(d)))),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            TransportBody::Empty => true,
            TransportBody::Full(data) => data.is_none(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            TransportBody::Full(Some(data)) => SizeHint::with_exact(data.len() as u64),
            _ => SizeHint::with_exact(0),
        }
    }
}

impl std::fmt::Debug for TransportBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportBody::Empty => write!(f, "TransportBody::Empty"),
            TransportBody::Full(data) => f
                .debug_struct("TransportBody::Full")
                .field("len", &data.as_ref().map(Bytes::len))
                .finish(),
        }
    }
}
