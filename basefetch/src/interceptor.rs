//! Interceptor chains.
//!
//! An [`InterceptorChain`] is an ordered list of async transforms applied to
//! a value before it moves on: the [`RequestDescriptor`](crate::RequestDescriptor)
//! before the transport call, or the [`ResponseEnvelope`](crate::ResponseEnvelope)
//! after it. Cross-cutting concerns such as auth-header injection, error
//! normalization or logging are written once as interceptors instead of at
//! every call site.
//!
//! # Ordering
//!
//! Handlers run in registration order. Handler *n + 1* is not polled until
//! the future returned by handler *n* has resolved, and the first `Err`
//! aborts the chain and propagates unchanged.
//!
//! # Handles
//!
//! [`InterceptorChain::add`] returns an [`InterceptorHandle`]. Ejecting a
//! handle turns its slot into a passthrough without removing it, so every
//! other handle stays valid and no index is ever reused.
//!
//! # Example
//!
//! ```ignore
//! use basefetch::{ClientError, HttpClient, RequestDescriptor};
//!
//! let client = HttpClient::with_base_url("https://api.example.com")?;
//!
//! let handle = client.request_interceptors().add_fn(|mut req: RequestDescriptor| async move {
//!     req.headers.insert("x-client", "dashboard".parse().unwrap());
//!     Ok::<_, ClientError>(req)
//! });
//!
//! // Later
//! client.request_interceptors().eject(handle);
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};

use crate::ClientError;

/// Type alias for a boxed future returning a result.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An async transform over a request descriptor or a response envelope.
///
/// Implement this for stateful interceptors; wrap closures with
/// [`InterceptorFn`] or register them directly with
/// [`InterceptorChain::add_fn`].
pub trait Interceptor<T>: Send + Sync {
    /// Transform `value`, or return an error to abort the call.
    fn intercept(&self, value: T) -> BoxFuture<'_, Result<T, ClientError>>;
}

/// A stable identifier for a registered interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterceptorHandle(usize);

impl InterceptorHandle {
    /// The slot index this handle refers to.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A closure-based interceptor.
///
/// # Example
///
/// ```ignore
/// use basefetch::{ClientError, InterceptorFn, RequestDescriptor};
///
/// let stamp = InterceptorFn::new(|req: RequestDescriptor| async move {
///     Ok::<_, ClientError>(req.param("source", "dashboard"))
/// });
/// ```
pub struct InterceptorFn<F> {
    func: F,
}

impl<F> InterceptorFn<F> {
    /// Wrap a closure returning a future.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Clone for InterceptorFn<F>
where
    F: Clone,
{
    fn clone(&self) -> Self {
        Self {
            func: self.func.clone(),
        }
    }
}

impl<F> std::fmt::Debug for InterceptorFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorFn").finish()
    }
}

impl<T, F, Fut> Interceptor<T> for InterceptorFn<F>
where
    T: Send,
    F: Fn(T) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
{
    fn intercept(&self, value: T) -> BoxFuture<'_, Result<T, ClientError>> {
        Box::pin((self.func)(value))
    }
}

type Slot<T> = Option<Arc<dyn Interceptor<T>>>;

/// An ordered chain of interceptors with stable handles.
///
/// Registration and ejection take `&self`, so a chain can be modified
/// through a shared client. Each [`run`](Self::run) works on a snapshot of
/// the handlers taken when it starts; concurrent runs never share the value
/// being transformed.
pub struct InterceptorChain<T> {
    slots: RwLock<Vec<Slot<T>>>,
}

impl<T> std::fmt::Debug for InterceptorChain<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("InterceptorChain")
            .field("slots", &slots.len())
            .field("active", &slots.iter().filter(|s| s.is_some()).count())
            .finish()
    }
}

impl<T> Default for InterceptorChain<T> {
    fn default() -> Self {
        Self {
            slots: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Send + 'static> InterceptorChain<T> {
    /// Create a new empty interceptor chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor and return its handle.
    pub fn add<I>(&self, interceptor: I) -> InterceptorHandle
    where
        I: Interceptor<T> + 'static,
    {
        self.add_arc(Arc::new(interceptor))
    }

    /// Append a shared interceptor and return its handle.
    pub fn add_arc(&self, interceptor: Arc<dyn Interceptor<T>>) -> InterceptorHandle {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.push(Some(interceptor));
        InterceptorHandle(slots.len() - 1)
    }

    /// Append an async closure and return its handle.
    pub fn add_fn<F, Fut>(&self, func: F) -> InterceptorHandle
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        self.add(InterceptorFn::new(func))
    }

    /// Turn the interceptor at `handle` into a passthrough.
    ///
    /// Returns `false` if the handle is unknown or was already ejected.
    pub fn eject(&self, handle: InterceptorHandle) -> bool {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        match slots.get_mut(handle.0) {
            Some(slot) => slot.take().is_some(),
            None => false,
        }
    }

    /// Number of slots, ejected ones included.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no interceptor was ever registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of interceptors that have not been ejected.
    pub fn active(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }

    fn snapshot(&self) -> Vec<Arc<dyn Interceptor<T>>> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    /// Run every active interceptor over `value`, in registration order.
    pub async fn run(&self, value: T) -> Result<T, ClientError> {
        let mut value = value;
        for interceptor in self.snapshot() {
            value = interceptor.intercept(value).await?;
        }
        Ok(value)
    }
}
