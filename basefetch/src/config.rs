//! Client-level configuration helpers.
//!
//! - [`HeaderInterceptor`]: inject a fixed header on every request
//! - [`RetryPolicy`]: retry a call with exponential backoff

mod interceptor;
mod retry;

pub use interceptor::HeaderInterceptor;
#[cfg(feature = "tracing")]
pub use interceptor::{TraceRequests, TraceResponses};
pub use retry::{ExponentialBackoff, RetryPolicy, defaults, retry, retry_with_policy};
