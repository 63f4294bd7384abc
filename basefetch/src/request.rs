//! Request descriptor and URL resolution.
//!
//! A [`RequestDescriptor`] describes one outbound call: method, headers,
//! body, query parameters and an optional base-URL override. It is built
//! fresh per call and handed by value through the request interceptor chain.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use url::Url;

use crate::ClientError;

/// Query parameters for a request.
///
/// Behaves like a string-to-string map: inserting an existing key replaces
/// its value in place. Iteration yields pairs in insertion order, which is
/// also the order they are appended to the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    /// Create an empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parameter, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.pairs.push((key, value));
                None
            }
        }
    }

    /// Get the value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Remove a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.pairs.iter().position(|(k, _)| k == key)?;
        Some(self.pairs.remove(index).1)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// The outbound request definition.
///
/// # Example
///
/// ```
/// use basefetch::RequestDescriptor;
/// use http::Method;
///
/// let descriptor = RequestDescriptor::new(Method::GET)
///     .param("status", "active")
///     .param("page", "2")
///     .header("x-request-id", "abc-123");
///
/// assert_eq!(descriptor.params.get("page"), Some("2"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestDescriptor {
    /// HTTP method.
    pub method: Method,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body, already serialized.
    pub body: Option<Bytes>,
    /// Query parameters appended to the resolved URL.
    pub params: Params,
    /// Overrides the client's base URL for this call.
    pub base_url: Option<String>,
}

impl RequestDescriptor {
    /// Create a descriptor for the given method.
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    /// Set the method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Add a header.
    ///
    /// # Panics
    ///
    /// Panics if the header name or value is invalid. Use
    /// [`try_header`](Self::try_header) for untrusted input.
    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        K::Error: std::fmt::Debug,
        V: TryInto<HeaderValue>,
        V::Error: std::fmt::Debug,
    {
        let name = name.try_into().expect("invalid header name");
        let value = value.try_into().expect("invalid header value");
        self.headers.insert(name, value);
        self
    }

    /// Try to add a header, failing if the name or value is invalid.
    pub fn try_header(mut self, name: &str, value: &str) -> Result<Self, ClientError> {
        let name: HeaderName = name
            .parse()
            .map_err(|_| ClientError::InvalidHeader(format!("invalid header name: {}", name)))?;
        let value: HeaderValue = value
            .parse()
            .map_err(|_| ClientError::InvalidHeader(format!("invalid header value for {}", name)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Replace all headers.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set a raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Add a query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key, value);
        self
    }

    /// Replace all query parameters.
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Override the client's base URL for this call.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Resolve the final URL for `path`.
    ///
    /// An absolute `http`/`https` `path` is used as-is. Anything else,
    /// including a path whose first segment merely looks like a scheme
    /// (`campaigns:export`), is appended to this descriptor's base-URL
    /// override, or else to `default_base`, with exactly one `/` between them.
    /// Params are appended after any query already present in `path`.
    pub fn resolve_url(&self, path: &str, default_base: Option<&str>) -> Result<Url, ClientError> {
        let mut url = match Url::parse(path) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self
                    .base_url
                    .as_deref()
                    .or(default_base)
                    .filter(|base| !base.is_empty())
                    .ok_or_else(|| {
                        ClientError::InvalidUrl(format!("relative path without base URL: {}", path))
                    })?;
                let joined = join_path(base, path);
                Url::parse(&joined)
                    .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", joined, e)))?
            }
            Err(e) => return Err(ClientError::InvalidUrl(format!("{}: {}", path, e))),
        };

        if !self.params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in self.params.iter() {
                query.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

fn join_path(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}
