//! Read-only cookie helpers.
//!
//! The client keeps no cookie jar. These helpers only parse a cookie string
//! into a name-to-value map.

use std::collections::HashMap;

use http::HeaderMap;
use http::header::COOKIE;

/// Parse a raw cookie string such as `"a=1; b=2"`.
///
/// Pairs are separated by `"; "` and split on their first `=`, so a value
/// containing `=` is kept verbatim. A segment without `=` maps to an empty
/// value; empty segments are skipped. Later duplicates win.
///
/// ```
/// let cookies = basefetch::parse_cookies("a=1; b=2=3");
/// assert_eq!(cookies["a"], "1");
/// assert_eq!(cookies["b"], "2=3");
/// ```
pub fn parse_cookies(raw: &str) -> HashMap<String, String> {
    raw.split("; ")
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((name, value)) => (name.to_string(), value.to_string()),
            None => (segment.to_string(), String::new()),
        })
        .collect()
}

/// Collect the cookies from every `Cookie` header in `headers`.
///
/// Returns an empty map when there is no `Cookie` header or none of them is
/// valid UTF-8.
pub fn get_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(parse_cookies)
        .collect()
}
