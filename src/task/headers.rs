//! Header normalization.
//!
//! # Responsibilities
//! - Flatten multi-valued headers into an ordered list of (NAME, value) pairs
//! - Uppercase header names
//! - Emit one pair per value, in received order
//!
//! # Design Decisions
//! - Pure functions, no state
//! - A value that is not visible text is recorded as an empty string

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

/// Ordered (NAME, value) pairs. Serializes as `[["NAME", "value"], ...]`.
pub type HeaderList = Vec<(String, String)>;

/// Value side of a header collection: one value, or a repeated header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValues {
    Single(String),
    Multiple(Vec<String>),
}

impl From<&str> for HeaderValues {
    fn from(value: &str) -> Self {
        HeaderValues::Single(value.to_string())
    }
}

impl From<String> for HeaderValues {
    fn from(value: String) -> Self {
        HeaderValues::Single(value)
    }
}

impl From<Vec<String>> for HeaderValues {
    fn from(values: Vec<String>) -> Self {
        HeaderValues::Multiple(values)
    }
}

impl From<Vec<&str>> for HeaderValues {
    fn from(values: Vec<&str>) -> Self {
        HeaderValues::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

/// Convert a name → value(s) collection into a flat header list.
pub fn normalize_headers<I, K>(headers: I) -> HeaderList
where
    I: IntoIterator<Item = (K, HeaderValues)>,
    K: AsRef<str>,
{
    let mut normalized = Vec::new();
    for (name, values) in headers {
        let name = name.as_ref().to_uppercase();
        match values {
            HeaderValues::Single(value) => normalized.push((name, value)),
            HeaderValues::Multiple(values) => {
                for value in values {
                    normalized.push((name.clone(), value));
                }
            }
        }
    }
    normalized
}

/// Convert an `http` header map into a flat header list.
///
/// Names appear in first-insertion order; repeated values keep their order.
pub fn normalize_header_map(headers: &HeaderMap) -> HeaderList {
    let mut normalized = Vec::with_capacity(headers.len());
    for name in headers.keys() {
        let upper = name.as_str().to_uppercase();
        for value in headers.get_all(name) {
            let value = value.to_str().unwrap_or_default().to_string();
            normalized.push((upper.clone(), value));
        }
    }
    normalized
}
