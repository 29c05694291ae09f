//! Request and response descriptors.
//!
//! # Responsibilities
//! - Capture what the tracker needs from an inbound request (method, target, headers, peer)
//! - Resolve absolute-form (`https://host/path?q`) and origin-form (`/path?q`) targets
//! - Capture status and headers from the outgoing response
//!
//! # Design Decisions
//! - Descriptors own their data so the tracker never borrows framework types
//! - Host falls back to the `Host` header for origin-form targets

use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Method, Request, Response, StatusCode, Uri};

use crate::task::QueryParams;
use crate::tracker::error::TrackerError;

/// What the tracker reads from an inbound request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Raw request target as received.
    pub target: String,
    pub headers: HeaderMap,
    pub client_addr: Option<IpAddr>,
}

/// A request target broken into its tracked parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedTarget {
    pub protocol: Option<String>,
    pub host: Option<String>,
    pub path: String,
    pub params: QueryParams,
}

impl RequestDescriptor {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            headers: HeaderMap::new(),
            client_addr: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_client_addr(mut self, addr: IpAddr) -> Self {
        self.client_addr = Some(addr);
        self
    }

    /// Describe an axum/hyper request. The peer address is taken from
    /// `ConnectInfo<SocketAddr>` when the server was started with connect info.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let client_addr = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Self {
            method: request.method().clone(),
            target: request.uri().to_string(),
            headers: request.headers().clone(),
            client_addr,
        }
    }

    pub(crate) fn resolve(&self) -> Result<ResolvedTarget, TrackerError> {
        if self.target.is_empty() {
            return Err(TrackerError::UnparseableRequest {
                uri: self.target.clone(),
                reason: "empty request target".into(),
            });
        }

        let uri: Uri = self
            .target
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| TrackerError::UnparseableRequest {
                uri: self.target.clone(),
                reason: e.to_string(),
            })?;

        // Authority-form (`CONNECT host:port`) carries no path to track.
        if uri.path().is_empty() {
            return Err(TrackerError::UnparseableRequest {
                uri: self.target.clone(),
                reason: "request target has no path".into(),
            });
        }

        let host = match uri.authority() {
            Some(authority) => Some(match authority.port() {
                Some(port) => format!("{}:{}", authority.host(), port),
                None => authority.host().to_string(),
            }),
            None => self
                .headers
                .get(header::HOST)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string),
        };

        let params = uri
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Ok(ResolvedTarget {
            protocol: uri.scheme_str().map(str::to_string),
            host,
            path: uri.path().to_string(),
            params,
        })
    }
}

/// What the tracker reads from an outgoing response.
#[derive(Debug, Clone)]
pub struct ResponseDescriptor {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl ResponseDescriptor {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn from_response<B>(response: &Response<B>) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
        }
    }

    /// Reason phrase for the status, e.g. `OK`.
    pub fn status_message(&self) -> Option<String> {
        self.status.canonical_reason().map(str::to_string)
    }
}
