//! Outbound HTTP port.
//!
//! Application services talk to WooCommerce, the WordPress identity endpoint
//! and the remote document store through [`Upstream`]. The reqwest adapter
//! lives in `infra::upstream`; tests substitute an in-memory fake.

use std::error::Error as StdError;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Which upstream service a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamTarget {
    Store,
    Identity,
    Documents,
}

impl UpstreamTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamTarget::Store => "store",
            UpstreamTarget::Identity => "identity",
            UpstreamTarget::Documents => "documents",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub target: UpstreamTarget,
    pub method: Method,
    pub url: Url,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

impl UpstreamRequest {
    pub fn new(target: UpstreamTarget, method: Method, url: Url) -> Self {
        Self {
            target,
            method,
            url,
            bearer: None,
            body: None,
        }
    }

    pub fn get(target: UpstreamTarget, url: Url) -> Self {
        Self::new(target, Method::GET, url)
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

type BoxError = Box<dyn StdError + Send + Sync>;

/// Transport-level failure. Display strings are safe to show to clients;
/// the boxed source carries the detail for server-side logs.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request timed out")]
    Timeout,
    #[error("could not connect to upstream")]
    Connect {
        #[source]
        source: BoxError,
    },
    #[error("upstream request failed")]
    Request {
        #[source]
        source: BoxError,
    },
    #[error("upstream response body could not be read")]
    Body {
        #[source]
        source: BoxError,
    },
}

#[async_trait]
pub trait Upstream: Send + Sync {
    /// Perform one request. Non-2xx statuses are returned as responses, not errors.
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError>;
}
