//! Response envelopes.
//!
//! An [`Envelope`] is serialized once when it is built. Cache hits replay the
//! stored bytes, so a cached response is byte-identical to the response that
//! populated the cache.

use std::time::Duration;

use axum::http::{
    HeaderValue, StatusCode,
    header::{CACHE_CONTROL, CONTENT_TYPE},
};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::Serialize;
use storegate_api_types::ErrorEnvelope;

use crate::cache::{CacheStatus, X_CACHE, cache_control, no_store};

use super::error::ErrorReport;

const SERIALIZATION_FAILURE_BODY: &str = r#"{"error":"Failed to encode response"}"#;

#[derive(Debug, Clone)]
pub struct Envelope {
    status: StatusCode,
    body: Bytes,
    report: Option<ErrorReport>,
}

impl Envelope {
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                body: Bytes::from(body),
                report: None,
            },
            Err(err) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: Bytes::from_static(SERIALIZATION_FAILURE_BODY.as_bytes()),
                report: Some(ErrorReport::from_error(
                    "application::envelope",
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &err,
                )),
            },
        }
    }

    pub fn ok<T: Serialize>(value: &T) -> Self {
        Self::json(StatusCode::OK, value)
    }

    pub fn error(status: StatusCode, body: ErrorEnvelope) -> Self {
        Self::json(status, &body)
    }

    pub fn with_report(mut self, report: ErrorReport) -> Self {
        self.report = Some(report);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn report(&self) -> Option<&ErrorReport> {
        self.report.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let mut response = (
            self.status,
            [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            self.body,
        )
            .into_response();
        if let Some(report) = self.report {
            report.attach(&mut response);
        }
        response
    }
}

/// An envelope plus the cache headers it should be served with.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub envelope: Envelope,
    pub cache: Option<CacheStatus>,
    pub ttl: Duration,
}

impl ProxyResponse {
    pub fn new(envelope: Envelope, cache: CacheStatus, ttl: Duration) -> Self {
        Self {
            envelope,
            cache: Some(cache),
            ttl,
        }
    }

    /// A response that never touched the cache, such as a validation failure.
    pub fn uncached(envelope: Envelope) -> Self {
        Self {
            envelope,
            cache: None,
            ttl: Duration::ZERO,
        }
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let cache_header = if self.envelope.is_success() && !self.ttl.is_zero() {
            cache_control(self.ttl)
        } else {
            no_store()
        };

        let mut response = self.envelope.into_response();
        let headers = response.headers_mut();
        headers.insert(CACHE_CONTROL, cache_header);
        if let Some(status) = self.cache {
            headers.insert(X_CACHE, status.header_value());
        }
        response
    }
}
