//! reqwest-backed [`Upstream`] transport.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::header::CONTENT_TYPE;
use reqwest::Client;

use crate::application::upstream::{Upstream, UpstreamError, UpstreamRequest, UpstreamResponse};

use super::error::InfraError;

/// Shared HTTP client for every upstream target. The timeout covers the whole
/// exchange, body included.
#[derive(Clone, Debug)]
pub struct HttpUpstream {
    client: Client,
}

impl HttpUpstream {
    pub fn new(timeout: Duration) -> Result<Self, InfraError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(Self::user_agent())
            .build()
            .map_err(|err| InfraError::http_client(err.without_url().to_string()))?;
        Ok(Self { client })
    }

    pub fn user_agent() -> &'static str {
        concat!("storegate/", env!("CARGO_PKG_VERSION"))
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let mut builder = self.client.request(request.method, request.url);
        if let Some(token) = request.bearer.as_deref() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = request.body.as_ref() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|err| {
            if err.is_timeout() {
                UpstreamError::Timeout
            } else {
                UpstreamError::Body {
                    source: Box::new(err.without_url()),
                }
            }
        })?;

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Map a send failure onto the transport taxonomy. The URL is stripped
/// because WooCommerce URLs carry the consumer secret.
fn classify(err: reqwest::Error) -> UpstreamError {
    let err = err.without_url();
    if err.is_timeout() {
        UpstreamError::Timeout
    } else if err.is_connect() {
        UpstreamError::Connect {
            source: Box::new(err),
        }
    } else {
        UpstreamError::Request {
            source: Box::new(err),
        }
    }
}
