//! Upstream call wrapper.
//!
//! Builds WooCommerce and identity URLs, injects credentials, and turns raw
//! upstream responses into parsed JSON or a [`ProxyError`]. No retries.

use std::{fmt, sync::Arc, time::Instant};

use axum::http::Method;
use metrics::histogram;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::UpstreamSettings;

use super::error::ProxyError;
use super::upstream::{Upstream, UpstreamRequest, UpstreamResponse, UpstreamTarget};

pub(crate) const METRIC_UPSTREAM_REQUEST_MS: &str = "storegate_upstream_request_ms";

const IDENTITY_PREFIX: &str = "wp-json/jwt-auth/v1";

/// WooCommerce REST API key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct UpstreamCredentials {
    consumer_key: String,
    consumer_secret: String,
}

impl UpstreamCredentials {
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }
}

impl fmt::Debug for UpstreamCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamEndpoints {
    pub store_url: Url,
    /// REST namespace under `wp-json/`, e.g. `wc/v3`.
    pub api_prefix: String,
    pub jwt_base_url: Url,
    pub credentials: Option<UpstreamCredentials>,
}

impl From<&UpstreamSettings> for UpstreamEndpoints {
    fn from(settings: &UpstreamSettings) -> Self {
        let credentials = match (&settings.consumer_key, &settings.consumer_secret) {
            (Some(key), Some(secret)) => Some(UpstreamCredentials::new(key, secret)),
            _ => None,
        };
        Self {
            store_url: settings.store_url.clone(),
            api_prefix: settings.api_prefix.clone(),
            jwt_base_url: settings.jwt_base_url.clone(),
            credentials,
        }
    }
}

pub struct StoreGateway {
    upstream: Arc<dyn Upstream>,
    endpoints: UpstreamEndpoints,
}

impl StoreGateway {
    pub fn new(upstream: Arc<dyn Upstream>, endpoints: UpstreamEndpoints) -> Self {
        Self {
            upstream,
            endpoints,
        }
    }

    pub fn ensure_credentials(&self) -> Result<&UpstreamCredentials, ProxyError> {
        self.endpoints
            .credentials
            .as_ref()
            .ok_or(ProxyError::MissingCredentials)
    }

    /// WooCommerce URL with `consumer_key`/`consumer_secret` appended.
    ///
    /// Fails with [`ProxyError::MissingCredentials`] before any network call
    /// when either credential is absent.
    pub fn store_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ProxyError> {
        let credentials = self.ensure_credentials()?;

        let prefix = self.endpoints.api_prefix.trim_matches('/');
        let mut url = join_path(
            &self.endpoints.store_url,
            &format!("wp-json/{prefix}/{}", path.trim_start_matches('/')),
        )?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
            pairs.append_pair("consumer_key", &credentials.consumer_key);
            pairs.append_pair("consumer_secret", &credentials.consumer_secret);
        }
        Ok(url)
    }

    pub fn identity_url(&self, path: &str) -> Result<Url, ProxyError> {
        Ok(join_path(
            &self.endpoints.jwt_base_url,
            &format!("{IDENTITY_PREFIX}/{}", path.trim_start_matches('/')),
        )?)
    }

    /// Send one request and time it. Only transport failures are errors.
    #[instrument(
        skip_all,
        fields(target = request.target.as_str(), method = %request.method, path = request.url.path())
    )]
    pub async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, ProxyError> {
        let target = request.target;
        let started_at = Instant::now();
        let result = self.upstream.send(request).await;
        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;

        let outcome = match &result {
            Ok(response) if response.status.is_success() => "success",
            Ok(_) => "http_error",
            Err(_) => "transport_error",
        };
        histogram!(
            METRIC_UPSTREAM_REQUEST_MS,
            "target" => target.as_str(),
            "outcome" => outcome
        )
        .record(elapsed_ms);

        match &result {
            Ok(response) => {
                debug!(status = response.status.as_u16(), elapsed_ms, "upstream responded")
            }
            Err(err) => warn!(error = %err, elapsed_ms, "upstream request failed"),
        }

        result.map_err(ProxyError::from)
    }

    /// Send a request and parse a 2xx body as JSON.
    ///
    /// Non-2xx answers become [`ProxyError::UpstreamStatus`] carrying the raw body text.
    pub async fn call_json(&self, request: UpstreamRequest) -> Result<Value, ProxyError> {
        let response = self.send(request).await?;
        if !response.status.is_success() {
            return Err(ProxyError::UpstreamStatus {
                status: response.status,
                body: response.body_text(),
            });
        }
        serde_json::from_slice(&response.body).map_err(|err| ProxyError::decode(err.to_string()))
    }

    pub async fn store_get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ProxyError> {
        let url = self.store_url(path, query)?;
        self.call_json(UpstreamRequest::get(UpstreamTarget::Store, url))
            .await
    }

    pub async fn store_send(
        &self,
        method: Method,
        path: &str,
        body: Value,
    ) -> Result<Value, ProxyError> {
        let url = self.store_url(path, &[])?;
        self.call_json(UpstreamRequest::new(UpstreamTarget::Store, method, url).with_json(body))
            .await
    }
}

/// Join `path` below `base`, treating `base` as a directory even without a trailing slash.
fn join_path(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let directory = format!("{}/", base.path());
        base.set_path(&directory);
    }
    base.join(path)
}
