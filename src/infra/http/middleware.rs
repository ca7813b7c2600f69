use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;
use crate::cache::X_CACHE;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// Tag every request with a fresh id, echoed back in `x-request-id`.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response.extensions_mut().insert(ctx);
    response
}

/// Log every response; failures carry the [`ErrorReport`] the handler attached.
///
/// The report is removed from the response so diagnostics stay server-side.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis();
    let cache = response
        .headers()
        .get(X_CACHE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !(status.is_client_error() || status.is_server_error()) {
        debug!(
            target: "storegate::http::response",
            status = status.as_u16(),
            method = %method,
            path = %path,
            elapsed_ms = elapsed_ms,
            cache = %cache,
            request_id = %request_id,
            "request served",
        );
        return response;
    }

    let report = response.extensions_mut().remove::<ErrorReport>();
    let (source, messages) = match report {
        Some(report) => (report.source, report.messages),
        None => ("unknown", Vec::new()),
    };
    let detail = messages
        .first()
        .cloned()
        .unwrap_or_else(|| "no diagnostic available".to_string());

    if status.is_server_error() {
        error!(
            target: "storegate::http::response",
            status = status.as_u16(),
            method = %method,
            path = %path,
            elapsed_ms = elapsed_ms,
            cache = %cache,
            source = source,
            detail = %detail,
            chain = ?messages,
            request_id = %request_id,
            "request failed",
        );
    } else {
        warn!(
            target: "storegate::http::response",
            status = status.as_u16(),
            method = %method,
            path = %path,
            elapsed_ms = elapsed_ms,
            cache = %cache,
            source = source,
            detail = %detail,
            chain = ?messages,
            request_id = %request_id,
            "client request error",
        );
    }

    response
}
