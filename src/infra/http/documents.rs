use axum::{
    body::Body,
    extract::{Query, State, rejection::QueryRejection},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, ETAG, IF_NONE_MATCH},
    },
    response::{IntoResponse, Response},
};

use crate::application::documents::{DocumentQuery, DocumentReply};
use crate::application::envelope::ProxyResponse;

use super::{AppState, bad_request};

const SOURCE: &str = "infra::http::documents";

pub(super) async fn file_proxy(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<DocumentQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return bad_request(SOURCE, rejection.body_text()),
    };

    match state.documents.fetch(&query).await {
        Ok(reply) => build_document_response(&headers, reply),
        Err(envelope) => ProxyResponse::uncached(envelope).into_response(),
    }
}

fn build_document_response(request_headers: &HeaderMap, reply: DocumentReply) -> Response {
    let not_modified = request_headers
        .get(IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| etag_matches(value, &reply.etag));

    let mut response = if not_modified {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NOT_MODIFIED;
        response
    } else {
        let length = reply.bytes.len();
        let mut response = Response::new(Body::from(reply.bytes));
        if let Ok(value) = HeaderValue::from_str(&reply.content_type) {
            response.headers_mut().insert(CONTENT_TYPE, value);
        }
        response
            .headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from(length));
        response
    };

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&reply.etag) {
        headers.insert(ETAG, value);
    }
    if let Ok(value) = HeaderValue::from_str(&format!(
        "public, max-age={}",
        reply.max_age.as_secs()
    )) {
        headers.insert(CACHE_CONTROL, value);
    }
    response
}

/// `If-None-Match` is a comma-separated list of entity tags, or `*`.
fn etag_matches(header: &str, etag: &str) -> bool {
    header.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.trim_start_matches("W/") == etag
    })
}
