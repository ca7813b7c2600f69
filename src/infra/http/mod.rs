//! HTTP surface: router, shared state and request middleware.

mod auth;
mod catalog;
mod customers;
mod documents;
mod middleware;
mod state;

pub use middleware::{RequestContext, X_REQUEST_ID};
pub use state::AppState;

use axum::{
    Router,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use storegate_api_types::ErrorEnvelope;

use crate::application::envelope::{Envelope, ProxyResponse};
use crate::application::error::ErrorReport;

use self::middleware::{log_responses, set_request_context};

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/products", get(catalog::products))
        .route("/products/update-stock", post(catalog::update_stock))
        .route("/products/{id}", get(catalog::product))
        .route("/products/{id}/variations", get(catalog::variations))
        .route("/categories", get(catalog::categories))
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/validate", post(auth::validate))
        .route(
            "/customer/{id}",
            get(customers::get_customer).put(customers::update_customer),
        )
        .route("/file-proxy", get(documents::file_proxy));

    Router::new()
        .nest("/api", api)
        .route("/_health", get(health))
        .fallback(not_found)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn not_found() -> Response {
    let envelope = Envelope::error(StatusCode::NOT_FOUND, ErrorEnvelope::new("Not found"));
    ProxyResponse::uncached(envelope).into_response()
}

/// 400 envelope for a request axum could not extract.
fn bad_request(source: &'static str, detail: String) -> Response {
    let report = ErrorReport::from_message(source, StatusCode::BAD_REQUEST, detail.clone());
    let envelope = Envelope::error(
        StatusCode::BAD_REQUEST,
        ErrorEnvelope::with_details("Invalid request", detail),
    )
    .with_report(report);
    ProxyResponse::uncached(envelope).into_response()
}
