use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use storegate_api_types::{LoginRequest, RegisterRequest, ValidateRequest};

use crate::application::envelope::ProxyResponse;

use super::{AppState, bad_request};

const SOURCE: &str = "infra::http::auth";

pub(super) async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(request)) => ProxyResponse::uncached(state.auth.login(request).await).into_response(),
        Err(rejection) => bad_request(SOURCE, rejection.body_text()),
    }
}

pub(super) async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(request)) => {
            ProxyResponse::uncached(state.auth.register(request).await).into_response()
        }
        Err(rejection) => bad_request(SOURCE, rejection.body_text()),
    }
}

pub(super) async fn validate(
    State(state): State<AppState>,
    body: Result<Json<ValidateRequest>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(request)) => {
            ProxyResponse::uncached(state.auth.validate(request).await).into_response()
        }
        Err(rejection) => bad_request(SOURCE, rejection.body_text()),
    }
}
