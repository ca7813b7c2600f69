use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::application::envelope::ProxyResponse;

use super::{AppState, bad_request};

const SOURCE: &str = "infra::http::customers";

pub(super) async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    ProxyResponse::uncached(state.customers.get(&id).await).into_response()
}

pub(super) async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(changes)) => {
            ProxyResponse::uncached(state.customers.update(&id, changes).await).into_response()
        }
        Err(rejection) => bad_request(SOURCE, rejection.body_text()),
    }
}
