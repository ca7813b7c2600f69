use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::{IntoResponse, Response},
};
use storegate_api_types::StockUpdateRequest;

use crate::application::catalog::ProductQuery;

use super::{AppState, bad_request};

const SOURCE: &str = "infra::http::catalog";

pub(super) async fn products(
    State(state): State<AppState>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> Response {
    match query {
        Ok(Query(query)) => state.catalog.products(&query).await.into_response(),
        Err(rejection) => bad_request(SOURCE, rejection.body_text()),
    }
}

pub(super) async fn product(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let query = ProductQuery {
        id: Some(id),
        ..Default::default()
    };
    state.catalog.products(&query).await.into_response()
}

pub(super) async fn categories(State(state): State<AppState>) -> Response {
    state.catalog.categories().await.into_response()
}

pub(super) async fn variations(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    state.catalog.variations(&id).await.into_response()
}

pub(super) async fn update_stock(
    State(state): State<AppState>,
    body: Result<Json<StockUpdateRequest>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(request)) => state.catalog.update_stock(request).await.into_response(),
        Err(rejection) => bad_request(SOURCE, rejection.body_text()),
    }
}
