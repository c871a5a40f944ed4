use crate::auth::authenticate;
use crate::http::handlers::{api_error_response, finish, store_error};
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use folio_api::{params, CreatePortfolioRequest, DeleteResponse};
use folio_store::NewPortfolioItem;
use std::collections::BTreeMap;
use std::time::Instant;

const ROUTE: &str = "/v1/portfolio";

pub(crate) async fn list_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let started = Instant::now();
    let owner = match authenticate(&headers, &state) {
        Ok(v) => v,
        Err(e) => return finish(&state, ROUTE, started, api_error_response(e)).await,
    };
    let resp = match state.db.portfolio_for(owner).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => api_error_response(store_error(e)),
    };
    finish(&state, ROUTE, started, resp).await
}

pub(crate) async fn create_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreatePortfolioRequest>,
) -> Response {
    let started = Instant::now();
    let owner = match authenticate(&headers, &state) {
        Ok(v) => v,
        Err(e) => return finish(&state, ROUTE, started, api_error_response(e)).await,
    };
    let new = NewPortfolioItem {
        title: req.title,
        description: req.description.unwrap_or_default(),
        url: req.url.unwrap_or_default(),
        image_url: req.image_url.unwrap_or_default(),
    };
    let resp = match state.db.create_portfolio_item(owner, new).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => api_error_response(store_error(e)),
    };
    finish(&state, ROUTE, started, resp).await
}

pub(crate) async fn delete_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let owner = match authenticate(&headers, &state) {
        Ok(v) => v,
        Err(e) => return finish(&state, ROUTE, started, api_error_response(e)).await,
    };
    let id = match params::require_id(&query) {
        Ok(v) => v,
        Err(e) => return finish(&state, ROUTE, started, api_error_response(e)).await,
    };
    let resp = match state.db.delete_portfolio_item(owner, id).await {
        Ok(deleted) => Json(DeleteResponse { deleted }).into_response(),
        Err(e) => api_error_response(store_error(e)),
    };
    finish(&state, ROUTE, started, resp).await
}
