use crate::auth::authenticate;
use crate::http::handlers::{api_error_response, finish, store_error};
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use folio_api::{params, CreateCompanyRequest, DeleteResponse};
use folio_model::CompanyPatch;
use folio_store::NewCompany;
use std::collections::BTreeMap;
use std::time::Instant;

const ROUTE: &str = "/v1/companies";

pub(crate) async fn list_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let started = Instant::now();
    let owner = match authenticate(&headers, &state) {
        Ok(v) => v,
        Err(e) => return finish(&state, ROUTE, started, api_error_response(e)).await,
    };
    let resp = match state.db.companies_for(owner).await {
        Ok(companies) => Json(companies).into_response(),
        Err(e) => api_error_response(store_error(e)),
    };
    finish(&state, ROUTE, started, resp).await
}

pub(crate) async fn create_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateCompanyRequest>,
) -> Response {
    let started = Instant::now();
    let owner = match authenticate(&headers, &state) {
        Ok(v) => v,
        Err(e) => return finish(&state, ROUTE, started, api_error_response(e)).await,
    };
    let new = NewCompany {
        name: req.name,
        url: req.url,
        favicon_url: req.favicon_url.unwrap_or_default(),
    };
    let resp = match state.db.create_company(owner, new).await {
        Ok(company) => Json(company).into_response(),
        Err(e) => api_error_response(store_error(e)),
    };
    finish(&state, ROUTE, started, resp).await
}

pub(crate) async fn update_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
    Json(patch): Json<CompanyPatch>,
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
    let resp = match state.db.update_company(owner, id, &patch).await {
        Ok(company) => Json(company).into_response(),
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
    let resp = match state.db.delete_company(owner, id).await {
        Ok(deleted) => Json(DeleteResponse { deleted }).into_response(),
        Err(e) => api_error_response(store_error(e)),
    };
    finish(&state, ROUTE, started, resp).await
}
