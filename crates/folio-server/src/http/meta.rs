use crate::fetch::{parse_metadata, FetchError};
use crate::http::handlers::{api_error_response, finish};
use crate::AppState;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use folio_api::{params, ApiError};
use reqwest::Url;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::warn;

const ROUTE: &str = "/v1/meta";

/// Link metadata lookup: one outbound GET with the configured 5s timeout,
/// no retry. Fails closed; the caller decides whether to prompt again.
pub(crate) async fn meta_handler(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let raw = match params::require_url(&query) {
        Ok(v) => v,
        Err(e) => return finish(&state, ROUTE, started, api_error_response(e)).await,
    };
    let url = match Url::parse(&raw) {
        Ok(v) if v.scheme() == "http" || v.scheme() == "https" => v,
        _ => {
            let resp = api_error_response(ApiError::invalid_param("url", &raw));
            return finish(&state, ROUTE, started, resp).await;
        }
    };
    let html = match state.fetcher.fetch_page(&url).await {
        Ok(v) => v,
        Err(e) => {
            warn!(url = %url, error = %e, "metadata fetch failed");
            let resp = api_error_response(ApiError::upstream_fetch_failed(&e.to_string()));
            return finish(&state, ROUTE, started, resp).await;
        }
    };
    let resp = match parse_metadata(&html, &url) {
        Ok(meta) => Json(meta).into_response(),
        Err(FetchError::Parse(msg)) => {
            api_error_response(ApiError::upstream_fetch_failed(&msg))
        }
        Err(e) => api_error_response(ApiError::upstream_fetch_failed(&e.to_string())),
    };
    finish(&state, ROUTE, started, resp).await
}
