use crate::AppState;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use folio_api::ApiError;
use folio_store::StoreError;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::time::Instant;

pub(crate) fn api_error_response(err: ApiError) -> Response {
    let status =
        StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"error": err}))).into_response()
}

/// Observes the request against its static route label and hands the
/// response back; every handler's exit path funnels through here.
pub(crate) async fn finish(
    state: &AppState,
    route: &'static str,
    started: Instant,
    resp: Response,
) -> Response {
    let status = resp.status();
    state.metrics.observe_request(route, status, started.elapsed()).await;
    resp
}

pub(crate) fn store_error(e: StoreError) -> ApiError {
    match e {
        StoreError::NotFound => ApiError::not_found("record"),
        StoreError::Conflict(msg) => ApiError::conflict(&msg),
        StoreError::Storage(msg) => {
            tracing::error!("store failure: {msg}");
            ApiError::internal("storage failure")
        }
    }
}

pub(crate) async fn landing_handler(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();
    let html = format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>folio</title></head><body>\
<h1>folio</h1>\
<p>Version: <code>{}</code></p>\
<ul>\
<li><a href=\"/v1/openapi.json\">/v1/openapi.json</a></li>\
<li><a href=\"/healthz\">/healthz</a></li>\
<li><a href=\"/metrics\">/metrics</a></li>\
</ul>\
</body></html>",
        env!("CARGO_PKG_VERSION")
    );
    let mut resp = (StatusCode::OK, html).into_response();
    resp.headers_mut().insert(
        "content-type",
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    state
        .metrics
        .observe_request("/", StatusCode::OK, started.elapsed())
        .await;
    resp
}

pub(crate) async fn healthz_handler(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();
    let resp = (StatusCode::OK, "ok").into_response();
    state
        .metrics
        .observe_request("/healthz", StatusCode::OK, started.elapsed())
        .await;
    resp
}

pub(crate) async fn readyz_handler(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();
    let draining = !state.accepting_requests.load(Ordering::Relaxed);
    let store_ok = state.db.ping().await.is_ok();
    state.ready.store(store_ok, Ordering::Relaxed);
    let (status, body) = if !draining && store_ok {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not-ready")
    };
    let resp = (status, body).into_response();
    state
        .metrics
        .observe_request("/readyz", status, started.elapsed())
        .await;
    resp
}

pub(crate) async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();
    let body = state.metrics.render().await;
    let mut resp = (StatusCode::OK, body).into_response();
    resp.headers_mut().insert(
        "content-type",
        HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    state
        .metrics
        .observe_request("/metrics", StatusCode::OK, started.elapsed())
        .await;
    resp
}

pub(crate) async fn version_handler(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();
    let payload = json!({
        "service": {
            "name": "folio",
            "version": env!("CARGO_PKG_VERSION"),
            "build_hash": option_env!("FOLIO_BUILD_HASH").unwrap_or("dev"),
        },
        "server": {
            "crate": crate::CRATE_NAME,
            "config_schema_version": crate::config::CONFIG_SCHEMA_VERSION,
        }
    });
    let mut response = Json(payload).into_response();
    if let Ok(value) = HeaderValue::from_str("public, max-age=30") {
        response.headers_mut().insert("cache-control", value);
    }
    state
        .metrics
        .observe_request("/v1/version", StatusCode::OK, started.elapsed())
        .await;
    response
}

pub(crate) async fn openapi_handler(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();
    let resp = Json(folio_api::openapi_v1_spec()).into_response();
    state
        .metrics
        .observe_request("/v1/openapi.json", StatusCode::OK, started.elapsed())
        .await;
    resp
}
