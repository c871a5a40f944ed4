#![forbid(unsafe_code)]
//! HTTP service for the folio link-in-bio portfolio.
//!
//! One authenticated admin edits a profile, portfolio items, company
//! endorsements and visitor-submitted testimonials; unauthenticated visitors
//! read the rendered data by slug and submit testimonials that land
//! unapproved. See `build_router` for the full surface.

use folio_store::Database;
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

pub mod auth;
pub mod config;
pub mod fetch;
mod http;
mod middleware;
mod telemetry;

pub use auth::SessionSigner;
pub use config::{ApiConfig, CONFIG_SCHEMA_VERSION};
pub use fetch::{parse_metadata, FetchError, HttpPageFetcher, PageFetcher};
pub use telemetry::RequestMetrics;

pub const CRATE_NAME: &str = "folio-server";

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub api: ApiConfig,
    pub ready: Arc<AtomicBool>,
    pub accepting_requests: Arc<AtomicBool>,
    pub(crate) sessions: Arc<SessionSigner>,
    pub(crate) fetcher: Arc<dyn PageFetcher>,
    pub(crate) metrics: Arc<RequestMetrics>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(db: Arc<Database>, api: ApiConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        let sessions = Arc::new(SessionSigner::new(
            &api.session_secret,
            api.session_ttl.as_secs(),
        ));
        Self {
            db,
            sessions,
            fetcher,
            ready: Arc::new(AtomicBool::new(true)),
            accepting_requests: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(RequestMetrics::default()),
            request_id_seed: Arc::new(AtomicU64::new(1)),
            api,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(http::handlers::landing_handler))
        .route("/healthz", get(http::handlers::healthz_handler))
        .route("/readyz", get(http::handlers::readyz_handler))
        .route("/metrics", get(http::handlers::metrics_handler))
        .route("/v1/version", get(http::handlers::version_handler))
        .route("/v1/openapi.json", get(http::handlers::openapi_handler))
        .route("/v1/auth/session", post(http::profile::sign_in_handler))
        .route(
            "/v1/profile",
            get(http::profile::profile_handler).put(http::profile::update_profile_handler),
        )
        .route(
            "/v1/profiles/:username",
            get(http::profile::public_profile_handler),
        )
        .route("/v1/pages/:username", get(http::profile::public_page_handler))
        .route(
            "/v1/portfolio",
            get(http::portfolio::list_handler)
                .post(http::portfolio::create_handler)
                .delete(http::portfolio::delete_handler),
        )
        .route(
            "/v1/companies",
            get(http::companies::list_handler)
                .post(http::companies::create_handler)
                .put(http::companies::update_handler)
                .delete(http::companies::delete_handler),
        )
        .route(
            "/v1/testimonials",
            get(http::testimonials::list_handler)
                .post(http::testimonials::create_handler)
                .put(http::testimonials::approve_handler)
                .delete(http::testimonials::delete_handler),
        )
        .route("/v1/meta", get(http::meta::meta_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::request_tracing::request_tracing_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.api.max_body_bytes))
        .with_state(state)
}

#[cfg(test)]
mod handler_tests;
