use crate::auth::authenticate;
use crate::http::handlers::{api_error_response, finish, store_error};
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use folio_api::{params, ApiError, DeleteResponse, PublicTestimonialRequest, SetApprovedRequest};
use folio_store::NewTestimonial;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Instant;

const ROUTE: &str = "/v1/testimonials";

/// `?username=` serves the public approved-only view; without it this is
/// the owner's moderation listing.
pub(crate) async fn list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let started = Instant::now();
    if let Some(username) = query.get("username") {
        let owner = match state.db.user_by_username(username).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                let resp = api_error_response(ApiError::not_found("user"));
                return finish(&state, ROUTE, started, resp).await;
            }
            Err(e) => {
                return finish(&state, ROUTE, started, api_error_response(store_error(e))).await
            }
        };
        let resp = match state.db.approved_testimonials(owner.id).await {
            Ok(list) => Json(list).into_response(),
            Err(e) => api_error_response(store_error(e)),
        };
        return finish(&state, ROUTE, started, resp).await;
    }

    let owner = match authenticate(&headers, &state) {
        Ok(v) => v,
        Err(e) => return finish(&state, ROUTE, started, api_error_response(e)).await,
    };
    let resp = match state.db.testimonials_for_owner(owner).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => api_error_response(store_error(e)),
    };
    finish(&state, ROUTE, started, resp).await
}

/// Create is public-only: `?public=true` persists a visitor submission with
/// `approved` forced to false. The authenticated variant is rejected; owners
/// moderate testimonials, they do not author them.
pub(crate) async fn create_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
    Json(req): Json<PublicTestimonialRequest>,
) -> Response {
    let started = Instant::now();
    if !params::bool_flag(&query, "public") {
        let resp = match authenticate(&headers, &state) {
            Ok(_) => api_error_response(ApiError::validation_failed(
                "testimonials are created through the public submission path",
                json!({"hint": "POST /v1/testimonials?public=true"}),
            )),
            Err(e) => api_error_response(e),
        };
        return finish(&state, ROUTE, started, resp).await;
    }

    let owner = match state.db.user_by_username(&req.username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            let resp = api_error_response(ApiError::not_found("user"));
            return finish(&state, ROUTE, started, resp).await;
        }
        Err(e) => return finish(&state, ROUTE, started, api_error_response(store_error(e))).await,
    };
    if req.author_name.trim().is_empty() || req.text.trim().is_empty() {
        let resp = api_error_response(ApiError::validation_failed(
            "author_name and text are required",
            json!({}),
        ));
        return finish(&state, ROUTE, started, resp).await;
    }
    // req.approved is deliberately ignored; submissions always land unapproved.
    let new = NewTestimonial {
        author_name: req.author_name,
        author_image: req.author_image.unwrap_or_default(),
        text: req.text,
    };
    let resp = match state.db.create_testimonial(owner.id, new).await {
        Ok(t) => Json(t).into_response(),
        Err(e) => api_error_response(store_error(e)),
    };
    finish(&state, ROUTE, started, resp).await
}

pub(crate) async fn approve_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
    Json(req): Json<SetApprovedRequest>,
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
    let resp = match state.db.set_testimonial_approved(owner, id, req.approved).await {
        Ok(t) => Json(t).into_response(),
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
    let resp = match state.db.delete_testimonial(owner, id).await {
        Ok(deleted) => Json(DeleteResponse { deleted }).into_response(),
        Err(e) => api_error_response(store_error(e)),
    };
    finish(&state, ROUTE, started, resp).await
}
