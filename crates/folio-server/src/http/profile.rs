use crate::auth::{authenticate, unix_seconds};
use crate::http::handlers::{api_error_response, finish, store_error};
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use folio_api::{ApiError, SessionResponse, SignInRequest};
use folio_model::{parse_email, parse_username, ProfilePatch};
use folio_store::NewUser;
use serde_json::json;
use std::time::Instant;
use tracing::info;

/// First-sign-in provisioning: the external OAuth layer asserts the
/// identity, this endpoint creates the user on first contact and hands back
/// a session token either way.
pub(crate) async fn sign_in_handler(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Response {
    let route = "/v1/auth/session";
    let started = Instant::now();
    let email = match parse_email(&req.email) {
        Ok(v) => v,
        Err(e) => {
            let resp = api_error_response(ApiError::validation_failed(
                "invalid email",
                json!({"message": e.to_string()}),
            ));
            return finish(&state, route, started, resp).await;
        }
    };
    let existing = match state.db.user_by_email(&email).await {
        Ok(v) => v,
        Err(e) => {
            let resp = api_error_response(store_error(e));
            return finish(&state, route, started, resp).await;
        }
    };
    let user = match existing {
        Some(u) => u,
        None => {
            let display = req.name.clone().unwrap_or_else(|| "User".to_string());
            let username = match state.db.allocate_username(&display).await {
                Ok(v) => v,
                Err(e) => {
                    let resp = api_error_response(store_error(e));
                    return finish(&state, route, started, resp).await;
                }
            };
            info!(email = %email, username = %username, "provisioning user on first sign-in");
            match state
                .db
                .create_user(NewUser {
                    email,
                    name: display,
                    image: req.image.clone().unwrap_or_default(),
                    username,
                })
                .await
            {
                Ok(v) => v,
                Err(e) => {
                    let resp = api_error_response(store_error(e));
                    return finish(&state, route, started, resp).await;
                }
            }
        }
    };
    let token = state.sessions.issue(user.id, unix_seconds());
    let resp = Json(SessionResponse { token, user }).into_response();
    finish(&state, route, started, resp).await
}

pub(crate) async fn profile_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let route = "/v1/profile";
    let started = Instant::now();
    let user_id = match authenticate(&headers, &state) {
        Ok(v) => v,
        Err(e) => return finish(&state, route, started, api_error_response(e)).await,
    };
    let resp = match state.db.user_by_id(user_id).await {
        Ok(Some(user)) => Json(user).into_response(),
        Ok(None) => api_error_response(ApiError::not_found("user")),
        Err(e) => api_error_response(store_error(e)),
    };
    finish(&state, route, started, resp).await
}

/// Profile update. Uniqueness is validated only for the username field; a
/// slug owned by a different user leaves the stored profile untouched.
pub(crate) async fn update_profile_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(patch): Json<ProfilePatch>,
) -> Response {
    let route = "/v1/profile";
    let started = Instant::now();
    let user_id = match authenticate(&headers, &state) {
        Ok(v) => v,
        Err(e) => return finish(&state, route, started, api_error_response(e)).await,
    };
    if let Some(raw) = &patch.username {
        let username = match parse_username(raw) {
            Ok(v) => v,
            Err(e) => {
                let resp = api_error_response(ApiError::validation_failed(
                    "invalid username",
                    json!({"message": e.to_string()}),
                ));
                return finish(&state, route, started, resp).await;
            }
        };
        match state.db.user_by_username(username.as_str()).await {
            Ok(Some(existing)) if existing.id != user_id => {
                let resp = api_error_response(ApiError::validation_failed(
                    "username already in use",
                    json!({"username": username}),
                ));
                return finish(&state, route, started, resp).await;
            }
            Ok(_) => {}
            Err(e) => {
                return finish(&state, route, started, api_error_response(store_error(e))).await
            }
        }
    }
    let resp = match state.db.update_profile(user_id, &patch).await {
        Ok(user) => Json(user).into_response(),
        // A racing duplicate slips past the probe; the unique index catches it.
        Err(folio_store::StoreError::Conflict(_)) => api_error_response(
            ApiError::validation_failed("username already in use", json!({})),
        ),
        Err(e) => api_error_response(store_error(e)),
    };
    finish(&state, route, started, resp).await
}

pub(crate) async fn public_profile_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Response {
    let route = "/v1/profiles/:username";
    let started = Instant::now();
    let resp = match state.db.user_by_username(&username).await {
        Ok(Some(user)) => Json(user).into_response(),
        Ok(None) => api_error_response(ApiError::not_found("user")),
        Err(e) => api_error_response(store_error(e)),
    };
    finish(&state, route, started, resp).await
}

/// The visitor flow in one read: slug -> owner, then the owner's portfolio,
/// companies and approved testimonials for rendering.
pub(crate) async fn public_page_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Response {
    let route = "/v1/pages/:username";
    let started = Instant::now();
    let user = match state.db.user_by_username(&username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            let resp = api_error_response(ApiError::not_found("user"));
            return finish(&state, route, started, resp).await;
        }
        Err(e) => return finish(&state, route, started, api_error_response(store_error(e))).await,
    };
    let portfolio = match state.db.portfolio_for(user.id).await {
        Ok(v) => v,
        Err(e) => return finish(&state, route, started, api_error_response(store_error(e))).await,
    };
    let companies = match state.db.companies_for(user.id).await {
        Ok(v) => v,
        Err(e) => return finish(&state, route, started, api_error_response(store_error(e))).await,
    };
    let testimonials = match state.db.approved_testimonials(user.id).await {
        Ok(v) => v,
        Err(e) => return finish(&state, route, started, api_error_response(store_error(e))).await,
    };
    let resp = Json(json!({
        "profile": user,
        "portfolio": portfolio,
        "companies": companies,
        "testimonials": testimonials,
    }))
    .into_response();
    finish(&state, route, started, resp).await
}
