use crate::fetch::{FetchError, PageFetcher};
use crate::http;
use crate::{AppState, ApiConfig};
use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use axum::Json;
use folio_api::{DeleteResponse, LinkMetadata, PublicTestimonialRequest, SessionResponse, SignInRequest};
use folio_model::{ProfilePatch, Testimonial, User};
use folio_store::Database;
use reqwest::Url;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;

struct FakePageFetcher {
    html: String,
    fail: Option<FetchError>,
}

#[async_trait]
impl PageFetcher for FakePageFetcher {
    async fn fetch_page(&self, _url: &Url) -> Result<String, FetchError> {
        match &self.fail {
            Some(e) => Err(e.clone()),
            None => Ok(self.html.clone()),
        }
    }
}

fn mk_state_with_fetcher(fetcher: Arc<dyn PageFetcher>) -> (TempDir, AppState) {
    let dir = TempDir::new().expect("tempdir");
    let db = Arc::new(Database::new(dir.path().join("folio.sqlite")));
    let state = AppState::new(db, ApiConfig::default(), fetcher);
    (dir, state)
}

fn mk_state() -> (TempDir, AppState) {
    mk_state_with_fetcher(Arc::new(FakePageFetcher {
        html: String::new(),
        fail: None,
    }))
}

async fn body_json(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}

async fn sign_in(state: &AppState, email: &str, name: &str) -> SessionResponse {
    let resp = http::profile::sign_in_handler(
        State(state.clone()),
        Json(SignInRequest {
            email: email.to_string(),
            name: Some(name.to_string()),
            image: None,
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    serde_json::from_value(body_json(resp).await).expect("session response")
}

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "authorization",
        HeaderValue::from_str(&format!("Bearer {token}")).expect("header value"),
    );
    headers
}

#[tokio::test]
async fn sign_in_provisions_once_per_email() {
    let (_dir, state) = mk_state();
    let first = sign_in(&state, "admin@example.com", "John Doe").await;
    assert_eq!(first.user.username.as_str(), "john-doe");

    let again = sign_in(&state, "admin@example.com", "John Doe").await;
    assert_eq!(again.user.id, first.user.id);

    let other = sign_in(&state, "other@example.com", "John Doe").await;
    assert_eq!(other.user.username.as_str(), "john-doe-1");
}

#[tokio::test]
async fn gated_reads_reject_missing_and_garbage_tokens() {
    let (_dir, state) = mk_state();
    let resp = http::profile::profile_handler(State(state.clone()), HeaderMap::new()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = http::profile::profile_handler(State(state.clone()), bearer("garbage")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_update_rejects_foreign_username_and_keeps_original() {
    let (_dir, state) = mk_state();
    let john = sign_in(&state, "john@example.com", "John Doe").await;
    let jane = sign_in(&state, "jane@example.com", "Jane Roe").await;

    let patch = ProfilePatch {
        username: Some(john.user.username.as_str().to_string()),
        ..ProfilePatch::default()
    };
    let resp = http::profile::update_profile_handler(
        State(state.clone()),
        bearer(&jane.token),
        Json(patch),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "ValidationFailed");

    let resp = http::profile::profile_handler(State(state.clone()), bearer(&jane.token)).await;
    let unchanged: User = serde_json::from_value(body_json(resp).await).expect("user");
    assert_eq!(unchanged.username, jane.user.username);
}

#[tokio::test]
async fn profile_update_accepts_own_username_and_patches_fields() {
    let (_dir, state) = mk_state();
    let john = sign_in(&state, "john@example.com", "John Doe").await;

    let patch = ProfilePatch {
        username: Some(john.user.username.as_str().to_string()),
        headline: Some("Freelance engineer".to_string()),
        ..ProfilePatch::default()
    };
    let resp = http::profile::update_profile_handler(
        State(state.clone()),
        bearer(&john.token),
        Json(patch),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: User = serde_json::from_value(body_json(resp).await).expect("user");
    assert_eq!(updated.headline, "Freelance engineer");
    assert_eq!(updated.username, john.user.username);
}

#[tokio::test]
async fn public_submission_always_lands_unapproved() {
    let (_dir, state) = mk_state();
    let owner = sign_in(&state, "owner@example.com", "Owner").await;

    let mut query = BTreeMap::new();
    query.insert("public".to_string(), "true".to_string());
    let resp = http::testimonials::create_handler(
        State(state.clone()),
        HeaderMap::new(),
        Query(query),
        Json(PublicTestimonialRequest {
            username: owner.user.username.as_str().to_string(),
            author_name: "Visitor".to_string(),
            author_image: None,
            text: "Great work".to_string(),
            approved: Some(true),
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let created: Testimonial = serde_json::from_value(body_json(resp).await).expect("testimonial");
    assert!(!created.approved);
}

#[tokio::test]
async fn authenticated_testimonial_create_is_rejected() {
    let (_dir, state) = mk_state();
    let owner = sign_in(&state, "owner@example.com", "Owner").await;

    let resp = http::testimonials::create_handler(
        State(state.clone()),
        bearer(&owner.token),
        Query(BTreeMap::new()),
        Json(PublicTestimonialRequest {
            username: owner.user.username.as_str().to_string(),
            author_name: "Owner".to_string(),
            author_image: None,
            text: "I am great".to_string(),
            approved: None,
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn public_submission_for_unknown_slug_is_not_found() {
    let (_dir, state) = mk_state();
    let mut query = BTreeMap::new();
    query.insert("public".to_string(), "true".to_string());
    let resp = http::testimonials::create_handler(
        State(state.clone()),
        HeaderMap::new(),
        Query(query),
        Json(PublicTestimonialRequest {
            username: "no-such-slug".to_string(),
            author_name: "Visitor".to_string(),
            author_image: None,
            text: "hello".to_string(),
            approved: None,
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_of_missing_id_reports_deleted_false() {
    let (_dir, state) = mk_state();
    let owner = sign_in(&state, "owner@example.com", "Owner").await;

    let mut query = BTreeMap::new();
    query.insert("id".to_string(), "9999".to_string());
    let resp = http::portfolio::delete_handler(
        State(state.clone()),
        bearer(&owner.token),
        Query(query),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let report: DeleteResponse =
        serde_json::from_value(body_json(resp).await).expect("delete response");
    assert!(!report.deleted);
}

#[tokio::test]
async fn public_page_composes_only_approved_testimonials() {
    let (_dir, state) = mk_state();
    let owner = sign_in(&state, "owner@example.com", "Owner").await;

    let mut query = BTreeMap::new();
    query.insert("public".to_string(), "true".to_string());
    for text in ["first", "second"] {
        let resp = http::testimonials::create_handler(
            State(state.clone()),
            HeaderMap::new(),
            Query(query.clone()),
            Json(PublicTestimonialRequest {
                username: owner.user.username.as_str().to_string(),
                author_name: "Visitor".to_string(),
                author_image: None,
                text: text.to_string(),
                approved: None,
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    // Approve only the first submission through the owner path.
    let listing = http::testimonials::list_handler(
        State(state.clone()),
        bearer(&owner.token),
        Query(BTreeMap::new()),
    )
    .await;
    let all: Vec<Testimonial> = serde_json::from_value(body_json(listing).await).expect("list");
    assert_eq!(all.len(), 2);
    let mut approve_query = BTreeMap::new();
    approve_query.insert("id".to_string(), all[0].id.to_string());
    let resp = http::testimonials::approve_handler(
        State(state.clone()),
        bearer(&owner.token),
        Query(approve_query),
        Json(folio_api::SetApprovedRequest { approved: true }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let page = http::profile::public_page_handler(
        State(state.clone()),
        Path(owner.user.username.as_str().to_string()),
    )
    .await;
    assert_eq!(page.status(), StatusCode::OK);
    let body = body_json(page).await;
    let testimonials = body["testimonials"].as_array().expect("testimonials array");
    assert_eq!(testimonials.len(), 1);
    assert_eq!(testimonials[0]["approved"], true);
}

#[tokio::test]
async fn unknown_slug_pages_are_not_found() {
    let (_dir, state) = mk_state();
    let resp = http::profile::public_page_handler(
        State(state.clone()),
        Path("no-such-slug".to_string()),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn meta_endpoint_parses_fetched_markup() {
    let html = r#"<html><head>
        <meta property="og:site_name" content="Acme Studio">
        <link rel="icon" href="/fav.png">
    </head></html>"#;
    let (_dir, state) = mk_state_with_fetcher(Arc::new(FakePageFetcher {
        html: html.to_string(),
        fail: None,
    }));

    let mut query = BTreeMap::new();
    query.insert("url".to_string(), "https://acme.example/about".to_string());
    let resp = http::meta::meta_handler(State(state.clone()), Query(query)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let meta: LinkMetadata = serde_json::from_value(body_json(resp).await).expect("metadata");
    assert_eq!(meta.name, "Acme Studio");
    assert_eq!(meta.favicon_url, "https://acme.example/fav.png");
}

#[tokio::test]
async fn meta_endpoint_fails_closed_on_upstream_errors() {
    let (_dir, state) = mk_state_with_fetcher(Arc::new(FakePageFetcher {
        html: String::new(),
        fail: Some(FetchError::Status(404)),
    }));

    let mut query = BTreeMap::new();
    query.insert("url".to_string(), "https://acme.example".to_string());
    let resp = http::meta::meta_handler(State(state.clone()), Query(query)).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let resp = http::meta::meta_handler(State(state.clone()), Query(BTreeMap::new())).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let mut query = BTreeMap::new();
    query.insert("url".to_string(), "ftp://acme.example".to_string());
    let resp = http::meta::meta_handler(State(state.clone()), Query(query)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
