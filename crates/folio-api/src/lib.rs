#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

mod dto;

pub use dto::{
    CreateCompanyRequest, CreatePortfolioRequest, DeleteResponse, LinkMetadata,
    PublicTestimonialRequest, SessionResponse, SetApprovedRequest, SignInRequest,
};

pub const CRATE_NAME: &str = "folio-api";

/// Error taxonomy surfaced by every endpoint. The JSON body is always
/// `{"error": {code, message, details}}` with the matching HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ApiErrorCode {
    Unauthorized,
    NotFound,
    ValidationFailed,
    MissingParameter,
    InvalidParameter,
    Conflict,
    UpstreamFetchFailed,
    Internal,
}

impl ApiErrorCode {
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::NotFound => 404,
            Self::ValidationFailed | Self::MissingParameter | Self::InvalidParameter => 400,
            Self::Conflict => 409,
            Self::UpstreamFetchFailed => 502,
            Self::Internal => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
}

impl ApiError {
    #[must_use]
    pub fn new(code: ApiErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
        }
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(ApiErrorCode::Unauthorized, "unauthorized", json!({}))
    }

    #[must_use]
    pub fn not_found(what: &str) -> Self {
        Self::new(
            ApiErrorCode::NotFound,
            format!("{what} not found"),
            json!({"resource": what}),
        )
    }

    #[must_use]
    pub fn validation_failed(message: &str, details: Value) -> Self {
        Self::new(ApiErrorCode::ValidationFailed, message, details)
    }

    #[must_use]
    pub fn missing_param(name: &str) -> Self {
        Self::new(
            ApiErrorCode::MissingParameter,
            format!("missing query parameter: {name}"),
            json!({"parameter": name}),
        )
    }

    #[must_use]
    pub fn invalid_param(name: &str, value: &str) -> Self {
        Self::new(
            ApiErrorCode::InvalidParameter,
            format!("invalid query parameter: {name}"),
            json!({"parameter": name, "value": value}),
        )
    }

    #[must_use]
    pub fn conflict(message: &str) -> Self {
        Self::new(ApiErrorCode::Conflict, message, json!({}))
    }

    #[must_use]
    pub fn upstream_fetch_failed(message: &str) -> Self {
        Self::new(ApiErrorCode::UpstreamFetchFailed, message, json!({}))
    }

    #[must_use]
    pub fn internal(message: &str) -> Self {
        Self::new(ApiErrorCode::Internal, message, json!({}))
    }
}

pub mod params {
    use super::ApiError;
    use std::collections::BTreeMap;

    /// Record ids arrive as `?id=<rowid>` on update/delete, matching the
    /// admin client's query-string convention.
    pub fn require_id(query: &BTreeMap<String, String>) -> Result<i64, ApiError> {
        let raw = query.get("id").ok_or_else(|| ApiError::missing_param("id"))?;
        raw.parse::<i64>()
            .map_err(|_| ApiError::invalid_param("id", raw))
    }

    pub fn require_url(query: &BTreeMap<String, String>) -> Result<String, ApiError> {
        let raw = query
            .get("url")
            .ok_or_else(|| ApiError::missing_param("url"))?;
        if raw.trim().is_empty() {
            return Err(ApiError::invalid_param("url", raw));
        }
        Ok(raw.clone())
    }

    #[must_use]
    pub fn bool_flag(query: &BTreeMap<String, String>, name: &str) -> bool {
        query
            .get(name)
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
    }
}

#[must_use]
pub fn openapi_v1_spec() -> Value {
    json!({
      "openapi": "3.0.3",
      "info": {
        "title": "folio API",
        "version": "v1"
      },
      "paths": {
        "/healthz": {"get": {"responses": {"200": {"description": "ok"}}}},
        "/readyz": {"get": {"responses": {"200": {"description": "ready"}, "503": {"description": "not ready"}}}},
        "/metrics": {"get": {"responses": {"200": {"description": "prometheus metrics"}}}},
        "/v1/auth/session": {
          "post": {
            "responses": {
              "200": {"description": "session token + user"},
              "400": {"description": "invalid identity payload", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ApiError"}}}}
            }
          }
        },
        "/v1/profile": {
          "get": {"responses": {"200": {"description": "own profile"}, "401": {"description": "unauthorized"}}},
          "put": {
            "responses": {
              "200": {"description": "updated profile"},
              "400": {"description": "validation failed (e.g. username taken)", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ApiError"}}}},
              "401": {"description": "unauthorized"}
            }
          }
        },
        "/v1/profiles/{username}": {
          "get": {
            "parameters": [{"name": "username", "in": "path", "required": true, "schema": {"type": "string"}}],
            "responses": {"200": {"description": "public profile"}, "404": {"description": "unknown slug"}}
          }
        },
        "/v1/pages/{username}": {
          "get": {
            "parameters": [{"name": "username", "in": "path", "required": true, "schema": {"type": "string"}}],
            "responses": {"200": {"description": "profile + portfolio + companies + approved testimonials"}, "404": {"description": "unknown slug"}}
          }
        },
        "/v1/portfolio": {
          "get": {"responses": {"200": {"description": "own portfolio items"}, "401": {"description": "unauthorized"}}},
          "post": {"responses": {"200": {"description": "created item"}, "401": {"description": "unauthorized"}}},
          "delete": {
            "parameters": [{"name": "id", "in": "query", "required": true, "schema": {"type": "integer"}}],
            "responses": {"200": {"description": "idempotent delete report"}, "401": {"description": "unauthorized"}}
          }
        },
        "/v1/companies": {
          "get": {"responses": {"200": {"description": "own companies"}, "401": {"description": "unauthorized"}}},
          "post": {"responses": {"200": {"description": "created company"}, "401": {"description": "unauthorized"}}},
          "put": {
            "parameters": [{"name": "id", "in": "query", "required": true, "schema": {"type": "integer"}}],
            "responses": {"200": {"description": "updated company"}, "404": {"description": "missing or foreign id"}, "401": {"description": "unauthorized"}}
          },
          "delete": {
            "parameters": [{"name": "id", "in": "query", "required": true, "schema": {"type": "integer"}}],
            "responses": {"200": {"description": "idempotent delete report"}, "401": {"description": "unauthorized"}}
          }
        },
        "/v1/testimonials": {
          "get": {
            "parameters": [{"name": "username", "in": "query", "required": false, "schema": {"type": "string"}}],
            "responses": {
              "200": {"description": "owner listing, or approved-only when ?username= is present"},
              "401": {"description": "unauthorized (owner listing only)"},
              "404": {"description": "unknown slug"}
            }
          },
          "post": {
            "parameters": [{"name": "public", "in": "query", "required": false, "schema": {"type": "boolean"}}],
            "responses": {
              "200": {"description": "public submission persisted unapproved"},
              "400": {"description": "authenticated create is rejected"},
              "404": {"description": "unknown target slug"}
            }
          },
          "put": {
            "parameters": [{"name": "id", "in": "query", "required": true, "schema": {"type": "integer"}}],
            "responses": {"200": {"description": "approval flag updated"}, "404": {"description": "missing or foreign id"}, "401": {"description": "unauthorized"}}
          },
          "delete": {
            "parameters": [{"name": "id", "in": "query", "required": true, "schema": {"type": "integer"}}],
            "responses": {"200": {"description": "idempotent delete report"}, "401": {"description": "unauthorized"}}
          }
        },
        "/v1/meta": {
          "get": {
            "parameters": [{"name": "url", "in": "query", "required": true, "schema": {"type": "string"}}],
            "responses": {
              "200": {"description": "{name, favicon_url}"},
              "400": {"description": "missing url"},
              "502": {"description": "upstream fetch failed", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ApiError"}}}}
            }
          }
        }
      },
      "components": {
        "schemas": {
          "ApiErrorCode": {
            "type": "string",
            "enum": [
              "Unauthorized",
              "NotFound",
              "ValidationFailed",
              "MissingParameter",
              "InvalidParameter",
              "Conflict",
              "UpstreamFetchFailed",
              "Internal"
            ]
          },
          "ApiError": {
            "type": "object",
            "required": ["code", "message", "details"],
            "additionalProperties": false,
            "properties": {
              "code": {"$ref": "#/components/schemas/ApiErrorCode"},
              "message": {"type": "string"},
              "details": {"type": "object"}
            }
          }
        }
      }
    })
}
