//! HTTP response helpers
//!
//! JSON error bodies share one `{error, error_description}` envelope so
//! operators see the same shape from the gate, the token exchange, and the
//! job itself. The unauthorized body is pre-serialized once at startup.

use actix_web::{http::header, HttpResponse};
use serde_json::json;

static UNAUTHORIZED_BODY: std::sync::LazyLock<String> = std::sync::LazyLock::new(|| {
    serde_json::to_string(&json!({
        "error": "unauthorized",
        "error_description": "Administrative credentials are required to access this resource"
    }))
    .expect("Failed to serialize JSON")
});

/// Create an unauthorized (401) response
#[must_use]
pub fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized()
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .body(UNAUTHORIZED_BODY.clone())
}

/// Create an internal server error (500) response with error detail
#[must_use]
pub fn error_json(error: &str, description: &str) -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({
        "error": error,
        "error_description": description
    }))
}
