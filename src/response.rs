//! Plain-text status responses used by the create/login endpoints.

use axum::http::StatusCode;

pub fn created() -> (StatusCode, &'static str) {
    (StatusCode::CREATED, "Created")
}

pub fn ok() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
