use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

use super::error_responses::error_response;

pub async fn not_found() -> impl IntoResponse {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
