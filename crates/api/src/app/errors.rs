use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use warden_infra::{AccessError, EntityStoreError};

pub fn access_error_to_response(err: AccessError) -> axum::response::Response {
    match err {
        AccessError::Store(EntityStoreError::Unavailable(msg)) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", msg)
        }
        AccessError::Store(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string()),
        AccessError::UserNotValid { .. } => {
            json_error(StatusCode::BAD_REQUEST, "invalid_grant", "User no longer valid")
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
