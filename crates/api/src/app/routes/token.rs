use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

use crate::app::{errors, services::AppServices};
use crate::context::PrincipalContext;

/// POST /connect/refresh - exchange a valid access token for a fresh pair
///
/// Claims are re-resolved from the store; identity scopes carry over from
/// the presented token.
pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    let mut claims = match services.access.refresh_claims(principal.user_id()).await {
        Ok(claims) => claims,
        Err(e) => {
            tracing::info!(user_id = %principal.user_id(), error = %e, "token refresh refused");
            return errors::access_error_to_response(e);
        }
    };
    claims.grant_identity_scopes(principal.scopes().iter().map(String::as_str));

    match services.tokens.issue(&claims, Utc::now()) {
        Ok(pair) => (StatusCode::OK, Json(pair)).into_response(),
        Err(e) => errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "token_error", e.to_string()),
    }
}
