use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::app::{errors, services::AppServices};
use crate::context::PrincipalContext;

/// GET /api/me/access - scopes, roles and permissions as currently resolved
///
/// Reads the store, so it reflects grants changed since the token was issued.
pub async fn my_access(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    let user_id = principal.user_id();
    let access = &services.access;

    let resolved = async {
        Ok::<_, warden_infra::AccessError>((
            access.resolve_scope_codes(user_id).await?,
            access.resolve_effective_role_strings(user_id).await?,
            access.resolve_effective_permission_strings(user_id).await?,
        ))
    }
    .await;

    match resolved {
        Ok((scopes, roles, permissions)) => (
            StatusCode::OK,
            Json(json!({
                "user_id": user_id.to_string(),
                "username": principal.username(),
                "scopes": scopes,
                "roles": roles,
                "permissions": permissions,
            })),
        )
            .into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}
