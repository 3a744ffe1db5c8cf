//! Authorization audit endpoints.
//!
//! Answer "would this caller be allowed?" from the token's `permissions` claim.

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use warden_auth::{explain_authorization, PermissionKey};

use crate::app::errors;
use crate::authz;
use crate::context::PrincipalContext;

#[derive(Debug, Deserialize)]
pub struct ExplainQuery {
    /// `APP:OPTION:ACTION`
    pub permission: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    /// `Permission:APP:OPTION:VERB`
    pub policy: String,
}

/// GET /api/authorize/explain?permission=APP:OPTION:ACTION
pub async fn explain(
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<ExplainQuery>,
) -> axum::response::Response {
    let required: PermissionKey = match query.permission.parse() {
        Ok(key) => key,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_permission", e.to_string()),
    };

    let explanation = explain_authorization(principal.principal(), &required);
    (StatusCode::OK, Json(explanation)).into_response()
}

/// GET /api/authorize/check?policy=Permission:APP:OPTION:VERB
///
/// 204 when the caller satisfies the policy, 403 otherwise.
pub async fn check(
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<CheckQuery>,
) -> axum::response::Response {
    match authz::require_policy(&principal, &query.policy) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(response) => response,
    }
}
