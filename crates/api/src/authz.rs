//! API-side permission guard.
//!
//! Enforces `Permission:APP:OPTION:VERB` policies against the caller's
//! `permissions` claim before a handler does any work.

use axum::http::StatusCode;
use axum::response::Response;

use warden_auth::{authorize, parse_policy, AuthzError};

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

/// Check a policy for the current request.
pub fn check_policy(principal: &PrincipalContext, policy: &str) -> Result<(), AuthzError> {
    let required = parse_policy(policy)?;
    authorize(principal.principal(), &required)
}

/// Same as [`check_policy`], mapped to an HTTP error response.
pub fn require_policy(principal: &PrincipalContext, policy: &str) -> Result<(), Response> {
    check_policy(principal, policy).map_err(|e| match e {
        AuthzError::Forbidden(_) => json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()),
        AuthzError::InvalidPolicy(_) => json_error(StatusCode::BAD_REQUEST, "invalid_policy", e.to_string()),
    })
}
