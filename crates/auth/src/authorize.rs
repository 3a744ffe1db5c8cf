use serde::Serialize;
use thiserror::Error;

use warden_core::UserId;

use crate::permissions::{ActionCode, PermissionKey};
use crate::principal::Principal;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),

    #[error("invalid permission policy '{0}'")]
    InvalidPolicy(String),
}

/// Authorize a principal against a required permission.
///
/// - No IO
/// - No panics
/// - Exact string match on the `permissions` claim
pub fn authorize(principal: &Principal, required: &PermissionKey) -> Result<(), AuthzError> {
    let required = required.to_string();
    if principal.permissions.contains(&required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Policies
// ─────────────────────────────────────────────────────────────────────────────

/// Prefix of permission policy names, e.g. `Permission:AUDITORIA:EXPEDIENTES:GET`.
pub const POLICY_PREFIX: &str = "Permission:";

/// Action implied by an HTTP method.
pub fn action_for_http_method(method: &str) -> Option<ActionCode> {
    match method.to_ascii_uppercase().as_str() {
        "GET" | "HEAD" => Some(ActionCode::READ),
        "POST" => Some(ActionCode::CREATE),
        "PUT" | "PATCH" => Some(ActionCode::UPDATE),
        "DELETE" => Some(ActionCode::DELETE),
        _ => None,
    }
}

/// Resolve a policy name into the permission it requires.
///
/// The last segment may be an HTTP method (mapped to its action) or an
/// action code used verbatim.
pub fn parse_policy(policy: &str) -> Result<PermissionKey, AuthzError> {
    let invalid = || AuthzError::InvalidPolicy(policy.to_string());
    let body = policy.strip_prefix(POLICY_PREFIX).ok_or_else(invalid)?;
    let key: PermissionKey = body.parse().map_err(|_| invalid())?;

    let action = action_for_http_method(key.action.as_str()).unwrap_or(key.action);
    Ok(PermissionKey::new(key.application_code, key.option_name, action))
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub required_permission: String,
    pub granted: bool,
    /// Human-readable reason for the decision.
    pub reason: String,
    pub principal: PrincipalState,
    pub denial_reason: Option<DenialReason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrincipalState {
    pub user_id: UserId,
    pub username: String,
    pub scopes: Vec<String>,
    pub roles: Vec<String>,
    pub effective_permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// The caller has no scope for the permission's application.
    ApplicationNotInScope,
    MissingPermission,
}

/// Explain why an authorization decision was made (or would be made).
///
/// Answers "why was this request allowed/denied?" using only the token's
/// claims, and lists actions already held on the same option.
pub fn explain_authorization(principal: &Principal, required: &PermissionKey) -> AuthorizationExplanation {
    let required_str = required.to_string();
    let state = PrincipalState {
        user_id: principal.user_id,
        username: principal.username.clone(),
        scopes: principal.scopes.iter().cloned().collect(),
        roles: principal.roles.iter().cloned().collect(),
        effective_permissions: principal.permissions.iter().cloned().collect(),
    };

    if authorize(principal, required).is_ok() {
        return AuthorizationExplanation {
            reason: format!("Principal has permission '{required_str}'"),
            required_permission: required_str,
            granted: true,
            principal: state,
            denial_reason: None,
        };
    }

    let scope = required.application_code.to_lowercase();
    let (kind, message) = if principal.has_scope(&scope) {
        (
            DenialKind::MissingPermission,
            format!("Missing required permission: '{required_str}'"),
        )
    } else {
        (
            DenialKind::ApplicationNotInScope,
            format!(
                "Principal is not assigned to application '{}' (scope '{scope}' absent)",
                required.application_code
            ),
        )
    };

    let same_option: Vec<String> = principal
        .permissions
        .iter()
        .filter_map(|p| p.parse::<PermissionKey>().ok())
        .filter(|held| held.same_option(required))
        .map(|held| held.action.to_string())
        .collect();

    let mut suggestions = vec![
        format!("Assign a role of application '{}' that grants '{required_str}'", required.application_code),
        format!("Grant '{required_str}' directly to the user"),
    ];
    if kind == DenialKind::ApplicationNotInScope {
        suggestions.insert(
            0,
            format!("Assign the user to application '{}'", required.application_code),
        );
    }
    if !same_option.is_empty() {
        suggestions.push(format!(
            "Principal already holds {:?} on '{}:{}'; check the action requested",
            same_option, required.application_code, required.option_name
        ));
    }

    AuthorizationExplanation {
        reason: format!(
            "Principal does not have permission '{required_str}'. Current permissions: {:?}",
            state.effective_permissions
        ),
        required_permission: required_str,
        granted: false,
        principal: state,
        denial_reason: Some(DenialReason {
            kind,
            message,
            suggestions,
        }),
    }
}
