use std::collections::BTreeSet;

use serde::Serialize;

use warden_core::UserId;

use crate::claims::AccessTokenClaims;

/// Authenticated caller, as established by a validated access token.
///
/// Everything here comes from the token; no store access is needed to
/// guard an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub scopes: BTreeSet<String>,
    pub roles: BTreeSet<String>,
    pub permissions: BTreeSet<String>,
}

impl Principal {
    pub fn from_claims(claims: &AccessTokenClaims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.name.clone(),
            scopes: claims.scopes().map(str::to_string).collect(),
            roles: claims.roles.iter().cloned().collect(),
            permissions: claims.permissions.iter().cloned().collect(),
        }
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}
