use std::collections::BTreeSet;

use warden_auth::Principal;
use warden_core::UserId;

/// Principal context for a request (authenticated identity + token claims).
///
/// Inserted by the auth middleware; present on every protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn user_id(&self) -> UserId {
        self.principal.user_id
    }

    pub fn username(&self) -> &str {
        &self.principal.username
    }

    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.principal.scopes
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}
