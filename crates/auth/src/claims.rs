use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use warden_core::{EmployeeId, UserId};

/// Fixed token lifetime in seconds.
pub const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Standard identity scopes a client may request alongside application scopes.
pub const IDENTITY_SCOPES: [&str; 4] = ["openid", "profile", "email", "roles"];

/// Everything the access core knows about a user at token time.
///
/// Transport-agnostic: the token codec decides which claims land in which
/// token via [`destinations`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet {
    pub subject: UserId,
    pub username: String,
    pub employee_id: Option<EmployeeId>,
    /// Lower-cased application codes plus any granted identity scopes.
    pub scopes: BTreeSet<String>,
    /// `{APPCODE}_{ROLECODE}`
    pub roles: BTreeSet<String>,
    /// `{APPCODE}:{OptionName}:{ACTION}`
    pub permissions: BTreeSet<String>,
}

impl ClaimSet {
    /// Adds the requested scopes that are standard identity scopes; others are ignored.
    pub fn grant_identity_scopes<'a>(&mut self, requested: impl IntoIterator<Item = &'a str>) {
        for scope in requested {
            if IDENTITY_SCOPES.contains(&scope) {
                self.scopes.insert(scope.to_string());
            }
        }
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    /// True when `kind` is routed to `destination` under this set's scopes.
    pub fn routes_to(&self, kind: ClaimKind, destination: Destination) -> bool {
        destinations(kind, &self.scopes).contains(&destination)
    }

    /// Space-separated `scope` claim value.
    pub fn scope_string(&self) -> String {
        self.scopes.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Claim destinations
// ─────────────────────────────────────────────────────────────────────────────

/// Claim types the issuer knows how to route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimKind {
    Subject,
    Name,
    Email,
    Role,
    Roles,
    Permissions,
    EmployeeId,
    Other,
}

impl ClaimKind {
    pub fn from_claim_type(claim_type: &str) -> Self {
        match claim_type {
            "sub" => ClaimKind::Subject,
            "name" => ClaimKind::Name,
            "email" => ClaimKind::Email,
            "role" => ClaimKind::Role,
            "roles" => ClaimKind::Roles,
            "permissions" => ClaimKind::Permissions,
            "employee_id" => ClaimKind::EmployeeId,
            _ => ClaimKind::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    AccessToken,
    IdentityToken,
}

const ACCESS_ONLY: &[Destination] = &[Destination::AccessToken];
const BOTH: &[Destination] = &[Destination::AccessToken, Destination::IdentityToken];

/// Destination table: which token(s) carry a claim, given the granted scopes.
pub fn destinations(kind: ClaimKind, scopes: &BTreeSet<String>) -> &'static [Destination] {
    let gated = |scope: &str| if scopes.contains(scope) { BOTH } else { ACCESS_ONLY };
    match kind {
        ClaimKind::Subject => BOTH,
        ClaimKind::Name => gated("profile"),
        ClaimKind::Email => gated("email"),
        ClaimKind::Role => gated("roles"),
        ClaimKind::Roles | ClaimKind::Permissions | ClaimKind::EmployeeId | ClaimKind::Other => {
            ACCESS_ONLY
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Token payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Access token payload (what endpoint guards read).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,
    pub sub: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<EmployeeId>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub scope: String,
    pub iat: i64,
    pub exp: i64,
}

impl AccessTokenClaims {
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope.split_whitespace()
    }
}

/// Identity token payload; optional claims depend on granted scopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityTokenClaims {
    pub iss: String,
    pub sub: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Vec<String>>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate the token time window against `now`.
///
/// Signature verification happens in the codec; this checks the claims only.
pub fn validate_claims(claims: &AccessTokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scopes(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn subject_goes_everywhere() {
        assert_eq!(destinations(ClaimKind::Subject, &scopes(&[])), BOTH);
    }

    #[test]
    fn name_reaches_identity_token_only_with_profile_scope() {
        assert_eq!(destinations(ClaimKind::Name, &scopes(&["auditoria"])), ACCESS_ONLY);
        assert_eq!(destinations(ClaimKind::Name, &scopes(&["auditoria", "profile"])), BOTH);
        assert_eq!(destinations(ClaimKind::Email, &scopes(&["email"])), BOTH);
        assert_eq!(destinations(ClaimKind::Role, &scopes(&["roles"])), BOTH);
    }

    #[test]
    fn authorization_claims_stay_in_access_token() {
        let all = scopes(&["openid", "profile", "email", "roles"]);
        for kind in [ClaimKind::Roles, ClaimKind::Permissions, ClaimKind::EmployeeId] {
            assert_eq!(destinations(kind, &all), ACCESS_ONLY);
        }
        assert_eq!(ClaimKind::from_claim_type("tenant"), ClaimKind::Other);
        assert_eq!(destinations(ClaimKind::Other, &all), ACCESS_ONLY);
    }

    #[test]
    fn only_identity_scopes_are_granted() {
        let mut claims = ClaimSet {
            subject: UserId::new(),
            username: "jdoe".to_string(),
            employee_id: None,
            scopes: scopes(&["auditoria"]),
            roles: BTreeSet::new(),
            permissions: BTreeSet::new(),
        };
        claims.grant_identity_scopes(["profile", "memos", "offline_access"]);
        assert_eq!(claims.scopes, scopes(&["auditoria", "profile"]));
        assert_eq!(claims.scope_string(), "auditoria profile");
        assert!(claims.routes_to(ClaimKind::Name, Destination::IdentityToken));
    }

    #[test]
    fn time_window_is_checked() {
        let now = Utc::now();
        let mut claims = AccessTokenClaims {
            iss: "warden".to_string(),
            sub: UserId::new(),
            name: "jdoe".to_string(),
            employee_id: None,
            roles: vec![],
            permissions: vec![],
            scope: String::new(),
            iat: now.timestamp(),
            exp: now.timestamp() + TOKEN_LIFETIME_SECS,
        };
        assert_eq!(validate_claims(&claims, now), Ok(()));

        claims.exp = claims.iat;
        assert_eq!(validate_claims(&claims, now), Err(TokenValidationError::InvalidTimeWindow));

        claims.iat = now.timestamp() + 60;
        claims.exp = claims.iat + 60;
        assert_eq!(validate_claims(&claims, now), Err(TokenValidationError::NotYetValid));

        claims.iat = now.timestamp() - 120;
        claims.exp = now.timestamp() - 60;
        assert_eq!(validate_claims(&claims, now), Err(TokenValidationError::Expired));
    }
}
