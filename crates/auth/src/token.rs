//! HS256 token issuing and validation.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::claims::{
    validate_claims, AccessTokenClaims, ClaimKind, ClaimSet, Destination, IdentityTokenClaims,
    TokenValidationError, TOKEN_LIFETIME_SECS,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Token endpoint response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub id_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub scope: String,
}

/// Verifies bearer tokens for the HTTP layer.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<AccessTokenClaims, TokenError>;
}

/// Symmetric-key codec for access and identity tokens.
#[derive(Clone)]
pub struct Hs256TokenCodec {
    issuer: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl core::fmt::Debug for Hs256TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenCodec")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl Hs256TokenCodec {
    pub fn new(issuer: impl Into<String>, secret: &[u8]) -> Self {
        Self {
            issuer: issuer.into(),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Sign an access/identity token pair valid from `now` for the fixed lifetime.
    pub fn issue(&self, claims: &ClaimSet, now: DateTime<Utc>) -> Result<TokenPair, TokenError> {
        let iat = now.timestamp();
        let exp = iat + TOKEN_LIFETIME_SECS;

        let access = AccessTokenClaims {
            iss: self.issuer.clone(),
            sub: claims.subject,
            name: claims.username.clone(),
            employee_id: claims.employee_id,
            roles: claims.roles.iter().cloned().collect(),
            permissions: claims.permissions.iter().cloned().collect(),
            scope: claims.scope_string(),
            iat,
            exp,
        };

        let identity = IdentityTokenClaims {
            iss: self.issuer.clone(),
            sub: claims.subject,
            name: claims
                .routes_to(ClaimKind::Name, Destination::IdentityToken)
                .then(|| claims.username.clone()),
            role: claims
                .routes_to(ClaimKind::Role, Destination::IdentityToken)
                .then(|| claims.roles.iter().cloned().collect()),
            iat,
            exp,
        };

        Ok(TokenPair {
            access_token: self.sign(&access)?,
            id_token: self.sign(&identity)?,
            token_type: "Bearer".to_string(),
            expires_in: TOKEN_LIFETIME_SECS,
            scope: access.scope,
        })
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

impl JwtValidator for Hs256TokenCodec {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<AccessTokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // The time window is checked against the caller's clock below.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);
        validation.set_issuer(&[self.issuer.as_str()]);

        let data = jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding, &validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}
