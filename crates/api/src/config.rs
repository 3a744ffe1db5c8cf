//! Environment-driven configuration for the API binary.

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub token_issuer: String,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
}

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_TOKEN_ISSUER: &str = "warden";
const DEV_JWT_SECRET: &str = "dev-secret";

impl ApiConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let use_persistent_stores = lookup("USE_PERSISTENT_STORES")
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            jwt_secret,
            token_issuer: lookup("TOKEN_ISSUER").unwrap_or_else(|| DEFAULT_TOKEN_ISSUER.to_string()),
            use_persistent_stores,
            database_url: lookup("DATABASE_URL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ApiConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]);
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.token_issuer, DEFAULT_TOKEN_ISSUER);
        assert!(!cfg.use_persistent_stores);
        assert_eq!(cfg.database_url, None);
    }

    #[test]
    fn explicit_values_win() {
        let cfg = config(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
            ("TOKEN_ISSUER", "auth.example"),
            ("USE_PERSISTENT_STORES", "true"),
            ("DATABASE_URL", "postgres://localhost/warden"),
        ]);
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert_eq!(cfg.token_issuer, "auth.example");
        assert!(cfg.use_persistent_stores);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/warden"));
    }

    #[test]
    fn unparsable_persistence_flag_means_false() {
        assert!(!config(&[("USE_PERSISTENT_STORES", "yes")]).use_persistent_stores);
    }
}
