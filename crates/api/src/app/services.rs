//! Infrastructure wiring: entity store + access service + token codec.

use std::sync::Arc;

use anyhow::Context;

use warden_auth::Hs256TokenCodec;
use warden_infra::{AccessService, EntityStore, InMemoryEntityStore, PostgresEntityStore};

use crate::config::ApiConfig;

pub type DynEntityStore = Arc<dyn EntityStore>;

/// Shared per-process services handed to every handler.
#[derive(Clone)]
pub struct AppServices {
    pub access: AccessService<DynEntityStore>,
    pub tokens: Arc<Hs256TokenCodec>,
}

impl AppServices {
    pub fn new(store: DynEntityStore, tokens: Hs256TokenCodec) -> Self {
        Self {
            access: AccessService::new(store),
            tokens: Arc::new(tokens),
        }
    }
}

pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let tokens = Hs256TokenCodec::new(config.token_issuer.clone(), config.jwt_secret.as_bytes());

    let store: DynEntityStore = if config.use_persistent_stores {
        let url = config
            .database_url
            .as_deref()
            .context("USE_PERSISTENT_STORES=true requires DATABASE_URL")?;
        tracing::info!("using postgres entity store");
        Arc::new(
            PostgresEntityStore::connect(url)
                .await
                .context("failed to connect entity store")?,
        )
    } else {
        tracing::warn!("using empty in-memory entity store (dev only)");
        Arc::new(InMemoryEntityStore::new())
    };

    Ok(AppServices::new(store, tokens))
}
