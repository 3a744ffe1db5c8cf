use std::sync::Arc;

use thiserror::Error;

use warden_auth::{ApplicationGrantRow, DirectGrantRow, RoleGrantRow, User};
use warden_core::UserId;

/// Entity store operation error.
///
/// Only infrastructure faults surface here. A user with no rows (or no such
/// user) is an empty result, never an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntityStoreError {
    #[error("entity store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("failed to decode row: {0}")]
    Decode(String),
}

/// Grant queries consumed by the access core.
///
/// Rows are returned in a stable store order; resolution does not depend on
/// it except for which duplicate wins.
#[async_trait::async_trait]
pub trait EntityStore: Send + Sync {
    async fn find_user(&self, user_id: UserId) -> Result<Option<User>, EntityStoreError>;

    /// Direct grants, each joined with permission → option → module → application.
    async fn user_permission_grants(&self, user_id: UserId) -> Result<Vec<DirectGrantRow>, EntityStoreError>;

    /// One row per (role assignment, permission); roles without permissions
    /// yield a single row with no record.
    async fn user_role_grants(&self, user_id: UserId) -> Result<Vec<RoleGrantRow>, EntityStoreError>;

    async fn user_application_grants(&self, user_id: UserId) -> Result<Vec<ApplicationGrantRow>, EntityStoreError>;
}

#[async_trait::async_trait]
impl<S> EntityStore for Arc<S>
where
    S: EntityStore + ?Sized,
{
    async fn find_user(&self, user_id: UserId) -> Result<Option<User>, EntityStoreError> {
        (**self).find_user(user_id).await
    }

    async fn user_permission_grants(&self, user_id: UserId) -> Result<Vec<DirectGrantRow>, EntityStoreError> {
        (**self).user_permission_grants(user_id).await
    }

    async fn user_role_grants(&self, user_id: UserId) -> Result<Vec<RoleGrantRow>, EntityStoreError> {
        (**self).user_role_grants(user_id).await
    }

    async fn user_application_grants(&self, user_id: UserId) -> Result<Vec<ApplicationGrantRow>, EntityStoreError> {
        (**self).user_application_grants(user_id).await
    }
}
