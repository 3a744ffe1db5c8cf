//! Access service: entity store reads + pure resolution/projection.
//!
//! Stateless per call. Every method reads fresh rows; nothing is cached.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, instrument};

use warden_auth::{
    project_all_menus, project_menu, resolve, role_strings, scope_codes, ClaimSet,
    EffectivePermissions, MenuTree, User, UserStatus,
};
use warden_core::UserId;

use crate::entity_store::{EntityStore, EntityStoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error(transparent)]
    Store(#[from] EntityStoreError),

    /// The user is gone or may no longer authenticate.
    #[error("user {user_id} is no longer valid")]
    UserNotValid {
        user_id: UserId,
        status: Option<UserStatus>,
    },
}

/// Effective-permission, claim and menu queries for one user at a time.
#[derive(Debug, Clone)]
pub struct AccessService<S> {
    store: S,
}

impl<S> AccessService<S>
where
    S: EntityStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn resolve_effective_permissions(&self, user_id: UserId) -> Result<EffectivePermissions, AccessError> {
        self.resolve_effective_permissions_at(user_id, Utc::now()).await
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    pub async fn resolve_effective_permissions_at(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<EffectivePermissions, AccessError> {
        let direct = self.store.user_permission_grants(user_id).await?;
        let roles = self.store.user_role_grants(user_id).await?;
        let resolved = resolve(&direct, &roles, now);

        debug!(
            direct_rows = direct.len(),
            role_rows = roles.len(),
            effective = resolved.len(),
            "resolved effective permissions"
        );
        Ok(resolved)
    }

    /// `APPCODE:OptionName:ACTION` strings, deduplicated.
    pub async fn resolve_effective_permission_strings(&self, user_id: UserId) -> Result<BTreeSet<String>, AccessError> {
        Ok(self.resolve_effective_permissions(user_id).await?.permission_strings())
    }

    /// `{APPCODE}_{ROLECODE}` for each effective role assignment.
    #[instrument(skip(self), fields(user_id = %user_id), err)]
    pub async fn resolve_effective_role_strings(&self, user_id: UserId) -> Result<BTreeSet<String>, AccessError> {
        let roles = self.store.user_role_grants(user_id).await?;
        Ok(role_strings(&roles))
    }

    /// Lower-cased application codes the user is assigned to.
    #[instrument(skip(self), fields(user_id = %user_id), err)]
    pub async fn resolve_scope_codes(&self, user_id: UserId) -> Result<BTreeSet<String>, AccessError> {
        let applications = self.store.user_application_grants(user_id).await?;
        Ok(scope_codes(&applications))
    }

    pub async fn project_menu(&self, user_id: UserId, application_code: &str) -> Result<Option<MenuTree>, AccessError> {
        self.project_menu_at(user_id, application_code, Utc::now()).await
    }

    #[instrument(skip(self), fields(user_id = %user_id, application_code = %application_code), err)]
    pub async fn project_menu_at(
        &self,
        user_id: UserId,
        application_code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<MenuTree>, AccessError> {
        let resolved = self.resolve_effective_permissions_at(user_id, now).await?;
        Ok(project_menu(&resolved, application_code))
    }

    pub async fn project_all_menus(&self, user_id: UserId) -> Result<Vec<MenuTree>, AccessError> {
        self.project_all_menus_at(user_id, Utc::now()).await
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    pub async fn project_all_menus_at(&self, user_id: UserId, now: DateTime<Utc>) -> Result<Vec<MenuTree>, AccessError> {
        let resolved = self.resolve_effective_permissions_at(user_id, now).await?;
        Ok(project_all_menus(&resolved))
    }

    pub async fn claim_set(&self, user: &User) -> Result<ClaimSet, AccessError> {
        self.claim_set_at(user, Utc::now()).await
    }

    /// Scopes, roles and permissions for `user`, ready for the token issuer.
    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    pub async fn claim_set_at(&self, user: &User, now: DateTime<Utc>) -> Result<ClaimSet, AccessError> {
        let direct = self.store.user_permission_grants(user.id).await?;
        let roles = self.store.user_role_grants(user.id).await?;
        let applications = self.store.user_application_grants(user.id).await?;

        Ok(ClaimSet {
            subject: user.id,
            username: user.username.clone(),
            employee_id: user.employee_id,
            scopes: scope_codes(&applications),
            roles: role_strings(&roles),
            permissions: resolve(&direct, &roles, now).permission_strings(),
        })
    }

    /// Re-resolve claims for a token refresh.
    ///
    /// Refused when the user no longer exists or may not authenticate.
    #[instrument(skip(self), fields(user_id = %user_id), err)]
    pub async fn refresh_claims(&self, user_id: UserId) -> Result<ClaimSet, AccessError> {
        match self.store.find_user(user_id).await? {
            Some(user) if user.can_authenticate() => self.claim_set(&user).await,
            Some(user) => Err(AccessError::UserNotValid {
                user_id,
                status: Some(user.status),
            }),
            None => Err(AccessError::UserNotValid { user_id, status: None }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Duration;
    use warden_auth::fixtures::Catalog;
    use warden_auth::{ActionCode, GrantSource};

    use crate::entity_store::InMemoryEntityStore;

    fn service(store: &Arc<InMemoryEntityStore>) -> AccessService<Arc<InMemoryEntityStore>> {
        AccessService::new(Arc::clone(store))
    }

    fn strings(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    /// Store with AUDITORIA/EXPEDIENTES/EXPEDIENTES and an AUDITOR role.
    struct World {
        catalog: Catalog,
        store: Arc<InMemoryEntityStore>,
        app: warden_auth::Application,
        option: warden_auth::MenuOption,
        role: warden_auth::Role,
    }

    fn world() -> World {
        let mut catalog = Catalog::new();
        let app = catalog.application("AUDITORIA");
        let module = catalog.module(&app, "EXPEDIENTES", 1);
        let option = catalog.option(&module, "EXPEDIENTES");
        let role = catalog.role(&app, "AUDITOR");
        let store = Arc::new(InMemoryEntityStore::new());
        store.insert_user(catalog.user().clone()).unwrap();
        World {
            catalog,
            store,
            app,
            option,
            role,
        }
    }

    /// Store whose every read fails as if the database were unreachable.
    struct DownStore;

    #[async_trait::async_trait]
    impl EntityStore for DownStore {
        async fn find_user(&self, _user_id: UserId) -> Result<Option<User>, EntityStoreError> {
            Err(EntityStoreError::Unavailable("down".to_string()))
        }

        async fn user_permission_grants(
            &self,
            _user_id: UserId,
        ) -> Result<Vec<warden_auth::DirectGrantRow>, EntityStoreError> {
            Err(EntityStoreError::Unavailable("down".to_string()))
        }

        async fn user_role_grants(&self, _user_id: UserId) -> Result<Vec<warden_auth::RoleGrantRow>, EntityStoreError> {
            Err(EntityStoreError::Unavailable("down".to_string()))
        }

        async fn user_application_grants(
            &self,
            _user_id: UserId,
        ) -> Result<Vec<warden_auth::ApplicationGrantRow>, EntityStoreError> {
            Err(EntityStoreError::Unavailable("down".to_string()))
        }
    }

    fn is_store_down<T: std::fmt::Debug>(result: Result<T, AccessError>) -> bool {
        matches!(result, Err(AccessError::Store(EntityStoreError::Unavailable(_))))
    }

    #[tokio::test]
    async fn store_faults_surface_as_errors_never_as_empty_results() {
        let access = AccessService::new(DownStore);
        let user = User::new(UserId::new(), "jdoe");

        assert!(is_store_down(access.resolve_effective_permissions(user.id).await));
        assert!(is_store_down(access.resolve_effective_permission_strings(user.id).await));
        assert!(is_store_down(access.resolve_effective_role_strings(user.id).await));
        assert!(is_store_down(access.resolve_scope_codes(user.id).await));
        assert!(is_store_down(access.project_menu(user.id, "AUDITORIA").await));
        assert!(is_store_down(access.project_all_menus(user.id).await));
        assert!(is_store_down(access.claim_set(&user).await));
        assert!(is_store_down(access.refresh_claims(user.id).await));
    }

    #[tokio::test]
    async fn user_without_rows_resolves_to_empty_sets() {
        let store = Arc::new(InMemoryEntityStore::new());
        let access = service(&store);
        let user_id = UserId::new();

        assert!(access.resolve_effective_permission_strings(user_id).await.unwrap().is_empty());
        assert!(access.resolve_effective_role_strings(user_id).await.unwrap().is_empty());
        assert!(access.resolve_scope_codes(user_id).await.unwrap().is_empty());
        assert_eq!(access.project_all_menus(user_id).await.unwrap(), vec![]);
        assert_eq!(access.project_menu(user_id, "AUDITORIA").await.unwrap(), None);
    }

    #[tokio::test]
    async fn direct_grant_on_inactive_option_never_resolves() {
        let mut w = world();
        w.catalog.deactivate_option(w.option.id);
        let row = w.catalog.direct(w.catalog.record(&w.role, &w.option, "READ"), None);
        w.store.load_direct_grant(&row).unwrap();

        let access = service(&w.store);
        let user_id = w.catalog.user_id();
        assert!(access.resolve_effective_permission_strings(user_id).await.unwrap().is_empty());
        assert_eq!(access.project_menu(user_id, "AUDITORIA").await.unwrap(), None);
    }

    #[tokio::test]
    async fn revoked_role_assignment_never_resolves() {
        let w = world();
        let mut row = w
            .catalog
            .role_grant(&w.role, Some(w.catalog.record(&w.role, &w.option, "READ")));
        row.assignment.revoked_at = Some(Utc::now() - Duration::days(1));
        w.store.load_role_grant(&row).unwrap();

        let access = service(&w.store);
        let user_id = w.catalog.user_id();
        assert!(access.resolve_effective_permission_strings(user_id).await.unwrap().is_empty());
        assert!(access.resolve_effective_role_strings(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expired_direct_grant_is_excluded_even_when_active() {
        let w = world();
        let now = Utc::now();
        let row = w.catalog.direct(
            w.catalog.record(&w.role, &w.option, "READ"),
            Some(now - Duration::minutes(5)),
        );
        assert!(row.grant.is_active);
        w.store.load_direct_grant(&row).unwrap();

        let access = service(&w.store);
        let resolved = access
            .resolve_effective_permissions_at(w.catalog.user_id(), now)
            .await
            .unwrap();
        assert!(resolved.is_empty());
    }

    #[tokio::test]
    async fn resolution_is_idempotent() {
        let w = world();
        let rows = w.catalog.role_grants(
            &w.role,
            vec![
                w.catalog.record(&w.role, &w.option, "READ"),
                w.catalog.record(&w.role, &w.option, "UPDATE"),
            ],
        );
        for row in &rows {
            w.store.load_role_grant(row).unwrap();
        }

        let access = service(&w.store);
        let user_id = w.catalog.user_id();
        let now = Utc::now();
        let first = access.resolve_effective_permissions_at(user_id, now).await.unwrap();
        let second = access.resolve_effective_permissions_at(user_id, now).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.permission_strings().len(), 2);
    }

    #[tokio::test]
    async fn direct_and_role_grant_of_same_content_union_to_one_string() {
        let mut w = world();
        let other_role = w.catalog.role(&w.app, "SUPERVISOR");
        let direct = w.catalog.direct(w.catalog.record(&other_role, &w.option, "READ"), None);
        let via_role = w
            .catalog
            .role_grant(&w.role, Some(w.catalog.record(&w.role, &w.option, "READ")));
        w.store.load_direct_grant(&direct).unwrap();
        w.store.load_role_grant(&via_role).unwrap();

        let access = service(&w.store);
        let user_id = w.catalog.user_id();
        let resolved = access.resolve_effective_permissions(user_id).await.unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved.by_content().len(), 1);
        assert_eq!(resolved.by_content()[0].source, GrantSource::Direct);
        assert_eq!(
            access.resolve_effective_permission_strings(user_id).await.unwrap(),
            strings(&["AUDITORIA:EXPEDIENTES:READ"])
        );
    }

    #[tokio::test]
    async fn expedientes_menu_renders_single_branch() {
        let w = world();
        let row = w
            .catalog
            .role_grant(&w.role, Some(w.catalog.record(&w.role, &w.option, "READ")));
        w.store.load_role_grant(&row).unwrap();

        let access = service(&w.store);
        let user_id = w.catalog.user_id();
        let menu = access.project_menu(user_id, "AUDITORIA").await.unwrap().unwrap();
        assert_eq!(menu.application_code, "AUDITORIA");
        assert_eq!(menu.modules.len(), 1);
        assert_eq!(menu.modules[0].code, "EXPEDIENTES");
        assert_eq!(menu.modules[0].options.len(), 1);
        assert_eq!(menu.modules[0].options[0].code, "EXPEDIENTES");
        assert_eq!(menu.modules[0].options[0].allowed_actions, vec![ActionCode::READ]);

        assert_eq!(access.project_menu(user_id, "MEMOS").await.unwrap(), None);
        assert_eq!(access.project_all_menus(user_id).await.unwrap(), vec![menu]);
    }

    #[tokio::test]
    async fn scopes_follow_application_assignments_without_permissions() {
        let mut w = world();
        let memos = w.catalog.application("MEMOS");
        w.store.load_application_grant(&w.catalog.app_grant(&w.app)).unwrap();
        w.store.load_application_grant(&w.catalog.app_grant(&memos)).unwrap();

        let access = service(&w.store);
        let user_id = w.catalog.user_id();
        assert_eq!(
            access.resolve_scope_codes(user_id).await.unwrap(),
            strings(&["auditoria", "memos"])
        );
        assert!(access.resolve_effective_permission_strings(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn module_whose_only_permission_is_inactive_is_dropped() {
        let mut w = world();
        let archive = w.catalog.module(&w.app, "ARCHIVO", 2);
        let historico = w.catalog.option(&archive, "HISTORICO");
        let mut inactive = w.catalog.record(&w.role, &historico, "READ");
        inactive.permission.is_active = false;

        let rows = w
            .catalog
            .role_grants(&w.role, vec![w.catalog.record(&w.role, &w.option, "READ"), inactive]);
        for row in &rows {
            w.store.load_role_grant(row).unwrap();
        }

        let access = service(&w.store);
        let menu = access
            .project_menu(w.catalog.user_id(), "AUDITORIA")
            .await
            .unwrap()
            .unwrap();
        let codes: Vec<&str> = menu.modules.iter().map(|m| m.code.as_str()).collect();
        assert_eq!(codes, vec!["EXPEDIENTES"]);
    }

    #[tokio::test]
    async fn claim_set_combines_scopes_roles_and_permissions() {
        let w = world();
        let row = w
            .catalog
            .role_grant(&w.role, Some(w.catalog.record(&w.role, &w.option, "READ")));
        w.store.load_role_grant(&row).unwrap();
        w.store.load_application_grant(&w.catalog.app_grant(&w.app)).unwrap();

        let access = service(&w.store);
        let claims = access.claim_set(w.catalog.user()).await.unwrap();
        assert_eq!(claims.subject, w.catalog.user_id());
        assert_eq!(claims.scopes, strings(&["auditoria"]));
        assert_eq!(claims.roles, strings(&["AUDITORIA_AUDITOR"]));
        assert_eq!(claims.permissions, strings(&["AUDITORIA:EXPEDIENTES:READ"]));
    }

    #[tokio::test]
    async fn refresh_is_refused_for_missing_or_inactive_users() {
        let w = world();
        let access = service(&w.store);

        let ghost = UserId::new();
        assert_eq!(
            access.refresh_claims(ghost).await,
            Err(AccessError::UserNotValid { user_id: ghost, status: None })
        );

        let mut locked = w.catalog.user().clone();
        locked.status = UserStatus::Locked;
        w.store.insert_user(locked.clone()).unwrap();
        assert_eq!(
            access.refresh_claims(locked.id).await,
            Err(AccessError::UserNotValid {
                user_id: locked.id,
                status: Some(UserStatus::Locked)
            })
        );
    }

    #[tokio::test]
    async fn refresh_succeeds_for_active_user() {
        let w = world();
        let access = service(&w.store);
        let claims = access.refresh_claims(w.catalog.user_id()).await.unwrap();
        assert_eq!(claims.username, "jdoe");
        assert!(claims.permissions.is_empty());
    }
}
