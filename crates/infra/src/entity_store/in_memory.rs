use std::collections::HashMap;
use std::sync::RwLock;

use warden_auth::{
    Application, ApplicationGrantRow, DirectGrantRow, MenuOption, Module, Permission,
    PermissionRecord, Role, RoleGrantRow, User, UserApplication, UserPermission, UserRole,
};
use warden_core::{ApplicationId, Entity, ModuleId, OptionId, PermissionId, RoleId, UserId};

use super::r#trait::{EntityStore, EntityStoreError};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    applications: HashMap<ApplicationId, Application>,
    modules: HashMap<ModuleId, Module>,
    options: HashMap<OptionId, MenuOption>,
    roles: HashMap<RoleId, Role>,
    // Insertion order is the store order reported to callers.
    permissions: Vec<Permission>,
    user_roles: Vec<UserRole>,
    user_permissions: Vec<UserPermission>,
    user_applications: Vec<UserApplication>,
}

impl Tables {
    /// Inner join permission → option → module → application.
    fn record(&self, permission: &Permission) -> Option<PermissionRecord> {
        let option = self.options.get(&permission.option_id)?;
        let module = self.modules.get(&option.module_id)?;
        let application = self.applications.get(&module.application_id)?;
        Some(PermissionRecord {
            permission: permission.clone(),
            option: option.clone(),
            module: module.clone(),
            application: application.clone(),
        })
    }

    fn upsert_record(&mut self, record: &PermissionRecord) {
        put(&mut self.applications, record.application.clone());
        put(&mut self.modules, record.module.clone());
        put(&mut self.options, record.option.clone());
        upsert_by(&mut self.permissions, record.permission.clone(), |p| *p.id());
    }
}

fn put<T: Entity>(table: &mut HashMap<T::Id, T>, row: T) {
    table.insert(row.id().clone(), row);
}

fn upsert_by<T, K: PartialEq>(rows: &mut Vec<T>, row: T, key: impl Fn(&T) -> K) {
    match rows.iter_mut().find(|existing| key(existing) == key(&row)) {
        Some(existing) => *existing = row,
        None => rows.push(row),
    }
}

/// In-memory entity store.
///
/// Intended for tests/dev. Joins are nested scans; dangling references are
/// dropped the way an inner join would drop them.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    tables: RwLock<Tables>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, EntityStoreError> {
        self.tables
            .read()
            .map_err(|_| EntityStoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, EntityStoreError> {
        self.tables
            .write()
            .map_err(|_| EntityStoreError::Unavailable("lock poisoned".to_string()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Typed inserts (upsert by primary key)
    // ─────────────────────────────────────────────────────────────────────────

    pub fn insert_user(&self, user: User) -> Result<(), EntityStoreError> {
        put(&mut self.write()?.users, user);
        Ok(())
    }

    pub fn insert_application(&self, application: Application) -> Result<(), EntityStoreError> {
        put(&mut self.write()?.applications, application);
        Ok(())
    }

    pub fn insert_module(&self, module: Module) -> Result<(), EntityStoreError> {
        put(&mut self.write()?.modules, module);
        Ok(())
    }

    pub fn insert_option(&self, option: MenuOption) -> Result<(), EntityStoreError> {
        put(&mut self.write()?.options, option);
        Ok(())
    }

    pub fn insert_role(&self, role: Role) -> Result<(), EntityStoreError> {
        put(&mut self.write()?.roles, role);
        Ok(())
    }

    pub fn insert_permission(&self, permission: Permission) -> Result<(), EntityStoreError> {
        upsert_by(&mut self.write()?.permissions, permission, |p| *p.id());
        Ok(())
    }

    pub fn assign_role(&self, assignment: UserRole) -> Result<(), EntityStoreError> {
        upsert_by(&mut self.write()?.user_roles, assignment, |a| (a.user_id, a.role_id));
        Ok(())
    }

    pub fn grant_permission(&self, grant: UserPermission) -> Result<(), EntityStoreError> {
        upsert_by(&mut self.write()?.user_permissions, grant, |g| (g.user_id, g.permission_id));
        Ok(())
    }

    pub fn assign_application(&self, assignment: UserApplication) -> Result<(), EntityStoreError> {
        upsert_by(&mut self.write()?.user_applications, assignment, |a| {
            (a.user_id, a.application_id)
        });
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Row loaders: decompose joined rows back into tables
    // ─────────────────────────────────────────────────────────────────────────

    pub fn load_direct_grant(&self, row: &DirectGrantRow) -> Result<(), EntityStoreError> {
        let mut tables = self.write()?;
        tables.upsert_record(&row.record);
        upsert_by(&mut tables.user_permissions, row.grant.clone(), |g| {
            (g.user_id, g.permission_id)
        });
        Ok(())
    }

    pub fn load_role_grant(&self, row: &RoleGrantRow) -> Result<(), EntityStoreError> {
        let mut tables = self.write()?;
        put(&mut tables.applications, row.role_application.clone());
        put(&mut tables.roles, row.role.clone());
        if let Some(record) = &row.record {
            tables.upsert_record(record);
        }
        upsert_by(&mut tables.user_roles, row.assignment.clone(), |a| (a.user_id, a.role_id));
        Ok(())
    }

    pub fn load_application_grant(&self, row: &ApplicationGrantRow) -> Result<(), EntityStoreError> {
        let mut tables = self.write()?;
        put(&mut tables.applications, row.application.clone());
        upsert_by(&mut tables.user_applications, row.assignment.clone(), |a| {
            (a.user_id, a.application_id)
        });
        Ok(())
    }
}

#[async_trait::async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn find_user(&self, user_id: UserId) -> Result<Option<User>, EntityStoreError> {
        Ok(self.read()?.users.get(&user_id).cloned())
    }

    async fn user_permission_grants(&self, user_id: UserId) -> Result<Vec<DirectGrantRow>, EntityStoreError> {
        let tables = self.read()?;
        let permissions: HashMap<PermissionId, &Permission> =
            tables.permissions.iter().map(|p| (p.id, p)).collect();

        Ok(tables
            .user_permissions
            .iter()
            .filter(|grant| grant.user_id == user_id)
            .filter_map(|grant| {
                let permission = permissions.get(&grant.permission_id)?;
                Some(DirectGrantRow {
                    grant: grant.clone(),
                    record: tables.record(permission)?,
                })
            })
            .collect())
    }

    async fn user_role_grants(&self, user_id: UserId) -> Result<Vec<RoleGrantRow>, EntityStoreError> {
        let tables = self.read()?;
        let mut rows = Vec::new();

        for assignment in tables.user_roles.iter().filter(|a| a.user_id == user_id) {
            let Some(role) = tables.roles.get(&assignment.role_id) else {
                continue;
            };
            let Some(role_application) = tables.applications.get(&role.application_id) else {
                continue;
            };

            let records: Vec<PermissionRecord> = tables
                .permissions
                .iter()
                .filter(|p| p.role_id == role.id)
                .filter_map(|p| tables.record(p))
                .collect();

            let row = |record| RoleGrantRow {
                assignment: assignment.clone(),
                role: role.clone(),
                role_application: role_application.clone(),
                record,
            };
            if records.is_empty() {
                rows.push(row(None));
            } else {
                rows.extend(records.into_iter().map(|record| row(Some(record))));
            }
        }

        Ok(rows)
    }

    async fn user_application_grants(&self, user_id: UserId) -> Result<Vec<ApplicationGrantRow>, EntityStoreError> {
        let tables = self.read()?;
        Ok(tables
            .user_applications
            .iter()
            .filter(|a| a.user_id == user_id)
            .filter_map(|assignment| {
                Some(ApplicationGrantRow {
                    assignment: assignment.clone(),
                    application: tables.applications.get(&assignment.application_id)?.clone(),
                })
            })
            .collect())
    }
}
