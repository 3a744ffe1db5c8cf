//! In-memory catalog builder for tests.
//!
//! Entities are kept in maps by id; rows are assembled from the *current*
//! map contents, so deactivate first and build rows afterwards.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use warden_core::{ApplicationId, ModuleId, OptionId, PermissionId, RoleId, UserId};

use crate::catalog::{Application, MenuOption, Module};
use crate::grants::{
    ApplicationGrantRow, DirectGrantRow, PermissionRecord, RoleGrantRow, UserApplication,
    UserPermission, UserRole,
};
use crate::permissions::{ActionCode, Permission};
use crate::roles::Role;
use crate::user::User;

#[derive(Debug, Clone)]
pub struct Catalog {
    user: User,
    now: DateTime<Utc>,
    applications: HashMap<ApplicationId, Application>,
    modules: HashMap<ModuleId, Module>,
    options: HashMap<OptionId, MenuOption>,
    roles: HashMap<RoleId, Role>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::for_user(User::new(UserId::new(), "jdoe"))
    }

    pub fn for_user(user: User) -> Self {
        Self {
            user,
            now: Utc::now(),
            applications: HashMap::new(),
            modules: HashMap::new(),
            options: HashMap::new(),
            roles: HashMap::new(),
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn application(&mut self, code: &str) -> Application {
        let app = Application {
            id: ApplicationId::new(),
            code: code.to_string(),
            name: format!("{code} app"),
            base_url: format!("https://{}.example.test", code.to_lowercase()),
            icon: format!("icon-{}", code.to_lowercase()),
            is_active: true,
        };
        self.applications.insert(app.id, app.clone());
        app
    }

    pub fn module(&mut self, app: &Application, code: &str, order: i32) -> Module {
        let module = Module {
            id: ModuleId::new(),
            application_id: app.id,
            code: code.to_string(),
            name: code.to_string(),
            description: format!("{code} module"),
            icon: format!("icon-{}", code.to_lowercase()),
            order,
            is_active: true,
        };
        self.modules.insert(module.id, module.clone());
        module
    }

    pub fn option(&mut self, module: &Module, name: &str) -> MenuOption {
        let option = MenuOption {
            id: OptionId::new(),
            module_id: module.id,
            code: name.to_string(),
            name: name.to_string(),
            route: format!("/{}", name.to_lowercase()),
            http_method: "GET".to_string(),
            icon: format!("icon-{}", name.to_lowercase()),
            is_active: true,
        };
        self.options.insert(option.id, option.clone());
        option
    }

    pub fn role(&mut self, app: &Application, code: &str) -> Role {
        let role = Role {
            id: RoleId::new(),
            application_id: app.id,
            code: code.to_string(),
            name: code.to_string(),
            description: None,
            is_active: true,
        };
        self.roles.insert(role.id, role.clone());
        role
    }

    pub fn deactivate_application(&mut self, id: ApplicationId) {
        if let Some(app) = self.applications.get_mut(&id) {
            app.is_active = false;
        }
    }

    pub fn deactivate_module(&mut self, id: ModuleId) {
        if let Some(module) = self.modules.get_mut(&id) {
            module.is_active = false;
        }
    }

    pub fn deactivate_option(&mut self, id: OptionId) {
        if let Some(option) = self.options.get_mut(&id) {
            option.is_active = false;
        }
    }

    pub fn deactivate_role(&mut self, id: RoleId) {
        if let Some(role) = self.roles.get_mut(&id) {
            role.is_active = false;
        }
    }

    /// New active permission row for `action` on `option`, attached to `role`.
    ///
    /// Panics if the option was not created by this catalog.
    pub fn record(&self, role: &Role, option: &MenuOption, action: &str) -> PermissionRecord {
        let option = self.options[&option.id].clone();
        let module = self.modules[&option.module_id].clone();
        let application = self.applications[&module.application_id].clone();
        PermissionRecord {
            permission: Permission {
                id: PermissionId::new(),
                role_id: role.id,
                option_id: option.id,
                action: ActionCode::new(action.to_string()),
                is_active: true,
            },
            option,
            module,
            application,
        }
    }

    pub fn direct(&self, record: PermissionRecord, expires_at: Option<DateTime<Utc>>) -> DirectGrantRow {
        DirectGrantRow {
            grant: UserPermission {
                user_id: self.user.id,
                permission_id: record.permission.id,
                granted_at: self.now,
                expires_at,
                granted_by: None,
                reason: None,
                is_active: true,
            },
            record,
        }
    }

    pub fn role_grant(&self, role: &Role, record: Option<PermissionRecord>) -> RoleGrantRow {
        self.role_grants(role, record.into_iter().collect())
            .pop()
            .unwrap_or_else(|| unreachable!("role_grants always yields a row"))
    }

    /// Rows for one assignment of `role`, one per record (or one empty row).
    pub fn role_grants(&self, role: &Role, records: Vec<PermissionRecord>) -> Vec<RoleGrantRow> {
        let role = self.roles[&role.id].clone();
        let role_application = self.applications[&role.application_id].clone();
        let assignment = UserRole {
            user_id: self.user.id,
            role_id: role.id,
            assigned_at: self.now,
            revoked_at: None,
            notes: None,
        };

        if records.is_empty() {
            return vec![RoleGrantRow {
                assignment,
                role,
                role_application,
                record: None,
            }];
        }

        records
            .into_iter()
            .map(|record| RoleGrantRow {
                assignment: assignment.clone(),
                role: role.clone(),
                role_application: role_application.clone(),
                record: Some(record),
            })
            .collect()
    }

    pub fn app_grant(&self, app: &Application) -> ApplicationGrantRow {
        ApplicationGrantRow {
            assignment: UserApplication {
                user_id: self.user.id,
                application_id: app.id,
                is_active: true,
                assigned_at: self.now,
                revoked_at: None,
            },
            application: self.applications[&app.id].clone(),
        }
    }
}
