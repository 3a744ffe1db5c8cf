//! Postgres-backed entity store.
//!
//! One joined query per grant kind. The store reads these tables:
//!
//! | Table | Columns used |
//! |-------|--------------|
//! | `users` | `id, username, status, employee_id` |
//! | `applications` | `id, code, name, base_url, icon, is_active` |
//! | `modules` | `id, application_id, code, name, description, icon, display_order, is_active` |
//! | `options` | `id, module_id, code, name, route, http_method, icon, is_active` |
//! | `roles` | `id, application_id, code, name, description, is_active` |
//! | `permissions` | `id, role_id, option_id, action_code, is_active` |
//! | `user_roles` | `user_id, role_id, assigned_at, revoked_at, notes` |
//! | `user_permissions` | `user_id, permission_id, granted_at, expires_at, granted_by, reason, is_active` |
//! | `user_applications` | `user_id, application_id, is_active, assigned_at, revoked_at` |
//!
//! ## Error Mapping
//!
//! | SQLx Error | EntityStoreError |
//! |------------|------------------|
//! | `PoolClosed`, `PoolTimedOut`, `Io`, `Tls` | `Unavailable` |
//! | `ColumnNotFound`, `ColumnDecode`, `Decode` | `Decode` |
//! | anything else | `Query` |

use std::sync::Arc;

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{instrument, Span};
use uuid::Uuid;

use warden_auth::{
    ActionCode, Application, ApplicationGrantRow, DirectGrantRow, MenuOption, Module, Permission,
    PermissionRecord, Role, RoleGrantRow, User, UserApplication, UserPermission, UserRole,
    UserStatus,
};
use warden_core::{ApplicationId, EmployeeId, ModuleId, OptionId, PermissionId, RoleId, UserId};

use super::r#trait::{EntityStore, EntityStoreError};

/// Column list for the permission → option → module → application chain.
///
/// Every joined query aliases the chain the same way (`p`, `o`, `m`, `a`).
const RECORD_COLUMNS: &str = r#"
    p.id            AS permission_id,
    p.role_id       AS permission_role_id,
    p.option_id     AS permission_option_id,
    p.action_code   AS permission_action_code,
    p.is_active     AS permission_is_active,
    o.id            AS option_id,
    o.module_id     AS option_module_id,
    o.code          AS option_code,
    o.name          AS option_name,
    o.route         AS option_route,
    o.http_method   AS option_http_method,
    o.icon          AS option_icon,
    o.is_active     AS option_is_active,
    m.id            AS module_id,
    m.application_id AS module_application_id,
    m.code          AS module_code,
    m.name          AS module_name,
    m.description   AS module_description,
    m.icon          AS module_icon,
    m.display_order AS module_display_order,
    m.is_active     AS module_is_active,
    a.id            AS application_id,
    a.code          AS application_code,
    a.name          AS application_name,
    a.base_url      AS application_base_url,
    a.icon          AS application_icon,
    a.is_active     AS application_is_active
"#;

/// Postgres-backed entity store.
///
/// Read-only; the catalog is maintained by the CRUD side of the service.
#[derive(Debug, Clone)]
pub struct PostgresEntityStore {
    pool: Arc<PgPool>,
}

impl PostgresEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect a new pool to `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, EntityStoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }
}

#[async_trait::async_trait]
impl EntityStore for PostgresEntityStore {
    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn find_user(&self, user_id: UserId) -> Result<Option<User>, EntityStoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, status, employee_id
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user", e))?;

        row.map(|row| decode_user(&row)).transpose()
    }

    #[instrument(skip(self), fields(user_id = %user_id, row_count = tracing::field::Empty), err)]
    async fn user_permission_grants(&self, user_id: UserId) -> Result<Vec<DirectGrantRow>, EntityStoreError> {
        let sql = format!(
            r#"
            SELECT
                up.user_id,
                up.permission_id AS grant_permission_id,
                up.granted_at,
                up.expires_at,
                up.granted_by,
                up.reason,
                up.is_active AS grant_is_active,
                {RECORD_COLUMNS}
            FROM user_permissions up
            JOIN permissions p  ON p.id = up.permission_id
            JOIN options o      ON o.id = p.option_id
            JOIN modules m      ON m.id = o.module_id
            JOIN applications a ON a.id = m.application_id
            WHERE up.user_id = $1
            ORDER BY up.granted_at ASC, p.id ASC
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(user_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("user_permission_grants", e))?;

        let grants = rows
            .iter()
            .map(|row| {
                Ok(DirectGrantRow {
                    grant: UserPermission {
                        user_id: UserId::from_uuid(get(row, "user_id")?),
                        permission_id: PermissionId::from_uuid(get(row, "grant_permission_id")?),
                        granted_at: get(row, "granted_at")?,
                        expires_at: get(row, "expires_at")?,
                        granted_by: get::<Option<Uuid>>(row, "granted_by")?.map(UserId::from_uuid),
                        reason: get(row, "reason")?,
                        is_active: get(row, "grant_is_active")?,
                    },
                    record: decode_record(row)?,
                })
            })
            .collect::<Result<Vec<_>, EntityStoreError>>()?;

        Span::current().record("row_count", grants.len());
        Ok(grants)
    }

    #[instrument(skip(self), fields(user_id = %user_id, row_count = tracing::field::Empty), err)]
    async fn user_role_grants(&self, user_id: UserId) -> Result<Vec<RoleGrantRow>, EntityStoreError> {
        // LEFT JOIN keeps permission-less roles as a single row with NULL chain columns.
        let sql = format!(
            r#"
            SELECT
                ur.user_id,
                ur.role_id AS assignment_role_id,
                ur.assigned_at,
                ur.revoked_at,
                ur.notes,
                r.id            AS role_id,
                r.application_id AS role_application_id,
                r.code          AS role_code,
                r.name          AS role_name,
                r.description   AS role_description,
                r.is_active     AS role_is_active,
                ra.id           AS role_app_id,
                ra.code         AS role_app_code,
                ra.name         AS role_app_name,
                ra.base_url     AS role_app_base_url,
                ra.icon         AS role_app_icon,
                ra.is_active    AS role_app_is_active,
                {RECORD_COLUMNS}
            FROM user_roles ur
            JOIN roles r         ON r.id = ur.role_id
            JOIN applications ra ON ra.id = r.application_id
            LEFT JOIN (
                permissions p
                JOIN options o      ON o.id = p.option_id
                JOIN modules m      ON m.id = o.module_id
                JOIN applications a ON a.id = m.application_id
            ) ON p.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY ur.assigned_at ASC, r.id ASC, p.id ASC NULLS FIRST
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(user_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("user_role_grants", e))?;

        let grants = rows
            .iter()
            .map(|row| {
                let has_permission = get::<Option<Uuid>>(row, "permission_id")?.is_some();
                Ok(RoleGrantRow {
                    assignment: UserRole {
                        user_id: UserId::from_uuid(get(row, "user_id")?),
                        role_id: RoleId::from_uuid(get(row, "assignment_role_id")?),
                        assigned_at: get(row, "assigned_at")?,
                        revoked_at: get(row, "revoked_at")?,
                        notes: get(row, "notes")?,
                    },
                    role: Role {
                        id: RoleId::from_uuid(get(row, "role_id")?),
                        application_id: ApplicationId::from_uuid(get(row, "role_application_id")?),
                        code: get(row, "role_code")?,
                        name: get(row, "role_name")?,
                        description: get(row, "role_description")?,
                        is_active: get(row, "role_is_active")?,
                    },
                    role_application: Application {
                        id: ApplicationId::from_uuid(get(row, "role_app_id")?),
                        code: get(row, "role_app_code")?,
                        name: get(row, "role_app_name")?,
                        base_url: get(row, "role_app_base_url")?,
                        icon: get(row, "role_app_icon")?,
                        is_active: get(row, "role_app_is_active")?,
                    },
                    record: if has_permission { Some(decode_record(row)?) } else { None },
                })
            })
            .collect::<Result<Vec<_>, EntityStoreError>>()?;

        Span::current().record("row_count", grants.len());
        Ok(grants)
    }

    #[instrument(skip(self), fields(user_id = %user_id, row_count = tracing::field::Empty), err)]
    async fn user_application_grants(&self, user_id: UserId) -> Result<Vec<ApplicationGrantRow>, EntityStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                ua.user_id,
                ua.is_active AS assignment_is_active,
                ua.assigned_at,
                ua.revoked_at,
                a.id            AS application_id,
                a.code          AS application_code,
                a.name          AS application_name,
                a.base_url      AS application_base_url,
                a.icon          AS application_icon,
                a.is_active     AS application_is_active
            FROM user_applications ua
            JOIN applications a ON a.id = ua.application_id
            WHERE ua.user_id = $1
            ORDER BY ua.assigned_at ASC, a.id ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("user_application_grants", e))?;

        let grants = rows
            .iter()
            .map(|row| {
                let application = decode_application(row)?;
                Ok(ApplicationGrantRow {
                    assignment: UserApplication {
                        user_id: UserId::from_uuid(get(row, "user_id")?),
                        application_id: application.id,
                        is_active: get(row, "assignment_is_active")?,
                        assigned_at: get(row, "assigned_at")?,
                        revoked_at: get(row, "revoked_at")?,
                    },
                    application,
                })
            })
            .collect::<Result<Vec<_>, EntityStoreError>>()?;

        Span::current().record("row_count", grants.len());
        Ok(grants)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row decoding
// ─────────────────────────────────────────────────────────────────────────────

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, EntityStoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| EntityStoreError::Decode(format!("column '{column}': {e}")))
}

fn decode_user(row: &PgRow) -> Result<User, EntityStoreError> {
    let status: String = get(row, "status")?;
    Ok(User {
        id: UserId::from_uuid(get(row, "id")?),
        username: get(row, "username")?,
        status: parse_status(&status)?,
        employee_id: get::<Option<Uuid>>(row, "employee_id")?.map(EmployeeId::from_uuid),
    })
}

fn parse_status(status: &str) -> Result<UserStatus, EntityStoreError> {
    match status {
        "Active" => Ok(UserStatus::Active),
        "Inactive" => Ok(UserStatus::Inactive),
        "Locked" => Ok(UserStatus::Locked),
        "Suspended" => Ok(UserStatus::Suspended),
        other => Err(EntityStoreError::Decode(format!("unknown user status '{other}'"))),
    }
}

fn decode_application(row: &PgRow) -> Result<Application, EntityStoreError> {
    Ok(Application {
        id: ApplicationId::from_uuid(get(row, "application_id")?),
        code: get(row, "application_code")?,
        name: get(row, "application_name")?,
        base_url: get(row, "application_base_url")?,
        icon: get(row, "application_icon")?,
        is_active: get(row, "application_is_active")?,
    })
}

fn decode_record(row: &PgRow) -> Result<PermissionRecord, EntityStoreError> {
    let action: String = get(row, "permission_action_code")?;
    Ok(PermissionRecord {
        permission: Permission {
            id: PermissionId::from_uuid(get(row, "permission_id")?),
            role_id: RoleId::from_uuid(get(row, "permission_role_id")?),
            option_id: OptionId::from_uuid(get(row, "permission_option_id")?),
            action: ActionCode::new(action),
            is_active: get(row, "permission_is_active")?,
        },
        option: MenuOption {
            id: OptionId::from_uuid(get(row, "option_id")?),
            module_id: ModuleId::from_uuid(get(row, "option_module_id")?),
            code: get(row, "option_code")?,
            name: get(row, "option_name")?,
            route: get(row, "option_route")?,
            http_method: get(row, "option_http_method")?,
            icon: get(row, "option_icon")?,
            is_active: get(row, "option_is_active")?,
        },
        module: Module {
            id: ModuleId::from_uuid(get(row, "module_id")?),
            application_id: ApplicationId::from_uuid(get(row, "module_application_id")?),
            code: get(row, "module_code")?,
            name: get(row, "module_name")?,
            description: get(row, "module_description")?,
            icon: get(row, "module_icon")?,
            order: get(row, "module_display_order")?,
            is_active: get(row, "module_is_active")?,
        },
        application: decode_application(row)?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> EntityStoreError {
    match err {
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            EntityStoreError::Unavailable(format!("connection pool unavailable in {operation}"))
        }
        sqlx::Error::Io(e) => EntityStoreError::Unavailable(format!("io error in {operation}: {e}")),
        sqlx::Error::Tls(e) => EntityStoreError::Unavailable(format!("tls error in {operation}: {e}")),
        sqlx::Error::ColumnNotFound(column) => {
            EntityStoreError::Decode(format!("column '{column}' missing in {operation}"))
        }
        sqlx::Error::ColumnDecode { index, source } => {
            EntityStoreError::Decode(format!("column {index} in {operation}: {source}"))
        }
        sqlx::Error::Decode(e) => EntityStoreError::Decode(format!("decode error in {operation}: {e}")),
        sqlx::Error::Database(db_err) => {
            EntityStoreError::Query(format!("database error in {operation}: {}", db_err.message()))
        }
        other => EntityStoreError::Query(format!("sqlx error in {operation}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_decode_from_their_display_form() {
        for status in [UserStatus::Active, UserStatus::Inactive, UserStatus::Locked, UserStatus::Suspended] {
            assert_eq!(parse_status(&status.to_string()), Ok(status));
        }
        assert!(matches!(parse_status("Deleted"), Err(EntityStoreError::Decode(_))));
    }

    #[test]
    fn pool_faults_map_to_unavailable() {
        assert!(matches!(
            map_sqlx_error("find_user", sqlx::Error::PoolTimedOut),
            EntityStoreError::Unavailable(_)
        ));
        assert!(matches!(
            map_sqlx_error("find_user", sqlx::Error::ColumnNotFound("status".into())),
            EntityStoreError::Decode(_)
        ));
        assert!(matches!(
            map_sqlx_error("find_user", sqlx::Error::RowNotFound),
            EntityStoreError::Query(_)
        ));
    }
}
