//! User grant junctions and the flat, denormalized rows the store returns.
//!
//! The store joins User → Role → Permission → Option → Module → Application
//! in one read per grant kind; trees are rebuilt in-process from these rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_core::{ApplicationId, PermissionId, RoleId, UserId};

use crate::catalog::{Application, MenuOption, Module};
use crate::permissions::{Permission, PermissionKey};
use crate::roles::Role;

// ─────────────────────────────────────────────────────────────────────────────
// Junctions
// ─────────────────────────────────────────────────────────────────────────────

/// Role assigned to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub user_id: UserId,
    pub role_id: RoleId,
    pub assigned_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl UserRole {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// Permission granted directly to a user, bypassing roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermission {
    pub user_id: UserId,
    pub permission_id: PermissionId,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub granted_by: Option<UserId>,
    pub reason: Option<String>,
    pub is_active: bool,
}

impl UserPermission {
    /// Expired means `expires_at` is at or before `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Application a user may use at all (source of OAuth scopes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserApplication {
    pub user_id: UserId,
    pub application_id: ApplicationId,
    pub is_active: bool,
    pub assigned_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Joined rows
// ─────────────────────────────────────────────────────────────────────────────

/// A permission with its full option → module → application context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub permission: Permission,
    pub option: MenuOption,
    pub module: Module,
    pub application: Application,
}

impl PermissionRecord {
    pub fn key(&self) -> PermissionKey {
        PermissionKey::new(
            self.application.code.clone(),
            self.option.name.clone(),
            self.permission.action.clone(),
        )
    }
}

/// One direct grant joined with its permission context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectGrantRow {
    pub grant: UserPermission,
    pub record: PermissionRecord,
}

/// One (role assignment, permission) pair.
///
/// Roles without permissions still produce exactly one row with
/// `record == None` so the role claim can be derived from the same read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrantRow {
    pub assignment: UserRole,
    pub role: Role,
    pub role_application: Application,
    pub record: Option<PermissionRecord>,
}

/// One application assignment joined with its application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationGrantRow {
    pub assignment: UserApplication,
    pub application: Application,
}
