//! Effective-permission resolution.
//!
//! Pure over the store's flat rows: no IO, no clock reads. Callers pass `now`.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::trace;

use warden_core::{OptionId, PermissionId, RoleId};

use crate::effective::{check_application_grant, check_direct_grant, check_role_assignment, check_role_grant};
use crate::grants::{ApplicationGrantRow, DirectGrantRow, PermissionRecord, RoleGrantRow};
use crate::permissions::{ActionCode, PermissionKey};

/// How a permission reached the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GrantSource {
    Direct,
    Role { role_id: RoleId, role_code: String },
}

/// One permission that survived the full activity chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePermission {
    pub record: PermissionRecord,
    pub source: GrantSource,
}

impl EffectivePermission {
    pub fn permission_id(&self) -> PermissionId {
        self.record.permission.id
    }

    pub fn key(&self) -> PermissionKey {
        self.record.key()
    }

    fn content(&self) -> (OptionId, ActionCode) {
        (self.record.option.id, self.record.permission.action.clone())
    }
}

/// Deduplicated set of effective permissions for one user.
///
/// Entries are unique by permission id, in resolution order: direct grants
/// first, then role-derived grants, each in store order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectivePermissions {
    grants: Vec<EffectivePermission>,
}

impl EffectivePermissions {
    pub fn grants(&self) -> &[EffectivePermission] {
        &self.grants
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectivePermission> {
        self.grants.iter()
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    /// Entries collapsed by (option, action); the first occurrence is kept.
    pub fn by_content(&self) -> Vec<&EffectivePermission> {
        let mut seen = HashSet::new();
        self.grants
            .iter()
            .filter(|grant| seen.insert(grant.content()))
            .collect()
    }

    /// `APPCODE:OptionName:ACTION` strings, deduplicated.
    pub fn permission_strings(&self) -> BTreeSet<String> {
        self.grants.iter().map(|grant| grant.key().to_string()).collect()
    }

    pub fn permission_keys(&self) -> BTreeSet<PermissionKey> {
        self.grants.iter().map(EffectivePermission::key).collect()
    }

    fn push(&mut self, seen: &mut HashSet<PermissionId>, grant: EffectivePermission) {
        if seen.insert(grant.permission_id()) {
            self.grants.push(grant);
        }
    }
}

/// Collects grants in iteration order, keeping the first entry per permission id.
///
/// No activity checks are applied; consumers such as the menu projector
/// filter again on their own.
impl FromIterator<EffectivePermission> for EffectivePermissions {
    fn from_iter<I: IntoIterator<Item = EffectivePermission>>(iter: I) -> Self {
        let mut out = EffectivePermissions::default();
        let mut seen = HashSet::new();
        for grant in iter {
            out.push(&mut seen, grant);
        }
        out
    }
}

/// Union of direct and role-derived grants that are in effect at `now`.
///
/// Rows failing any link of the activity chain are skipped silently.
pub fn resolve(
    direct: &[DirectGrantRow],
    roles: &[RoleGrantRow],
    now: DateTime<Utc>,
) -> EffectivePermissions {
    let mut out = EffectivePermissions::default();
    let mut seen = HashSet::new();

    for row in direct {
        match check_direct_grant(row, now) {
            Ok(()) => out.push(
                &mut seen,
                EffectivePermission {
                    record: row.record.clone(),
                    source: GrantSource::Direct,
                },
            ),
            Err(link) => trace!(
                permission_id = %row.record.permission.id,
                broken = %link,
                "direct grant skipped"
            ),
        }
    }

    for row in roles {
        match check_role_grant(row) {
            Ok(Some(record)) => out.push(
                &mut seen,
                EffectivePermission {
                    record: record.clone(),
                    source: GrantSource::Role {
                        role_id: row.role.id,
                        role_code: row.role.code.clone(),
                    },
                },
            ),
            Ok(None) => {}
            Err(link) => trace!(role_id = %row.role.id, broken = %link, "role grant skipped"),
        }
    }

    out
}

/// `{APPCODE}_{ROLECODE}` for every effective role assignment.
///
/// Independent of whether the role carries any effective permission.
pub fn role_strings(roles: &[RoleGrantRow]) -> BTreeSet<String> {
    roles
        .iter()
        .filter(|row| check_role_assignment(&row.assignment, &row.role, &row.role_application).is_ok())
        .map(|row| row.role.claim(&row.role_application.code))
        .collect()
}

/// Lower-cased application codes for every effective application assignment.
pub fn scope_codes(applications: &[ApplicationGrantRow]) -> BTreeSet<String> {
    applications
        .iter()
        .filter(|row| check_application_grant(row).is_ok())
        .map(|row| row.application.scope())
        .collect()
}
