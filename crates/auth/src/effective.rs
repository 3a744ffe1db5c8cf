//! The activity gate: one place that decides whether a grant is in effect.
//!
//! Every entry point (direct grants, role grants, application scopes and the
//! menu's action filter) goes through these checks. A single broken link
//! removes the grant; there is no partial credit.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::Application;
use crate::grants::{ApplicationGrantRow, DirectGrantRow, PermissionRecord, RoleGrantRow, UserRole};
use crate::roles::Role;

/// First link that disqualified a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokenLink {
    PermissionInactive,
    OptionInactive,
    ModuleInactive,
    ApplicationInactive,
    GrantInactive,
    GrantExpired,
    RoleInactive,
    RoleApplicationInactive,
    AssignmentRevoked,
}

impl core::fmt::Display for BrokenLink {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            BrokenLink::PermissionInactive => "permission inactive",
            BrokenLink::OptionInactive => "option inactive",
            BrokenLink::ModuleInactive => "module inactive",
            BrokenLink::ApplicationInactive => "application inactive",
            BrokenLink::GrantInactive => "grant inactive",
            BrokenLink::GrantExpired => "grant expired",
            BrokenLink::RoleInactive => "role inactive",
            BrokenLink::RoleApplicationInactive => "role application inactive",
            BrokenLink::AssignmentRevoked => "assignment revoked",
        };
        f.write_str(s)
    }
}

/// Permission → option → module → application must all be active.
pub fn check_chain(record: &PermissionRecord) -> Result<(), BrokenLink> {
    if !record.permission.is_active {
        return Err(BrokenLink::PermissionInactive);
    }
    if !record.option.is_active {
        return Err(BrokenLink::OptionInactive);
    }
    if !record.module.is_active {
        return Err(BrokenLink::ModuleInactive);
    }
    if !record.application.is_active {
        return Err(BrokenLink::ApplicationInactive);
    }
    Ok(())
}

pub fn chain_is_active(record: &PermissionRecord) -> bool {
    check_chain(record).is_ok()
}

/// Direct grant: grant active, unexpired at `now`, and an active chain.
pub fn check_direct_grant(row: &DirectGrantRow, now: DateTime<Utc>) -> Result<(), BrokenLink> {
    if !row.grant.is_active {
        return Err(BrokenLink::GrantInactive);
    }
    if row.grant.is_expired(now) {
        return Err(BrokenLink::GrantExpired);
    }
    check_chain(&row.record)
}

/// Role assignment: role active, its application active, assignment not revoked.
pub fn check_role_assignment(
    assignment: &UserRole,
    role: &Role,
    role_application: &Application,
) -> Result<(), BrokenLink> {
    if assignment.is_revoked() {
        return Err(BrokenLink::AssignmentRevoked);
    }
    if !role.is_active {
        return Err(BrokenLink::RoleInactive);
    }
    if !role_application.is_active {
        return Err(BrokenLink::RoleApplicationInactive);
    }
    Ok(())
}

/// Role-derived grant: effective assignment plus an active chain.
///
/// Returns the permission record when the row carries one and it is in
/// effect; `Ok(None)` for the permission-less row of an effective role.
pub fn check_role_grant(row: &RoleGrantRow) -> Result<Option<&PermissionRecord>, BrokenLink> {
    check_role_assignment(&row.assignment, &row.role, &row.role_application)?;
    match &row.record {
        Some(record) => check_chain(record).map(|()| Some(record)),
        None => Ok(None),
    }
}

/// Application assignment: active, not revoked, application active.
pub fn check_application_grant(row: &ApplicationGrantRow) -> Result<(), BrokenLink> {
    if !row.assignment.is_active {
        return Err(BrokenLink::GrantInactive);
    }
    if row.assignment.revoked_at.is_some() {
        return Err(BrokenLink::AssignmentRevoked);
    }
    if !row.application.is_active {
        return Err(BrokenLink::ApplicationInactive);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Catalog;
    use chrono::Duration;

    #[test]
    fn direct_grant_on_inactive_option_is_rejected() {
        let mut catalog = Catalog::new();
        let app = catalog.application("AUDITORIA");
        let module = catalog.module(&app, "EXPEDIENTES", 1);
        let option = catalog.option(&module, "EXPEDIENTES");
        catalog.deactivate_option(option.id);
        let role = catalog.role(&app, "AUDITOR");
        let record = catalog.record(&role, &option, "READ");

        let row = catalog.direct(record, None);
        assert_eq!(check_direct_grant(&row, Utc::now()), Err(BrokenLink::OptionInactive));
    }

    #[test]
    fn expired_grant_is_rejected_even_when_active() {
        let mut catalog = Catalog::new();
        let app = catalog.application("AUDITORIA");
        let module = catalog.module(&app, "EXPEDIENTES", 1);
        let option = catalog.option(&module, "EXPEDIENTES");
        let role = catalog.role(&app, "AUDITOR");
        let record = catalog.record(&role, &option, "READ");

        let now = Utc::now();
        let row = catalog.direct(record, Some(now - Duration::minutes(1)));
        assert!(row.grant.is_active);
        assert_eq!(check_direct_grant(&row, now), Err(BrokenLink::GrantExpired));
    }

    #[test]
    fn future_expiry_is_still_effective() {
        let mut catalog = Catalog::new();
        let app = catalog.application("AUDITORIA");
        let module = catalog.module(&app, "EXPEDIENTES", 1);
        let option = catalog.option(&module, "EXPEDIENTES");
        let role = catalog.role(&app, "AUDITOR");
        let record = catalog.record(&role, &option, "READ");

        let now = Utc::now();
        let row = catalog.direct(record, Some(now + Duration::hours(1)));
        assert_eq!(check_direct_grant(&row, now), Ok(()));
    }

    #[test]
    fn revoked_assignment_breaks_role_grant() {
        let mut catalog = Catalog::new();
        let app = catalog.application("AUDITORIA");
        let module = catalog.module(&app, "EXPEDIENTES", 1);
        let option = catalog.option(&module, "EXPEDIENTES");
        let role = catalog.role(&app, "AUDITOR");
        let record = catalog.record(&role, &option, "READ");

        let mut row = catalog.role_grant(&role, Some(record));
        assert!(check_role_grant(&row).unwrap().is_some());

        row.assignment.revoked_at = Some(Utc::now());
        assert_eq!(check_role_grant(&row), Err(BrokenLink::AssignmentRevoked));
    }

    #[test]
    fn inactive_role_application_breaks_role_grant() {
        let mut catalog = Catalog::new();
        let app = catalog.application("MEMOS");
        let role = catalog.role(&app, "MEMO_USER");
        catalog.deactivate_application(app.id);

        let row = catalog.role_grant(&role, None);
        assert_eq!(check_role_grant(&row), Err(BrokenLink::RoleApplicationInactive));
    }

    #[test]
    fn inactive_module_breaks_chain() {
        let mut catalog = Catalog::new();
        let app = catalog.application("AUDITORIA");
        let module = catalog.module(&app, "EXPEDIENTES", 1);
        let option = catalog.option(&module, "EXPEDIENTES");
        let role = catalog.role(&app, "AUDITOR");
        catalog.deactivate_module(module.id);

        let record = catalog.record(&role, &option, "READ");
        assert_eq!(check_chain(&record), Err(BrokenLink::ModuleInactive));
    }

    #[test]
    fn permission_less_role_row_is_effective_without_record() {
        let mut catalog = Catalog::new();
        let app = catalog.application("MEMOS");
        let role = catalog.role(&app, "MEMO_USER");

        let row = catalog.role_grant(&role, None);
        assert_eq!(check_role_grant(&row), Ok(None));
    }
}
