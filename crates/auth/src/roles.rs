use serde::{Deserialize, Serialize};

use warden_core::{ApplicationId, Entity, RoleId};

/// Role scoped to one client application.
///
/// `code` is unique within the owning application only; the claim form
/// (`{APPCODE}_{ROLECODE}`) is what makes it globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub application_id: ApplicationId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
}

impl Role {
    /// Claim string for this role under the given application code.
    pub fn claim(&self, application_code: &str) -> String {
        format!("{}_{}", application_code, self.code)
    }
}

impl Entity for Role {
    type Id = RoleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
