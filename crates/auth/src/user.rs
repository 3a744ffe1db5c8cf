//! User accounts as seen by the access core.

use serde::{Deserialize, Serialize};

use warden_core::{EmployeeId, Entity, UserId};

/// User account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UserStatus {
    /// User is active and can authenticate.
    #[default]
    Active,
    Inactive,
    Locked,
    Suspended,
}

impl UserStatus {
    /// Only active accounts may obtain or refresh tokens.
    pub fn can_authenticate(self) -> bool {
        matches!(self, UserStatus::Active)
    }
}

impl core::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UserStatus::Active => write!(f, "Active"),
            UserStatus::Inactive => write!(f, "Inactive"),
            UserStatus::Locked => write!(f, "Locked"),
            UserStatus::Suspended => write!(f, "Suspended"),
        }
    }
}

/// User identity record.
///
/// Credentials are owned by the authentication collaborator and never loaded
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub status: UserStatus,
    pub employee_id: Option<EmployeeId>,
}

impl User {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            status: UserStatus::Active,
            employee_id: None,
        }
    }

    pub fn can_authenticate(&self) -> bool {
        self.status.can_authenticate()
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
