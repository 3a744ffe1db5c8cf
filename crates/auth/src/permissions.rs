use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use warden_core::{Entity, OptionId, PermissionId, RoleId};

/// Action code carried by a permission row (e.g. `"READ"`).
///
/// Action codes are an open set: the constants below are the values the
/// platform ships with, but stores may hold any string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionCode(Cow<'static, str>);

impl ActionCode {
    pub const READ: ActionCode = ActionCode(Cow::Borrowed("READ"));
    pub const CREATE: ActionCode = ActionCode(Cow::Borrowed("CREATE"));
    pub const UPDATE: ActionCode = ActionCode(Cow::Borrowed("UPDATE"));
    pub const DELETE: ActionCode = ActionCode(Cow::Borrowed("DELETE"));
    pub const APPROVE: ActionCode = ActionCode(Cow::Borrowed("APPROVE"));
    pub const EXPORT: ActionCode = ActionCode(Cow::Borrowed("EXPORT"));
    pub const IMPORT: ActionCode = ActionCode(Cow::Borrowed("IMPORT"));
    pub const PRINT: ActionCode = ActionCode(Cow::Borrowed("PRINT"));

    pub const KNOWN: [ActionCode; 8] = [
        Self::READ,
        Self::CREATE,
        Self::UPDATE,
        Self::DELETE,
        Self::APPROVE,
        Self::EXPORT,
        Self::IMPORT,
        Self::PRINT,
    ];

    pub fn new(code: impl Into<Cow<'static, str>>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_known(&self) -> bool {
        Self::KNOWN.iter().any(|k| k == self)
    }
}

impl core::fmt::Display for ActionCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The atomic grant: `action` on `option`, attached to `role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub role_id: RoleId,
    pub option_id: OptionId,
    pub action: ActionCode,
    pub is_active: bool,
}

impl Entity for Permission {
    type Id = PermissionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermissionKeyError {
    #[error("permission key must have the form APP:OPTION:ACTION, got '{0}'")]
    Malformed(String),
}

/// Flattened claim form of a permission: `APPCODE:OptionName:ACTION`.
///
/// This is what lands in the `permissions` token claim and what endpoint
/// guards compare against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PermissionKey {
    pub application_code: String,
    pub option_name: String,
    pub action: ActionCode,
}

impl PermissionKey {
    pub fn new(
        application_code: impl Into<String>,
        option_name: impl Into<String>,
        action: ActionCode,
    ) -> Self {
        Self {
            application_code: application_code.into(),
            option_name: option_name.into(),
            action,
        }
    }

    /// True when `other` names the same application and option.
    pub fn same_option(&self, other: &PermissionKey) -> bool {
        self.application_code == other.application_code && self.option_name == other.option_name
    }
}

impl core::fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}:{}", self.application_code, self.option_name, self.action)
    }
}

impl core::str::FromStr for PermissionKey {
    type Err = PermissionKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(app), Some(option), Some(action), None)
                if !app.is_empty() && !option.is_empty() && !action.is_empty() =>
            {
                Ok(Self::new(app, option, ActionCode::new(action.to_string())))
            }
            _ => Err(PermissionKeyError::Malformed(s.to_string())),
        }
    }
}

impl From<PermissionKey> for String {
    fn from(value: PermissionKey) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for PermissionKey {
    type Error = PermissionKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_action_codes_are_recognized() {
        assert!(ActionCode::new("APPROVE").is_known());
        assert!(!ActionCode::new("ARCHIVE").is_known());
    }

    #[test]
    fn permission_key_parses_claim_strings() {
        let key: PermissionKey = "AUDITORIA:EXPEDIENTES:READ".parse().unwrap();
        assert_eq!(key.application_code, "AUDITORIA");
        assert_eq!(key.option_name, "EXPEDIENTES");
        assert_eq!(key.action, ActionCode::READ);
        assert_eq!(key.to_string(), "AUDITORIA:EXPEDIENTES:READ");
    }

    #[test]
    fn permission_key_rejects_wrong_arity() {
        assert!("AUDITORIA:READ".parse::<PermissionKey>().is_err());
        assert!("A:B:C:D".parse::<PermissionKey>().is_err());
        assert!("A::READ".parse::<PermissionKey>().is_err());
    }
}
