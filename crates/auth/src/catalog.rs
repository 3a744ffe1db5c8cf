//! Application catalog: applications, their menu modules, and options.

use serde::{Deserialize, Serialize};

use warden_core::{ApplicationId, Entity, ModuleId, OptionId};

/// A client system whose access is gated by this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    /// Unique upper-case code, e.g. `AUDITORIA`.
    pub code: String,
    pub name: String,
    pub base_url: String,
    pub icon: String,
    pub is_active: bool,
}

impl Application {
    /// OAuth scope value for this application.
    pub fn scope(&self) -> String {
        self.code.to_lowercase()
    }

    pub fn matches_code(&self, code: &str) -> bool {
        self.code.eq_ignore_ascii_case(code)
    }
}

impl Entity for Application {
    type Id = ApplicationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Named grouping of options inside an application (menu section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub application_id: ApplicationId,
    pub code: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    /// Ascending display order.
    pub order: i32,
    pub is_active: bool,
}

impl Entity for Module {
    type Id = ModuleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Addressable UI/API surface inside a module (route + HTTP verb).
///
/// Permissions attach here, one row per allowed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuOption {
    pub id: OptionId,
    pub module_id: ModuleId,
    pub code: String,
    pub name: String,
    pub route: String,
    pub http_method: String,
    pub icon: String,
    pub is_active: bool,
}

impl Entity for MenuOption {
    type Id = OptionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
