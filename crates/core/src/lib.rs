//! `warden-core`: domain foundation building blocks.
//!
//! Identifiers, the domain error model and the entity trait shared by every
//! other crate. No infrastructure concerns live here.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::DomainError;
pub use id::{ApplicationId, EmployeeId, ModuleId, OptionId, PermissionId, RoleId, UserId};
