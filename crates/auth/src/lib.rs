//! `warden-auth`: the pure access model (effective permissions, menus, claims, tokens).
//!
//! No HTTP, no storage. Store rows come in, projections go out.

pub mod authorize;
pub mod catalog;
pub mod claims;
pub mod effective;
pub mod grants;
pub mod menu;
pub mod permissions;
pub mod principal;
pub mod resolve;
pub mod roles;
pub mod token;
pub mod user;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use authorize::{
    action_for_http_method, authorize, explain_authorization, parse_policy, AuthorizationExplanation,
    AuthzError, DenialKind,
};
pub use catalog::{Application, MenuOption, Module};
pub use claims::{
    destinations, validate_claims, AccessTokenClaims, ClaimKind, ClaimSet, Destination,
    IdentityTokenClaims, TokenValidationError, TOKEN_LIFETIME_SECS,
};
pub use effective::BrokenLink;
pub use grants::{
    ApplicationGrantRow, DirectGrantRow, PermissionRecord, RoleGrantRow, UserApplication,
    UserPermission, UserRole,
};
pub use menu::{project_all_menus, project_menu, MenuTree, ModuleNode, OptionNode};
pub use permissions::{ActionCode, Permission, PermissionKey, PermissionKeyError};
pub use principal::Principal;
pub use resolve::{resolve, role_strings, scope_codes, EffectivePermission, EffectivePermissions, GrantSource};
pub use roles::Role;
pub use token::{Hs256TokenCodec, JwtValidator, TokenError, TokenPair};
pub use user::{User, UserStatus};
