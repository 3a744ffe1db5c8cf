//! HTTP API: menus, access introspection, authorization audit and token refresh.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
