use axum::{
    routing::{get, post},
    Router,
};

pub mod access;
pub mod authorize;
pub mod menus;
pub mod system;
pub mod token;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/api/menus", get(menus::list_menus))
        .route("/api/menus/:code", get(menus::get_menu))
        .route("/api/me/access", get(access::my_access))
        .route("/api/authorize/explain", get(authorize::explain))
        .route("/api/authorize/check", get(authorize::check))
        .route("/connect/refresh", post(token::refresh))
}
