//! Permission-driven navigation menus for the calling user.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::app::{errors, services::AppServices};
use crate::context::PrincipalContext;

/// GET /api/menus - every application menu the caller can see
pub async fn list_menus(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.access.project_all_menus(principal.user_id()).await {
        Ok(menus) => (StatusCode::OK, Json(menus)).into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}

/// GET /api/menus/:code - one application's menu, 404 when nothing is granted
pub async fn get_menu(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(code): Path<String>,
) -> axum::response::Response {
    let code = code.to_uppercase();
    match services.access.project_menu(principal.user_id(), &code).await {
        Ok(Some(menu)) => (StatusCode::OK, Json(menu)).into_response(),
        Ok(None) => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("no menu for application '{code}'"),
        ),
        Err(e) => errors::access_error_to_response(e),
    }
}
