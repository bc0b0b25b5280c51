//! Sidebar menu entries. Anyone signed in can read them; only admins edit.

use std::sync::Arc;

use agenthub_common::{
    error::{HubError, HubResult},
    ids,
    models::{CreateMenuRequest, Menu, MenuList, MessageResponse, UpdateMenuRequest},
    validation::validate_request,
};
use agenthub_db::repository::menus;
use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    middleware,
    routing::get,
};

use crate::{AppState, middleware::AuthContext};

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/menu", get(list_menu).post(create_menu))
        .route(
            "/menu/{menu_id}",
            get(get_menu).put(update_menu).delete(delete_menu),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth_middleware,
        ))
}

fn menu_not_found() -> HubError {
    HubError::NotFoundDetail("Menu item not found".into())
}

/// GET /menu
async fn list_menu(State(state): State<Arc<AppState>>) -> HubResult<Json<MenuList>> {
    let menus = menus::list_menus(&state.db.pool).await?;
    Ok(Json(MenuList {
        total_count: menus.len(),
        menus,
    }))
}

/// POST /menu (admin)
async fn create_menu(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateMenuRequest>,
) -> HubResult<Json<Menu>> {
    auth.require_admin()?;
    validate_request(&body)?;

    let menu = menus::create_menu(
        &state.db.pool,
        &ids::generate(ids::MENU),
        body.icon.trim(),
        body.url.trim(),
    )
    .await?;
    tracing::info!(menu_id = %menu.id, url = %menu.url, "Menu item created");
    Ok(Json(menu))
}

/// GET /menu/{menu_id}
async fn get_menu(
    State(state): State<Arc<AppState>>,
    Path(menu_id): Path<String>,
) -> HubResult<Json<Menu>> {
    menus::find_by_id(&state.db.pool, &menu_id)
        .await?
        .map(Json)
        .ok_or_else(menu_not_found)
}

/// PUT /menu/{menu_id} (admin, partial)
async fn update_menu(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(menu_id): Path<String>,
    Json(body): Json<UpdateMenuRequest>,
) -> HubResult<Json<Menu>> {
    auth.require_admin()?;
    validate_request(&body)?;

    menus::update_menu(
        &state.db.pool,
        &menu_id,
        body.icon.as_deref().map(str::trim),
        body.url.as_deref().map(str::trim),
    )
    .await?
    .map(Json)
    .ok_or_else(menu_not_found)
}

/// DELETE /menu/{menu_id} (admin)
async fn delete_menu(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(menu_id): Path<String>,
) -> HubResult<Json<MessageResponse>> {
    auth.require_admin()?;
    if !menus::delete_menu(&state.db.pool, &menu_id).await? {
        return Err(menu_not_found());
    }
    Ok(Json(MessageResponse::new("Menu item deleted successfully")))
}
