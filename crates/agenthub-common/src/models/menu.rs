//! Sidebar menu entries of the web client.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Menu {
    pub id: String,
    pub icon: String,
    pub url: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMenuRequest {
    #[validate(length(min = 1, max = 100))]
    pub icon: String,
    #[validate(length(min = 1, max = 500))]
    pub url: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMenuRequest {
    #[validate(length(min = 1, max = 100))]
    pub icon: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MenuList {
    pub menus: Vec<Menu>,
    pub total_count: usize,
}
