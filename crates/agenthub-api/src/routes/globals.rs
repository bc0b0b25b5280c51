//! Public settings the web client reads before login.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct Globals {
    pub frontend_project_name: String,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/globals", get(globals))
}

/// GET /globals
async fn globals(State(state): State<Arc<AppState>>) -> Json<Globals> {
    Json(Globals {
        frontend_project_name: state.config.frontend.project_name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_globals_uses_default_project_name() {
        let (status, body) = get(app(), "/globals").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"frontend_project_name": "Agent Hub"}));
    }
}
