//! Simulation history routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::error;

use crate::changes::{update_changes_made, ChangesOutcome, NO_PARENT_MESSAGE};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/simulations/changes", post(update_changes))
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangesRequest {
    #[serde(default)]
    pub simulation_id: Option<i64>,
}

async fn update_changes(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChangesRequest>,
) -> Response {
    // Ids start at 1; a zero id counts as missing
    let Some(id) = req.simulation_id.filter(|&id| id != 0) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "simulation_id is required" })),
        )
            .into_response();
    };

    match update_changes_made(&state, id).await {
        Ok(ChangesOutcome::NoParent) => Json(serde_json::json!({
            "success": true,
            "message": NO_PARENT_MESSAGE,
        }))
        .into_response(),
        Ok(ChangesOutcome::Updated {
            simulation_id,
            changes_made,
        }) => Json(serde_json::json!({
            "success": true,
            "changes_made": changes_made,
            "simulation_id": simulation_id,
        }))
        .into_response(),
        Err(e) if e.is_not_found() => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to update changes_made for {}: {}", id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": e.to_string(),
                    "type": e.kind(),
                })),
            )
                .into_response()
        }
    }
}
