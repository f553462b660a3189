use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub store_reachable: bool,
}

/// Reports process liveness and store connectivity. This is the only HTTP
/// route this service exposes — planning itself runs through the seed
/// runner and the library API, not a request/response surface.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_reachable = state.store.active_plan_for_driver("__health_check__").await.is_ok();
    Json(HealthResponse { healthy: true, store_reachable })
}
