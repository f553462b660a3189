pub mod health;

use axum::{routing::get, Router};

use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new().route("/health", get(health::health_check)).with_state(state)
}
