mod api;
mod config;
mod demo;

use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use planner_core::providers::{HaversineDistanceProvider, StaticFuelStopProvider, StaticRestAreaProvider};
use planner_core::store::PlanStore;
use planner_store::SqlitePlanStore;

use config::ServiceConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PlanStore>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info,sqlx=warn".into()),
        )
        .init();

    let config = ServiceConfig::load_or_default("config.yaml");
    tracing::info!(database_url = %config.database_url, "loaded configuration");

    let store = SqlitePlanStore::connect(&config.database_url)
        .await
        .expect("failed to connect to plan store");

    let distance_provider = HaversineDistanceProvider::new();
    let rest_area_provider = StaticRestAreaProvider::new();
    let fuel_stop_provider = StaticFuelStopProvider::new(4.25, config.engine.fuel_station_search_radius_mi);

    if let Err(err) = demo::run(
        &config.engine,
        &config.demo,
        &distance_provider,
        &rest_area_provider,
        &fuel_stop_provider,
        &store,
    )
    .await
    {
        tracing::error!(error = %err, kind = err.kind(), "seed scenario failed");
    }

    let state = AppState { store: Arc::new(store) };

    let cors_layer = if config.cors_permissive {
        tracing::warn!("CORS: permissive mode explicitly enabled (all origins allowed) - do not use in production");
        CorsLayer::permissive()
    } else if !config.cors_origins.is_empty() {
        let origins = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(origins)
    } else {
        tracing::warn!("CORS: no origins configured and permissive mode disabled - all cross-origin requests will be rejected");
        CorsLayer::new()
    };

    let app = Router::new().merge(api::router(state)).layer(TraceLayer::new_for_http()).layer(cors_layer);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .expect("failed to bind health-check listener");
    tracing::info!(address = %config.bind_address, "serving health-check endpoint");
    axum::serve(listener, app).await.expect("health-check server error");
}
