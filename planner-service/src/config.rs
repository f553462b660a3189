//! Process-wide service configuration: the tuning table from
//! `planner-core::EngineConfig`, storage and transport settings, and a
//! literal demo scenario for the seed runner. Loaded once at startup from
//! YAML (`serde_yaml`).

use std::path::Path;

use serde::Deserialize;

use planner_core::config::EngineConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// `sqlx` connection string for the plan store, e.g. `sqlite://data.db`.
    pub database_url: String,
    /// Allowed CORS origins for the health-check surface. Required unless
    /// `cors_permissive` is true.
    pub cors_origins: Vec<String>,
    /// Explicitly allow all origins (development only).
    pub cors_permissive: bool,
    /// HTTP bind address for the health-check surface.
    pub bind_address: String,
    /// FMCSA/HOS tuning table.
    pub engine: EngineConfig,
    /// Literal scenario the seed runner drives end to end at startup.
    pub demo: DemoScenario,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://planner.db?mode=rwc".to_string(),
            cors_origins: Vec::new(),
            cors_permissive: false,
            bind_address: "0.0.0.0:3000".to_string(),
            engine: EngineConfig::default(),
            demo: DemoScenario::default(),
        }
    }
}

/// A driver/vehicle/stop-list the seed runner plans and then perturbs with
/// one dynamic trigger, so startup always exercises the full planning path
/// against a real store, not just unit tests.
#[derive(Debug, Clone, Deserialize)]
pub struct DemoScenario {
    pub driver_id: String,
    pub vehicle_id: String,
    pub hours_driven: f64,
    pub on_duty_time: f64,
    pub hours_since_break: f64,
    pub fuel_capacity_gal: f64,
    pub current_fuel_gal: f64,
    pub mpg: f64,
    pub stops: Vec<DemoStop>,
    /// Minutes of traffic delay injected after the initial plan is drafted,
    /// to exercise `DynamicUpdateHandler` against the seeded plan.
    pub injected_delay_minutes: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemoStop {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub is_origin: bool,
    #[serde(default)]
    pub is_destination: bool,
    #[serde(default)]
    pub estimated_dock_hours: f64,
}

impl Default for DemoScenario {
    fn default() -> Self {
        Self {
            driver_id: "drv-demo-1".to_string(),
            vehicle_id: "veh-demo-1".to_string(),
            hours_driven: 0.0,
            on_duty_time: 0.0,
            hours_since_break: 0.0,
            fuel_capacity_gal: 200.0,
            current_fuel_gal: 180.0,
            mpg: 6.5,
            stops: vec![
                DemoStop {
                    id: "origin".to_string(),
                    name: "Omaha Distribution Center".to_string(),
                    lat: 41.2565,
                    lon: -95.9345,
                    is_origin: true,
                    is_destination: false,
                    estimated_dock_hours: 0.0,
                },
                DemoStop {
                    id: "customer-1".to_string(),
                    name: "Denver Customer Dock".to_string(),
                    lat: 39.7392,
                    lon: -104.9903,
                    is_origin: false,
                    is_destination: false,
                    estimated_dock_hours: 1.5,
                },
                DemoStop {
                    id: "dest".to_string(),
                    name: "Salt Lake City Warehouse".to_string(),
                    lat: 40.7608,
                    lon: -111.8910,
                    is_origin: false,
                    is_destination: true,
                    estimated_dock_hours: 0.0,
                },
            ],
            injected_delay_minutes: 90,
        }
    }
}

impl ServiceConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read(e.to_string()))?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Falls back to defaults when no config file is present — a fresh
    /// checkout should still run the seed scenario with zero setup.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(cfg) => cfg,
            Err(ConfigError::Read(_)) => {
                tracing::info!(path = %path.as_ref().display(), "no config file found, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse config file, using defaults");
                Self::default()
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(String),
    #[error("failed to parse config: {0}")]
    Parse(String),
}
