use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopKind {
    Warehouse,
    Customer,
    DistributionCenter,
    TruckStop,
    ServiceArea,
    FuelStation,
}

/// A pickup/delivery/waypoint location. At most one `Stop` in a planning
/// request may have `is_origin = true`, and at most one
/// `is_destination = true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub kind: StopKind,
    #[serde(default)]
    pub is_origin: bool,
    #[serde(default)]
    pub is_destination: bool,
    #[serde(default)]
    pub earliest_arrival: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub latest_arrival: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub estimated_dock_hours: f64,
}

impl Stop {
    pub fn new(id: impl Into<String>, name: impl Into<String>, lat: f64, lon: f64, kind: StopKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lat,
            lon,
            kind,
            is_origin: false,
            is_destination: false,
            earliest_arrival: None,
            latest_arrival: None,
            estimated_dock_hours: 0.0,
        }
    }

    pub fn as_origin(mut self) -> Self {
        self.is_origin = true;
        self
    }

    pub fn as_destination(mut self) -> Self {
        self.is_destination = true;
        self
    }

    pub fn with_dock_hours(mut self, hours: f64) -> Self {
        self.estimated_dock_hours = hours;
        self
    }
}
