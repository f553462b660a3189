//! Pluggable collaborators consumed by the core. All calls are async — the
//! only suspension points in the engine — and side-effect-free, so
//! concurrent calls across drivers are always safe.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{PlannerError, PlannerResult};
use crate::types::Stop;

/// Calls `f`, cancelling it if it doesn't return within `timeout`. A
/// timed-out or failed first attempt is retried once after `backoff`
/// (spec §7's `ProviderFailure` path); a second failure collapses into
/// `InsufficientData`, since by that point the caller has exhausted the
/// documented retry budget and the simulator's job is to record a
/// feasibility issue and carry on, not to keep retrying indefinitely.
pub async fn call_with_retry<T, F, Fut>(operation: &str, timeout: Duration, backoff: Duration, mut f: F) -> PlannerResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PlannerResult<T>>,
{
    async fn attempt<T>(timeout: Duration, fut: impl Future<Output = PlannerResult<T>>) -> PlannerResult<T> {
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(PlannerError::provider_failure("provider call timed out")),
        }
    }

    match attempt(timeout, f()).await {
        Ok(v) => Ok(v),
        Err(first_err) => {
            warn!(operation, error = %first_err, "provider call failed, retrying once after backoff");
            tokio::time::sleep(backoff).await;
            attempt(timeout, f()).await.map_err(|e| PlannerError::insufficient_data(format!("{operation} failed after retry: {e}")))
        }
    }
}

/// Road class used to pick an average speed when none is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadClass {
    Highway,
    Interstate,
    City,
    Unspecified,
}

impl RoadClass {
    /// Average speed in mph: highway 50, interstate 60, city 30, default 55
    /// if unspecified.
    pub fn avg_speed_mph(&self) -> f64 {
        match self {
            RoadClass::Highway => 50.0,
            RoadClass::Interstate => 60.0,
            RoadClass::City => 30.0,
            RoadClass::Unspecified => 55.0,
        }
    }
}

/// Source of pairwise distances and drive times between stops.
#[async_trait]
pub trait DistanceProvider: Send + Sync {
    async fn distance(&self, from: &Stop, to: &Stop) -> PlannerResult<f64>;

    /// Drive time in hours for `miles` at the average speed of `road_class`.
    fn drive_time(&self, miles: f64, road_class: RoadClass) -> f64 {
        miles / road_class.avg_speed_mph()
    }
}

/// A candidate rest-area / truck-stop location returned by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RestStopLocation {
    pub stop_id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub amenities: Vec<String>,
    pub distance_from_point_mi: f64,
}

#[async_trait]
pub trait RestAreaProvider: Send + Sync {
    async fn find_along_route(&self, a: &Stop, b: &Stop) -> PlannerResult<Option<RestStopLocation>>;
    async fn find_near(&self, lat: f64, lon: f64, radius_mi: f64) -> PlannerResult<Vec<RestStopLocation>>;
}

/// Result of a fuel-stop optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct FuelStopQuote {
    pub station: String,
    pub gallons_needed: f64,
    pub estimated_cost: f64,
}

#[async_trait]
pub trait FuelStopProvider: Send + Sync {
    async fn optimize(
        &self,
        from: &Stop,
        to: &Stop,
        current_fuel_gal: f64,
        capacity_gal: f64,
        mpg: f64,
    ) -> PlannerResult<Option<FuelStopQuote>>;
}

/// Great-circle distance in miles, scaled by a road-factor to roughly
/// approximate real road distance (default: Haversine × 1.2).
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_MI: f64 = 3958.8;
    let (lat1r, lat2r) = (lat1.to_radians(), lat2.to_radians());
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2) + lat1r.cos() * lat2r.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_MI * c
}

/// Default `DistanceProvider`: Haversine great-circle distance with a 1.2x
/// road factor.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineDistanceProvider {
    pub road_factor: f64,
}

impl HaversineDistanceProvider {
    pub fn new() -> Self {
        Self { road_factor: 1.2 }
    }
}

#[async_trait]
impl DistanceProvider for HaversineDistanceProvider {
    async fn distance(&self, from: &Stop, to: &Stop) -> PlannerResult<f64> {
        Ok(haversine_miles(from.lat, from.lon, to.lat, to.lon) * self.road_factor)
    }
}

/// Default `RestAreaProvider`: a small hardcoded catalog of truck stops,
/// intended to be replaced by a real API integration.
#[derive(Debug, Clone)]
pub struct StaticRestAreaProvider {
    catalog: Vec<RestStopLocation>,
}

impl StaticRestAreaProvider {
    pub fn new() -> Self {
        let entry = |stop_id: &str, name: &str, lat: f64, lon: f64, amenities: &[&str]| RestStopLocation {
            stop_id: stop_id.to_string(),
            name: name.to_string(),
            lat,
            lon,
            amenities: amenities.iter().map(|s| s.to_string()).collect(),
            distance_from_point_mi: 0.0,
        };
        Self {
            catalog: vec![
                entry(
                    "ts_i80_exit_123",
                    "Pilot Travel Center - I-80 Exit 123",
                    41.2565,
                    -95.9345,
                    &["parking", "fuel", "food", "showers", "laundry"],
                ),
                entry(
                    "ts_i80_exit_145",
                    "Love's Travel Stop - I-80 Exit 145",
                    41.1234,
                    -96.1234,
                    &["parking", "fuel", "food"],
                ),
                entry(
                    "ts_i5_exit_200",
                    "TA Travel Center - I-5 Exit 200",
                    34.0522,
                    -118.2437,
                    &["parking", "fuel", "food", "showers", "truck_wash"],
                ),
                entry(
                    "ts_i95_exit_50",
                    "Petro Stopping Center - I-95 Exit 50",
                    39.7392,
                    -104.9903,
                    &["parking", "fuel", "food", "showers"],
                ),
                entry(
                    "ts_i40_exit_100",
                    "Flying J - I-40 Exit 100",
                    35.4676,
                    -97.5164,
                    &["parking", "fuel", "food", "showers", "wifi"],
                ),
            ],
        }
    }
}

impl Default for StaticRestAreaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RestAreaProvider for StaticRestAreaProvider {
    async fn find_near(&self, lat: f64, lon: f64, radius_mi: f64) -> PlannerResult<Vec<RestStopLocation>> {
        let mut found: Vec<RestStopLocation> = self
            .catalog
            .iter()
            .cloned()
            .map(|mut stop| {
                stop.distance_from_point_mi = haversine_miles(lat, lon, stop.lat, stop.lon);
                stop
            })
            .filter(|stop| stop.distance_from_point_mi <= radius_mi)
            .collect();
        found.sort_by(|a, b| a.distance_from_point_mi.total_cmp(&b.distance_from_point_mi));
        Ok(found)
    }

    async fn find_along_route(&self, a: &Stop, b: &Stop) -> PlannerResult<Option<RestStopLocation>> {
        let mid_lat = (a.lat + b.lat) / 2.0;
        let mid_lon = (a.lon + b.lon) / 2.0;
        let nearby = self.find_near(mid_lat, mid_lon, 25.0).await?;
        Ok(nearby.into_iter().next())
    }
}

/// Default `FuelStopProvider`: cheapest station within a fixed search
/// radius of the leg's origin, at a flat assumed price per gallon.
#[derive(Debug, Clone, Copy)]
pub struct StaticFuelStopProvider {
    pub price_per_gallon: f64,
    pub search_radius_mi: f64,
}

impl StaticFuelStopProvider {
    pub fn new(price_per_gallon: f64, search_radius_mi: f64) -> Self {
        Self { price_per_gallon, search_radius_mi }
    }
}

impl Default for StaticFuelStopProvider {
    fn default() -> Self {
        Self::new(3.85, 30.0)
    }
}

#[async_trait]
impl FuelStopProvider for StaticFuelStopProvider {
    async fn optimize(
        &self,
        from: &Stop,
        _to: &Stop,
        current_fuel_gal: f64,
        capacity_gal: f64,
        _mpg: f64,
    ) -> PlannerResult<Option<FuelStopQuote>> {
        let rest_areas = StaticRestAreaProvider::new();
        let nearby = rest_areas.find_near(from.lat, from.lon, self.search_radius_mi).await?;
        let Some(station) = nearby.into_iter().find(|s| s.amenities.iter().any(|a| a == "fuel")) else {
            return Ok(None);
        };
        let gallons_needed = (capacity_gal - current_fuel_gal).max(0.0);
        Ok(Some(FuelStopQuote {
            station: station.name,
            gallons_needed,
            estimated_cost: gallons_needed * self.price_per_gallon,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_is_zero_for_identical_points() {
        assert_eq!(haversine_miles(41.0, -95.0, 41.0, -95.0), 0.0);
    }

    #[test]
    fn road_class_defaults_to_fifty_five() {
        assert_eq!(RoadClass::Unspecified.avg_speed_mph(), 55.0);
        assert_eq!(RoadClass::Highway.avg_speed_mph(), 50.0);
    }

    #[tokio::test]
    async fn static_rest_area_provider_finds_stop_along_route() {
        let provider = StaticRestAreaProvider::new();
        let a = Stop::new("a", "A", 41.3, -95.9, crate::types::StopKind::TruckStop);
        let b = Stop::new("b", "B", 41.1, -96.1, crate::types::StopKind::TruckStop);
        let found = provider.find_along_route(&a, &b).await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn static_rest_area_provider_returns_none_when_far_from_catalog() {
        let provider = StaticRestAreaProvider::new();
        let a = Stop::new("a", "A", 0.0, 0.0, crate::types::StopKind::TruckStop);
        let b = Stop::new("b", "B", 0.1, 0.1, crate::types::StopKind::TruckStop);
        let found = provider.find_along_route(&a, &b).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn call_with_retry_succeeds_on_first_try_without_sleeping() {
        let mut calls = 0;
        let result = call_with_retry("test", Duration::from_millis(50), Duration::from_millis(1), || {
            calls += 1;
            async { Ok(42) }
        })
        .await
        .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn call_with_retry_recovers_on_second_attempt() {
        let attempt = std::sync::atomic::AtomicU32::new(0);
        let result = call_with_retry("test", Duration::from_millis(50), Duration::from_millis(1), || {
            let n = attempt.fetch_add(1, std::sync::Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(PlannerError::provider_failure("first attempt down"))
                } else {
                    Ok("recovered")
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(result, "recovered");
    }

    #[tokio::test]
    async fn call_with_retry_collapses_into_insufficient_data_after_two_failures() {
        let result: PlannerResult<()> =
            call_with_retry("test", Duration::from_millis(50), Duration::from_millis(1), || async {
                Err(PlannerError::provider_failure("always down"))
            })
            .await;
        assert!(matches!(result, Err(PlannerError::InsufficientData(_))));
    }
}
