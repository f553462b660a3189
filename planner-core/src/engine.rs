//! Orchestration glue: builds the distance matrix, sequences stops,
//! simulates the route, and assembles/persists a `RoutePlan`.

use std::time::Duration;

use chrono::Utc;
use futures::future::try_join_all;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{PlannerError, PlannerResult};
use crate::providers::{call_with_retry, DistanceProvider, FuelStopProvider, RestAreaProvider};
use crate::simulator::RouteSimulator;
use crate::store::PlanStore;
use crate::tsp::{DistanceMatrix, TspSequencer};
use crate::types::{HosState, OptimizationPriority, PlanStatus, RoutePlan, Stop, VehicleState};

/// A request to produce a new plan.
pub struct PlanRequest<'a> {
    pub driver_id: &'a str,
    pub vehicle_id: &'a str,
    pub load_id: Option<&'a str>,
    pub driver_state: HosState,
    pub vehicle_state: VehicleState,
    pub stops: Vec<Stop>,
    pub optimization_priority: OptimizationPriority,
}

impl<'a> PlanRequest<'a> {
    fn validate(&self) -> PlannerResult<()> {
        if self.stops.len() < 2 {
            return Err(PlannerError::invalid_input("a plan request requires at least 2 stops"));
        }
        let origin_count = self.stops.iter().filter(|s| s.is_origin).count();
        if origin_count != 1 {
            return Err(PlannerError::invalid_input(format!(
                "exactly one origin stop is required, found {origin_count}"
            )));
        }
        let destination_count = self.stops.iter().filter(|s| s.is_destination).count();
        if destination_count > 1 {
            return Err(PlannerError::invalid_input(format!(
                "at most one destination stop is allowed, found {destination_count}"
            )));
        }
        Ok(())
    }
}

/// Composes the leaf subsystems (providers, TSP sequencer, route simulator)
/// into the single `plan_route` operation, then persists the result.
pub struct PlanningEngine<'a> {
    cfg: &'a EngineConfig,
    distance_provider: &'a dyn DistanceProvider,
    rest_area_provider: &'a dyn RestAreaProvider,
    fuel_stop_provider: &'a dyn FuelStopProvider,
    store: &'a dyn PlanStore,
}

impl<'a> PlanningEngine<'a> {
    pub fn new(
        cfg: &'a EngineConfig,
        distance_provider: &'a dyn DistanceProvider,
        rest_area_provider: &'a dyn RestAreaProvider,
        fuel_stop_provider: &'a dyn FuelStopProvider,
        store: &'a dyn PlanStore,
    ) -> Self {
        Self { cfg, distance_provider, rest_area_provider, fuel_stop_provider, store }
    }

    /// Builds the full pairwise distance matrix for `stops` by calling the
    /// distance provider for every ordered pair. Pairs are fetched
    /// concurrently — this is purely I/O-bound.
    async fn build_distance_matrix(&self, stops: &[Stop]) -> PlannerResult<DistanceMatrix> {
        let mut pairs = Vec::new();
        for (i, a) in stops.iter().enumerate() {
            for b in &stops[i + 1..] {
                pairs.push((a, b));
            }
        }

        let timeout = Duration::from_secs_f64(self.cfg.distance_provider_timeout_s);
        let backoff = Duration::from_millis(self.cfg.provider_retry_backoff_ms);
        let distances = try_join_all(pairs.iter().map(|(a, b)| async move {
            call_with_retry("distance_provider.distance", timeout, backoff, || self.distance_provider.distance(a, b))
                .await
                .map(|miles| (a.id.clone(), b.id.clone(), miles))
        }))
        .await?;

        let mut matrix = DistanceMatrix::new();
        for (a_id, b_id, miles) in distances {
            matrix.insert(&a_id, &b_id, miles);
        }
        Ok(matrix)
    }

    /// Runs TSP sequencing + route simulation and assembles a `RoutePlan`
    /// without persisting it. Used both by `plan_route` and by the dynamic
    /// update handler, which persists a replan onto an existing plan's
    /// lineage rather than as a fresh row.
    pub async fn build_plan(&self, request: PlanRequest<'_>) -> PlannerResult<RoutePlan> {
        request.validate()?;

        let matrix = self.build_distance_matrix(&request.stops).await?;

        let sequencer = TspSequencer::new(self.cfg);
        let sequence = sequencer.sequence(&request.stops, &matrix);

        let simulator = RouteSimulator::new(self.cfg);
        let outcome = simulator
            .simulate(
                &sequence,
                request.driver_state,
                request.vehicle_state,
                Utc::now(),
                &matrix,
                self.distance_provider,
                self.rest_area_provider,
                self.fuel_stop_provider,
            )
            .await?;

        let feasibility_issues = outcome.compliance_report.violations.clone();

        Ok(RoutePlan {
            plan_id: Uuid::new_v4().to_string(),
            driver_id: request.driver_id.to_string(),
            vehicle_id: request.vehicle_id.to_string(),
            load_id: request.load_id.map(|s| s.to_string()),
            version: 1,
            is_active: false,
            status: PlanStatus::Draft,
            total_distance_miles: outcome.total_distance_miles,
            total_drive_time_h: outcome.total_drive_time_h,
            total_on_duty_time_h: outcome.total_on_duty_time_h,
            total_cost_estimate: outcome.total_cost_estimate,
            is_feasible: outcome.is_feasible,
            feasibility_issues,
            compliance_report: outcome.compliance_report,
            optimization_priority: request.optimization_priority,
            segments: outcome.segments,
        })
    }

    /// Runs the full planning pipeline and returns a persisted `draft` plan.
    pub async fn plan_route(&self, request: PlanRequest<'_>) -> PlannerResult<RoutePlan> {
        let plan = self.build_plan(request).await?;
        self.store.create_plan(plan).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{FuelStopProvider, FuelStopQuote, HaversineDistanceProvider, RestAreaProvider, RestStopLocation};
    use crate::types::{PlanUpdate, RouteSegment, SegmentStatus, StopKind};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct AlwaysFindsRestArea;

    #[async_trait]
    impl RestAreaProvider for AlwaysFindsRestArea {
        async fn find_along_route(&self, a: &Stop, _b: &Stop) -> PlannerResult<Option<RestStopLocation>> {
            Ok(Some(RestStopLocation {
                stop_id: "rest-1".into(),
                name: format!("Rest area near {}", a.id),
                lat: a.lat,
                lon: a.lon,
                amenities: vec!["parking".into()],
                distance_from_point_mi: 5.0,
            }))
        }
        async fn find_near(&self, _lat: f64, _lon: f64, _radius_mi: f64) -> PlannerResult<Vec<RestStopLocation>> {
            Ok(vec![])
        }
    }

    struct NeverNeedsFuel;

    #[async_trait]
    impl FuelStopProvider for NeverNeedsFuel {
        async fn optimize(
            &self,
            _from: &Stop,
            _to: &Stop,
            _current_fuel_gal: f64,
            _capacity_gal: f64,
            _mpg: f64,
        ) -> PlannerResult<Option<FuelStopQuote>> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct InMemoryStore {
        plans: Mutex<Vec<RoutePlan>>,
    }

    #[async_trait]
    impl PlanStore for InMemoryStore {
        async fn create_plan(&self, plan: RoutePlan) -> PlannerResult<RoutePlan> {
            self.plans.lock().unwrap().push(plan.clone());
            Ok(plan)
        }
        async fn update_plan(&self, plan: RoutePlan) -> PlannerResult<RoutePlan> {
            let mut plans = self.plans.lock().unwrap();
            if let Some(existing) = plans.iter_mut().find(|p| p.plan_id == plan.plan_id) {
                *existing = plan.clone();
            } else {
                plans.push(plan.clone());
            }
            Ok(plan)
        }
        async fn get_plan(&self, plan_id: &str) -> PlannerResult<Option<RoutePlan>> {
            Ok(self.plans.lock().unwrap().iter().find(|p| p.plan_id == plan_id).cloned())
        }
        async fn activate(&self, _plan_id: &str) -> PlannerResult<()> {
            Ok(())
        }
        async fn complete(&self, _plan_id: &str) -> PlannerResult<()> {
            Ok(())
        }
        async fn cancel(&self, _plan_id: &str) -> PlannerResult<()> {
            Ok(())
        }
        async fn append_segment(&self, _plan_id: &str, _segment: RouteSegment) -> PlannerResult<()> {
            Ok(())
        }
        async fn set_segment_status(&self, _plan_id: &str, _sequence_order: u32, _status: SegmentStatus) -> PlannerResult<()> {
            Ok(())
        }
        async fn append_update(&self, _update: PlanUpdate) -> PlannerResult<()> {
            Ok(())
        }
        async fn current_segment(&self, _plan_id: &str) -> PlannerResult<Option<RouteSegment>> {
            Ok(None)
        }
        async fn remaining_segments(&self, _plan_id: &str) -> PlannerResult<Vec<RouteSegment>> {
            Ok(vec![])
        }
        async fn active_plan_for_driver(&self, _driver_id: &str) -> PlannerResult<Option<RoutePlan>> {
            Ok(None)
        }
    }

    fn stop(id: &str, lat: f64, lon: f64) -> Stop {
        Stop::new(id, id, lat, lon, StopKind::Customer)
    }

    #[tokio::test]
    async fn plan_route_rejects_missing_origin() {
        let cfg = EngineConfig::default();
        let distance = HaversineDistanceProvider::new();
        let rest_area = AlwaysFindsRestArea;
        let fuel = NeverNeedsFuel;
        let store = InMemoryStore::default();
        let engine = PlanningEngine::new(&cfg, &distance, &rest_area, &fuel, &store);

        let request = PlanRequest {
            driver_id: "drv-1",
            vehicle_id: "veh-1",
            load_id: None,
            driver_state: HosState::new(0.0, 0.0, 0.0).unwrap(),
            vehicle_state: VehicleState::new(300.0, 300.0, 6.5).unwrap(),
            stops: vec![stop("a", 0.0, 0.0), stop("b", 1.0, 1.0)],
            optimization_priority: OptimizationPriority::Balance,
        };

        let result = engine.plan_route(request).await;
        assert!(matches!(result, Err(PlannerError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn plan_route_produces_a_draft_plan() {
        let cfg = EngineConfig::default();
        let distance = HaversineDistanceProvider::new();
        let rest_area = AlwaysFindsRestArea;
        let fuel = NeverNeedsFuel;
        let store = InMemoryStore::default();
        let engine = PlanningEngine::new(&cfg, &distance, &rest_area, &fuel, &store);

        let request = PlanRequest {
            driver_id: "drv-1",
            vehicle_id: "veh-1",
            load_id: None,
            driver_state: HosState::new(0.0, 0.0, 0.0).unwrap(),
            vehicle_state: VehicleState::new(300.0, 300.0, 6.5).unwrap(),
            stops: vec![stop("origin", 0.0, 0.0).as_origin(), stop("dest", 0.2, 0.0).as_destination()],
            optimization_priority: OptimizationPriority::Balance,
        };

        let plan = engine.plan_route(request).await.unwrap();
        assert_eq!(plan.version, 1);
        assert_eq!(plan.status, PlanStatus::Draft);
        assert!(!plan.is_active);
        assert!(!plan.segments.is_empty());
        assert_eq!(store.plans.lock().unwrap().len(), 1);
    }
}
