//! Orchestrates the replan protocol: given a classified trigger against a
//! known plan, decides `NO_ACTION` / `UPDATE_ETAS` / `REPLAN` and, for a
//! replan, re-invokes the planning engine and commits the result as the
//! next version of the *same* plan.

use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::concurrency::DriverLockRegistry;
use crate::engine::{PlanRequest, PlanningEngine};
use crate::error::{PlannerError, PlannerResult};
use crate::store::PlanStore;
use crate::types::{
    HosState, ImpactSummary, OptimizationPriority, PlanStatus, PlanUpdate, RoutePlan, SegmentStatus, Stop, Trigger, TriggerPriority,
    VehicleState,
};

use super::{decide, ReplanAction};

/// A classified trigger ready to be adjudicated against a specific plan.
/// `remaining_stops` is the tail of the current itinerary re-derived by the
/// caller — richer than what `RouteSegment` retains, so it isn't
/// reconstructed here.
pub struct UpdateRequest<'a> {
    pub plan_id: &'a str,
    pub trigger: Trigger,
    pub priority: TriggerPriority,
    pub reason: String,
    pub triggered_by: &'a str,
    pub impact_hours: f64,
    pub remaining_stops: Vec<Stop>,
    pub vehicle_state: VehicleState,
    pub optimization_priority: OptimizationPriority,
}

/// Result of adjudicating one `UpdateRequest`.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    NoAction(PlanUpdate),
    EtasUpdated(PlanUpdate),
    Replanned { update: PlanUpdate, plan: RoutePlan },
}

/// Consumes existing plans and re-invokes the planning engine.
///
/// `locks` serializes replans per `driver_id` (spec §5): at most one replan
/// may be in flight for a given driver, and concurrent triggers for the
/// same driver are applied in arrival order. `locks` is expected to be the
/// same `DriverLockRegistry` shared across every concurrently-running
/// handler for the life of the process, not a fresh one per request.
pub struct DynamicUpdateHandler<'a> {
    engine: &'a PlanningEngine<'a>,
    store: &'a dyn PlanStore,
    locks: &'a DriverLockRegistry,
    high_priority_replan_threshold_h: f64,
    replan_lock_wait_deadline_s: f64,
}

impl<'a> DynamicUpdateHandler<'a> {
    pub fn new(
        engine: &'a PlanningEngine<'a>,
        store: &'a dyn PlanStore,
        locks: &'a DriverLockRegistry,
        high_priority_replan_threshold_h: f64,
        replan_lock_wait_deadline_s: f64,
    ) -> Self {
        Self { engine, store, locks, high_priority_replan_threshold_h, replan_lock_wait_deadline_s }
    }

    pub async fn handle(&self, request: UpdateRequest<'_>) -> PlannerResult<UpdateOutcome> {
        let plan = self
            .store
            .get_plan(request.plan_id)
            .await?
            .ok_or_else(|| PlannerError::store_precondition_failure(format!("no such plan: {}", request.plan_id)))?;

        // Serialize per driver: a second trigger for the same driver queues
        // behind this one rather than racing it to the store.
        let _driver_lock = self.locks.acquire(&plan.driver_id, Duration::from_secs_f64(self.replan_lock_wait_deadline_s)).await?;

        let action = decide(request.priority, &request.trigger, request.impact_hours, self.high_priority_replan_threshold_h);

        let base_update = PlanUpdate {
            update_id: Uuid::new_v4().to_string(),
            plan_id: plan.plan_id.clone(),
            trigger: request.trigger.clone(),
            triggered_at: Utc::now(),
            triggered_by: request.triggered_by.to_string(),
            replan_triggered: false,
            replan_reason: None,
            previous_version: plan.version,
            new_version: None,
            impact_summary: ImpactSummary {
                total_eta_change_hours: request.impact_hours,
                segments_added: 0,
                segments_removed: 0,
                trigger_descriptions: vec![request.reason.clone()],
            },
        };

        match action {
            ReplanAction::NoAction => {
                self.store.append_update(base_update.clone()).await?;
                Ok(UpdateOutcome::NoAction(base_update))
            }
            ReplanAction::UpdateEtas => {
                self.store.append_update(base_update.clone()).await?;
                Ok(UpdateOutcome::EtasUpdated(base_update))
            }
            ReplanAction::Replan => self.replan(plan, request, base_update).await,
        }
    }

    async fn replan(&self, plan: RoutePlan, request: UpdateRequest<'_>, mut update: PlanUpdate) -> PlannerResult<UpdateOutcome> {
        let current_hos = match self.store.current_segment(&plan.plan_id).await? {
            Some(seg) => seg.hos_state_after,
            None => HosState::ZERO,
        };
        let (driver_state, vehicle_state) = apply_trigger_mutation(&request.trigger, current_hos, request.vehicle_state);

        let plan_request = PlanRequest {
            driver_id: &plan.driver_id,
            vehicle_id: &plan.vehicle_id,
            load_id: plan.load_id.as_deref(),
            driver_state,
            vehicle_state,
            stops: request.remaining_stops,
            optimization_priority: request.optimization_priority,
        };
        let mut new_plan = self.engine.build_plan(plan_request).await?;

        // Same plan lineage: keep the id, bump the version, preserve status.
        new_plan.plan_id = plan.plan_id.clone();
        new_plan.version = plan.version + 1;
        new_plan.is_active = plan.is_active;
        new_plan.status = plan.status;

        let cancelled = plan.segments.iter().filter(|s| s.status == SegmentStatus::Planned).count() as u32;
        for seg in plan.segments.iter().filter(|s| s.status == SegmentStatus::Planned) {
            self.store.set_segment_status(&plan.plan_id, seg.sequence_order, SegmentStatus::Cancelled).await?;
        }
        for seg in new_plan.segments.clone() {
            self.store.append_segment(&plan.plan_id, seg).await?;
        }

        let persisted = self.store.update_plan(new_plan).await?;

        update.replan_triggered = true;
        update.replan_reason = Some(request.reason);
        update.new_version = Some(persisted.version);
        update.impact_summary.segments_added = persisted.segments.len() as u32;
        update.impact_summary.segments_removed = cancelled;

        self.store.append_update(update.clone()).await?;

        Ok(UpdateOutcome::Replanned { update, plan: persisted })
    }
}

/// Applies the driver/vehicle state mutation a trigger implies before
/// re-invoking the planning engine. Triggers that don't name a state
/// effect leave both states untouched.
fn apply_trigger_mutation(trigger: &Trigger, hos: HosState, vehicle: VehicleState) -> (HosState, VehicleState) {
    match trigger {
        Trigger::DockTimeChange { estimated_hours, actual_hours, .. } => {
            let variance = (actual_hours - estimated_hours).max(0.0);
            (hos.after_on_duty(variance), vehicle)
        }
        Trigger::DriverRestRequest { .. }
        | Trigger::HosViolationDrive { .. }
        | Trigger::HosViolationDuty { .. }
        | Trigger::HosViolationBreak { .. } => (HosState::after_full_rest(), vehicle),
        Trigger::FuelLow { fuel_available_gal, .. } => {
            let current_fuel_gal = fuel_available_gal.min(vehicle.fuel_capacity_gal);
            (hos, VehicleState { current_fuel_gal, ..vehicle })
        }
        _ => (hos, vehicle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::providers::{FuelStopProvider, FuelStopQuote, HaversineDistanceProvider, RestAreaProvider, RestStopLocation};
    use crate::types::{ComplianceReport, PlanUpdate, RouteSegment, SegmentDetail, SegmentStatus, Stop, StopKind};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct NoRestAreas;
    #[async_trait]
    impl RestAreaProvider for NoRestAreas {
        async fn find_along_route(&self, _a: &Stop, _b: &Stop) -> PlannerResult<Option<RestStopLocation>> {
            Ok(None)
        }
        async fn find_near(&self, _lat: f64, _lon: f64, _radius_mi: f64) -> PlannerResult<Vec<RestStopLocation>> {
            Ok(vec![])
        }
    }

    struct NoFuelStops;
    #[async_trait]
    impl FuelStopProvider for NoFuelStops {
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
    struct RecordingStore {
        plans: Mutex<Vec<RoutePlan>>,
        updates: Mutex<Vec<PlanUpdate>>,
    }

    #[async_trait]
    impl PlanStore for RecordingStore {
        async fn create_plan(&self, plan: RoutePlan) -> PlannerResult<RoutePlan> {
            self.plans.lock().unwrap().push(plan.clone());
            Ok(plan)
        }
        async fn update_plan(&self, plan: RoutePlan) -> PlannerResult<RoutePlan> {
            let mut plans = self.plans.lock().unwrap();
            if let Some(existing) = plans.iter_mut().find(|p| p.plan_id == plan.plan_id) {
                *existing = plan.clone();
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
        async fn append_update(&self, update: PlanUpdate) -> PlannerResult<()> {
            self.updates.lock().unwrap().push(update);
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

    fn seed_plan(plan_id: &str) -> RoutePlan {
        RoutePlan {
            plan_id: plan_id.to_string(),
            driver_id: "drv-1".to_string(),
            vehicle_id: "veh-1".to_string(),
            load_id: None,
            version: 1,
            is_active: true,
            status: PlanStatus::Active,
            total_distance_miles: 10.0,
            total_drive_time_h: 0.2,
            total_on_duty_time_h: 0.2,
            total_cost_estimate: 10.0,
            is_feasible: true,
            feasibility_issues: vec![],
            compliance_report: ComplianceReport {
                max_drive_hours_used: 0.2,
                max_duty_hours_used: 0.2,
                breaks_required: 0,
                breaks_planned: 0,
                violations: vec![],
            },
            optimization_priority: OptimizationPriority::Balance,
            segments: vec![RouteSegment::new(
                1,
                SegmentDetail::Drive { distance_miles: 10.0, drive_time_h: 0.2, from: "origin".into(), to: "dest".into() },
                HosState::new(0.2, 0.2, 0.2).unwrap(),
                Utc::now(),
                Utc::now(),
            )],
        }
    }

    #[tokio::test]
    async fn low_priority_trigger_takes_no_action_and_does_not_touch_the_plan() {
        let cfg = EngineConfig::default();
        let distance = HaversineDistanceProvider::new();
        let rest_area = NoRestAreas;
        let fuel = NoFuelStops;
        let store = RecordingStore::default();
        store.plans.lock().unwrap().push(seed_plan("plan-1"));
        let engine = PlanningEngine::new(&cfg, &distance, &rest_area, &fuel, &store);
        let locks = DriverLockRegistry::new();
        let handler = DynamicUpdateHandler::new(&engine, &store, &locks, cfg.high_priority_replan_threshold_h, cfg.replan_lock_wait_deadline_s);

        let request = UpdateRequest {
            plan_id: "plan-1",
            trigger: Trigger::SpeedDeviation { expected_mph: 55.0, actual_mph: 50.0 },
            priority: TriggerPriority::Low,
            reason: "speed within tolerance".into(),
            triggered_by: "telemetry".into(),
            impact_hours: 0.0,
            remaining_stops: vec![],
            vehicle_state: VehicleState::new(200.0, 150.0, 6.5).unwrap(),
            optimization_priority: OptimizationPriority::Balance,
        };

        let outcome = handler.handle(request).await.unwrap();
        assert!(matches!(outcome, UpdateOutcome::NoAction(_)));
        assert_eq!(store.plans.lock().unwrap()[0].version, 1);
    }

    #[tokio::test]
    async fn critical_trigger_replans_and_bumps_the_same_plan_version() {
        let cfg = EngineConfig::default();
        let distance = HaversineDistanceProvider::new();
        let rest_area = NoRestAreas;
        let fuel = NoFuelStops;
        let store = RecordingStore::default();
        store.plans.lock().unwrap().push(seed_plan("plan-1"));
        let engine = PlanningEngine::new(&cfg, &distance, &rest_area, &fuel, &store);
        let locks = DriverLockRegistry::new();
        let handler = DynamicUpdateHandler::new(&engine, &store, &locks, cfg.high_priority_replan_threshold_h, cfg.replan_lock_wait_deadline_s);

        let request = UpdateRequest {
            plan_id: "plan-1",
            trigger: Trigger::DockUnavailable { stop_id: "dest".into() },
            priority: TriggerPriority::Critical,
            reason: "dock closed, rerouting".into(),
            triggered_by: "dispatch".into(),
            impact_hours: 2.0,
            remaining_stops: vec![stop("origin", 0.0, 0.0).as_origin(), stop("dest", 0.2, 0.0).as_destination()],
            vehicle_state: VehicleState::new(200.0, 150.0, 6.5).unwrap(),
            optimization_priority: OptimizationPriority::Balance,
        };

        let outcome = handler.handle(request).await.unwrap();
        match outcome {
            UpdateOutcome::Replanned { update, plan } => {
                assert_eq!(plan.plan_id, "plan-1");
                assert_eq!(plan.version, 2);
                assert_eq!(update.previous_version, 1);
                assert_eq!(update.new_version, Some(2));
                assert!(update.replan_triggered);
            }
            other => panic!("expected a replan, got {other:?}"),
        }
        assert_eq!(store.plans.lock().unwrap()[0].version, 2);
    }

    #[tokio::test]
    async fn unknown_plan_is_a_store_precondition_failure() {
        let cfg = EngineConfig::default();
        let distance = HaversineDistanceProvider::new();
        let rest_area = NoRestAreas;
        let fuel = NoFuelStops;
        let store = RecordingStore::default();
        let engine = PlanningEngine::new(&cfg, &distance, &rest_area, &fuel, &store);
        let locks = DriverLockRegistry::new();
        let handler = DynamicUpdateHandler::new(&engine, &store, &locks, cfg.high_priority_replan_threshold_h, cfg.replan_lock_wait_deadline_s);

        let request = UpdateRequest {
            plan_id: "missing",
            trigger: Trigger::SpeedDeviation { expected_mph: 55.0, actual_mph: 50.0 },
            priority: TriggerPriority::Low,
            reason: "n/a".into(),
            triggered_by: "telemetry".into(),
            impact_hours: 0.0,
            remaining_stops: vec![],
            vehicle_state: VehicleState::new(200.0, 150.0, 6.5).unwrap(),
            optimization_priority: OptimizationPriority::Balance,
        };

        let result = handler.handle(request).await;
        assert!(matches!(result, Err(PlannerError::StorePreconditionFailure(_))));
    }
}
