//! Seed runner: wires real providers and a live store together and drives
//! one planning scenario end to end — a draft plan followed by a dynamic
//! replan — so startup exercises the same path the integration tests do,
//! against whatever store the deployment actually configured.

use planner_core::concurrency::DriverLockRegistry;
use planner_core::config::EngineConfig;
use planner_core::dynamic::{DynamicUpdateHandler, UpdateOutcome, UpdateRequest};

use planner_core::engine::{PlanRequest, PlanningEngine};
use planner_core::providers::{DistanceProvider, FuelStopProvider, RestAreaProvider};
use planner_core::store::PlanStore;
use planner_core::types::{HosState, OptimizationPriority, Stop, StopKind, Trigger, TriggerPriority, VehicleState};

use crate::config::DemoScenario;

pub async fn run(
    cfg: &EngineConfig,
    demo: &DemoScenario,
    distance_provider: &dyn DistanceProvider,
    rest_area_provider: &dyn RestAreaProvider,
    fuel_stop_provider: &dyn FuelStopProvider,
    store: &dyn PlanStore,
) -> planner_core::PlannerResult<()> {
    let driver_state = HosState::new(demo.hours_driven, demo.on_duty_time, demo.hours_since_break)?;
    let vehicle_state = VehicleState::new(demo.fuel_capacity_gal, demo.current_fuel_gal, demo.mpg)?;

    let stops: Vec<Stop> = demo
        .stops
        .iter()
        .map(|s| {
            let mut stop = Stop::new(s.id.as_str(), s.name.as_str(), s.lat, s.lon, StopKind::Customer);
            stop.estimated_dock_hours = s.estimated_dock_hours;
            if s.is_origin {
                stop = stop.as_origin();
            }
            if s.is_destination {
                stop = stop.as_destination();
            }
            stop
        })
        .collect();

    let engine = PlanningEngine::new(cfg, distance_provider, rest_area_provider, fuel_stop_provider, store);

    let request = PlanRequest {
        driver_id: &demo.driver_id,
        vehicle_id: &demo.vehicle_id,
        load_id: None,
        driver_state,
        vehicle_state,
        stops: stops.clone(),
        optimization_priority: OptimizationPriority::Balance,
    };

    let plan = engine.plan_route(request).await?;
    tracing::info!(
        plan_id = %plan.plan_id,
        segments = plan.segments.len(),
        miles = plan.total_distance_miles,
        drive_h = plan.total_drive_time_h,
        feasible = plan.is_feasible,
        "seed plan drafted"
    );
    store.activate(&plan.plan_id).await?;

    let update_request = UpdateRequest {
        plan_id: &plan.plan_id,
        trigger: Trigger::TrafficDelay { segment_id: None, delay_minutes: demo.injected_delay_minutes },
        priority: TriggerPriority::High,
        reason: format!("injected {} minute traffic delay", demo.injected_delay_minutes),
        triggered_by: "seed-runner",
        impact_hours: demo.injected_delay_minutes as f64 / 60.0,
        // A traffic delay doesn't change the stop list, so the tail of the
        // itinerary re-derived for the replan is the same origin/destination
        // pair the original plan used.
        remaining_stops: stops,
        vehicle_state,
        optimization_priority: OptimizationPriority::Balance,
    };

    let locks = DriverLockRegistry::new();
    let handler = DynamicUpdateHandler::new(&engine, store, &locks, cfg.high_priority_replan_threshold_h, cfg.replan_lock_wait_deadline_s);
    match handler.handle(update_request).await? {
        UpdateOutcome::NoAction(update) => {
            tracing::info!(update_id = %update.update_id, "injected trigger required no action");
        }
        UpdateOutcome::EtasUpdated(update) => {
            tracing::info!(update_id = %update.update_id, "injected trigger updated ETAs only");
        }
        UpdateOutcome::Replanned { update, plan } => {
            tracing::info!(
                update_id = %update.update_id,
                new_version = plan.version,
                "injected trigger triggered a replan"
            );
        }
    }

    Ok(())
}
