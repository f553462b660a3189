//! Classifies runtime events against an active plan and decides whether to
//! replan, update ETAs only, or take no action. Grouped into five
//! categories rather than one flat match: external events, HOS compliance,
//! vehicle/operational, appointment/customer, environmental.

mod appointment_customer;
mod environmental;
mod external_events;
mod hos_compliance;
mod vehicle_operational;

pub use appointment_customer::*;
pub use environmental::*;
pub use external_events::*;
pub use hos_compliance::*;
pub use vehicle_operational::*;

mod replan;
pub use replan::{DynamicUpdateHandler, UpdateOutcome, UpdateRequest};

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::rest::TripRequirement;
use crate::types::{HosState, Trigger, TriggerPriority};

/// A trigger, already classified with its priority and a human-readable
/// reason — the unit every per-category check function produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedTrigger {
    pub trigger: Trigger,
    pub priority: TriggerPriority,
    pub reason: String,
}

/// Raw event data as a caller (the out-of-scope HTTP/API layer) would
/// supply it for `UpdatePlan`'s `update_type` + `update_data` pair — one
/// variant per trigger kind, carrying exactly the inputs that kind's check
/// function needs. This is the unclassified counterpart to `Trigger`: it
/// has no `priority` yet, only the raw facts a trigger check runs against.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerInput {
    TrafficDelay { segment_id: Option<String>, delay_minutes: u32 },
    DockTimeChange { segment_id: Option<String>, estimated_hours: f64, actual_hours: f64 },
    LoadAdded { stop_id: Option<String> },
    LoadCancelled { stop_id: Option<String> },
    DriverRestRequest { location: Option<String>, reason: Option<String> },
    HosApproachingLimits { remaining_route: Vec<TripRequirement> },
    HosViolation,
    RestDurationChanged { planned_hours: f64, actual_hours: f64 },
    FuelLow { fuel_available_gal: f64, fuel_needed_gal: f64, tank_capacity_gal: f64 },
    SpeedDeviation { expected_mph: f64, actual_mph: f64 },
    AppointmentChanged {
        stop_id: Option<String>,
        old_appointment: Option<chrono::DateTime<chrono::Utc>>,
        new_appointment: Option<chrono::DateTime<chrono::Utc>>,
    },
    DockUnavailable { stop_id: String },
    WeatherConditions,
    WeighStationDelay,
}

/// Classifies one raw `TriggerInput` against the driver's current HOS
/// state, dispatching to the category check function that owns this
/// trigger kind (spec §4.6's five-category grouping). Returns `None` when
/// the event doesn't clear its category's threshold — e.g. a 10-minute
/// traffic delay below `traffic_delay_threshold_min`.
///
/// `hos` is only consulted by the HOS-compliance category; every other
/// category ignores it.
pub fn classify(cfg: &EngineConfig, hos: &HosState, input: TriggerInput) -> Option<ClassifiedTrigger> {
    match input {
        TriggerInput::TrafficDelay { segment_id, delay_minutes } => check_traffic_delay(cfg, segment_id, delay_minutes),
        TriggerInput::DockTimeChange { segment_id, estimated_hours, actual_hours } => {
            check_dock_time_change(cfg, segment_id, estimated_hours, actual_hours)
        }
        TriggerInput::LoadAdded { stop_id } => Some(check_load_change(true, stop_id)),
        TriggerInput::LoadCancelled { stop_id } => Some(check_load_change(false, stop_id)),
        TriggerInput::DriverRestRequest { location, reason } => Some(check_driver_rest_request(location, reason)),
        TriggerInput::HosApproachingLimits { remaining_route } => check_hos_approaching_limits(cfg, hos, &remaining_route),
        TriggerInput::HosViolation => check_hos_violations(cfg, hos),
        TriggerInput::RestDurationChanged { planned_hours, actual_hours } => {
            check_rest_duration_changed(cfg, planned_hours, actual_hours)
        }
        TriggerInput::FuelLow { fuel_available_gal, fuel_needed_gal, tank_capacity_gal } => {
            check_fuel_low(cfg, fuel_available_gal, fuel_needed_gal, tank_capacity_gal)
        }
        TriggerInput::SpeedDeviation { expected_mph, actual_mph } => check_speed_deviation(cfg, expected_mph, actual_mph),
        TriggerInput::AppointmentChanged { stop_id, old_appointment, new_appointment } => {
            check_appointment_changed(cfg, stop_id, old_appointment, new_appointment)
        }
        TriggerInput::DockUnavailable { stop_id } => Some(check_dock_unavailable(stop_id)),
        TriggerInput::WeatherConditions => check_weather_conditions(),
        TriggerInput::WeighStationDelay => check_weigh_station_delay(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplanAction {
    NoAction,
    UpdateEtas,
    Replan,
}

/// Decision rule: CRITICAL always replans; HIGH replans only if the
/// measured schedule impact exceeds the configured threshold or the
/// trigger is a driver/safety override; MEDIUM always updates ETAs only;
/// LOW takes no action.
pub fn decide(priority: TriggerPriority, trigger: &Trigger, impact_hours: f64, high_priority_replan_threshold_h: f64) -> ReplanAction {
    match priority {
        TriggerPriority::Critical => ReplanAction::Replan,
        TriggerPriority::High => {
            if trigger.is_safety_override() || impact_hours > high_priority_replan_threshold_h {
                ReplanAction::Replan
            } else {
                ReplanAction::UpdateEtas
            }
        }
        TriggerPriority::Medium => ReplanAction::UpdateEtas,
        TriggerPriority::Low => ReplanAction::NoAction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Trigger;

    #[test]
    fn critical_always_replans() {
        let trigger = Trigger::DockUnavailable { stop_id: "s1".into() };
        assert_eq!(decide(TriggerPriority::Critical, &trigger, 0.0, 1.0), ReplanAction::Replan);
    }

    #[test]
    fn high_priority_replans_only_above_threshold() {
        let trigger = Trigger::TrafficDelay { segment_id: None, delay_minutes: 90 };
        assert_eq!(decide(TriggerPriority::High, &trigger, 0.5, 1.0), ReplanAction::UpdateEtas);
        assert_eq!(decide(TriggerPriority::High, &trigger, 1.5, 1.0), ReplanAction::Replan);
    }

    #[test]
    fn high_priority_safety_override_always_replans() {
        let trigger = Trigger::DriverRestRequest { location: None, reason: None };
        assert_eq!(decide(TriggerPriority::High, &trigger, 0.0, 1.0), ReplanAction::Replan);
    }

    #[test]
    fn load_change_and_dock_unavailable_always_replan_regardless_of_impact() {
        let load_added = Trigger::LoadAdded { stop_id: Some("s1".into()) };
        let load_cancelled = Trigger::LoadCancelled { stop_id: Some("s1".into()) };
        let dock_unavailable = Trigger::DockUnavailable { stop_id: "s1".into() };
        for trigger in [&load_added, &load_cancelled, &dock_unavailable] {
            assert_eq!(decide(TriggerPriority::High, trigger, 0.0, 1.0), ReplanAction::Replan);
        }
    }

    #[test]
    fn medium_always_updates_etas() {
        let trigger = Trigger::SpeedDeviation { expected_mph: 55.0, actual_mph: 40.0 };
        assert_eq!(decide(TriggerPriority::Medium, &trigger, 10.0, 1.0), ReplanAction::UpdateEtas);
    }

    #[test]
    fn low_takes_no_action() {
        let trigger = Trigger::SpeedDeviation { expected_mph: 55.0, actual_mph: 50.0 };
        assert_eq!(decide(TriggerPriority::Low, &trigger, 10.0, 1.0), ReplanAction::NoAction);
    }

    #[test]
    fn classify_dispatches_traffic_delay_to_its_category_check() {
        let cfg = EngineConfig::default();
        let hos = HosState::ZERO;
        let classified = classify(&cfg, &hos, TriggerInput::TrafficDelay { segment_id: None, delay_minutes: 90 }).unwrap();
        assert_eq!(classified.priority, TriggerPriority::High);
        assert!(matches!(classified.trigger, Trigger::TrafficDelay { .. }));
    }

    #[test]
    fn classify_returns_none_below_a_category_threshold() {
        let cfg = EngineConfig::default();
        let hos = HosState::ZERO;
        assert!(classify(&cfg, &hos, TriggerInput::TrafficDelay { segment_id: None, delay_minutes: 5 }).is_none());
    }

    #[test]
    fn classify_consults_hos_for_hos_categories_only() {
        let cfg = EngineConfig::default();
        let hos = HosState::new(10.5, 11.0, 3.0).unwrap();
        let remaining_route = vec![TripRequirement { drive_time_h: 2.0, dock_time_h: 0.0 }];
        let classified = classify(&cfg, &hos, TriggerInput::HosApproachingLimits { remaining_route }).unwrap();
        assert_eq!(classified.priority, TriggerPriority::High);
        assert!(matches!(classified.trigger, Trigger::HosDriveLimitApproaching { .. }));
    }

    #[test]
    fn classify_environmental_inputs_are_always_quiet() {
        let cfg = EngineConfig::default();
        let hos = HosState::ZERO;
        assert!(classify(&cfg, &hos, TriggerInput::WeatherConditions).is_none());
        assert!(classify(&cfg, &hos, TriggerInput::WeighStationDelay).is_none());
    }
}
