//! Category 3: Vehicle/Operational — rest duration drift, low fuel, and
//! speed deviation.

use crate::config::EngineConfig;
use crate::types::{Trigger, TriggerPriority};

use super::ClassifiedTrigger;

/// Trigger 8 (supplemented, `SPEC_FULL.md` §C.4): an in-progress rest
/// segment's actual duration differs from planned.
pub fn check_rest_duration_changed(cfg: &EngineConfig, planned_hours: f64, actual_hours: f64) -> Option<ClassifiedTrigger> {
    let variance = (actual_hours - planned_hours).abs();
    if variance <= cfg.rest_duration_variance_threshold_h {
        return None;
    }
    Some(ClassifiedTrigger {
        trigger: Trigger::RestDurationChanged { planned_hours, actual_hours },
        priority: TriggerPriority::Medium,
        reason: format!("rest duration varied by {variance:.1}h from plan"),
    })
}

/// Trigger 9: fuel running low relative to what the remaining leg needs.
pub fn check_fuel_low(cfg: &EngineConfig, fuel_available_gal: f64, fuel_needed_gal: f64, tank_capacity_gal: f64) -> Option<ClassifiedTrigger> {
    if fuel_available_gal >= fuel_needed_gal * (1.0 + cfg.fuel_buffer) {
        return None;
    }
    let fuel_fraction = fuel_available_gal / tank_capacity_gal;
    let priority = if fuel_fraction < cfg.low_fuel_frac { TriggerPriority::Critical } else { TriggerPriority::High };
    Some(ClassifiedTrigger {
        trigger: Trigger::FuelLow { fuel_available_gal, fuel_needed_gal, fuel_fraction },
        priority,
        reason: format!("fuel at {:.0}% of capacity, below what the remaining leg needs", fuel_fraction * 100.0),
    })
}

/// Trigger 10: actual speed deviates materially from the plan's assumed
/// average speed.
pub fn check_speed_deviation(cfg: &EngineConfig, expected_mph: f64, actual_mph: f64) -> Option<ClassifiedTrigger> {
    let deviation = (actual_mph - expected_mph).abs() / expected_mph;
    if deviation <= cfg.speed_deviation_threshold {
        return None;
    }
    Some(ClassifiedTrigger {
        trigger: Trigger::SpeedDeviation { expected_mph, actual_mph },
        priority: TriggerPriority::Medium,
        reason: format!("speed deviated {:.0}% from plan", deviation * 100.0),
    })
}
