//! Category 1: External Events — traffic delays, dock-time variance, load
//! changes, and driver rest requests.

use crate::config::EngineConfig;
use crate::types::{Trigger, TriggerPriority};

use super::ClassifiedTrigger;

/// Trigger 1: traffic delay / road closure report.
pub fn check_traffic_delay(cfg: &EngineConfig, segment_id: Option<String>, delay_minutes: u32) -> Option<ClassifiedTrigger> {
    if delay_minutes < cfg.traffic_delay_threshold_min {
        return None;
    }
    let priority = if delay_minutes > 60 { TriggerPriority::High } else { TriggerPriority::Medium };
    Some(ClassifiedTrigger {
        trigger: Trigger::TrafficDelay { segment_id, delay_minutes },
        priority,
        reason: format!("traffic delay of {delay_minutes} minutes detected"),
    })
}

/// Trigger 2: dock time differs from estimate (early/late loading).
pub fn check_dock_time_change(
    cfg: &EngineConfig,
    segment_id: Option<String>,
    estimated_hours: f64,
    actual_hours: f64,
) -> Option<ClassifiedTrigger> {
    let variance = (actual_hours - estimated_hours).abs();
    if variance < cfg.dock_variance_threshold_h {
        return None;
    }
    Some(ClassifiedTrigger {
        trigger: Trigger::DockTimeChange { segment_id, estimated_hours, actual_hours },
        priority: TriggerPriority::Critical,
        reason: format!("dock time exceeded estimate by {variance:.1} hours, route feasibility may be affected"),
    })
}

/// Trigger 3: load added or cancelled mid-route. Always replan-eligible.
pub fn check_load_change(added: bool, stop_id: Option<String>) -> ClassifiedTrigger {
    let trigger = if added { Trigger::LoadAdded { stop_id } } else { Trigger::LoadCancelled { stop_id } };
    ClassifiedTrigger {
        trigger,
        priority: TriggerPriority::High,
        reason: "load change requires re-sequencing remaining stops".to_string(),
    }
}

/// Trigger 4: driver manual rest request. Always honored — a driver safety
/// override.
pub fn check_driver_rest_request(location: Option<String>, reason: Option<String>) -> ClassifiedTrigger {
    ClassifiedTrigger {
        trigger: Trigger::DriverRestRequest { location, reason },
        priority: TriggerPriority::High,
        reason: "driver requested rest stop; safety override".to_string(),
    }
}
