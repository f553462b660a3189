//! Category 4: Appointment/Customer — appointment time changes and
//! docks that become unavailable.

use chrono::{DateTime, Utc};

use crate::config::EngineConfig;
use crate::types::{Trigger, TriggerPriority};

use super::ClassifiedTrigger;

/// Trigger 11: a customer moves an appointment window.
pub fn check_appointment_changed(
    cfg: &EngineConfig,
    stop_id: Option<String>,
    old_appointment: Option<DateTime<Utc>>,
    new_appointment: Option<DateTime<Utc>>,
) -> Option<ClassifiedTrigger> {
    let delta_hours = match (old_appointment, new_appointment) {
        (Some(old), Some(new)) => (new - old).num_seconds() as f64 / 3600.0,
        _ => 0.0,
    };
    if delta_hours.abs() <= cfg.appointment_variance_threshold_h {
        return None;
    }
    Some(ClassifiedTrigger {
        trigger: Trigger::AppointmentChanged { stop_id, old_appointment, new_appointment, delta_hours },
        priority: TriggerPriority::Medium,
        reason: format!("appointment shifted by {delta_hours:.1}h"),
    })
}

/// Trigger 12 (supplemented, `SPEC_FULL.md` §C.4): a dock becomes
/// unavailable — always replan-eligible once signalled.
pub fn check_dock_unavailable(stop_id: String) -> ClassifiedTrigger {
    ClassifiedTrigger {
        trigger: Trigger::DockUnavailable { stop_id },
        priority: TriggerPriority::High,
        reason: "dock unavailable, stop must be skipped or rescheduled".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_appointment_shift_is_not_a_trigger() {
        let cfg = EngineConfig::default();
        let old = Utc::now();
        let new = old + chrono::Duration::minutes(10);
        assert!(check_appointment_changed(&cfg, None, Some(old), Some(new)).is_none());
    }

    #[test]
    fn large_appointment_shift_triggers() {
        let cfg = EngineConfig::default();
        let old = Utc::now();
        let new = old + chrono::Duration::hours(2);
        let classified = check_appointment_changed(&cfg, None, Some(old), Some(new)).unwrap();
        assert_eq!(classified.priority, TriggerPriority::Medium);
    }
}
