//! Category 2: HOS Compliance — proactive limit warnings and violations.
//! These are the safety-critical triggers.

use crate::config::EngineConfig;
use crate::rest::TripRequirement;
use crate::types::{HosState, Trigger, TriggerPriority};

use super::ClassifiedTrigger;

/// Trigger 5: HOS approaching limits, checked against the remaining route
/// (proactive — warns before a violation occurs). Checks drive limit, then
/// duty limit, then break requirement; returns the first that applies.
pub fn check_hos_approaching_limits(
    cfg: &EngineConfig,
    hos: &HosState,
    remaining_route: &[TripRequirement],
) -> Option<ClassifiedTrigger> {
    let hours_until_drive_limit = (cfg.max_drive_h - hos.hours_driven).max(0.0);
    let hours_until_duty_limit = (cfg.max_duty_h - hos.on_duty_time).max(0.0);
    let hours_until_break = (cfg.break_trigger_h - hos.hours_since_break).max(0.0);

    let total_drive_needed: f64 = remaining_route.iter().map(|t| t.drive_time_h).sum();
    let total_duty_needed: f64 = remaining_route.iter().map(|t| t.drive_time_h + t.dock_time_h).sum();

    if hours_until_drive_limit < total_drive_needed {
        return Some(ClassifiedTrigger {
            trigger: Trigger::HosDriveLimitApproaching {
                hours_remaining: hours_until_drive_limit,
                hours_needed: total_drive_needed,
            },
            priority: TriggerPriority::High,
            reason: format!(
                "drive limit approaching: {hours_until_drive_limit:.1}h remaining, {total_drive_needed:.1}h needed"
            ),
        });
    }

    if hours_until_duty_limit < total_duty_needed {
        return Some(ClassifiedTrigger {
            trigger: Trigger::HosDutyLimitApproaching {
                hours_remaining: hours_until_duty_limit,
                hours_needed: total_duty_needed,
            },
            priority: TriggerPriority::High,
            reason: format!(
                "duty limit approaching: {hours_until_duty_limit:.1}h remaining, {total_duty_needed:.1}h needed"
            ),
        });
    }

    if hours_until_break < 1.0 {
        return Some(ClassifiedTrigger {
            trigger: Trigger::BreakRequiredSoon { hours_until_break },
            priority: TriggerPriority::Medium,
            reason: format!("30-minute break required in {:.0} minutes", hours_until_break * 60.0),
        });
    }

    None
}

/// Trigger 6/7: HOS violations already occurred (drive/duty over limit, or
/// break overdue). Always CRITICAL — mandatory rest/break immediately.
pub fn check_hos_violations(cfg: &EngineConfig, hos: &HosState) -> Option<ClassifiedTrigger> {
    if hos.hours_driven > cfg.max_drive_h {
        return Some(ClassifiedTrigger {
            trigger: Trigger::HosViolationDrive { hours_driven: hos.hours_driven },
            priority: TriggerPriority::Critical,
            reason: format!("drive limit violated: {:.1}h driven", hos.hours_driven),
        });
    }
    if hos.on_duty_time > cfg.max_duty_h {
        return Some(ClassifiedTrigger {
            trigger: Trigger::HosViolationDuty { on_duty_hours: hos.on_duty_time },
            priority: TriggerPriority::Critical,
            reason: format!("duty window violated: {:.1}h on duty", hos.on_duty_time),
        });
    }
    if hos.hours_since_break > cfg.break_trigger_h {
        return Some(ClassifiedTrigger {
            trigger: Trigger::HosViolationBreak { hours_since_break: hos.hours_since_break },
            priority: TriggerPriority::Critical,
            reason: format!("break overdue: {:.1}h since last break", hos.hours_since_break),
        });
    }
    None
}
