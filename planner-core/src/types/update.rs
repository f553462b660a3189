use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// A classified runtime event. One variant per trigger kind, each carrying
/// exactly the fields that kind needs rather than a dynamic dict payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "trigger_type", rename_all = "snake_case")]
pub enum Trigger {
    TrafficDelay { segment_id: Option<String>, delay_minutes: u32 },
    DockTimeChange { segment_id: Option<String>, estimated_hours: f64, actual_hours: f64 },
    LoadAdded { stop_id: Option<String> },
    LoadCancelled { stop_id: Option<String> },
    DriverRestRequest { location: Option<String>, reason: Option<String> },
    HosDriveLimitApproaching { hours_remaining: f64, hours_needed: f64 },
    HosDutyLimitApproaching { hours_remaining: f64, hours_needed: f64 },
    BreakRequiredSoon { hours_until_break: f64 },
    HosViolationDrive { hours_driven: f64 },
    HosViolationDuty { on_duty_hours: f64 },
    HosViolationBreak { hours_since_break: f64 },
    RestDurationChanged { planned_hours: f64, actual_hours: f64 },
    FuelLow { fuel_available_gal: f64, fuel_needed_gal: f64, fuel_fraction: f64 },
    SpeedDeviation { expected_mph: f64, actual_mph: f64 },
    AppointmentChanged {
        stop_id: Option<String>,
        old_appointment: Option<DateTime<Utc>>,
        new_appointment: Option<DateTime<Utc>>,
        delta_hours: f64,
    },
    DockUnavailable { stop_id: String },
}

impl Trigger {
    pub fn type_name(&self) -> &'static str {
        match self {
            Trigger::TrafficDelay { .. } => "traffic_delay",
            Trigger::DockTimeChange { .. } => "dock_time_change",
            Trigger::LoadAdded { .. } => "load_added",
            Trigger::LoadCancelled { .. } => "load_cancelled",
            Trigger::DriverRestRequest { .. } => "driver_rest_request",
            Trigger::HosDriveLimitApproaching { .. } => "hos_drive_limit_approaching",
            Trigger::HosDutyLimitApproaching { .. } => "hos_duty_limit_approaching",
            Trigger::BreakRequiredSoon { .. } => "break_required_soon",
            Trigger::HosViolationDrive { .. } => "hos_violation_drive",
            Trigger::HosViolationDuty { .. } => "hos_violation_duty",
            Trigger::HosViolationBreak { .. } => "hos_violation_break",
            Trigger::RestDurationChanged { .. } => "rest_duration_changed",
            Trigger::FuelLow { .. } => "fuel_low",
            Trigger::SpeedDeviation { .. } => "speed_deviation",
            Trigger::AppointmentChanged { .. } => "appointment_changed",
            Trigger::DockUnavailable { .. } => "dock_unavailable",
        }
    }

    /// True for triggers whose replan threshold is "always" per §4.6's
    /// table — driver-safety overrides, HOS violations, load changes, and
    /// unavailable docks — regardless of measured schedule impact.
    pub fn is_safety_override(&self) -> bool {
        matches!(
            self,
            Trigger::DriverRestRequest { .. }
                | Trigger::HosViolationDrive { .. }
                | Trigger::HosViolationDuty { .. }
                | Trigger::HosViolationBreak { .. }
                | Trigger::LoadAdded { .. }
                | Trigger::LoadCancelled { .. }
                | Trigger::DockUnavailable { .. }
        )
    }
}

/// Structured impact of applying one or more triggers to a `PlanUpdate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactSummary {
    pub total_eta_change_hours: f64,
    pub segments_added: u32,
    pub segments_removed: u32,
    pub trigger_descriptions: Vec<String>,
}

/// Append-only audit record of an applied trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanUpdate {
    pub update_id: String,
    pub plan_id: String,
    pub trigger: Trigger,
    pub triggered_at: DateTime<Utc>,
    pub triggered_by: String,
    pub replan_triggered: bool,
    pub replan_reason: Option<String>,
    pub previous_version: u32,
    pub new_version: Option<u32>,
    pub impact_summary: ImpactSummary,
}
