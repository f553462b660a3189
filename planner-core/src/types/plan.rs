use serde::{Deserialize, Serialize};

use super::segment::RouteSegment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Draft,
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationPriority {
    MinimizeTime,
    MinimizeCost,
    Balance,
}

/// Compliance report emitted alongside a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub max_drive_hours_used: f64,
    pub max_duty_hours_used: f64,
    pub breaks_required: u32,
    pub breaks_planned: u32,
    pub violations: Vec<String>,
}

/// A versioned, executable multi-leg route plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub plan_id: String,
    pub driver_id: String,
    pub vehicle_id: String,
    pub load_id: Option<String>,
    /// Starts at 1, monotonically increases on re-plan.
    pub version: u32,
    pub is_active: bool,
    pub status: PlanStatus,
    pub total_distance_miles: f64,
    pub total_drive_time_h: f64,
    pub total_on_duty_time_h: f64,
    pub total_cost_estimate: f64,
    pub is_feasible: bool,
    pub feasibility_issues: Vec<String>,
    pub compliance_report: ComplianceReport,
    pub optimization_priority: OptimizationPriority,
    pub segments: Vec<RouteSegment>,
}

impl RoutePlan {
    /// `sequence_order` is dense `1..N` with no gaps.
    pub fn has_dense_sequence(&self) -> bool {
        self.segments
            .iter()
            .enumerate()
            .all(|(i, seg)| seg.sequence_order == (i as u32) + 1)
    }

    /// `estimated_arrival[i+1] >= estimated_departure[i]`.
    pub fn has_monotonic_timing(&self) -> bool {
        self.segments
            .windows(2)
            .all(|w| w[1].estimated_arrival >= w[0].estimated_departure)
    }
}
