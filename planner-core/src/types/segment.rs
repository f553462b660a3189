use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::hos::HosState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    Planned,
    InProgress,
    Completed,
    Skipped,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestType {
    FullRest,
    PartialRest7_3,
    PartialRest8_2,
    Break,
}

/// Kind-specific payload for a `RouteSegment`. Each variant carries exactly
/// its own fields, nothing else — no polymorphic dict-with-optional-keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentDetail {
    Drive {
        distance_miles: f64,
        drive_time_h: f64,
        from: String,
        to: String,
    },
    Rest {
        rest_type: RestType,
        duration_h: f64,
        reason: String,
    },
    Fuel {
        gallons: f64,
        cost_estimate: f64,
        station: String,
    },
    Dock {
        duration_h: f64,
        customer: String,
    },
}

/// One atomic step in a route plan: a shared envelope (ordering, HOS
/// snapshot, timing, status) around a kind-specific `SegmentDetail`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    /// 1-based, dense per plan.
    pub sequence_order: u32,
    pub detail: SegmentDetail,
    /// HOS snapshot after this segment completes.
    pub hos_state_after: HosState,
    pub estimated_arrival: DateTime<Utc>,
    pub estimated_departure: DateTime<Utc>,
    pub status: SegmentStatus,
}

impl RouteSegment {
    pub fn new(
        sequence_order: u32,
        detail: SegmentDetail,
        hos_state_after: HosState,
        estimated_arrival: DateTime<Utc>,
        estimated_departure: DateTime<Utc>,
    ) -> Self {
        Self {
            sequence_order,
            detail,
            hos_state_after,
            estimated_arrival,
            estimated_departure,
            status: SegmentStatus::Planned,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.detail {
            SegmentDetail::Drive { .. } => "drive",
            SegmentDetail::Rest { .. } => "rest",
            SegmentDetail::Fuel { .. } => "fuel",
            SegmentDetail::Dock { .. } => "dock",
        }
    }

    pub fn is_rest_or_break(&self) -> bool {
        matches!(self.detail, SegmentDetail::Rest { .. })
    }
}
