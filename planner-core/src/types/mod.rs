mod hos;
mod plan;
mod segment;
mod stop;
mod update;
mod vehicle;

pub use hos::HosState;
pub use plan::{ComplianceReport, OptimizationPriority, PlanStatus, RoutePlan};
pub use segment::{RestType, RouteSegment, SegmentDetail, SegmentStatus};
pub use stop::{Stop, StopKind};
pub use update::{ImpactSummary, PlanUpdate, Trigger, TriggerPriority};
pub use vehicle::VehicleState;
