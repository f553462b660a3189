//! Logical `PlanStore` interface. The core depends only on this trait; a
//! concrete SQL-backed implementation lives in `planner-store`.

use async_trait::async_trait;

use crate::error::PlannerResult;
use crate::types::{PlanUpdate, RoutePlan, RouteSegment, SegmentStatus};

/// Versioned plan + segment + update-log storage with a transactional
/// single-active-plan-per-driver invariant.
#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn create_plan(&self, plan: RoutePlan) -> PlannerResult<RoutePlan>;

    /// Replaces a plan's persisted row in place — same `plan_id`, a bumped
    /// `version`, and a fresh segment list. Satisfies the replan protocol's
    /// "same plan, next version" semantics without minting a new `plan_id`
    /// for every runtime trigger.
    async fn update_plan(&self, plan: RoutePlan) -> PlannerResult<RoutePlan>;

    async fn get_plan(&self, plan_id: &str) -> PlannerResult<Option<RoutePlan>>;

    /// Atomically sets `plan_id`'s `is_active = true, status = active` and
    /// deactivates every other plan for the same driver.
    async fn activate(&self, plan_id: &str) -> PlannerResult<()>;

    async fn complete(&self, plan_id: &str) -> PlannerResult<()>;

    async fn cancel(&self, plan_id: &str) -> PlannerResult<()>;

    async fn append_segment(&self, plan_id: &str, segment: RouteSegment) -> PlannerResult<()>;

    async fn set_segment_status(&self, plan_id: &str, sequence_order: u32, status: SegmentStatus) -> PlannerResult<()>;

    async fn append_update(&self, update: PlanUpdate) -> PlannerResult<()>;

    async fn current_segment(&self, plan_id: &str) -> PlannerResult<Option<RouteSegment>>;

    async fn remaining_segments(&self, plan_id: &str) -> PlannerResult<Vec<RouteSegment>>;

    /// The driver's currently-active plan, if any. A driver's "current
    /// plan" is a stored `plan_id`, never an in-memory pointer — this is
    /// the store-mediated lookup.
    async fn active_plan_for_driver(&self, driver_id: &str) -> PlannerResult<Option<RoutePlan>>;
}
