//! A `PlanStore` backed by an in-process `Mutex<HashMap<...>>`. Used by
//! `planner-core`'s own tests and by callers (demos, CLIs) that don't need
//! durability.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use planner_core::error::{PlannerError, PlannerResult};
use planner_core::store::PlanStore;
use planner_core::types::{PlanStatus, PlanUpdate, RoutePlan, RouteSegment, SegmentStatus};

#[derive(Default)]
pub struct InMemoryPlanStore {
    plans: Mutex<HashMap<String, RoutePlan>>,
    updates: Mutex<Vec<PlanUpdate>>,
}

impl InMemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn not_found(plan_id: &str) -> PlannerError {
        PlannerError::store_precondition_failure(format!("plan not found: {plan_id}"))
    }
}

#[async_trait]
impl PlanStore for InMemoryPlanStore {
    async fn create_plan(&self, plan: RoutePlan) -> PlannerResult<RoutePlan> {
        self.plans.lock().unwrap().insert(plan.plan_id.clone(), plan.clone());
        Ok(plan)
    }

    async fn update_plan(&self, plan: RoutePlan) -> PlannerResult<RoutePlan> {
        let mut plans = self.plans.lock().unwrap();
        if !plans.contains_key(&plan.plan_id) {
            return Err(Self::not_found(&plan.plan_id));
        }
        plans.insert(plan.plan_id.clone(), plan.clone());
        Ok(plan)
    }

    async fn get_plan(&self, plan_id: &str) -> PlannerResult<Option<RoutePlan>> {
        Ok(self.plans.lock().unwrap().get(plan_id).cloned())
    }

    async fn activate(&self, plan_id: &str) -> PlannerResult<()> {
        let mut plans = self.plans.lock().unwrap();
        let driver_id = plans.get(plan_id).map(|p| p.driver_id.clone()).ok_or_else(|| Self::not_found(plan_id))?;
        for plan in plans.values_mut() {
            if plan.driver_id == driver_id {
                plan.is_active = false;
            }
        }
        let target = plans.get_mut(plan_id).expect("checked above");
        target.is_active = true;
        target.status = PlanStatus::Active;
        Ok(())
    }

    async fn complete(&self, plan_id: &str) -> PlannerResult<()> {
        let mut plans = self.plans.lock().unwrap();
        let plan = plans.get_mut(plan_id).ok_or_else(|| Self::not_found(plan_id))?;
        plan.status = PlanStatus::Completed;
        plan.is_active = false;
        Ok(())
    }

    async fn cancel(&self, plan_id: &str) -> PlannerResult<()> {
        let mut plans = self.plans.lock().unwrap();
        let plan = plans.get_mut(plan_id).ok_or_else(|| Self::not_found(plan_id))?;
        plan.status = PlanStatus::Cancelled;
        plan.is_active = false;
        Ok(())
    }

    async fn append_segment(&self, plan_id: &str, segment: RouteSegment) -> PlannerResult<()> {
        let mut plans = self.plans.lock().unwrap();
        let plan = plans.get_mut(plan_id).ok_or_else(|| Self::not_found(plan_id))?;
        plan.segments.push(segment);
        Ok(())
    }

    async fn set_segment_status(&self, plan_id: &str, sequence_order: u32, status: SegmentStatus) -> PlannerResult<()> {
        let mut plans = self.plans.lock().unwrap();
        let plan = plans.get_mut(plan_id).ok_or_else(|| Self::not_found(plan_id))?;
        let segment = plan
            .segments
            .iter_mut()
            .find(|s| s.sequence_order == sequence_order)
            .ok_or_else(|| PlannerError::store_precondition_failure(format!("segment not found: plan {plan_id}, sequence_order {sequence_order}")))?;
        segment.status = status;
        Ok(())
    }

    async fn append_update(&self, update: PlanUpdate) -> PlannerResult<()> {
        self.updates.lock().unwrap().push(update);
        Ok(())
    }

    async fn current_segment(&self, plan_id: &str) -> PlannerResult<Option<RouteSegment>> {
        let plans = self.plans.lock().unwrap();
        let Some(plan) = plans.get(plan_id) else { return Ok(None) };
        let in_progress = plan.segments.iter().find(|s| s.status == SegmentStatus::InProgress);
        if let Some(seg) = in_progress {
            return Ok(Some(seg.clone()));
        }
        Ok(plan.segments.iter().find(|s| s.status == SegmentStatus::Planned).cloned())
    }

    async fn remaining_segments(&self, plan_id: &str) -> PlannerResult<Vec<RouteSegment>> {
        let plans = self.plans.lock().unwrap();
        let Some(plan) = plans.get(plan_id) else { return Ok(vec![]) };
        Ok(plan.segments.iter().filter(|s| s.status == SegmentStatus::Planned).cloned().collect())
    }

    async fn active_plan_for_driver(&self, driver_id: &str) -> PlannerResult<Option<RoutePlan>> {
        Ok(self.plans.lock().unwrap().values().find(|p| p.driver_id == driver_id && p.is_active).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use planner_core::types::{ComplianceReport, HosState, OptimizationPriority, SegmentDetail};

    fn sample_plan(plan_id: &str, driver_id: &str) -> RoutePlan {
        RoutePlan {
            plan_id: plan_id.to_string(),
            driver_id: driver_id.to_string(),
            vehicle_id: "veh-1".to_string(),
            load_id: None,
            version: 1,
            is_active: false,
            status: PlanStatus::Draft,
            total_distance_miles: 5.0,
            total_drive_time_h: 0.1,
            total_on_duty_time_h: 0.1,
            total_cost_estimate: 4.0,
            is_feasible: true,
            feasibility_issues: vec![],
            compliance_report: ComplianceReport {
                max_drive_hours_used: 0.1,
                max_duty_hours_used: 0.1,
                breaks_required: 0,
                breaks_planned: 0,
                violations: vec![],
            },
            optimization_priority: OptimizationPriority::Balance,
            segments: vec![RouteSegment::new(
                1,
                SegmentDetail::Drive { distance_miles: 5.0, drive_time_h: 0.1, from: "a".into(), to: "b".into() },
                HosState::new(0.1, 0.1, 0.1).unwrap(),
                Utc::now(),
                Utc::now(),
            )],
        }
    }

    #[tokio::test]
    async fn activate_deactivates_other_plans_for_the_same_driver() {
        let store = InMemoryPlanStore::new();
        store.create_plan(sample_plan("p1", "drv-1")).await.unwrap();
        store.create_plan(sample_plan("p2", "drv-1")).await.unwrap();

        store.activate("p1").await.unwrap();
        store.activate("p2").await.unwrap();

        assert!(!store.get_plan("p1").await.unwrap().unwrap().is_active);
        assert!(store.get_plan("p2").await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn update_plan_requires_an_existing_row() {
        let store = InMemoryPlanStore::new();
        let result = store.update_plan(sample_plan("missing", "drv-1")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn set_segment_status_then_remaining_segments_excludes_it() {
        let store = InMemoryPlanStore::new();
        store.create_plan(sample_plan("p1", "drv-1")).await.unwrap();
        store.set_segment_status("p1", 1, SegmentStatus::Completed).await.unwrap();
        assert!(store.remaining_segments("p1").await.unwrap().is_empty());
    }
}
