//! SQLite-backed `PlanStore`: connect once at startup, run embedded
//! migrations, hand the pool to every store method.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use planner_core::error::PlannerResult;
use planner_core::store::PlanStore;
use planner_core::types::{
    ComplianceReport, HosState, OptimizationPriority, PlanStatus, PlanUpdate, RoutePlan, RouteSegment, SegmentDetail, SegmentStatus,
};

use crate::error::StoreError;

pub struct SqlitePlanStore {
    pool: SqlitePool,
}

impl SqlitePlanStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and runs the embedded migrations
    /// (`SqlitePool::connect` + `sqlx::migrate!`).
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePool::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| StoreError::Database(e.into()))?;
        Ok(Self { pool })
    }

    async fn load_segments(&self, plan_id: &str) -> Result<Vec<RouteSegment>, StoreError> {
        let rows = sqlx::query("SELECT sequence_order, detail, hos_state_after, estimated_arrival, estimated_departure, status FROM segments WHERE plan_id = ? ORDER BY sequence_order ASC")
            .bind(plan_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(row_to_segment).collect()
    }

    async fn replace_segments(&self, tx: &mut Transaction<'_, Sqlite>, plan_id: &str, segments: &[RouteSegment]) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM segments WHERE plan_id = ?").bind(plan_id).execute(&mut **tx).await?;
        for segment in segments {
            insert_segment(tx, plan_id, segment).await?;
        }
        Ok(())
    }

    async fn fetch_plan_row(&self, plan_id: &str) -> Result<Option<RoutePlan>, StoreError> {
        let row = sqlx::query(
            "SELECT plan_id, driver_id, vehicle_id, load_id, version, is_active, status, total_distance_miles, total_drive_time_h, \
             total_on_duty_time_h, total_cost_estimate, is_feasible, feasibility_issues, compliance_report, optimization_priority \
             FROM plans WHERE plan_id = ?",
        )
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else { return Ok(None) };
        let segments = self.load_segments(plan_id).await?;
        Ok(Some(row_to_plan(row, segments)?))
    }
}

#[async_trait]
impl PlanStore for SqlitePlanStore {
    async fn create_plan(&self, plan: RoutePlan) -> PlannerResult<RoutePlan> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;
        insert_plan_row(&mut tx, &plan).await.map_err(StoreError::from)?;
        for segment in &plan.segments {
            insert_segment(&mut tx, &plan.plan_id, segment).await.map_err(StoreError::from)?;
        }
        tx.commit().await.map_err(StoreError::from)?;
        tracing::info!(plan_id = %plan.plan_id, driver_id = %plan.driver_id, version = plan.version, "created plan");
        Ok(plan)
    }

    async fn update_plan(&self, plan: RoutePlan) -> PlannerResult<RoutePlan> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;
        let result = sqlx::query(
            "UPDATE plans SET version = ?, is_active = ?, status = ?, total_distance_miles = ?, total_drive_time_h = ?, \
             total_on_duty_time_h = ?, total_cost_estimate = ?, is_feasible = ?, feasibility_issues = ?, compliance_report = ?, \
             optimization_priority = ? WHERE plan_id = ?",
        )
        .bind(plan.version as i64)
        .bind(plan.is_active)
        .bind(plan_status_str(plan.status))
        .bind(plan.total_distance_miles)
        .bind(plan.total_drive_time_h)
        .bind(plan.total_on_duty_time_h)
        .bind(plan.total_cost_estimate)
        .bind(plan.is_feasible)
        .bind(serde_json::to_string(&plan.feasibility_issues).map_err(StoreError::from)?)
        .bind(serde_json::to_string(&plan.compliance_report).map_err(StoreError::from)?)
        .bind(optimization_priority_str(plan.optimization_priority))
        .bind(&plan.plan_id)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::PlanNotFound(plan.plan_id).into());
        }
        self.replace_segments(&mut tx, &plan.plan_id, &plan.segments).await.map_err(StoreError::from)?;
        tx.commit().await.map_err(StoreError::from)?;
        tracing::info!(plan_id = %plan.plan_id, version = plan.version, "updated plan in place");
        Ok(plan)
    }

    async fn get_plan(&self, plan_id: &str) -> PlannerResult<Option<RoutePlan>> {
        Ok(self.fetch_plan_row(plan_id).await.map_err(StoreError::from)?)
    }

    async fn activate(&self, plan_id: &str) -> PlannerResult<()> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;
        let driver_id: Option<String> = sqlx::query_scalar("SELECT driver_id FROM plans WHERE plan_id = ?")
            .bind(plan_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::from)?;
        let driver_id = driver_id.ok_or_else(|| StoreError::PlanNotFound(plan_id.to_string()))?;

        sqlx::query("UPDATE plans SET is_active = 0 WHERE driver_id = ?")
            .bind(&driver_id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;
        sqlx::query("UPDATE plans SET is_active = 1, status = 'active' WHERE plan_id = ?")
            .bind(plan_id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;
        tx.commit().await.map_err(StoreError::from)?;
        tracing::info!(%plan_id, %driver_id, "activated plan");
        Ok(())
    }

    async fn complete(&self, plan_id: &str) -> PlannerResult<()> {
        let result = sqlx::query("UPDATE plans SET status = 'completed', is_active = 0 WHERE plan_id = ?")
            .bind(plan_id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::PlanNotFound(plan_id.to_string()).into());
        }
        Ok(())
    }

    async fn cancel(&self, plan_id: &str) -> PlannerResult<()> {
        let result = sqlx::query("UPDATE plans SET status = 'cancelled', is_active = 0 WHERE plan_id = ?")
            .bind(plan_id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::PlanNotFound(plan_id.to_string()).into());
        }
        Ok(())
    }

    async fn append_segment(&self, plan_id: &str, segment: RouteSegment) -> PlannerResult<()> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;
        insert_segment(&mut tx, plan_id, &segment).await.map_err(StoreError::from)?;
        tx.commit().await.map_err(StoreError::from)?;
        Ok(())
    }

    async fn set_segment_status(&self, plan_id: &str, sequence_order: u32, status: SegmentStatus) -> PlannerResult<()> {
        let result = sqlx::query("UPDATE segments SET status = ? WHERE plan_id = ? AND sequence_order = ?")
            .bind(segment_status_str(status))
            .bind(plan_id)
            .bind(sequence_order as i64)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::SegmentNotFound { plan_id: plan_id.to_string(), sequence_order }.into());
        }
        Ok(())
    }

    async fn append_update(&self, update: PlanUpdate) -> PlannerResult<()> {
        sqlx::query(
            "INSERT INTO updates (update_id, plan_id, trigger, triggered_at, triggered_by, replan_triggered, replan_reason, \
             previous_version, new_version, impact_summary) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&update.update_id)
        .bind(&update.plan_id)
        .bind(serde_json::to_string(&update.trigger).map_err(StoreError::from)?)
        .bind(update.triggered_at.to_rfc3339())
        .bind(&update.triggered_by)
        .bind(update.replan_triggered)
        .bind(&update.replan_reason)
        .bind(update.previous_version as i64)
        .bind(update.new_version.map(|v| v as i64))
        .bind(serde_json::to_string(&update.impact_summary).map_err(StoreError::from)?)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(())
    }

    async fn current_segment(&self, plan_id: &str) -> PlannerResult<Option<RouteSegment>> {
        let row = sqlx::query(
            "SELECT sequence_order, detail, hos_state_after, estimated_arrival, estimated_departure, status FROM segments \
             WHERE plan_id = ? AND status IN ('in_progress', 'planned') ORDER BY (status = 'in_progress') DESC, sequence_order ASC LIMIT 1",
        )
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)?;
        match row {
            Some(row) => Ok(Some(row_to_segment(row).map_err(StoreError::from)?)),
            None => Ok(None),
        }
    }

    async fn remaining_segments(&self, plan_id: &str) -> PlannerResult<Vec<RouteSegment>> {
        let rows = sqlx::query(
            "SELECT sequence_order, detail, hos_state_after, estimated_arrival, estimated_departure, status FROM segments \
             WHERE plan_id = ? AND status = 'planned' ORDER BY sequence_order ASC",
        )
        .bind(plan_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(rows.into_iter().map(row_to_segment).collect::<Result<Vec<_>, _>>().map_err(StoreError::from)?)
    }

    async fn active_plan_for_driver(&self, driver_id: &str) -> PlannerResult<Option<RoutePlan>> {
        let plan_id: Option<String> = sqlx::query_scalar("SELECT plan_id FROM plans WHERE driver_id = ? AND is_active = 1 LIMIT 1")
            .bind(driver_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from)?;
        match plan_id {
            Some(plan_id) => Ok(self.fetch_plan_row(&plan_id).await.map_err(StoreError::from)?),
            None => Ok(None),
        }
    }
}

async fn insert_plan_row(tx: &mut Transaction<'_, Sqlite>, plan: &RoutePlan) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO plans (plan_id, driver_id, vehicle_id, load_id, version, is_active, status, total_distance_miles, \
         total_drive_time_h, total_on_duty_time_h, total_cost_estimate, is_feasible, feasibility_issues, compliance_report, \
         optimization_priority) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&plan.plan_id)
    .bind(&plan.driver_id)
    .bind(&plan.vehicle_id)
    .bind(&plan.load_id)
    .bind(plan.version as i64)
    .bind(plan.is_active)
    .bind(plan_status_str(plan.status))
    .bind(plan.total_distance_miles)
    .bind(plan.total_drive_time_h)
    .bind(plan.total_on_duty_time_h)
    .bind(plan.total_cost_estimate)
    .bind(plan.is_feasible)
    .bind(serde_json::to_string(&plan.feasibility_issues)?)
    .bind(serde_json::to_string(&plan.compliance_report)?)
    .bind(optimization_priority_str(plan.optimization_priority))
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_segment(tx: &mut Transaction<'_, Sqlite>, plan_id: &str, segment: &RouteSegment) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO segments (plan_id, sequence_order, detail, hos_state_after, estimated_arrival, estimated_departure, status) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(plan_id)
    .bind(segment.sequence_order as i64)
    .bind(serde_json::to_string(&segment.detail)?)
    .bind(serde_json::to_string(&segment.hos_state_after)?)
    .bind(segment.estimated_arrival.to_rfc3339())
    .bind(segment.estimated_departure.to_rfc3339())
    .bind(segment_status_str(segment.status))
    .execute(&mut **tx)
    .await?;
    Ok(())
}

fn row_to_plan(row: sqlx::sqlite::SqliteRow, segments: Vec<RouteSegment>) -> Result<RoutePlan, StoreError> {
    let status: String = row.try_get("status")?;
    let optimization_priority: String = row.try_get("optimization_priority")?;
    let feasibility_issues: String = row.try_get("feasibility_issues")?;
    let compliance_report: String = row.try_get("compliance_report")?;
    Ok(RoutePlan {
        plan_id: row.try_get("plan_id")?,
        driver_id: row.try_get("driver_id")?,
        vehicle_id: row.try_get("vehicle_id")?,
        load_id: row.try_get("load_id")?,
        version: row.try_get::<i64, _>("version")? as u32,
        is_active: row.try_get("is_active")?,
        status: plan_status_from_str(&status)?,
        total_distance_miles: row.try_get("total_distance_miles")?,
        total_drive_time_h: row.try_get("total_drive_time_h")?,
        total_on_duty_time_h: row.try_get("total_on_duty_time_h")?,
        total_cost_estimate: row.try_get("total_cost_estimate")?,
        is_feasible: row.try_get("is_feasible")?,
        feasibility_issues: serde_json::from_str(&feasibility_issues)?,
        compliance_report: serde_json::from_str::<ComplianceReport>(&compliance_report)?,
        optimization_priority: optimization_priority_from_str(&optimization_priority)?,
        segments,
    })
}

fn row_to_segment(row: sqlx::sqlite::SqliteRow) -> Result<RouteSegment, StoreError> {
    let detail: String = row.try_get("detail")?;
    let hos_state_after: String = row.try_get("hos_state_after")?;
    let estimated_arrival: String = row.try_get("estimated_arrival")?;
    let estimated_departure: String = row.try_get("estimated_departure")?;
    let status: String = row.try_get("status")?;
    Ok(RouteSegment {
        sequence_order: row.try_get::<i64, _>("sequence_order")? as u32,
        detail: serde_json::from_str::<SegmentDetail>(&detail)?,
        hos_state_after: serde_json::from_str::<HosState>(&hos_state_after)?,
        estimated_arrival: parse_rfc3339(&estimated_arrival)?,
        estimated_departure: parse_rfc3339(&estimated_departure)?,
        status: segment_status_from_str(&status)?,
    })
}

fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, StoreError> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

fn plan_status_str(status: PlanStatus) -> &'static str {
    match status {
        PlanStatus::Draft => "draft",
        PlanStatus::Active => "active",
        PlanStatus::Completed => "completed",
        PlanStatus::Cancelled => "cancelled",
    }
}

fn plan_status_from_str(s: &str) -> Result<PlanStatus, StoreError> {
    match s {
        "draft" => Ok(PlanStatus::Draft),
        "active" => Ok(PlanStatus::Active),
        "completed" => Ok(PlanStatus::Completed),
        "cancelled" => Ok(PlanStatus::Cancelled),
        other => Err(StoreError::PreconditionFailed(format!("unknown plan status in store: {other}"))),
    }
}

fn optimization_priority_str(priority: OptimizationPriority) -> &'static str {
    match priority {
        OptimizationPriority::MinimizeTime => "minimize_time",
        OptimizationPriority::MinimizeCost => "minimize_cost",
        OptimizationPriority::Balance => "balance",
    }
}

fn optimization_priority_from_str(s: &str) -> Result<OptimizationPriority, StoreError> {
    match s {
        "minimize_time" => Ok(OptimizationPriority::MinimizeTime),
        "minimize_cost" => Ok(OptimizationPriority::MinimizeCost),
        "balance" => Ok(OptimizationPriority::Balance),
        other => Err(StoreError::PreconditionFailed(format!("unknown optimization priority in store: {other}"))),
    }
}

fn segment_status_str(status: SegmentStatus) -> &'static str {
    match status {
        SegmentStatus::Planned => "planned",
        SegmentStatus::InProgress => "in_progress",
        SegmentStatus::Completed => "completed",
        SegmentStatus::Skipped => "skipped",
        SegmentStatus::Cancelled => "cancelled",
    }
}

fn segment_status_from_str(s: &str) -> Result<SegmentStatus, StoreError> {
    match s {
        "planned" => Ok(SegmentStatus::Planned),
        "in_progress" => Ok(SegmentStatus::InProgress),
        "completed" => Ok(SegmentStatus::Completed),
        "skipped" => Ok(SegmentStatus::Skipped),
        "cancelled" => Ok(SegmentStatus::Cancelled),
        other => Err(StoreError::PreconditionFailed(format!("unknown segment status in store: {other}"))),
    }
}
