//! Storage-layer error type. Kept distinct from `PlannerError` so that SQL
//! and serialization failures have their own `#[error(...)]` messages; the
//! `From` conversion below is where they're folded into the core's error
//! taxonomy at the trait boundary.

use planner_core::PlannerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to serialize stored value: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("malformed timestamp in store: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("plan not found: {0}")]
    PlanNotFound(String),

    #[error("segment not found: plan {plan_id}, sequence_order {sequence_order}")]
    SegmentNotFound { plan_id: String, sequence_order: u32 },

    #[error("no active plan could be assigned: {0}")]
    PreconditionFailed(String),
}

impl From<StoreError> for PlannerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PlanNotFound(msg) => PlannerError::store_precondition_failure(msg),
            StoreError::SegmentNotFound { plan_id, sequence_order } => {
                PlannerError::store_precondition_failure(format!("segment not found: plan {plan_id}, sequence_order {sequence_order}"))
            }
            StoreError::PreconditionFailed(msg) => PlannerError::store_precondition_failure(msg),
            other => PlannerError::fatal(other.to_string()),
        }
    }
}
