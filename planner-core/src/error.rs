//! Error taxonomy for the planning engine.
//!
//! Every public operation returns `Result<T, PlannerError>`. `kind()` gives
//! callers a stable string they can log or surface without matching on the
//! full enum.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("provider call failed: {0}")]
    ProviderFailure(String),

    #[error("plan store precondition failed: {0}")]
    StorePreconditionFailure(String),

    #[error("concurrency conflict on driver {driver_id}: {reason}")]
    ConcurrencyConflict { driver_id: String, reason: String },

    #[error("fatal invariant violation: {0}")]
    Fatal(String),
}

impl PlannerError {
    /// Stable kind code, independent of the human-readable message, for
    /// logging and for callers that want to branch on error class without a
    /// full match.
    pub fn kind(&self) -> &'static str {
        match self {
            PlannerError::InvalidInput(_) => "InvalidInput",
            PlannerError::InsufficientData(_) => "InsufficientData",
            PlannerError::ProviderFailure(_) => "ProviderFailure",
            PlannerError::StorePreconditionFailure(_) => "StorePreconditionFailure",
            PlannerError::ConcurrencyConflict { .. } => "ConcurrencyConflict",
            PlannerError::Fatal(_) => "Fatal",
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        PlannerError::InvalidInput(msg.into())
    }

    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        PlannerError::InsufficientData(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        PlannerError::Fatal(msg.into())
    }

    pub fn provider_failure(msg: impl Into<String>) -> Self {
        PlannerError::ProviderFailure(msg.into())
    }

    pub fn store_precondition_failure(msg: impl Into<String>) -> Self {
        PlannerError::StorePreconditionFailure(msg.into())
    }

    pub fn concurrency_conflict(driver_id: impl Into<String>, reason: impl Into<String>) -> Self {
        PlannerError::ConcurrencyConflict { driver_id: driver_id.into(), reason: reason.into() }
    }
}

pub type PlannerResult<T> = Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_stable_and_independent_of_message() {
        let a = PlannerError::invalid_input("hours_driven out of range");
        let b = PlannerError::invalid_input("something else entirely");
        assert_eq!(a.kind(), b.kind());
        assert_eq!(a.kind(), "InvalidInput");
    }

    #[test]
    fn concurrency_conflict_display_includes_driver_id() {
        let err = PlannerError::ConcurrencyConflict {
            driver_id: "drv-42".into(),
            reason: "replan already in flight".into(),
        };
        assert!(err.to_string().contains("drv-42"));
        assert_eq!(err.kind(), "ConcurrencyConflict");
    }
}
