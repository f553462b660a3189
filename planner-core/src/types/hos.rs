use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};

/// A driver's Hours-of-Service state. Always validated on construction —
/// never shared-mutable; every transition produces a new value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HosState {
    /// Hours of driving accumulated in the current duty period, in [0, 24].
    pub hours_driven: f64,
    /// Total on-duty hours (driving + non-driving duty + docks + breaks), in [0, 24].
    pub on_duty_time: f64,
    /// Driving hours accrued since the last qualifying break, in [0, 24].
    pub hours_since_break: f64,
}

impl HosState {
    pub const ZERO: HosState = HosState { hours_driven: 0.0, on_duty_time: 0.0, hours_since_break: 0.0 };

    /// Constructs a validated `HosState`. Returns `InvalidInput` if any field
    /// is outside `[0, 24]` or the `hours_driven <= on_duty_time` invariant
    /// is violated.
    pub fn new(hours_driven: f64, on_duty_time: f64, hours_since_break: f64) -> PlannerResult<Self> {
        for (name, v) in [
            ("hours_driven", hours_driven),
            ("on_duty_time", on_duty_time),
            ("hours_since_break", hours_since_break),
        ] {
            if !(0.0..=24.0).contains(&v) {
                return Err(PlannerError::invalid_input(format!(
                    "{name} must be in [0, 24], got {v}"
                )));
            }
        }
        if hours_driven > on_duty_time {
            return Err(PlannerError::invalid_input(format!(
                "hours_driven ({hours_driven}) must not exceed on_duty_time ({on_duty_time})"
            )));
        }
        Ok(Self { hours_driven, on_duty_time, hours_since_break })
    }

    /// Returns the HOS state after a full 10-hour rest: all three counters
    /// reset to zero.
    pub fn after_full_rest() -> Self {
        HosState::ZERO
    }

    /// Returns the HOS state after accruing `drive_time_h` of driving.
    pub fn after_driving(&self, drive_time_h: f64) -> Self {
        Self {
            hours_driven: self.hours_driven + drive_time_h,
            on_duty_time: self.on_duty_time + drive_time_h,
            hours_since_break: self.hours_since_break + drive_time_h,
        }
    }

    /// Returns the HOS state after `duty_time_h` of non-driving on-duty time
    /// (docks, fueling): counts toward on-duty and since-break, not driving.
    pub fn after_on_duty(&self, duty_time_h: f64) -> Self {
        Self {
            hours_driven: self.hours_driven,
            on_duty_time: self.on_duty_time + duty_time_h,
            hours_since_break: self.hours_since_break + duty_time_h,
        }
    }

    /// Returns the HOS state after a qualifying 30-minute break: zeroes
    /// `hours_since_break` only.
    pub fn after_break(&self) -> Self {
        Self { hours_since_break: 0.0, ..*self }
    }
}
