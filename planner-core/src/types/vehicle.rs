use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};

/// A vehicle's fuel state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub fuel_capacity_gal: f64,
    pub current_fuel_gal: f64,
    pub mpg: f64,
}

impl VehicleState {
    /// Constructs a validated `VehicleState`. Enforces `0 <= current_fuel <=
    /// capacity` and `mpg > 0`.
    pub fn new(fuel_capacity_gal: f64, current_fuel_gal: f64, mpg: f64) -> PlannerResult<Self> {
        if fuel_capacity_gal <= 0.0 {
            return Err(PlannerError::invalid_input(format!(
                "fuel_capacity_gal must be positive, got {fuel_capacity_gal}"
            )));
        }
        if mpg <= 0.0 {
            return Err(PlannerError::invalid_input(format!("mpg must be positive, got {mpg}")));
        }
        if !(0.0..=fuel_capacity_gal).contains(&current_fuel_gal) {
            return Err(PlannerError::invalid_input(format!(
                "current_fuel_gal ({current_fuel_gal}) must be within [0, {fuel_capacity_gal}]"
            )));
        }
        Ok(Self { fuel_capacity_gal, current_fuel_gal, mpg })
    }

    pub fn fuel_fraction(&self) -> f64 {
        self.current_fuel_gal / self.fuel_capacity_gal
    }

    pub fn gallons_for_miles(&self, miles: f64) -> f64 {
        miles / self.mpg
    }

    pub fn refueled(&self) -> Self {
        Self { current_fuel_gal: self.fuel_capacity_gal, ..*self }
    }
}
