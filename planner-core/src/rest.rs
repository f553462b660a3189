//! Decides what rest, if any, a driver should take before continuing.
//! Three analyses — feasibility, opportunity, cost — feed a decision
//! lattice; the first matching rule wins.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::PlannerResult;
use crate::types::{HosState, RestType};

/// One upcoming trip leg: drive time plus any dock/dwell time at its end.
/// A single post-load drive is modeled as a one-element slice of these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TripRequirement {
    pub drive_time_h: f64,
    pub dock_time_h: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitingFactor {
    DriveLimit,
    DutyWindow,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityAnalysis {
    pub total_drive_needed_h: f64,
    pub total_on_duty_needed_h: f64,
    pub drive_remaining_h: f64,
    pub duty_remaining_h: f64,
    pub is_feasible: bool,
    pub limiting_factor: LimitingFactor,
    pub drive_margin_h: f64,
    pub duty_margin_h: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpportunityAnalysis {
    pub dock_score: f64,
    pub hours_gainable_score: f64,
    pub criticality_score: f64,
    pub total_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostAnalysis {
    pub full_extension_h: f64,
    pub partial_extension_h: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestRecommendationKind {
    FullRest,
    PartialRest7_3,
    PartialRest8_2,
    Break,
    NoRest,
}

impl RestRecommendationKind {
    /// Maps a recommendation onto the segment-level `RestType`, where
    /// applicable.
    pub fn as_rest_type(&self) -> Option<RestType> {
        match self {
            RestRecommendationKind::FullRest => Some(RestType::FullRest),
            RestRecommendationKind::PartialRest7_3 => Some(RestType::PartialRest7_3),
            RestRecommendationKind::PartialRest8_2 => Some(RestType::PartialRest8_2),
            RestRecommendationKind::Break => Some(RestType::Break),
            RestRecommendationKind::NoRest => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestRecommendation {
    pub recommendation: RestRecommendationKind,
    pub duration_h: f64,
    pub confidence: u8,
    pub driver_can_decline: bool,
    pub limiting_factor: LimitingFactor,
    pub shortfall_h: f64,
    pub post_load_drive_feasible: bool,
    pub hours_after_rest_drive: f64,
    pub hours_after_rest_duty: f64,
    pub feasibility: FeasibilityAnalysis,
    pub opportunity: OpportunityAnalysis,
    pub cost: CostAnalysis,
}

pub struct RestOptimizer<'a> {
    cfg: &'a EngineConfig,
}

impl<'a> RestOptimizer<'a> {
    pub fn new(cfg: &'a EngineConfig) -> Self {
        Self { cfg }
    }

    /// Current dock opportunity, in hours, taken from the first upcoming
    /// trip in `trips` — the dock the driver is sitting at right now.
    fn current_dock_h(trips: &[TripRequirement]) -> f64 {
        trips.first().map(|t| t.dock_time_h).unwrap_or(0.0)
    }

    fn analyze_feasibility(&self, hos: &HosState, trips: &[TripRequirement]) -> FeasibilityAnalysis {
        let total_drive_needed_h: f64 = trips.iter().map(|t| t.drive_time_h).sum();
        let mut total_on_duty_needed_h: f64 = trips.iter().map(|t| t.drive_time_h + t.dock_time_h).sum();

        let hours_since_break_at_end = hos.hours_since_break + total_drive_needed_h;
        if hours_since_break_at_end >= self.cfg.break_trigger_h {
            total_on_duty_needed_h += 0.5;
        }

        let drive_remaining_h = (self.cfg.max_drive_h - hos.hours_driven).max(0.0);
        let duty_remaining_h = (self.cfg.max_duty_h - hos.on_duty_time).max(0.0);

        let drive_margin_h = drive_remaining_h - total_drive_needed_h;
        let duty_margin_h = duty_remaining_h - total_on_duty_needed_h;
        let is_feasible = drive_margin_h >= 0.0 && duty_margin_h >= 0.0;

        let limiting_factor = if is_feasible {
            LimitingFactor::None
        } else if drive_margin_h <= duty_margin_h {
            LimitingFactor::DriveLimit
        } else {
            LimitingFactor::DutyWindow
        };

        FeasibilityAnalysis {
            total_drive_needed_h,
            total_on_duty_needed_h,
            drive_remaining_h,
            duty_remaining_h,
            is_feasible,
            limiting_factor,
            drive_margin_h,
            duty_margin_h,
        }
    }

    fn analyze_opportunity(&self, hos: &HosState, dock_h: f64, feasibility: &FeasibilityAnalysis) -> OpportunityAnalysis {
        let dock_score = if dock_h >= self.cfg.min_rest_h {
            30.0
        } else if dock_h >= 8.0 {
            20.0
        } else if dock_h >= 2.0 {
            10.0
        } else {
            0.0
        };

        let hours_gainable_score = if dock_h >= 2.0 || dock_h >= self.cfg.min_rest_h {
            let gainable = (self.cfg.max_drive_h - feasibility.drive_remaining_h)
                .max(self.cfg.max_duty_h - feasibility.duty_remaining_h)
                .max(0.0);
            (gainable / self.cfg.max_drive_h * 30.0).min(30.0)
        } else {
            0.0
        };

        let criticality_ratio = (hos.hours_driven / self.cfg.max_drive_h).max(hos.on_duty_time / self.cfg.max_duty_h);
        let criticality_score = if criticality_ratio >= 0.90 {
            40.0
        } else if criticality_ratio >= 0.75 {
            30.0
        } else if criticality_ratio >= 0.50 {
            15.0
        } else {
            5.0
        };

        OpportunityAnalysis {
            dock_score,
            hours_gainable_score,
            criticality_score,
            total_score: dock_score + hours_gainable_score + criticality_score,
        }
    }

    fn analyze_cost(&self, dock_h: f64) -> CostAnalysis {
        CostAnalysis {
            full_extension_h: (self.cfg.min_rest_h - dock_h).max(0.0),
            partial_extension_h: (7.0 - dock_h).max(0.0),
        }
    }

    /// Applies `kind` to `hos`, returning the HOS state afterward.
    /// `PartialRest` approximates recovery as half the rest duration applied
    /// to both counters — a deliberate simplification, not FMCSA-accurate
    /// sleeper-berth pairing math.
    pub fn apply_rest(&self, hos: &HosState, kind: RestRecommendationKind, duration_h: f64) -> HosState {
        match kind {
            RestRecommendationKind::FullRest => HosState::after_full_rest(),
            RestRecommendationKind::PartialRest7_3 | RestRecommendationKind::PartialRest8_2 => {
                let recovered = 0.5 * duration_h;
                HosState {
                    hours_driven: (hos.hours_driven - recovered).max(0.0),
                    on_duty_time: (hos.on_duty_time - recovered).max(0.0),
                    hours_since_break: hos.hours_since_break,
                }
            }
            RestRecommendationKind::Break => hos.after_break(),
            RestRecommendationKind::NoRest => *hos,
        }
    }

    /// Recommends a rest action for a driver about to undertake `trips`.
    /// `trips` must be non-empty.
    pub fn recommend(&self, hos: &HosState, trips: &[TripRequirement]) -> PlannerResult<RestRecommendation> {
        let dock_h = Self::current_dock_h(trips);
        let feasibility = self.analyze_feasibility(hos, trips);
        let opportunity = self.analyze_opportunity(hos, dock_h, &feasibility);
        let cost = self.analyze_cost(dock_h);

        let shortfall_h = if feasibility.is_feasible {
            0.0
        } else {
            feasibility.drive_margin_h.min(feasibility.duty_margin_h).abs()
        };

        let (kind, duration_h, confidence, driver_can_decline) = if !feasibility.is_feasible {
            (RestRecommendationKind::FullRest, self.cfg.min_rest_h, 100, false)
        } else if hos.hours_since_break >= self.cfg.break_trigger_h {
            (RestRecommendationKind::Break, self.cfg.required_break_min as f64 / 60.0, 100, false)
        } else if (feasibility.drive_margin_h < 2.0 || feasibility.duty_margin_h < 2.0)
            && opportunity.total_score >= 50.0
            && cost.full_extension_h <= 5.0
        {
            (RestRecommendationKind::FullRest, self.cfg.min_rest_h, 75, true)
        } else if feasibility.drive_margin_h < 2.0 || feasibility.duty_margin_h < 2.0 {
            // Feasible marginal, but opportunity/cost gates for FULL_REST failed below.
            if opportunity.total_score >= 40.0 && cost.partial_extension_h <= 3.0 && dock_h >= 8.0 {
                (RestRecommendationKind::PartialRest8_2, self.cfg.sleeper_split_8_2.long_hours, 65, true)
            } else if opportunity.total_score >= 40.0 && cost.partial_extension_h <= 3.0 {
                (RestRecommendationKind::PartialRest7_3, self.cfg.sleeper_split_7_3.long_hours, 65, true)
            } else {
                (RestRecommendationKind::NoRest, 0.0, 60, true)
            }
        } else if opportunity.total_score >= 60.0 && cost.full_extension_h <= 5.0 {
            (RestRecommendationKind::FullRest, self.cfg.min_rest_h, 55, true)
        } else {
            (RestRecommendationKind::NoRest, 0.0, 80, true)
        };

        let hos_after = self.apply_rest(hos, kind, duration_h);
        let post_rest_feasibility = self.analyze_feasibility(&hos_after, trips);

        Ok(RestRecommendation {
            recommendation: kind,
            duration_h,
            confidence,
            driver_can_decline,
            limiting_factor: feasibility.limiting_factor,
            shortfall_h,
            post_load_drive_feasible: post_rest_feasibility.is_feasible,
            hours_after_rest_drive: post_rest_feasibility.drive_remaining_h,
            hours_after_rest_duty: post_rest_feasibility.duty_remaining_h,
            feasibility,
            opportunity,
            cost,
        })
    }
}
