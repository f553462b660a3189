//! Pure, stateless evaluator of the FMCSA 11/14/8 duty rules.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::PlannerResult;
use crate::types::HosState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    Warning,
    NonCompliant,
}

/// One of the three independent rule checks (drive-limit, duty-window, break).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub rule_name: String,
    pub is_compliant: bool,
    pub current_value: f64,
    pub limit_value: f64,
    pub remaining: f64,
    pub message: String,
}

impl ComplianceCheck {
    fn new(rule_name: &str, current_value: f64, limit_value: f64) -> Self {
        let remaining = (limit_value - current_value).max(0.0);
        let is_compliant = current_value <= limit_value;
        let message = if is_compliant {
            format!("{rule_name}: {current_value:.2} of {limit_value:.2} used, {remaining:.2} remaining")
        } else {
            format!("{rule_name} exceeded: {current_value:.2} of {limit_value:.2} allowed")
        };
        Self { rule_name: rule_name.to_string(), is_compliant, current_value, limit_value, remaining, message }
    }
}

/// Result of `HosRuleEngine::validate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub status: ComplianceStatus,
    pub is_compliant: bool,
    pub drive_limit_check: ComplianceCheck,
    pub duty_window_check: ComplianceCheck,
    pub break_check: ComplianceCheck,
    pub hours_remaining_to_drive: f64,
    pub hours_remaining_on_duty: f64,
    pub break_required: bool,
    pub rest_required: bool,
    pub violations: Vec<String>,
}

/// Stateless rule evaluator, parameterized by `EngineConfig` — constructed by
/// the caller and passed in, never a global singleton.
pub struct HosRuleEngine<'a> {
    cfg: &'a EngineConfig,
}

impl<'a> HosRuleEngine<'a> {
    pub fn new(cfg: &'a EngineConfig) -> Self {
        Self { cfg }
    }

    /// Evaluates `hos` against the 11/14/8 rules. Never fails for a
    /// previously-validated `HosState` — range checks already happened at
    /// `HosState::new`.
    pub fn validate(&self, hos: &HosState) -> PlannerResult<ComplianceResult> {
        let drive_limit_check = ComplianceCheck::new("drive_limit", hos.hours_driven, self.cfg.max_drive_h);
        let duty_window_check = ComplianceCheck::new("duty_window", hos.on_duty_time, self.cfg.max_duty_h);
        let break_check = ComplianceCheck::new("break_requirement", hos.hours_since_break, self.cfg.break_trigger_h);

        let all_compliant =
            drive_limit_check.is_compliant && duty_window_check.is_compliant && break_check.is_compliant;
        let any_near_limit = [&drive_limit_check, &duty_window_check, &break_check]
            .iter()
            .any(|c| c.remaining <= 1.0);

        let status = if !all_compliant {
            ComplianceStatus::NonCompliant
        } else if any_near_limit {
            ComplianceStatus::Warning
        } else {
            ComplianceStatus::Compliant
        };

        let mut violations = Vec::new();
        for check in [&drive_limit_check, &duty_window_check, &break_check] {
            if !check.is_compliant {
                violations.push(check.message.clone());
            }
        }

        let hours_remaining_to_drive = (self.cfg.max_drive_h - hos.hours_driven).max(0.0);
        let hours_remaining_on_duty = (self.cfg.max_duty_h - hos.on_duty_time).max(0.0);
        let break_required = hos.hours_since_break >= self.cfg.break_trigger_h;
        let rest_required = hos.hours_driven >= self.cfg.max_drive_h || hos.on_duty_time >= self.cfg.max_duty_h;

        Ok(ComplianceResult {
            status,
            is_compliant: all_compliant,
            drive_limit_check,
            duty_window_check,
            break_check,
            hours_remaining_to_drive,
            hours_remaining_on_duty,
            break_required,
            rest_required,
            violations,
        })
    }

    /// Convenience: can the driver legally drive `additional_hours` more
    /// right now, without a break or rest (original's `can_drive`).
    pub fn can_drive(&self, hos: &HosState, additional_hours: f64) -> bool {
        hos.hours_driven + additional_hours <= self.cfg.max_drive_h
            && hos.on_duty_time + additional_hours <= self.cfg.max_duty_h
            && hos.hours_since_break + additional_hours < self.cfg.break_trigger_h
    }

    /// Convenience: hours of driving remaining before a break, drive limit,
    /// or duty window forces a stop — whichever binds first (original's
    /// `hours_until_rest_required`).
    pub fn hours_until_rest_required(&self, hos: &HosState) -> f64 {
        let to_drive_limit = (self.cfg.max_drive_h - hos.hours_driven).max(0.0);
        let to_duty_limit = (self.cfg.max_duty_h - hos.on_duty_time).max(0.0);
        let to_break = (self.cfg.break_trigger_h - hos.hours_since_break).max(0.0);
        to_drive_limit.min(to_duty_limit).min(to_break)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_compliant_no_rest_needed() {
        let cfg = EngineConfig::default();
        let engine = HosRuleEngine::new(&cfg);
        let hos = HosState::new(5.0, 7.0, 4.0).unwrap();
        let result = engine.validate(&hos).unwrap();

        assert!(result.is_compliant);
        assert_eq!(result.status, ComplianceStatus::Compliant);
        assert_eq!(result.hours_remaining_to_drive, 6.0);
        assert!(!result.break_required);
        assert!(!result.rest_required);
    }

    #[test]
    fn s2_drive_limit_exceeded() {
        let cfg = EngineConfig::default();
        let engine = HosRuleEngine::new(&cfg);
        let hos = HosState::new(12.0, 13.0, 12.0).unwrap();
        let result = engine.validate(&hos).unwrap();

        assert!(!result.is_compliant);
        assert!(result.rest_required);
        assert_eq!(result.hours_remaining_to_drive, 0.0);
        assert!(result.violations.iter().any(|v| v.contains("drive_limit")));
    }

    #[test]
    fn warning_when_any_check_is_within_one_hour() {
        let cfg = EngineConfig::default();
        let engine = HosRuleEngine::new(&cfg);
        let hos = HosState::new(10.5, 11.0, 3.0).unwrap();
        let result = engine.validate(&hos).unwrap();

        assert!(result.is_compliant);
        assert_eq!(result.status, ComplianceStatus::Warning);
    }

    #[test]
    fn idempotent_validate() {
        let cfg = EngineConfig::default();
        let engine = HosRuleEngine::new(&cfg);
        let hos = HosState::new(6.0, 8.0, 5.0).unwrap();
        assert_eq!(engine.validate(&hos).unwrap(), engine.validate(&hos).unwrap());
    }

    #[test]
    fn hours_until_rest_required_picks_the_tightest_bound() {
        let cfg = EngineConfig::default();
        let engine = HosRuleEngine::new(&cfg);
        let hos = HosState::new(2.0, 2.0, 7.5).unwrap();
        assert_eq!(engine.hours_until_rest_required(&hos), 0.5); // break binds first
    }
}
