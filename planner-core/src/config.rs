//! Process-wide tuning configuration.
//!
//! Constructed once at startup from immutable configuration and passed by
//! reference into every engine operation — never a lazily-initialized
//! singleton.

use serde::Deserialize;

/// A long/short sleeper-berth split pair, e.g. `(7.0, 3.0)`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SleeperSplit {
    pub long_hours: f64,
    pub short_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 11-hour driving limit.
    pub max_drive_h: f64,
    /// 14-hour on-duty window.
    pub max_duty_h: f64,
    /// Driving hours since a qualifying break that triggers a mandatory break.
    pub break_trigger_h: f64,
    /// Minutes of the mandatory break once triggered.
    pub required_break_min: u32,
    /// Hours of a full (10h) rest period.
    pub min_rest_h: f64,
    /// 7/3 sleeper-berth split.
    pub sleeper_split_7_3: SleeperSplit,
    /// 8/2 sleeper-berth split.
    pub sleeper_split_8_2: SleeperSplit,
    /// Safety buffer applied over the fuel required for a leg (0.20 = 20%).
    pub fuel_buffer: f64,
    /// Fraction of tank capacity considered "low fuel".
    pub low_fuel_frac: f64,
    /// Minimum traffic delay, in minutes, considered for any action.
    pub traffic_delay_threshold_min: u32,
    /// Dock-time variance, in hours, that makes a dock_time_change replan-eligible.
    pub dock_variance_threshold_h: f64,
    /// Fractional speed deviation that makes a speed_deviation trigger replan-eligible.
    pub speed_deviation_threshold: f64,
    /// Cap on 2-opt improvement iterations in the TSP sequencer.
    pub max_2opt_iter: usize,
    /// Hours of schedule shift that makes a HIGH-priority trigger replan (vs. ETA-only).
    pub high_priority_replan_threshold_h: f64,
    /// Rest-duration variance, in hours, that makes rest_duration_changed replan-eligible.
    pub rest_duration_variance_threshold_h: f64,
    /// Appointment-time delta, in hours, that makes appointment_changed replan-eligible.
    pub appointment_variance_threshold_h: f64,
    /// Radius, in miles, searched for a fuel station near a leg's origin.
    pub fuel_station_search_radius_mi: f64,
    /// Fallback distance, in miles, used by the TSP sequencer when a matrix
    /// entry is missing — an internal safety net, not a substitute for real
    /// provider failures.
    pub tsp_missing_distance_fallback_mi: f64,
    /// Timeout, in seconds, for a single `DistanceProvider` call.
    pub distance_provider_timeout_s: f64,
    /// Timeout, in seconds, for a single `RestAreaProvider` / `FuelStopProvider` call.
    pub location_provider_timeout_s: f64,
    /// Backoff, in milliseconds, before a provider call's single retry.
    pub provider_retry_backoff_ms: u64,
    /// Deadline, in seconds, a replan waits to acquire its driver's lock
    /// before failing with `ConcurrencyConflict`.
    pub replan_lock_wait_deadline_s: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_drive_h: 11.0,
            max_duty_h: 14.0,
            break_trigger_h: 8.0,
            required_break_min: 30,
            min_rest_h: 10.0,
            sleeper_split_7_3: SleeperSplit { long_hours: 7.0, short_hours: 3.0 },
            sleeper_split_8_2: SleeperSplit { long_hours: 8.0, short_hours: 2.0 },
            fuel_buffer: 0.20,
            low_fuel_frac: 0.25,
            traffic_delay_threshold_min: 30,
            dock_variance_threshold_h: 1.0,
            speed_deviation_threshold: 0.15,
            max_2opt_iter: 100,
            high_priority_replan_threshold_h: 1.0,
            rest_duration_variance_threshold_h: 0.5,
            appointment_variance_threshold_h: 0.5,
            fuel_station_search_radius_mi: 30.0,
            tsp_missing_distance_fallback_mi: 100.0,
            distance_provider_timeout_s: 5.0,
            location_provider_timeout_s: 2.0,
            provider_retry_backoff_ms: 1_000,
            replan_lock_wait_deadline_s: 5.0,
        }
    }
}
