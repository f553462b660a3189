//! Forward simulation that turns a stop sequence into a feasible list of
//! `RouteSegment`s, inserting rest and fuel stops as HOS and fuel
//! invariants require. The core algorithm of the engine.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::config::EngineConfig;
use crate::error::{PlannerError, PlannerResult};
use crate::providers::{call_with_retry, DistanceProvider, FuelStopProvider, RestAreaProvider, RoadClass};
use crate::tsp::DistanceMatrix;
use crate::types::{ComplianceReport, HosState, RestType, RouteSegment, SegmentDetail, Stop, VehicleState};

/// Output of one simulation run: the segment list plus the derived
/// compliance report.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub segments: Vec<RouteSegment>,
    pub compliance_report: ComplianceReport,
    pub is_feasible: bool,
    pub total_distance_miles: f64,
    pub total_drive_time_h: f64,
    pub total_on_duty_time_h: f64,
    pub total_cost_estimate: f64,
}

/// Segment-by-segment forward simulator.
///
/// `strict_rest_area_policy`: when `true`, a missing rest area at an HOS
/// cutover is a hard failure (`Fatal`) rather than a recorded feasibility
/// issue on an infeasible plan. Defaults to `false`.
pub struct RouteSimulator<'a> {
    cfg: &'a EngineConfig,
    strict_rest_area_policy: bool,
}

impl<'a> RouteSimulator<'a> {
    pub fn new(cfg: &'a EngineConfig) -> Self {
        Self { cfg, strict_rest_area_policy: false }
    }

    pub fn with_strict_rest_area_policy(mut self, strict: bool) -> Self {
        self.strict_rest_area_policy = strict;
        self
    }

    /// Runs the simulation over `sequence` (already TSP-ordered), starting
    /// from `initial_hos` / `initial_vehicle` at `start_time`.
    pub async fn simulate(
        &self,
        sequence: &[Stop],
        initial_hos: HosState,
        initial_vehicle: VehicleState,
        start_time: DateTime<Utc>,
        matrix: &DistanceMatrix,
        distance_provider: &dyn DistanceProvider,
        rest_area_provider: &dyn RestAreaProvider,
        fuel_stop_provider: &dyn FuelStopProvider,
    ) -> PlannerResult<SimulationOutcome> {
        let mut segments = Vec::new();
        let mut feasibility_issues = Vec::new();

        let mut cur_hos = initial_hos;
        let mut cur_vehicle = initial_vehicle;
        let mut cur_time = start_time;
        let mut max_hours_since_break_observed = cur_hos.hours_since_break;

        let mut total_distance_miles = 0.0;
        let mut total_cost_estimate = 0.0;
        let mut total_drive_time_h = 0.0;
        let mut total_on_duty_time_h = 0.0;

        for pair in sequence.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);

            let distance = match matrix.get(&a.id, &b.id) {
                Some(d) => d,
                None => call_with_retry(
                    "distance_provider.distance",
                    Duration::from_secs_f64(self.cfg.distance_provider_timeout_s),
                    Duration::from_millis(self.cfg.provider_retry_backoff_ms),
                    || distance_provider.distance(a, b),
                )
                .await
                .map_err(|e| PlannerError::insufficient_data(format!("no distance available for {}->{}: {e}", a.id, b.id)))?,
            };
            let drive_time = distance_provider.drive_time(distance, RoadClass::Unspecified);

            // Fuel check.
            let gallons_needed = cur_vehicle.gallons_for_miles(distance);
            if cur_vehicle.current_fuel_gal < gallons_needed * (1.0 + self.cfg.fuel_buffer) {
                let fuel_quote = call_with_retry(
                    "fuel_stop_provider.optimize",
                    Duration::from_secs_f64(self.cfg.location_provider_timeout_s),
                    Duration::from_millis(self.cfg.provider_retry_backoff_ms),
                    || fuel_stop_provider.optimize(a, b, cur_vehicle.current_fuel_gal, cur_vehicle.fuel_capacity_gal, cur_vehicle.mpg),
                )
                .await;
                match fuel_quote {
                    Ok(Some(quote)) => {
                        let arrival = cur_time;
                        let departure = cur_time + chrono::Duration::minutes(15);
                        cur_vehicle = cur_vehicle.refueled();
                        cur_hos = cur_hos.after_on_duty(0.25);
                        cur_time = departure;
                        total_cost_estimate += quote.estimated_cost;
                        total_on_duty_time_h += 0.25;
                        segments.push(RouteSegment::new(
                            segments.len() as u32 + 1,
                            SegmentDetail::Fuel {
                                gallons: quote.gallons_needed,
                                cost_estimate: quote.estimated_cost,
                                station: quote.station,
                            },
                            cur_hos,
                            arrival,
                            departure,
                        ));
                    }
                    Ok(None) => {
                        let msg = format!("no fuel station found near {}", a.id);
                        warn!(stop = %a.id, "{}", msg);
                        feasibility_issues.push(msg);
                    }
                    Err(e) => {
                        let msg = format!("fuel stop lookup near {} unresolved: {e}", a.id);
                        warn!(stop = %a.id, "{}", msg);
                        feasibility_issues.push(msg);
                    }
                }
            }

            // Drive, splitting the leg into <= max_drive_h chunks separated
            // by full rests whenever this leg alone outlasts one duty
            // period (a single leg can exceed 11h even starting from a
            // fresh HOS state).
            let mut remaining_drive_time = drive_time;
            let mut remaining_distance = distance;

            while remaining_drive_time > 1e-9 {
                let capacity = (self.cfg.max_drive_h - cur_hos.hours_driven).max(0.0);
                let mut chunk_time = remaining_drive_time.min(capacity);

                if chunk_time <= 1e-9 {
                    let rest_stop = call_with_retry(
                        "rest_area_provider.find_along_route",
                        Duration::from_secs_f64(self.cfg.location_provider_timeout_s),
                        Duration::from_millis(self.cfg.provider_retry_backoff_ms),
                        || rest_area_provider.find_along_route(a, b),
                    )
                    .await;
                    match rest_stop {
                        Ok(Some(stop)) => {
                            let arrival = cur_time;
                            let departure = cur_time + chrono::Duration::hours(self.cfg.min_rest_h as i64);
                            cur_hos = HosState::after_full_rest();
                            cur_time = departure;
                            segments.push(RouteSegment::new(
                                segments.len() as u32 + 1,
                                SegmentDetail::Rest {
                                    rest_type: RestType::FullRest,
                                    duration_h: self.cfg.min_rest_h,
                                    reason: format!("HOS drive limit reached near {}", stop.name),
                                },
                                cur_hos,
                                arrival,
                                departure,
                            ));
                            continue;
                        }
                        Ok(None) => {
                            let msg = "HOS limit reached but no rest stop found".to_string();
                            if self.strict_rest_area_policy {
                                return Err(PlannerError::fatal(msg));
                            }
                            warn!("{}", msg);
                            feasibility_issues.push(msg);
                            // No rest available to recover capacity; drive the
                            // remainder of the leg in one shot rather than spin.
                            chunk_time = remaining_drive_time;
                        }
                        Err(e) => {
                            let msg = format!("HOS limit reached but rest stop lookup unresolved: {e}");
                            if self.strict_rest_area_policy {
                                return Err(PlannerError::fatal(msg));
                            }
                            warn!("{}", msg);
                            feasibility_issues.push(msg);
                            chunk_time = remaining_drive_time;
                        }
                    }
                }

                let chunk_distance = remaining_distance * (chunk_time / remaining_drive_time);
                let drive_arrival = cur_time;
                let drive_departure = cur_time + chrono_duration_from_hours(chunk_time);
                cur_hos = cur_hos.after_driving(chunk_time);
                cur_vehicle.current_fuel_gal -= cur_vehicle.gallons_for_miles(chunk_distance);
                cur_time = drive_departure;
                total_distance_miles += chunk_distance;
                total_drive_time_h += chunk_time;
                total_on_duty_time_h += chunk_time;
                max_hours_since_break_observed = max_hours_since_break_observed.max(cur_hos.hours_since_break);

                segments.push(RouteSegment::new(
                    segments.len() as u32 + 1,
                    SegmentDetail::Drive { distance_miles: chunk_distance, drive_time_h: chunk_time, from: a.id.clone(), to: b.id.clone() },
                    cur_hos,
                    drive_arrival,
                    drive_departure,
                ));

                remaining_drive_time -= chunk_time;
                remaining_distance -= chunk_distance;
            }

            // Dock.
            if b.estimated_dock_hours > 0.0 {
                let dock_arrival = cur_time;
                let dock_departure = cur_time + chrono_duration_from_hours(b.estimated_dock_hours);
                cur_hos = cur_hos.after_on_duty(b.estimated_dock_hours);
                cur_time = dock_departure;
                total_on_duty_time_h += b.estimated_dock_hours;
                max_hours_since_break_observed = max_hours_since_break_observed.max(cur_hos.hours_since_break);

                segments.push(RouteSegment::new(
                    segments.len() as u32 + 1,
                    SegmentDetail::Dock { duration_h: b.estimated_dock_hours, customer: b.name.clone() },
                    cur_hos,
                    dock_arrival,
                    dock_departure,
                ));
            }
        }

        let breaks_planned =
            segments.iter().filter(|s| matches!(s.detail, SegmentDetail::Rest { .. })).count() as u32;

        let compliance_report = ComplianceReport {
            max_drive_hours_used: segments
                .iter()
                .map(|s| s.hos_state_after.hours_driven)
                .fold(0.0, f64::max),
            max_duty_hours_used: segments
                .iter()
                .map(|s| s.hos_state_after.on_duty_time)
                .fold(0.0, f64::max),
            breaks_required: (max_hours_since_break_observed / self.cfg.break_trigger_h).floor() as u32,
            breaks_planned,
            violations: feasibility_issues.clone(),
        };

        Ok(SimulationOutcome {
            is_feasible: feasibility_issues.is_empty(),
            segments,
            compliance_report,
            total_distance_miles,
            total_drive_time_h,
            total_on_duty_time_h,
            total_cost_estimate,
        })
    }
}

fn chrono_duration_from_hours(hours: f64) -> chrono::Duration {
    chrono::Duration::milliseconds((hours * 3_600_000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{FuelStopQuote, HaversineDistanceProvider, RestStopLocation, StaticFuelStopProvider};
    use crate::types::StopKind;
    use async_trait::async_trait;

    struct AlwaysFindsRestArea;

    #[async_trait]
    impl RestAreaProvider for AlwaysFindsRestArea {
        async fn find_along_route(&self, a: &Stop, _b: &Stop) -> PlannerResult<Option<RestStopLocation>> {
            Ok(Some(RestStopLocation {
                stop_id: "rest-1".into(),
                name: format!("Rest area near {}", a.id),
                lat: a.lat,
                lon: a.lon,
                amenities: vec!["parking".into()],
                distance_from_point_mi: 5.0,
            }))
        }
        async fn find_near(&self, _lat: f64, _lon: f64, _radius_mi: f64) -> PlannerResult<Vec<RestStopLocation>> {
            Ok(vec![])
        }
    }

    struct NeverNeedsFuel;

    #[async_trait]
    impl FuelStopProvider for NeverNeedsFuel {
        async fn optimize(
            &self,
            _from: &Stop,
            _to: &Stop,
            _current_fuel_gal: f64,
            _capacity_gal: f64,
            _mpg: f64,
        ) -> PlannerResult<Option<FuelStopQuote>> {
            Ok(None)
        }
    }

    fn stop(id: &str, lat: f64, lon: f64) -> Stop {
        Stop::new(id, id, lat, lon, StopKind::Customer)
    }

    #[tokio::test]
    async fn s5_mandatory_mid_route_rest_when_drive_exceeds_limit() {
        let cfg = EngineConfig::default();
        let sim = RouteSimulator::new(&cfg);

        // Laid out so the leg exceeds 11 hours of driving at 55mph default speed.
        let origin = stop("origin", 0.0, 0.0).as_origin();
        let destination = stop("dest", 9.0, 0.0).as_destination();
        let sequence = vec![origin, destination];

        let hos = HosState::new(0.0, 0.0, 0.0).unwrap();
        let vehicle = VehicleState::new(300.0, 300.0, 6.5).unwrap();
        let matrix = DistanceMatrix::new();
        let distance_provider = HaversineDistanceProvider::new();
        let rest_area = AlwaysFindsRestArea;
        let fuel = NeverNeedsFuel;

        let outcome = sim
            .simulate(&sequence, hos, vehicle, Utc::now(), &matrix, &distance_provider, &rest_area, &fuel)
            .await
            .unwrap();

        let has_full_rest = outcome.segments.iter().any(|s| {
            matches!(&s.detail, SegmentDetail::Rest { rest_type: RestType::FullRest, duration_h, .. } if *duration_h == 10.0)
        });
        assert!(has_full_rest, "expected a full_rest segment to be inserted");

        for seg in &outcome.segments {
            assert!(seg.hos_state_after.hours_driven <= cfg.max_drive_h + 1e-9);
        }
    }

    #[tokio::test]
    async fn feasible_short_trip_has_no_violations() {
        let cfg = EngineConfig::default();
        let sim = RouteSimulator::new(&cfg);
        let origin = stop("origin", 0.0, 0.0).as_origin();
        let destination = stop("dest", 0.2, 0.0).as_destination();
        let sequence = vec![origin, destination];

        let hos = HosState::new(0.0, 0.0, 0.0).unwrap();
        let vehicle = VehicleState::new(300.0, 300.0, 6.5).unwrap();
        let matrix = DistanceMatrix::new();
        let distance_provider = HaversineDistanceProvider::new();
        let rest_area = AlwaysFindsRestArea;
        let fuel = NeverNeedsFuel;

        let outcome = sim
            .simulate(&sequence, hos, vehicle, Utc::now(), &matrix, &distance_provider, &rest_area, &fuel)
            .await
            .unwrap();

        assert!(outcome.is_feasible);
        assert!(outcome.compliance_report.violations.is_empty());
    }

    #[tokio::test]
    async fn strict_policy_fails_fatally_without_a_rest_area() {
        struct NeverFindsRestArea;
        #[async_trait]
        impl RestAreaProvider for NeverFindsRestArea {
            async fn find_along_route(&self, _a: &Stop, _b: &Stop) -> PlannerResult<Option<RestStopLocation>> {
                Ok(None)
            }
            async fn find_near(&self, _lat: f64, _lon: f64, _radius_mi: f64) -> PlannerResult<Vec<RestStopLocation>> {
                Ok(vec![])
            }
        }

        let cfg = EngineConfig::default();
        let sim = RouteSimulator::new(&cfg).with_strict_rest_area_policy(true);
        let origin = stop("origin", 0.0, 0.0).as_origin();
        let destination = stop("dest", 9.0, 0.0).as_destination();
        let sequence = vec![origin, destination];

        let hos = HosState::new(0.0, 0.0, 0.0).unwrap();
        let vehicle = VehicleState::new(300.0, 300.0, 6.5).unwrap();
        let matrix = DistanceMatrix::new();
        let distance_provider = HaversineDistanceProvider::new();
        let rest_area = NeverFindsRestArea;
        let fuel = NeverNeedsFuel;

        let result = sim
            .simulate(&sequence, hos, vehicle, Utc::now(), &matrix, &distance_provider, &rest_area, &fuel)
            .await;
        assert!(matches!(result, Err(PlannerError::Fatal(_))));
    }
}
