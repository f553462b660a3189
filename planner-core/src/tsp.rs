//! Sequences stops with fixed origin/destination: greedy nearest-neighbor
//! construction followed by 2-opt local search on the interior.

use std::collections::HashMap;

use tracing::warn;

use crate::config::EngineConfig;
use crate::types::Stop;

/// A symmetric distance lookup keyed by stop id pairs. Missing entries fall
/// back to a configured constant with a warning — an internal safety net
/// for matrix gaps, distinct from a `DistanceProvider` failure which is
/// `InsufficientData`.
#[derive(Debug, Clone, Default)]
pub struct DistanceMatrix {
    entries: HashMap<(String, String), f64>,
}

impl DistanceMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, a: &str, b: &str, miles: f64) {
        self.entries.insert((a.to_string(), b.to_string()), miles);
        self.entries.insert((b.to_string(), a.to_string()), miles);
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.entries.get(&(a.to_string(), b.to_string())).copied()
    }
}

pub struct TspSequencer<'a> {
    cfg: &'a EngineConfig,
}

impl<'a> TspSequencer<'a> {
    pub fn new(cfg: &'a EngineConfig) -> Self {
        Self { cfg }
    }

    fn distance(&self, matrix: &DistanceMatrix, a: &str, b: &str) -> f64 {
        matrix.get(a, b).unwrap_or_else(|| {
            warn!(from = a, to = b, fallback_mi = self.cfg.tsp_missing_distance_fallback_mi, "distance matrix entry missing, using fallback");
            self.cfg.tsp_missing_distance_fallback_mi
        })
    }

    fn total_distance(&self, matrix: &DistanceMatrix, order: &[Stop]) -> f64 {
        order.windows(2).map(|w| self.distance(matrix, &w[0].id, &w[1].id)).sum()
    }

    /// Produces the visiting order for `stops`: origin first (if flagged),
    /// destination last (if flagged), every other stop visited exactly once,
    /// minimizing total distance.
    pub fn sequence(&self, stops: &[Stop], matrix: &DistanceMatrix) -> Vec<Stop> {
        if stops.len() <= 1 {
            return stops.to_vec();
        }

        let origin = stops.iter().find(|s| s.is_origin).cloned();
        let destination = stops.iter().find(|s| s.is_destination).cloned();
        let mut waypoints: Vec<Stop> = stops
            .iter()
            .filter(|s| !s.is_origin && !s.is_destination)
            .cloned()
            .collect();

        let mut order = self.greedy_nearest_neighbor(origin, &mut waypoints, destination);
        self.two_opt_improve(&mut order, matrix);
        order
    }

    fn greedy_nearest_neighbor(&self, origin: Option<Stop>, waypoints: &mut Vec<Stop>, destination: Option<Stop>) -> Vec<Stop> {
        let mut order = Vec::new();
        let mut current = if let Some(o) = origin.clone() {
            order.push(o.clone());
            Some(o)
        } else if let Some(first) = waypoints.first().cloned() {
            order.push(first.clone());
            waypoints.retain(|s| s.id != first.id);
            Some(first)
        } else {
            None
        };

        while !waypoints.is_empty() {
            let Some(cur) = &current else { break };
            let (idx, _) = waypoints
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    let da = crate::providers::haversine_miles(cur.lat, cur.lon, a.lat, a.lon);
                    let db = crate::providers::haversine_miles(cur.lat, cur.lon, b.lat, b.lon);
                    da.total_cmp(&db)
                })
                .expect("waypoints is non-empty");
            let next = waypoints.remove(idx);
            order.push(next.clone());
            current = Some(next);
        }

        if let Some(d) = destination {
            order.push(d);
        }
        order
    }

    /// 2-opt local search over the interior (endpoints pinned), capped at
    /// `max_2opt_iter` full passes. Position 0 never moves (origin is
    /// mandatory in a planning request); a flagged destination at the last
    /// position is likewise never moved.
    fn two_opt_improve(&self, order: &mut [Stop], matrix: &DistanceMatrix) {
        let n = order.len();
        if n < 4 {
            return;
        }
        let start = 1;
        let end = if order[n - 1].is_destination { n - 2 } else { n - 1 };
        if start >= end {
            return;
        }

        // The trailing edge `(j, j+1)` only exists up to `n - 2`; when the
        // final stop isn't a pinned destination, `end` reaches `n - 1` and
        // `order[j + 1]` would run off the end, so `j` gets its own cap.
        let j_end = if order[n - 1].is_destination { end } else { n - 2 };

        for _ in 0..self.cfg.max_2opt_iter {
            let mut improved = false;
            for i in start..=end {
                for j in (i + 1)..=j_end {
                    let d_before = self.distance(matrix, &order[i - 1].id, &order[i].id)
                        + self.distance(matrix, &order[j].id, &order[j + 1].id);
                    let d_after = self.distance(matrix, &order[i - 1].id, &order[j].id)
                        + self.distance(matrix, &order[i].id, &order[j + 1].id);
                    if d_after < d_before - 1e-9 {
                        order[i..=j].reverse();
                        improved = true;
                    }
                }
            }
            if !improved {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StopKind;

    fn stop(id: &str, lat: f64, lon: f64) -> Stop {
        Stop::new(id, id, lat, lon, StopKind::Customer)
    }

    #[test]
    fn trivial_for_single_stop() {
        let cfg = EngineConfig::default();
        let seq = TspSequencer::new(&cfg);
        let stops = vec![stop("a", 0.0, 0.0).as_origin()];
        let matrix = DistanceMatrix::new();
        assert_eq!(seq.sequence(&stops, &matrix).len(), 1);
    }

    #[test]
    fn pins_origin_first_and_destination_last() {
        let cfg = EngineConfig::default();
        let seq = TspSequencer::new(&cfg);
        let origin = stop("origin", 0.0, 0.0).as_origin();
        let dest = stop("dest", 10.0, 10.0).as_destination();
        let w1 = stop("w1", 1.0, 1.0);
        let w2 = stop("w2", 2.0, 2.0);
        let stops = vec![dest.clone(), w2.clone(), origin.clone(), w1.clone()];

        let mut matrix = DistanceMatrix::new();
        for a in &stops {
            for b in &stops {
                if a.id != b.id {
                    matrix.insert(&a.id, &b.id, crate::providers::haversine_miles(a.lat, a.lon, b.lat, b.lon));
                }
            }
        }

        let order = seq.sequence(&stops, &matrix);
        assert_eq!(order.len(), 4);
        assert_eq!(order.first().unwrap().id, "origin");
        assert_eq!(order.last().unwrap().id, "dest");
        let ids: std::collections::HashSet<_> = order.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn s7_two_opt_improves_a_crossing_pentagon() {
        let cfg = EngineConfig::default();
        let seq = TspSequencer::new(&cfg);
        let origin = stop("origin", 0.0, 0.0).as_origin();
        // A pentagon laid out so the input order crosses itself.
        let a = stop("a", 0.0, 4.0);
        let b = stop("b", 4.0, 0.0);
        let c = stop("c", 4.0, 4.0);
        let d = stop("d", 0.0, 0.1);
        let stops = vec![origin.clone(), a.clone(), b.clone(), c.clone(), d.clone()];

        let mut matrix = DistanceMatrix::new();
        for x in &stops {
            for y in &stops {
                if x.id != y.id {
                    matrix.insert(&x.id, &y.id, crate::providers::haversine_miles(x.lat, x.lon, y.lat, y.lon));
                }
            }
        }

        let greedy_order = vec![origin.clone(), a, b, c, d];
        let greedy_total = seq.total_distance(&matrix, &greedy_order);

        let optimized = seq.sequence(&stops, &matrix);
        let optimized_total = seq.total_distance(&matrix, &optimized);

        assert_eq!(optimized.first().unwrap().id, "origin");
        assert!(optimized_total <= greedy_total);
    }

    #[test]
    fn no_destination_with_several_waypoints_does_not_panic() {
        let cfg = EngineConfig::default();
        let seq = TspSequencer::new(&cfg);
        let origin = stop("origin", 0.0, 0.0).as_origin();
        let a = stop("a", 1.0, 1.0);
        let b = stop("b", 2.0, 2.0);
        let c = stop("c", 3.0, 3.0);
        let stops = vec![origin.clone(), a.clone(), b.clone(), c.clone()];

        let mut matrix = DistanceMatrix::new();
        for x in &stops {
            for y in &stops {
                if x.id != y.id {
                    matrix.insert(&x.id, &y.id, crate::providers::haversine_miles(x.lat, x.lon, y.lat, y.lon));
                }
            }
        }

        let order = seq.sequence(&stops, &matrix);
        assert_eq!(order.len(), 4);
        assert_eq!(order.first().unwrap().id, "origin");
        let ids: std::collections::HashSet<_> = order.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids.len(), 4);
    }
}
