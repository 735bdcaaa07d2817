//! Route evaluation over an ordered list of waypoints.
//!
//! Waypoints are assessed independently and in parallel; results come back in
//! input order. A waypoint that cannot be scored is kept in the output and left
//! out of the average.

use geo::prelude::*;
use geo::Point;
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::aggregate::{SafetyStatus, Weights};
use crate::assessor::{PointAssessment, PointQuery, SafetyAssessor};
use crate::error::{AssessmentError, Result};
use crate::hazard::HazardKind;
use crate::weather::WeatherReading;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub name: Option<String>,
    /// PM2.5 reading at this waypoint, µg/m³.
    #[serde(default)]
    pub pm25: Option<f64>,
    #[serde(default)]
    pub weather: Option<WeatherReading>,
}

impl Waypoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            name: None,
            pm25: None,
            weather: None,
        }
    }

    pub fn named(lat: f64, lon: f64, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(lat, lon)
        }
    }

    fn point(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaypointResult {
    pub waypoint: Waypoint,
    pub assessment: PointAssessment,
}

impl WaypointResult {
    pub fn safety_score(&self) -> Option<f64> {
        self.assessment.safety.as_ref().ok().map(|s| s.safety_score)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub waypoints: Vec<WaypointResult>,
    /// Mean over scored waypoints. `None` when no waypoint could be scored.
    pub average_safety: Option<f64>,
    pub route_status: Option<SafetyStatus>,
    pub scored: usize,
    pub unscored: usize,
    pub total_distance_m: f64,
}

pub fn evaluate_route(
    assessor: &SafetyAssessor,
    waypoints: &[Waypoint],
    weights: Weights,
) -> Result<RouteSummary> {
    if waypoints.is_empty() {
        return Err(AssessmentError::EmptyRoute);
    }
    weights.validate_for(&reading_channels(waypoints))?;

    let results: Vec<WaypointResult> = waypoints
        .par_iter()
        .map(|waypoint| {
            let query = PointQuery {
                lat: waypoint.lat,
                lon: waypoint.lon,
                weights,
                pm25: waypoint.pm25,
                weather: waypoint.weather,
            };
            WaypointResult {
                waypoint: waypoint.clone(),
                assessment: assessor.assess(&query),
            }
        })
        .collect();

    let scores: Vec<f64> = results.iter().filter_map(WaypointResult::safety_score).collect();
    let scored = scores.len();
    let unscored = results.len() - scored;

    for (index, result) in results.iter().enumerate() {
        if let Err(e) = &result.assessment.safety {
            tracing::warn!(index, name = ?result.waypoint.name, error = %e, "waypoint unscored");
        }
    }

    let average_safety = (scored > 0).then(|| scores.iter().sum::<f64>() / scored as f64);
    let route_status = average_safety.map(SafetyStatus::from_score);

    tracing::debug!(
        waypoints = results.len(),
        scored,
        unscored,
        average_safety = ?average_safety,
        "route evaluated"
    );

    Ok(RouteSummary {
        total_distance_m: path_length(waypoints),
        waypoints: results,
        average_safety,
        route_status,
        scored,
        unscored,
    })
}

/// Reading-driven channels that at least one waypoint brings in.
fn reading_channels(waypoints: &[Waypoint]) -> Vec<HazardKind> {
    let mut kinds = Vec::new();
    if waypoints.iter().any(|w| w.pm25.is_some()) {
        kinds.push(HazardKind::AirQuality);
    }
    if waypoints.iter().any(|w| w.weather.is_some()) {
        kinds.push(HazardKind::Weather);
    }
    kinds
}

/// Haversine length through consecutive waypoints, in meters.
pub fn path_length(waypoints: &[Waypoint]) -> f64 {
    waypoints
        .iter()
        .tuple_windows()
        .map(|(a, b)| a.point().haversine_distance(&b.point()))
        .filter(|d| d.is_finite())
        .fold(0.0, |total, d| total + d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::combine_pair;
    use crate::hazard::{HazardKind, Risk};
    use crate::predictor::{synthetic, Predictors};

    fn assessor() -> SafetyAssessor {
        SafetyAssessor::new(
            Predictors::from_paths("/nonexistent/lhasa", "/nonexistent/flood"),
            Weights::default(),
        )
    }

    fn delhi_route() -> Vec<Waypoint> {
        vec![
            Waypoint::named(28.7041, 77.1025, "New Delhi"),
            Waypoint::named(28.4595, 77.0266, "Gurgaon"),
            Waypoint::named(28.5921, 77.0489, "Noida"),
        ]
    }

    fn expected_score(lat: f64, lon: f64) -> f64 {
        combine_pair(
            Risk::new(synthetic::landslide(lat, lon)),
            Risk::new(synthetic::flood(lat, lon)),
            0.5,
            0.5,
        )
        .unwrap()
        .safety_score
    }

    #[test]
    fn empty_route_rejected() {
        let err = evaluate_route(&assessor(), &[], Weights::default()).unwrap_err();
        assert_eq!(err, AssessmentError::EmptyRoute);
    }

    #[test]
    fn average_of_delhi_waypoints() {
        let route = delhi_route();
        let summary = evaluate_route(&assessor(), &route, Weights::default()).unwrap();

        let scores: Vec<f64> = route.iter().map(|w| expected_score(w.lat, w.lon)).collect();
        let mean = (scores[0] + scores[1] + scores[2]) / 3.0;

        assert_eq!(summary.scored, 3);
        assert_eq!(summary.unscored, 0);
        assert_eq!(summary.average_safety, Some(mean));
        assert!((mean - 0.420_329_391_333_333_5).abs() < 1e-12);
        assert_eq!(summary.route_status, Some(SafetyStatus::Moderate));

        for (result, score) in summary.waypoints.iter().zip(&scores) {
            assert_eq!(result.safety_score(), Some(*score));
        }
    }

    #[test]
    fn per_waypoint_scores_match_formula() {
        let summary = evaluate_route(&assessor(), &delhi_route(), Weights::default()).unwrap();
        let expected = [0.413_075_193_999_999_9, 0.428_861_731_500_000_2, 0.419_051_248_500_000_2];
        for (result, value) in summary.waypoints.iter().zip(expected) {
            let score = result.safety_score().unwrap();
            assert!((score - value).abs() < 1e-12, "{score} != {value}");
        }
    }

    #[test]
    fn output_order_matches_input() {
        let mut route = delhi_route();
        route.extend((0..20).map(|i| Waypoint::new(10.0 + i as f64, 70.0 - i as f64)));

        let summary = evaluate_route(&assessor(), &route, Weights::default()).unwrap();
        let order: Vec<_> = summary.waypoints.iter().map(|r| r.waypoint.clone()).collect();
        assert_eq!(order, route);
    }

    #[test]
    fn unscorable_waypoint_excluded_from_average() {
        let mut route = delhi_route();
        route.insert(1, Waypoint::new(f64::NAN, 77.0));

        let summary = evaluate_route(&assessor(), &route, Weights::default()).unwrap();
        assert_eq!(summary.scored, 3);
        assert_eq!(summary.unscored, 1);
        assert_eq!(summary.waypoints.len(), 4);
        assert!(matches!(
            summary.waypoints[1].assessment.safety,
            Err(AssessmentError::AggregationIncomplete { ref missing })
                if missing == &vec![HazardKind::Landslide, HazardKind::Flood]
        ));

        let clean = evaluate_route(&assessor(), &delhi_route(), Weights::default()).unwrap();
        assert_eq!(summary.average_safety, clean.average_safety);
    }

    #[test]
    fn invalid_reading_unscores_only_that_waypoint() {
        let mut route = delhi_route();
        route[2].pm25 = Some(-1.0);

        let summary = evaluate_route(&assessor(), &route, Weights::default()).unwrap();
        assert_eq!(summary.unscored, 1);
        assert!(summary.waypoints[2].safety_score().is_none());
    }

    #[test]
    fn all_unscored_has_no_average() {
        let route = vec![Waypoint::new(f64::NAN, 0.0)];
        let summary = evaluate_route(&assessor(), &route, Weights::default()).unwrap();
        assert_eq!(summary.average_safety, None);
        assert_eq!(summary.route_status, None);
        assert_eq!(summary.unscored, 1);
    }

    #[test]
    fn invalid_weights_rejected_for_whole_route() {
        let weights = Weights {
            landslide: 0.0,
            flood: 0.0,
            ..Weights::default()
        };
        let err = evaluate_route(&assessor(), &delhi_route(), weights).unwrap_err();
        assert!(matches!(err, AssessmentError::InvalidConfiguration(_)));
    }

    #[test]
    fn reading_weights_checked_only_when_readings_present() {
        let weights = Weights {
            air_quality: -1.0,
            ..Weights::default()
        };
        assert!(evaluate_route(&assessor(), &delhi_route(), weights).is_ok());

        let mut route = delhi_route();
        route[0].pm25 = Some(12.0);
        let err = evaluate_route(&assessor(), &route, weights).unwrap_err();
        assert!(matches!(err, AssessmentError::InvalidConfiguration(_)));
    }

    #[test]
    fn weather_reading_scores_waypoint() {
        let mut route = delhi_route();
        route[1].weather = Some(WeatherReading {
            wind_kmh: 95.0,
            precipitation_mm: 30.0,
            humidity_pct: 90.0,
            temperature_c: Some(31.0),
        });

        let summary = evaluate_route(&assessor(), &route, Weights::default()).unwrap();
        let clean = evaluate_route(&assessor(), &delhi_route(), Weights::default()).unwrap();
        assert_eq!(summary.scored, 3);
        assert!(summary.waypoints[1].assessment.weather.is_some());
        assert!(summary.waypoints[1].safety_score() < clean.waypoints[1].safety_score());
        assert_eq!(summary.waypoints[0], clean.waypoints[0]);
    }

    #[test]
    fn path_length_sums_segments() {
        let route = delhi_route();
        let total = path_length(&route);
        // New Delhi → Gurgaon → Noida is a bit over 40 km
        assert!(total > 40_000.0 && total < 50_000.0, "{total}");
        let single = path_length(&route[..1]);
        assert_eq!(single, 0.0);
        assert!(single.is_sign_positive());
    }
}
