//! The per-location pipeline: predict every channel, then combine.

use h3o::{LatLng, Resolution};
use serde::Serialize;

use crate::aggregate::{self, SafetyResult, WeightedRisk, Weights};
use crate::air_quality::{self, AirQualityReport};
use crate::error::Result;
use crate::hazard::{HazardKind, RiskAssessment};
use crate::predictor::Predictors;
use crate::weather::{self, WeatherReading, WeatherReport};

/// Resolution of the H3 cell reported for each location.
pub const CELL_RESOLUTION: Resolution = Resolution::Nine;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointQuery {
    pub lat: f64,
    pub lon: f64,
    pub weights: Weights,
    /// PM2.5 in µg/m³. Adds the air quality channel when present.
    pub pm25: Option<f64>,
    /// Adds the weather channel when present.
    pub weather: Option<WeatherReading>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub h3_cell: Option<String>,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        let h3_cell = LatLng::new(lat, lon)
            .ok()
            .map(|coord| coord.to_cell(CELL_RESOLUTION).to_string());
        Self { lat, lon, h3_cell }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointAssessment {
    pub location: Location,
    pub channels: Vec<RiskAssessment>,
    pub air_quality: Option<AirQualityReport>,
    pub weather: Option<WeatherReport>,
    pub safety: Result<SafetyResult>,
}

impl PointAssessment {
    pub fn channel(&self, kind: HazardKind) -> Option<&RiskAssessment> {
        self.channels.iter().find(|c| c.source == kind)
    }
}

/// Owns the predictors and the service default weights.
pub struct SafetyAssessor {
    predictors: Predictors,
    default_weights: Weights,
}

impl SafetyAssessor {
    pub fn new(predictors: Predictors, default_weights: Weights) -> Self {
        Self {
            predictors,
            default_weights,
        }
    }

    pub fn predictors(&self) -> &Predictors {
        &self.predictors
    }

    pub fn default_weights(&self) -> Weights {
        self.default_weights
    }

    pub fn default_query(&self, lat: f64, lon: f64) -> PointQuery {
        PointQuery {
            lat,
            lon,
            weights: self.default_weights,
            pm25: None,
            weather: None,
        }
    }

    pub fn assess(&self, query: &PointQuery) -> PointAssessment {
        let mut channels: Vec<RiskAssessment> =
            self.predictors.predict_all(query.lat, query.lon).into();

        let air_quality = query.pm25.and_then(|pm25| {
            let (assessment, report) = air_quality::assess_pm25(pm25);
            channels.push(assessment);
            report
        });

        let weather = query.weather.and_then(|reading| {
            let (assessment, report) = weather::assess_weather(&reading);
            channels.push(assessment);
            report
        });

        let inputs: Vec<WeightedRisk> = channels
            .iter()
            .map(|c| WeightedRisk::from_assessment(c, query.weights.for_kind(c.source)))
            .collect();
        let safety = aggregate::combine(&inputs);

        if let Err(e) = &safety {
            tracing::debug!(lat = query.lat, lon = query.lon, error = %e, "location not scored");
        }

        PointAssessment {
            location: Location::new(query.lat, query.lon),
            channels,
            air_quality,
            weather,
            safety,
        }
    }
}
