//! Hazard-aware safety scoring.
//!
//! Landslide and flood predictors (plus optional air quality and weather readings) feed
//! a weighted aggregator that produces a safety score and a categorical status
//! for a point. Routes apply the same pipeline to every waypoint and average
//! the scored ones.

pub mod aggregate;
pub mod air_quality;
pub mod api;
pub mod assessor;
pub mod config;
pub mod error;
pub mod hazard;
pub mod predictor;
pub mod route;
pub mod weather;

pub use aggregate::{combine, combine_pair, RiskLevel, SafetyResult, SafetyStatus, Weights};
pub use assessor::SafetyAssessor;
pub use error::AssessmentError;
pub use hazard::{ChannelOutcome, HazardKind, Risk, RiskAssessment};
pub use predictor::{Predictor, Predictors};
pub use route::{evaluate_route, RouteSummary, Waypoint};
pub use weather::{WeatherReading, WeatherType};
