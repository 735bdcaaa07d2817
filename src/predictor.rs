//! Landslide and flood predictors.
//!
//! A predictor is constructed once at startup. Its availability is fixed at
//! construction from whether the model artifact exists on disk. Every call to
//! [`Predictor::predict`] returns a [`RiskAssessment`]; model problems never
//! escape as errors and instead fall back to the deterministic formulas in
//! [`synthetic`].

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::hazard::{
    ChannelOutcome, FallbackReason, HazardKind, PredictionBasis, RiskAssessment,
    UnavailableReason,
};

/// Degraded-mode risk formulas, used whenever no model produces a value.
///
/// Modulo is the Euclidean remainder, so it is never negative for a positive
/// divisor.
pub mod synthetic {
    pub fn landslide(lat: f64, lon: f64) -> f64 {
        let mut risk = (lat * 7.123 + lon * 3.456).rem_euclid(100.0).abs() / 100.0;

        // Mountainous bands
        if lat.rem_euclid(30.0).abs() > 15.0 {
            risk = (risk + 0.3).min(1.0);
        }

        // Flat bands
        if lat.rem_euclid(10.0).abs() < 2.0 {
            risk = (risk - 0.2).max(0.0);
        }

        risk
    }

    pub fn flood(lat: f64, lon: f64) -> f64 {
        let mut risk = (lon * 9.876 + lat * 5.432).rem_euclid(100.0).abs() / 100.0;

        // Low elevation
        if lon.rem_euclid(20.0).abs() < 10.0 {
            risk = (risk + 0.25).min(1.0);
        }

        // High elevation
        if lat.rem_euclid(25.0).abs() > 20.0 {
            risk = (risk - 0.15).max(0.0);
        }

        // Water proximity
        if lat.rem_euclid(5.0) < 1.0 || lon.rem_euclid(5.0) < 1.0 {
            risk = (risk + 0.2).min(1.0);
        }

        risk
    }
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("inference failed: {0}")]
    Inference(String),
}

/// A real inference backend for one hazard channel.
pub trait RiskModel: Send + Sync {
    fn infer(&self, lat: f64, lon: f64) -> Result<f64, ModelError>;
}

type Formula = fn(f64, f64) -> f64;

pub struct Predictor {
    kind: HazardKind,
    model_path: PathBuf,
    is_available: bool,
    model: Option<Box<dyn RiskModel>>,
    formula: Formula,
}

impl Predictor {
    pub fn landslide(model_path: impl Into<PathBuf>) -> Self {
        Self::new(HazardKind::Landslide, model_path.into(), synthetic::landslide)
    }

    pub fn flood(model_path: impl Into<PathBuf>) -> Self {
        Self::new(HazardKind::Flood, model_path.into(), synthetic::flood)
    }

    fn new(kind: HazardKind, model_path: PathBuf, formula: Formula) -> Self {
        let is_available = model_path.exists();
        if is_available {
            tracing::info!(channel = %kind, path = %model_path.display(), "model artifact found");
        } else {
            tracing::warn!(
                channel = %kind,
                path = %model_path.display(),
                "model artifact not found; using synthetic formula"
            );
        }

        Self {
            kind,
            model_path,
            is_available,
            model: None,
            formula,
        }
    }

    /// Attaches an inference backend. It is only consulted when the model
    /// artifact was present at construction.
    pub fn with_model(mut self, model: Box<dyn RiskModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn kind(&self) -> HazardKind {
        self.kind
    }

    pub fn is_available(&self) -> bool {
        self.is_available
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn predict(&self, lat: f64, lon: f64) -> RiskAssessment {
        if !lat.is_finite() || !lon.is_finite() {
            return RiskAssessment {
                source: self.kind,
                outcome: ChannelOutcome::Unavailable(UnavailableReason::ComputeFailure(
                    format!("non-finite coordinates ({lat}, {lon})"),
                )),
                basis: PredictionBasis::Synthetic {
                    reason: self.idle_reason(),
                },
            };
        }

        let reason = match (self.is_available, &self.model) {
            (true, Some(model)) => match model.infer(lat, lon) {
                Ok(value) if (0.0..=1.0).contains(&value) => {
                    return RiskAssessment {
                        source: self.kind,
                        outcome: ChannelOutcome::from_value(value),
                        basis: PredictionBasis::Model,
                    };
                }
                Ok(value) => {
                    tracing::error!(channel = %self.kind, value, "model returned out-of-range risk");
                    FallbackReason::ModelFailure(format!("risk {value} outside [0, 1]"))
                }
                Err(e) => {
                    tracing::error!(channel = %self.kind, error = %e, "model prediction failed");
                    FallbackReason::ModelFailure(e.to_string())
                }
            },
            _ => self.idle_reason(),
        };

        RiskAssessment {
            source: self.kind,
            outcome: ChannelOutcome::from_value((self.formula)(lat, lon)),
            basis: PredictionBasis::Synthetic { reason },
        }
    }

    fn idle_reason(&self) -> FallbackReason {
        if self.is_available {
            FallbackReason::ModelNotIntegrated
        } else {
            FallbackReason::ModelUnavailable
        }
    }
}

/// The predictor set shared by every request.
pub struct Predictors {
    pub landslide: Predictor,
    pub flood: Predictor,
}

impl Predictors {
    pub fn new(landslide: Predictor, flood: Predictor) -> Self {
        Self { landslide, flood }
    }

    pub fn from_paths(landslide: impl Into<PathBuf>, flood: impl Into<PathBuf>) -> Self {
        Self::new(Predictor::landslide(landslide), Predictor::flood(flood))
    }

    pub fn predict_all(&self, lat: f64, lon: f64) -> [RiskAssessment; 2] {
        [
            self.landslide.predict(lat, lon),
            self.flood.predict(lat, lon),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct FixedModel(f64);

    impl RiskModel for FixedModel {
        fn infer(&self, _lat: f64, _lon: f64) -> Result<f64, ModelError> {
            Ok(self.0)
        }
    }

    struct BrokenModel;

    impl RiskModel for BrokenModel {
        fn infer(&self, _lat: f64, _lon: f64) -> Result<f64, ModelError> {
            Err(ModelError::Inference("terrain tile missing".into()))
        }
    }

    fn missing_path() -> PathBuf {
        PathBuf::from("/nonexistent/safesafar/model")
    }

    #[test]
    fn landslide_formula_known_values() {
        // 28.7041 * 7.123 + 77.1025 * 3.456 ≈ 470.92, +0.3 in the 15..30 band
        assert_eq!(synthetic::landslide(28.7041, 77.1025), 1.0);
        // lat = 30 sits in the flat band: 213.69 % 100 = 13.69, -0.2 clamps at 0
        assert_eq!(synthetic::landslide(30.0, 0.0), 0.0);
    }

    #[test]
    fn flood_formula_known_values() {
        // lon = 0 is both low elevation and water-adjacent
        assert_eq!(synthetic::flood(30.0, 0.0), 1.0);
        let expected = {
            let base = (77.1025f64 * 9.876 + 28.7041 * 5.432).rem_euclid(100.0) / 100.0;
            base.min(1.0)
        };
        assert_eq!(synthetic::flood(28.7041, 77.1025), expected);
    }

    #[test]
    fn negative_coordinates_use_euclidean_remainder() {
        let risk = synthetic::landslide(-12.5, -33.3);
        assert!((0.0..=1.0).contains(&risk));
        // -12.5 mod 30 = 17.5 (> 15) and -12.5 mod 10 = 7.5
        let base = (-12.5f64 * 7.123 + -33.3 * 3.456).rem_euclid(100.0) / 100.0;
        assert_eq!(risk, (base + 0.3).min(1.0));
    }

    #[test]
    fn missing_artifact_is_unavailable_and_synthetic() {
        let predictor = Predictor::landslide(missing_path());
        assert!(!predictor.is_available());

        let assessment = predictor.predict(28.4595, 77.0266);
        assert_eq!(assessment.source, HazardKind::Landslide);
        assert_eq!(
            assessment.basis,
            PredictionBasis::Synthetic {
                reason: FallbackReason::ModelUnavailable
            }
        );
        assert_eq!(
            assessment.risk().map(|r| r.value()),
            Some(synthetic::landslide(28.4595, 77.0266))
        );
    }

    #[test]
    fn present_artifact_without_backend_reports_not_integrated() {
        let dir = tempfile::tempdir().unwrap();
        let predictor = Predictor::flood(dir.path());
        assert!(predictor.is_available());
        assert_eq!(predictor.kind(), HazardKind::Flood);
        assert_eq!(predictor.model_path(), dir.path());

        let assessment = predictor.predict(10.0, 10.0);
        assert_eq!(
            assessment.basis,
            PredictionBasis::Synthetic {
                reason: FallbackReason::ModelNotIntegrated
            }
        );
    }

    #[test]
    fn backend_value_used_when_available() {
        let dir = tempfile::tempdir().unwrap();
        let predictor = Predictor::flood(dir.path()).with_model(Box::new(FixedModel(0.42)));

        let assessment = predictor.predict(10.0, 10.0);
        assert_eq!(assessment.basis, PredictionBasis::Model);
        assert_eq!(assessment.risk().map(|r| r.value()), Some(0.42));
    }

    #[test]
    fn backend_ignored_without_artifact() {
        let predictor =
            Predictor::flood(missing_path()).with_model(Box::new(FixedModel(0.42)));
        let assessment = predictor.predict(10.0, 10.0);
        assert_eq!(
            assessment.risk().map(|r| r.value()),
            Some(synthetic::flood(10.0, 10.0))
        );
    }

    #[test]
    fn backend_failure_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let predictor = Predictor::landslide(dir.path()).with_model(Box::new(BrokenModel));

        let assessment = predictor.predict(45.0, 7.0);
        assert!(matches!(
            assessment.basis,
            PredictionBasis::Synthetic {
                reason: FallbackReason::ModelFailure(_)
            }
        ));
        assert_eq!(
            assessment.risk().map(|r| r.value()),
            Some(synthetic::landslide(45.0, 7.0))
        );
    }

    #[test]
    fn out_of_range_backend_value_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let predictor = Predictor::landslide(dir.path()).with_model(Box::new(FixedModel(1.5)));

        let assessment = predictor.predict(45.0, 7.0);
        assert_eq!(
            assessment.risk().map(|r| r.value()),
            Some(synthetic::landslide(45.0, 7.0))
        );
    }

    #[test]
    fn non_finite_coordinates_are_unavailable() {
        let predictor = Predictor::flood(missing_path());
        assert!(predictor.predict(f64::NAN, 77.0).risk().is_none());
        assert!(predictor.predict(28.0, f64::INFINITY).risk().is_none());
    }

    proptest! {
        #[test]
        fn synthetic_risk_within_bounds(lat in -1000.0f64..1000.0, lon in -1000.0f64..1000.0) {
            let l = synthetic::landslide(lat, lon);
            let f = synthetic::flood(lat, lon);
            prop_assert!((0.0..=1.0).contains(&l), "landslide {} at ({}, {})", l, lat, lon);
            prop_assert!((0.0..=1.0).contains(&f), "flood {} at ({}, {})", f, lat, lon);
        }

        #[test]
        fn predictions_always_available_for_finite_input(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
            let predictors = Predictors::from_paths(missing_path(), missing_path());
            for assessment in predictors.predict_all(lat, lon) {
                prop_assert!(assessment.risk().is_some());
            }
        }
    }
}
