//! Weighted combination of hazard channels into a safety score.
//!
//! Weights are normalised to sum to one, risks are combined linearly and the
//! safety score is the complement of the combined risk. Status and risk level
//! are a pure function of the safety score.

use serde::{Deserialize, Serialize};

use crate::error::{AssessmentError, Result};
use crate::hazard::{HazardKind, Risk, RiskAssessment};

/// Lowest safety score rated SAFE.
pub const SAFE_THRESHOLD: f64 = 0.7;
/// Lowest safety score rated MODERATE.
pub const MODERATE_THRESHOLD: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyStatus {
    Safe,
    Moderate,
    Risky,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl SafetyStatus {
    pub fn from_score(safety_score: f64) -> Self {
        if safety_score >= SAFE_THRESHOLD {
            SafetyStatus::Safe
        } else if safety_score >= MODERATE_THRESHOLD {
            SafetyStatus::Moderate
        } else {
            SafetyStatus::Risky
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        match self {
            SafetyStatus::Safe => RiskLevel::Low,
            SafetyStatus::Moderate => RiskLevel::Medium,
            SafetyStatus::Risky => RiskLevel::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SafetyResult {
    pub safety_score: f64,
    pub status: SafetyStatus,
    pub risk_level: RiskLevel,
    pub combined_risk: f64,
}

impl SafetyResult {
    fn from_combined_risk(combined_risk: f64) -> Self {
        let safety_score = 1.0 - combined_risk;
        let status = SafetyStatus::from_score(safety_score);
        Self {
            safety_score,
            status,
            risk_level: status.risk_level(),
            combined_risk,
        }
    }
}

/// One channel's input to [`combine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedRisk {
    pub kind: HazardKind,
    pub risk: Option<Risk>,
    pub weight: f64,
}

impl WeightedRisk {
    pub fn new(kind: HazardKind, risk: Option<Risk>, weight: f64) -> Self {
        Self { kind, risk, weight }
    }

    pub fn from_assessment(assessment: &RiskAssessment, weight: f64) -> Self {
        Self::new(assessment.source, assessment.risk(), weight)
    }
}

/// Per-channel weights. Any channel that participates must have a finite,
/// non-negative weight, and the participating weights must sum to more than
/// zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub landslide: f64,
    pub flood: f64,
    pub air_quality: f64,
    pub weather: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            landslide: 0.5,
            flood: 0.5,
            air_quality: 0.5,
            weather: 0.5,
        }
    }
}

impl Weights {
    pub fn for_kind(&self, kind: HazardKind) -> f64 {
        match kind {
            HazardKind::Landslide => self.landslide,
            HazardKind::Flood => self.flood,
            HazardKind::AirQuality => self.air_quality,
            HazardKind::Weather => self.weather,
        }
    }

    /// Checks every weight.
    pub fn validate(&self) -> Result<()> {
        self.validate_for(&[HazardKind::AirQuality, HazardKind::Weather])
    }

    /// Checks landslide and flood plus the reading-driven channels in
    /// `optional`. Landslide and flood alone must carry positive weight, since
    /// a location without readings is scored on those two only.
    pub fn validate_for(&self, optional: &[HazardKind]) -> Result<()> {
        check_weight(HazardKind::Landslide, self.landslide)?;
        check_weight(HazardKind::Flood, self.flood)?;
        for &kind in optional {
            check_weight(kind, self.for_kind(kind))?;
        }
        check_total(self.landslide.max(self.flood))
    }
}

fn check_weight(kind: HazardKind, weight: f64) -> Result<()> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(AssessmentError::InvalidConfiguration(format!(
            "{kind} weight must be finite and non-negative, got {weight}"
        )));
    }
    Ok(())
}

fn check_total(total: f64) -> Result<()> {
    if total <= 0.0 {
        return Err(AssessmentError::InvalidConfiguration(format!(
            "total weight must be positive, got {total}"
        )));
    }
    Ok(())
}

/// Weights divided by their sum. When the raw sum overflows, the weights are
/// first scaled by the largest one.
fn normalise(inputs: &[WeightedRisk]) -> Result<Vec<f64>> {
    for input in inputs {
        check_weight(input.kind, input.weight)?;
    }

    let largest = inputs.iter().map(|input| input.weight).fold(0.0, f64::max);
    check_total(largest)?;

    let total: f64 = inputs.iter().map(|input| input.weight).sum();
    let (scale, total) = if total.is_finite() {
        (1.0, total)
    } else {
        let scaled: f64 = inputs.iter().map(|input| input.weight / largest).sum();
        (largest, scaled)
    };

    Ok(inputs.iter().map(|input| (input.weight / scale) / total).collect())
}

/// Combines any number of channels.
///
/// Absent channels make the whole result [`AssessmentError::AggregationIncomplete`],
/// whatever the weights. Otherwise invalid weights are rejected with
/// [`AssessmentError::InvalidConfiguration`].
pub fn combine(inputs: &[WeightedRisk]) -> Result<SafetyResult> {
    if inputs.is_empty() {
        return Err(AssessmentError::InvalidConfiguration(
            "at least one hazard channel is required".into(),
        ));
    }

    let missing: Vec<HazardKind> = inputs
        .iter()
        .filter(|input| input.risk.is_none())
        .map(|input| input.kind)
        .collect();
    if !missing.is_empty() {
        return Err(AssessmentError::AggregationIncomplete { missing });
    }

    let weights = normalise(inputs)?;
    let combined_risk: f64 = inputs
        .iter()
        .zip(weights)
        .filter_map(|(input, weight)| input.risk.map(|risk| weight * risk.value()))
        .sum();

    Ok(SafetyResult::from_combined_risk(combined_risk.clamp(0.0, 1.0)))
}

/// The two-channel form used for landslide and flood.
pub fn combine_pair(
    landslide: Option<Risk>,
    flood: Option<Risk>,
    w_landslide: f64,
    w_flood: f64,
) -> Result<SafetyResult> {
    combine(&[
        WeightedRisk::new(HazardKind::Landslide, landslide, w_landslide),
        WeightedRisk::new(HazardKind::Flood, flood, w_flood),
    ])
}
