//! Air quality channel driven by a caller-supplied PM2.5 reading.
//!
//! Concentrations map to the US EPA AQI by linear interpolation inside the
//! breakpoint band that contains them.

use serde::Serialize;

use crate::hazard::{ChannelOutcome, HazardKind, PredictionBasis, RiskAssessment, UnavailableReason};

/// AQI at which the channel reports full risk.
pub const AQI_FULL_RISK: f64 = 300.0;

const MAX_AQI: f64 = 500.0;

// (C_low, C_high, I_low, I_high), µg/m³ truncated to 0.1
const PM25_BREAKPOINTS: [(f64, f64, f64, f64); 7] = [
    (0.0, 12.0, 0.0, 50.0),
    (12.1, 35.4, 51.0, 100.0),
    (35.5, 55.4, 101.0, 150.0),
    (55.5, 150.4, 151.0, 200.0),
    (150.5, 250.4, 201.0, 300.0),
    (250.5, 350.4, 301.0, 400.0),
    (350.5, 500.4, 401.0, 500.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AqiCategory {
    Good,
    Moderate,
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    pub fn from_aqi(aqi: f64) -> Self {
        match aqi {
            a if a <= 50.0 => AqiCategory::Good,
            a if a <= 100.0 => AqiCategory::Moderate,
            a if a <= 150.0 => AqiCategory::UnhealthyForSensitiveGroups,
            a if a <= 200.0 => AqiCategory::Unhealthy,
            a if a <= 300.0 => AqiCategory::VeryUnhealthy,
            _ => AqiCategory::Hazardous,
        }
    }

    pub fn warnings(&self) -> &'static [&'static str] {
        match self {
            AqiCategory::Good | AqiCategory::Moderate => &[],
            AqiCategory::UnhealthyForSensitiveGroups => {
                &["Sensitive groups should reduce prolonged outdoor exertion"]
            }
            AqiCategory::Unhealthy => &[
                "Everyone should reduce prolonged outdoor exertion",
                "Sensitive groups should avoid outdoor activity",
            ],
            AqiCategory::VeryUnhealthy => &[
                "Avoid prolonged outdoor exertion",
                "Consider wearing an N95 mask outdoors",
            ],
            AqiCategory::Hazardous => &[
                "Health emergency: avoid all outdoor activity",
                "Postpone non-essential travel",
            ],
        }
    }
}

/// Converts a PM2.5 concentration to a rounded AQI. Returns `None` for
/// negative or non-finite concentrations.
pub fn aqi_from_pm25(pm25: f64) -> Option<f64> {
    if !pm25.is_finite() || pm25 < 0.0 {
        return None;
    }

    let c = (pm25 * 10.0).floor() / 10.0;
    let aqi = PM25_BREAKPOINTS
        .iter()
        .find(|(_, c_high, _, _)| c <= *c_high)
        .map(|&(c_low, c_high, i_low, i_high)| {
            (i_high - i_low) / (c_high - c_low) * (c - c_low) + i_low
        })
        .unwrap_or(MAX_AQI);

    Some(aqi.round())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualityReport {
    pub pm25: f64,
    pub aqi: f64,
    pub category: AqiCategory,
    pub risk: f64,
    pub warnings: Vec<&'static str>,
}

/// Scores a PM2.5 reading. The report is `None` when the reading is invalid.
pub fn assess_pm25(pm25: f64) -> (RiskAssessment, Option<AirQualityReport>) {
    let Some(aqi) = aqi_from_pm25(pm25) else {
        let assessment = RiskAssessment {
            source: HazardKind::AirQuality,
            outcome: ChannelOutcome::Unavailable(UnavailableReason::InvalidReading(format!(
                "pm25 {pm25} is not a valid concentration"
            ))),
            basis: PredictionBasis::Measurement,
        };
        return (assessment, None);
    };

    let risk = (aqi / AQI_FULL_RISK).min(1.0);
    let category = AqiCategory::from_aqi(aqi);
    let report = AirQualityReport {
        pm25,
        aqi,
        category,
        risk,
        warnings: category.warnings().to_vec(),
    };
    let assessment = RiskAssessment {
        source: HazardKind::AirQuality,
        outcome: ChannelOutcome::from_value(risk),
        basis: PredictionBasis::Measurement,
    };

    (assessment, Some(report))
}
