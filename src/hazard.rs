use serde::Serialize;
use std::fmt;

/// One independent risk source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    Landslide,
    Flood,
    AirQuality,
    Weather,
}

impl HazardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HazardKind::Landslide => "landslide",
            HazardKind::Flood => "flood",
            HazardKind::AirQuality => "air_quality",
            HazardKind::Weather => "weather",
        }
    }
}

impl fmt::Display for HazardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A risk value in `0.0..=1.0`. 0.0 = Safe, 1.0 = Dangerous.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Risk(f64);

impl Risk {
    /// Returns `None` for NaN, infinities and anything outside `0.0..=1.0`.
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Why a channel has no usable risk value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum UnavailableReason {
    /// The synthetic formula produced a value outside `0.0..=1.0`
    /// (only reachable with non-finite coordinates).
    ComputeFailure(String),
    /// A caller-supplied reading could not be interpreted.
    InvalidReading(String),
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::ComputeFailure(detail) => write!(f, "compute failure: {detail}"),
            UnavailableReason::InvalidReading(detail) => write!(f, "invalid reading: {detail}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChannelOutcome {
    Available { risk: Risk },
    Unavailable(UnavailableReason),
}

impl ChannelOutcome {
    pub fn from_value(value: f64) -> Self {
        match Risk::new(value) {
            Some(risk) => ChannelOutcome::Available { risk },
            None => ChannelOutcome::Unavailable(UnavailableReason::ComputeFailure(format!(
                "risk {value} outside [0, 1]"
            ))),
        }
    }

    pub fn risk(&self) -> Option<Risk> {
        match self {
            ChannelOutcome::Available { risk } => Some(*risk),
            ChannelOutcome::Unavailable(_) => None,
        }
    }
}

/// Why the synthetic formula was used instead of a model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// No model artifact at startup.
    ModelUnavailable,
    /// The artifact exists but no inference backend is attached.
    ModelNotIntegrated,
    /// The backend returned an error or an out-of-range value.
    ModelFailure(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictionBasis {
    Model,
    Synthetic { reason: FallbackReason },
    /// Derived from a caller-supplied measurement.
    Measurement,
}

/// Output of a single hazard channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub source: HazardKind,
    pub outcome: ChannelOutcome,
    pub basis: PredictionBasis,
}

impl RiskAssessment {
    pub fn risk(&self) -> Option<Risk> {
        self.outcome.risk()
    }
}
