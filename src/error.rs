use crate::hazard::HazardKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssessmentError {
    #[error("cannot assess: no risk available for {}", list_kinds(.missing))]
    AggregationIncomplete { missing: Vec<HazardKind> },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("route has no waypoints")]
    EmptyRoute,
}

impl AssessmentError {
    /// Stable tag for API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AssessmentError::AggregationIncomplete { .. } => "aggregation_incomplete",
            AssessmentError::InvalidConfiguration(_) => "invalid_configuration",
            AssessmentError::EmptyRoute => "empty_route",
        }
    }
}

fn list_kinds(kinds: &[HazardKind]) -> String {
    kinds
        .iter()
        .map(HazardKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, AssessmentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_message_lists_channels() {
        let err = AssessmentError::AggregationIncomplete {
            missing: vec![HazardKind::Landslide, HazardKind::AirQuality],
        };
        assert_eq!(
            err.to_string(),
            "cannot assess: no risk available for landslide, air_quality"
        );
        assert_eq!(err.kind(), "aggregation_incomplete");
    }
}
