//! Weather channel driven by caller-supplied surface readings.
//!
//! Each reading maps to a component risk over fixed bands. The channel risk is
//! the worst component, so one severe condition is enough to flag a location.

use serde::{Deserialize, Serialize};

use crate::hazard::{ChannelOutcome, HazardKind, PredictionBasis, RiskAssessment, UnavailableReason};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub wind_kmh: f64,
    /// mm/h
    pub precipitation_mm: f64,
    pub humidity_pct: f64,
    #[serde(default)]
    pub temperature_c: Option<f64>,
}

impl WeatherReading {
    fn validate(&self) -> Result<(), String> {
        if !self.wind_kmh.is_finite() || self.wind_kmh < 0.0 {
            return Err(format!("wind {} km/h", self.wind_kmh));
        }
        if !self.precipitation_mm.is_finite() || self.precipitation_mm < 0.0 {
            return Err(format!("precipitation {} mm", self.precipitation_mm));
        }
        if !(0.0..=100.0).contains(&self.humidity_pct) {
            return Err(format!("humidity {}%", self.humidity_pct));
        }
        if let Some(t) = self.temperature_c.filter(|t| !t.is_finite()) {
            return Err(format!("temperature {t} °C"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WeatherType {
    Clear,
    Humid,
    Windy,
    Rain,
    #[serde(rename = "Heavy Rain")]
    HeavyRain,
    Storm,
}

impl WeatherType {
    pub fn classify(reading: &WeatherReading) -> Self {
        let WeatherReading {
            wind_kmh: wind,
            precipitation_mm: precip,
            humidity_pct: humidity,
            ..
        } = *reading;

        if wind >= 60.0 || (precip >= 10.0 && wind >= 40.0) {
            WeatherType::Storm
        } else if precip >= 10.0 {
            WeatherType::HeavyRain
        } else if precip >= 0.5 {
            WeatherType::Rain
        } else if wind >= 40.0 {
            WeatherType::Windy
        } else if humidity >= 90.0 {
            WeatherType::Humid
        } else {
            WeatherType::Clear
        }
    }
}

/// Per-condition risk, each in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherImpact {
    pub wind: f64,
    pub precipitation: f64,
    pub humidity: f64,
    pub temperature: f64,
}

impl WeatherImpact {
    pub fn from_reading(reading: &WeatherReading) -> Self {
        // Gusts above 90 km/h make travel unsafe
        let wind = match reading.wind_kmh {
            w if w < 20.0 => 0.0,
            w if w < 40.0 => 0.3 * (w - 20.0) / 20.0,
            w if w < 60.0 => 0.3 + 0.3 * (w - 40.0) / 20.0,
            w if w < 90.0 => 0.6 + 0.4 * (w - 60.0) / 30.0,
            _ => 1.0,
        };

        let precipitation = match reading.precipitation_mm {
            p if p < 0.5 => 0.0,
            p if p < 2.5 => 0.1 + 0.1 * (p - 0.5) / 2.0,
            p if p < 10.0 => 0.2 + 0.3 * (p - 2.5) / 7.5,
            p if p < 50.0 => 0.5 + 0.4 * (p - 10.0) / 40.0,
            _ => 1.0,
        };

        // Near saturation: fog and poor visibility
        let humidity = if reading.humidity_pct > 90.0 {
            0.2 * (reading.humidity_pct - 90.0) / 10.0
        } else {
            0.0
        };

        let temperature = match reading.temperature_c {
            Some(t) if t > 35.0 => ((t - 35.0) / 12.5).min(0.8),
            Some(t) if t < 0.0 => (-t / 25.0).min(0.8),
            _ => 0.0,
        };

        Self {
            wind,
            precipitation,
            humidity,
            temperature,
        }
    }

    pub fn worst(&self) -> f64 {
        [self.wind, self.precipitation, self.humidity, self.temperature]
            .into_iter()
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub weather_type: WeatherType,
    pub wind_speed: f64,
    pub precipitation: f64,
    pub humidity: f64,
    pub temperature: Option<f64>,
    pub risk: f64,
    pub details: WeatherImpact,
}

/// Scores a weather reading. The report is `None` when the reading is invalid.
pub fn assess_weather(reading: &WeatherReading) -> (RiskAssessment, Option<WeatherReport>) {
    if let Err(detail) = reading.validate() {
        let assessment = RiskAssessment {
            source: HazardKind::Weather,
            outcome: ChannelOutcome::Unavailable(UnavailableReason::InvalidReading(detail)),
            basis: PredictionBasis::Measurement,
        };
        return (assessment, None);
    }

    let details = WeatherImpact::from_reading(reading);
    let risk = details.worst();
    let report = WeatherReport {
        weather_type: WeatherType::classify(reading),
        wind_speed: reading.wind_kmh,
        precipitation: reading.precipitation_mm,
        humidity: reading.humidity_pct,
        temperature: reading.temperature_c,
        risk,
        details,
    };
    let assessment = RiskAssessment {
        source: HazardKind::Weather,
        outcome: ChannelOutcome::from_value(risk),
        basis: PredictionBasis::Measurement,
    };

    (assessment, Some(report))
}
