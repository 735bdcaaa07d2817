use std::path::PathBuf;

use clap::Parser;

use crate::aggregate::Weights;
use crate::error::Result;

#[derive(Debug, Clone, Parser)]
#[command(name = "safesafar", version, about = "Hazard-aware safety scoring API")]
pub struct Config {
    #[arg(long, env = "SAFESAFAR_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 5001)]
    pub port: u16,

    /// Directory of the LHASA landslide model
    #[arg(long, env = "LHASA_MODEL_PATH", default_value = "models/LHASA")]
    pub landslide_model: PathBuf,

    /// Directory of the flood mapping model
    #[arg(long, env = "FLOOD_MODEL_PATH", default_value = "models/flood-mapping-tool")]
    pub flood_model: PathBuf,

    #[arg(long, env = "SAFESAFAR_W_LANDSLIDE", default_value_t = 0.5)]
    pub w_landslide: f64,

    #[arg(long, env = "SAFESAFAR_W_FLOOD", default_value_t = 0.5)]
    pub w_flood: f64,

    #[arg(long, env = "SAFESAFAR_W_AIR_QUALITY", default_value_t = 0.5)]
    pub w_air_quality: f64,

    #[arg(long, env = "SAFESAFAR_W_WEATHER", default_value_t = 0.5)]
    pub w_weather: f64,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Default weights, rejected if they could never produce a score.
    pub fn weights(&self) -> Result<Weights> {
        let weights = Weights {
            landslide: self.w_landslide,
            flood: self.w_flood,
            air_quality: self.w_air_quality,
            weather: self.w_weather,
        };
        weights.validate()?;
        Ok(weights)
    }
}
