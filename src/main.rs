use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use safesafar::api::{self, AppState};
use safesafar::config::Config;
use safesafar::{Predictors, SafetyAssessor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "safesafar=debug,tower_http=info,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    let weights = config.weights()?;

    // 1. Predictors are built once; availability is fixed from here on
    let predictors = Predictors::from_paths(&config.landslide_model, &config.flood_model);
    for predictor in [&predictors.landslide, &predictors.flood] {
        tracing::info!(
            channel = %predictor.kind(),
            path = %predictor.model_path().display(),
            available = predictor.is_available(),
            "predictor ready"
        );
    }

    let state = Arc::new(AppState::new(SafetyAssessor::new(predictors, weights)));

    // 2. Serve
    let app = api::router(state);
    let addr = config.bind_addr();
    tracing::info!("🚀 Safety API running on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
