//! Strokewatch: stroke risk scoring service.
//!
//! Main entry point: initialize logging, load configuration and the model
//! artifact, connect the prediction store (with startup-only retry), then
//! serve the HTTP surface. Any startup failure aborts before the listener
//! is bound.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use strokewatch::adapters::http::{self, ModelInfo};
use strokewatch::adapters::model::LogisticModel;
use strokewatch::adapters::sanitize::SanitizingMakeWriter;
use strokewatch::adapters::sqlite::SqliteStore;
use strokewatch::application::ScoringService;
use strokewatch::config::Config;
use strokewatch::StrokewatchError;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(SanitizingMakeWriter::new(std::io::stdout)),
        )
        .init();

    tracing::info!("Starting strokewatch...");
    let config = Config::from_env();

    // The model is process-wide read-only state: loaded exactly once before
    // serving begins, never reassigned. Load failure is fatal.
    let model = LogisticModel::load(&config.model_path)
        .map_err(|e| StrokewatchError::Startup(format!("model artifact failed to load: {e}")))?;
    let model_info = ModelInfo {
        model_type: model.model_type().to_string(),
        num_features: model.feature_count(),
    };

    // Store open + schema ensure. This may block for the configured
    // retry/backoff window; exhausting it is fatal.
    let store = SqliteStore::open(&config.store)
        .map_err(|e| StrokewatchError::Startup(e.to_string()))?;

    let service = Arc::new(ScoringService::new(Arc::new(model), Arc::new(store)));
    let app = http::router(service, model_info);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    tracing::info!("strokewatch shutdown complete.");
    Ok(())
}
