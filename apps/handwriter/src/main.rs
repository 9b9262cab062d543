mod config;
mod errors;
mod geometry;
mod layout;
mod model;
mod render;
mod routes;
mod state;
mod synthesis;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::layout::LayoutConfig;
use crate::model::{LstmAttentionModel, ModelWeights, StrokeModel};
use crate::routes::build_router;
use crate::state::AppState;
use crate::synthesis::{GenerationPool, StyleLibrary};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting handwriter v{}", env!("CARGO_PKG_VERSION"));

    // Load model weights (large JSON parse, keep it off the async workers)
    let weights_path = config.model_weights_path.clone();
    let weights = tokio::task::spawn_blocking(move || ModelWeights::from_json_file(&weights_path))
        .await
        .context("spawn_blocking failed while loading model weights")??;
    let dims = weights.dimensions;
    let model: Arc<dyn StrokeModel> = Arc::new(LstmAttentionModel::new(weights)?);
    info!(
        lstm_size = dims.lstm_size,
        attention_components = dims.attention_components,
        mixture_components = dims.mixture_components,
        "Model weights loaded from {}",
        config.model_weights_path.display()
    );

    // Load style primers (a missing directory means unprimed writing only)
    let styles = Arc::new(StyleLibrary::from_dir(&config.styles_dir)?);

    let layout = LayoutConfig::default();
    layout.validate()?;

    let pool = GenerationPool::new(config.worker_limit);
    info!(
        "Generation pool: {} workers, {} max steps, timeout {:?}",
        pool.limit(),
        config.max_generation_steps,
        config.generation_timeout
    );

    // Build app state
    let state = AppState {
        generator: config.generator(),
        config: config.clone(),
        layout: Arc::new(layout),
        model,
        styles,
        pool,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
