//! Application setup and initialization

pub mod routes;
pub mod server;
pub mod services;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use dots_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    dots_infra::init_telemetry(config.is_production())?;

    validation::validate_config(&config).context("Configuration validation failed")?;
    tracing::info!(
        environment = %config.environment(),
        storage_backend = %config.storage_backend(),
        "Configuration loaded and validated successfully"
    );

    let storage = dots_storage::create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;

    let state = services::initialize_services(&config, storage)?;

    let router = routes::setup_routes(&config, state.clone());

    Ok((state, router))
}
