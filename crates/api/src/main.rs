use std::sync::Arc;

use anyhow::Context;

use mercato_api::app::{build_app, services::InMemoryDirectory};
use mercato_core::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    mercato_observability::init(config.mode);

    // Hardened mode: any defect stops the process here, before binding.
    let warnings = mercato_core::check(&config)
        .with_context(|| format!("configuration rejected in {} mode", config.mode))?;
    for warning in &warnings {
        tracing::warn!(mode = %config.mode, %warning, "configuration defect tolerated");
    }

    let app = build_app(&config, Arc::new(InMemoryDirectory::new()));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        mode = %config.mode,
        cors_origins = config.cors.allowed_origins.len(),
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
