// Main entry point for API server

use std::sync::Arc;

use anyhow::{Context, Result};
use automation::{ChromiumBrowser, ChromiumConfig, CsvExporter};
use server_core::kernel::{ServerDeps, WhatsAppAdapter};
use server_core::server::{build_app, AppState};
use server_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use whatsapp::{WhatsAppOptions, WhatsAppService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,automation=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Prospector API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    let whatsapp = WhatsAppService::new(WhatsAppOptions {
        base_url: config.whatsapp_api_url.clone(),
        session_id: config.whatsapp_session_id.clone(),
        api_key: config.whatsapp_api_key.clone(),
    })
    .context("Failed to create WhatsApp client")?;

    let browser = ChromiumBrowser::new(ChromiumConfig {
        headless: config.browser_headless,
        search_url: config.search_url.clone(),
        ..Default::default()
    });

    let deps = ServerDeps::new(
        Arc::new(browser),
        Arc::new(WhatsAppAdapter::new(Arc::new(whatsapp))),
        Arc::new(CsvExporter::new(&config.export_dir)),
        config.scrape_settings(),
        config.messaging_settings(),
    );

    // Build application
    let app = build_app(AppState::new(deps), &config.allowed_origins);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Exports written to {}", config.export_dir.display());
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
