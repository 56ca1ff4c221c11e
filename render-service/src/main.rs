use render_service::config::RenderConfig;
use render_service::services::metrics::init_metrics;
use render_service::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = RenderConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        "render-service",
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );

    init_metrics().map_err(|e| {
        tracing::error!("Failed to initialize metrics: {}", e);
        std::io::Error::other(format!("Metrics error: {}", e))
    })?;

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to start render service: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    application.run_until_stopped().await
}
