//! Application startup and lifecycle management.

use crate::config::RenderConfig;
use crate::handlers::{
    health::{health_check, metrics_endpoint, readiness_check},
    render::generate,
};
use crate::services::providers::gemini::GeminiImageProvider;
use crate::services::ImageProvider;
use axum::{
    http::{header, Method},
    middleware::from_fn,
    routing::{any, get},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{http_span, request_id_middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no API key is configured; render requests then fail with 500.
    pub image_provider: Option<Arc<dyn ImageProvider>>,
}

impl AppState {
    pub fn from_config(config: RenderConfig) -> Result<Self, AppError> {
        let image_provider: Option<Arc<dyn ImageProvider>> = if config.gemini.api_key.is_some() {
            let provider: Arc<dyn ImageProvider> =
                Arc::new(GeminiImageProvider::new(&config.gemini)?);
            tracing::info!(
                model = %config.gemini.model,
                base_url = %config.gemini.base_url,
                response_format = ?config.gemini.response_format,
                "Initialized Gemini image provider"
            );
            Some(provider)
        } else {
            tracing::warn!("GEMINI_API_KEY not set - render requests will fail until it is configured");
            None
        };

        Ok(Self { image_provider })
    }
}

/// Build the HTTP router for `state`.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/generate", any(generate))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_endpoint))
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(http_span))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: RenderConfig) -> Result<Self, AppError> {
        let http_addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let state = AppState::from_config(config)?;
        let router = build_router(state);

        // Port 0 picks a random port for testing
        let listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", http_addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Render service: HTTP on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until SIGINT or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}
