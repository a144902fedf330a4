use tracing_subscriber::EnvFilter;
use workflow_modeler::app::{API_PREFIX, app_router, open_repository};
use workflow_modeler::core::config::Config;
use workflow_modeler::core::db::DiagramRepositoryError;

#[tokio::main]
async fn main() {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load application config from environment variables
    let config = Config::from_env();

    tracing::info!(
        "Config loaded: diagrams_dir={}, persist_index={}",
        config.diagrams_dir.display(),
        config.persist_index
    );

    // Startup reconciliation walks the store directory
    let open_config = config.clone();
    let opened = tokio::task::spawn_blocking(move || open_repository(&open_config))
        .await
        .map_err(DiagramRepositoryError::from)
        .and_then(|opened| opened);

    let diagram_repo = match opened {
        Ok(repo) => repo,
        Err(err) => {
            tracing::error!("Failed to open diagram repository: {}", err);
            std::process::exit(1);
        }
    };

    let app = app_router(diagram_repo);

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind {}: {}", addr, err);
            std::process::exit(1);
        }
    };

    tracing::info!("Server is running on http://{}", addr);
    tracing::info!("Diagram API: http://{}{}/diagrams", addr, API_PREFIX);

    if let Err(err) = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", err);
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
