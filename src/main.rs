use std::sync::Arc;

use mediavault::{routes, AppConfig, AppState};
use mediavault_storage::LocalStorageBackend;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Main entry point for the MediaVault REST server.
///
/// # Environment Variables
/// - `VAULT_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `VAULT_DATA_DIR`: storage root for the local backend (default: "vault_data")
/// - `API_KEY`: optional shared key required in the `x-api-key` header
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mediavault=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    let backend = Arc::new(LocalStorageBackend::new(&config.data_dir)?);
    let state = AppState::new(backend, config.api_key.clone());

    let app = routes::router(state).merge(
        SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", routes::ApiDoc::openapi()),
    );

    tracing::info!("++ Starting MediaVault REST on {}", config.bind_addr);
    tracing::info!("++ Storage root: {}", config.data_dir.display());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
