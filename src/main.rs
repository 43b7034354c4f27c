use std::net::SocketAddr;

use tracing::info;

use kisan_backend::{api, config::AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kisan_backend=info,axum=info".into()),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    info!(
        data_dir = %config.data_dir.display(),
        default_state = %config.default_state,
        weather_key_configured = config.openweather_key.is_some(),
        model_key_configured = config.openrouter_key.is_some(),
        "Initializing KisanAI backend"
    );

    let port = config.port;
    let state = AppState::new(config);
    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(addr = %addr, "Starting KisanAI REST server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
