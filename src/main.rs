use std::sync::Arc;

use eduvia_api::external::{LogMailer, StubGateway};
use eduvia_api::state::AppState;
use eduvia_api::store::postgres::PgStore;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eduvia_api=info,tower_http=info".into()),
        )
        .init();

    let config = eduvia_api::config::config();
    tracing::info!("Starting Eduvia API in {:?} mode", config.environment);

    let store = Arc::new(PgStore::new());
    let state = AppState::new(store, Arc::new(LogMailer), Arc::new(StubGateway));

    // Central namespace must exist before the first request
    if let Err(e) = state.resolver.ensure_central().await {
        tracing::error!("failed to initialize central namespace: {e}");
        std::process::exit(1);
    }

    let app = eduvia_api::app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("EDUVIA_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind_addr}: {e}"));

    tracing::info!("Eduvia API listening on http://{bind_addr}");

    axum::serve(listener, app).await.expect("server");
}
