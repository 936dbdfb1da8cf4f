// src/main.rs

use std::str::FromStr;
use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use frontera::api::http::app_router;
use frontera::config::CONFIG;
use frontera::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let level = Level::from_str(&CONFIG.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Frontera prediction API");
    info!("Content root: {}", CONFIG.content_dir);
    info!("Model timeout: {}s", CONFIG.r_timeout_seconds);

    let state = Arc::new(AppState::new(&CONFIG));
    state.paths.ensure_dirs()?;

    let app = app_router(state, &CONFIG.cors_origin);

    let bind_address = CONFIG.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("HTTP server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
