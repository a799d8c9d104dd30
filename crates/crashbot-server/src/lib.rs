pub mod command;
pub mod routes;
pub mod slack;
pub mod state;

use axum::Router;
use crashbot_core::config::AppConfig;
use tower_http::trace::TraceLayer;

pub use state::{AppState, Backend};

/// Build the axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::slack_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let state = AppState::new(&config)?;
    if state.backend.is_none() {
        tracing::warn!(
            "AppCenter settings incomplete; every command will be answered with setup instructions"
        );
    }
    let router = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
