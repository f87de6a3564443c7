//! HTTP surface: the health probe and the WhatsApp webhook.

pub mod error;
pub mod payload;
pub mod routes;

use std::net::SocketAddr;

use axum::{Router, routing::get};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{base::types::Void, runtime::Runtime};

/// Build the application router.
pub fn build_router(runtime: Runtime) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(routes::health_check))
        .route("/api/webhook", get(routes::verify_webhook).post(routes::handle_webhook))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(runtime)
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(runtime: Runtime) -> Void {
    let addr: SocketAddr = runtime.config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Listening on http://{addr}");

    axum::serve(listener, build_router(runtime)).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {err}");
        return;
    }

    info!("Shutting down ...");
}
