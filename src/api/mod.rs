//! Local calculation service answering the backend's `/calculate/*`
//! endpoints from [`crate::finance`], for offline use and for exercising the
//! client end to end.

use crate::core::{AppError, AppState};
use axum::Router;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::info;

mod routes;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve(
    state: AppState,
    addr: SocketAddr,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), AppError> {
    let server = axum::Server::try_bind(&addr)
        .map_err(|e| AppError::Server(format!("cannot bind {addr}: {e}")))?
        .serve(router(state).into_make_service());
    info!(addr = %server.local_addr(), "calculation service listening");
    server
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::Server(e.to_string()))
}
