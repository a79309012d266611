//! Web server setup and routing

use anyhow::Result;
use axum::{
    http::{header, StatusCode},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::api;
use crate::state::AppState;

/// Build the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/devices", get(api::list_devices))
        .route("/api/devices/{name}/version", get(api::show_version))
        .route("/api/devices/{name}/command", post(api::run_command))
        .route("/api/devices/{name}/neighbors", get(api::neighbors_combined))
        .route("/api/devices/{name}/neighbors/lldp", get(api::neighbors_lldp))
        .route("/api/devices/{name}/neighbors/cdp", get(api::neighbors_cdp))
        .route("/api/devices/{name}/session", delete(api::disconnect))
        .route("/api/sessions", get(api::list_sessions))
        .route("/api/config", get(api::get_config))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods(cors::Any)
                .allow_headers(cors::Any),
        )
        .with_state(state)
}

/// Internal defects become a structured failure instead of a dropped connection
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response<String> {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %detail, "Request handler panicked");

    let body = serde_json::json!({
        "success": false,
        "error": "Unexpected error: internal failure",
    });

    let mut response = Response::new(body.to_string());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    response
}

/// Run the HTTP server until Ctrl-C, then close every session
pub async fn run(state: Arc<AppState>, bind: &str) -> Result<()> {
    state.spawn_session_reaper();

    let app = router(state.clone());
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(address = %bind, protocol = "HTTP", "Starting web server");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    info!("Shutting down");
    state.shutdown().await;
    Ok(())
}
