//! REST API handlers
//!
//! Every handler answers with a JSON body; failures are always
//! `{"success": false, "error": "..."}` with a status matching the error kind.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use netscope_core::{NetError, NetResult};
use netscope_discovery::to_response;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::state::AppState;

fn status_for(error: &NetError) -> StatusCode {
    match error {
        NetError::DeviceNotFound(_) => StatusCode::NOT_FOUND,
        NetError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        NetError::Connection(_) | NetError::Execution(_) => StatusCode::BAD_GATEWAY,
        NetError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Turn an operation result into an HTTP response
fn reply<T: Serialize>(result: NetResult<T>) -> Response {
    let body = to_response(&result);
    let status = match &result {
        Err(e) => status_for(e),
        // A command that ran but failed on the device
        Ok(_) if body["success"] == false => StatusCode::BAD_GATEWAY,
        Ok(_) => StatusCode::OK,
    };
    (status, Json(body)).into_response()
}

/// List all inventory devices
pub async fn list_devices(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.list_devices())
}

/// Run `show version` on a device
pub async fn show_version(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    reply(state.service.show_version(&name).await)
}

/// Command request body
#[derive(Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

/// Run an arbitrary command on a device
pub async fn run_command(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<CommandRequest>,
) -> Response {
    info!(device = %name, command = %req.command, "Command requested");
    reply(state.service.run_command(&name, &req.command).await)
}

/// LLDP neighbors of a device
pub async fn neighbors_lldp(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    reply(state.service.discover_neighbors_lldp(&name).await)
}

/// CDP neighbors of a device
pub async fn neighbors_cdp(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    reply(state.service.discover_neighbors_cdp(&name).await)
}

/// LLDP and CDP neighbors of a device, deduplicated
pub async fn neighbors_combined(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    reply(state.service.discover_neighbors_combined(&name).await)
}

/// Close a device's cached session
pub async fn disconnect(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    info!(device = %name, "Disconnect requested");
    reply(state.service.disconnect(&name).await)
}

/// Cached sessions
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({ "sessions": state.service.sessions().await }))
}

/// Get current configuration
pub async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.config.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&NetError::DeviceNotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&NetError::Timeout {
                operation: "connect".to_string(),
                ms: 10
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&NetError::Execution("x".to_string())),
            StatusCode::BAD_GATEWAY
        );
    }
}
