use crate::config::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use traktamente_mcp::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

/// Server description
pub async fn server_info() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "traktamente-mcp",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "MCP server for Skatteverket traktamente (per diem) rates",
        "endpoints": {
            "health": "/health",
            "mcp": "/mcp"
        },
        "transport": "http",
    }))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Handle one JSON-RPC message posted to `/mcp`.
///
/// Dropping this future (client disconnect) cancels any upstream request
/// made on its behalf.
pub async fn mcp(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected unparseable JSON-RPC body");
            return bad_request(JsonRpcError::parse_error());
        }
    };

    let request = match serde_json::from_value::<JsonRpcRequest>(value) {
        Ok(request) if request.jsonrpc == "2.0" => request,
        Ok(_) | Err(_) => {
            tracing::warn!("Rejected malformed JSON-RPC envelope");
            return bad_request(JsonRpcError::invalid_request());
        }
    };

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    match state.mcp.handle_request(request, cancel).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

fn bad_request(error: JsonRpcError) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(JsonRpcResponse::error(Value::Null, error)),
    )
        .into_response()
}
