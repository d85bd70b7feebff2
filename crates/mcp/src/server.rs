//! MCP server implementation
//!
//! Dispatches JSON-RPC messages to the traktamente tools. The same
//! [`McpServer::handle_request`] backs the stdio loop here and the HTTP
//! endpoint in the server crate. `McpServer` holds no per-client state;
//! request cancellation is tracked by the transport that owns the session.

use crate::error::ToolError;
use crate::protocol::*;
use crate::tools::{ToolRequest, Toolbox};
use anyhow::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const SERVER_NAME: &str = "traktamente-mcp";

pub struct McpServer {
    toolbox: Arc<Toolbox>,
}

impl McpServer {
    pub fn new(toolbox: Arc<Toolbox>) -> Self {
        Self { toolbox }
    }

    /// Handle one JSON-RPC message. Notifications yield no response.
    ///
    /// `cancel` scopes every upstream call made on behalf of this message.
    pub async fn handle_request(
        &self,
        request: JsonRpcRequest,
        cancel: CancellationToken,
    ) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            self.handle_notification(&request).await;
            return None;
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()));
        }

        debug!(method = %request.method, id = %id, "Handling request");

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => self.handle_list_tools(),
            "tools/call" => self.handle_call_tool(request.params, &cancel).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match result {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    async fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => info!("Client initialized"),
            // Only a session transport can map a request id to its call
            "notifications/cancelled" => debug!("Ignoring cancellation outside a session"),
            other => debug!(method = %other, "Ignoring notification"),
        }
    }

    fn handle_initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = params
            .and_then(|params| serde_json::from_value(params).ok())
            .unwrap_or_default();

        if let Some(client) = &params.client_info {
            info!(
                client = %client.name,
                version = %client.version,
                protocol = %params.protocol_version,
                "Client connected"
            );
        }

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        serde_json::to_value(result).map_err(|e| {
            JsonRpcError::internal_error(format!("Failed to serialize result: {}", e))
        })
    }

    fn handle_list_tools(&self) -> Result<Value, JsonRpcError> {
        let result = ListToolsResult {
            tools: self.toolbox.list_schemas(),
        };

        serde_json::to_value(result).map_err(|e| {
            JsonRpcError::internal_error(format!("Failed to serialize tools: {}", e))
        })
    }

    async fn handle_call_tool(
        &self,
        params: Option<Value>,
        cancel: &CancellationToken,
    ) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tool call params: {}", e)))?;

        let request = ToolRequest::parse(&params.name, params.arguments).map_err(|e| {
            warn!(tool = %params.name, error = %e, "Rejected tool call");
            JsonRpcError::from(e)
        })?;

        let kind = request.kind();
        let result = match self.toolbox.call(request, cancel).await {
            Ok(result) => result,
            Err(err) => {
                error!(tool = kind.name(), error = ?err, "Tool call failed");
                CallToolResult::error(err.user_message())
            }
        };

        serde_json::to_value(result).map_err(|e| {
            JsonRpcError::internal_error(format!("Failed to serialize tool result: {}", e))
        })
    }

    /// Run the MCP server over stdio until stdin closes or `shutdown` fires.
    pub async fn start(self: Arc<Self>, shutdown: CancellationToken) -> Result<()> {
        info!("MCP server starting on stdio");
        let reader = BufReader::new(tokio::io::stdin());
        self.serve(reader, tokio::io::stdout(), shutdown).await
    }

    /// Serve newline-delimited JSON-RPC over any reader/writer pair.
    ///
    /// Each request runs on its own task; responses are written by a single
    /// writer task so lines never interleave. When input ends, outstanding
    /// requests are cancelled and their responses flushed before returning.
    pub async fn serve<R, W>(
        self: Arc<Self>,
        reader: R,
        writer: W,
        shutdown: CancellationToken,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let writer_task = tokio::spawn(write_responses(writer, rx));
        let in_flight = Arc::new(InFlight::default());

        let mut lines = reader.lines();
        loop {
            let line = tokio::select! {
                _ = shutdown.cancelled() => break,
                line = lines.next_line() => line?,
            };

            let Some(line) = line else {
                info!("Client closed connection");
                break;
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            debug!("Received message: {}", line);

            let request: JsonRpcRequest = match serde_json::from_str(line) {
                Ok(request) => request,
                Err(e) => {
                    warn!(error = %e, "Failed to parse message");
                    let _ = tx.send(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error()));
                    continue;
                }
            };

            if request.is_notification() && request.method == "notifications/cancelled" {
                cancel_in_flight(&in_flight, request.params);
                continue;
            }

            let server = Arc::clone(&self);
            let tx = tx.clone();
            let cancel = shutdown.child_token();
            let entry = request
                .id
                .as_ref()
                .map(|id| in_flight.register(id, cancel.clone()));
            tokio::spawn(async move {
                let _entry = entry;
                if let Some(response) = server.handle_request(request, cancel).await {
                    let _ = tx.send(response);
                }
            });
        }

        shutdown.cancel();
        drop(tx);
        writer_task.await??;

        info!("MCP server stopped");
        Ok(())
    }
}

fn cancel_in_flight(in_flight: &InFlight, params: Option<Value>) {
    match params.map(serde_json::from_value::<CancelledParams>) {
        Some(Ok(params)) => {
            if in_flight.cancel(&params.request_id) {
                info!(request_id = %params.request_id, reason = ?params.reason, "Cancelling request");
            } else {
                debug!(request_id = %params.request_id, "No in-flight request to cancel");
            }
        }
        _ => warn!("Ignoring malformed cancellation notification"),
    }
}

/// Cancellation handles of one session's outstanding requests, keyed by id.
#[derive(Default)]
struct InFlight {
    state: Mutex<InFlightState>,
}

#[derive(Default)]
struct InFlightState {
    next_generation: u64,
    calls: HashMap<String, (u64, CancellationToken)>,
}

impl InFlight {
    fn state(&self) -> MutexGuard<'_, InFlightState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Track `token` under `id` until the returned entry is dropped.
    fn register(self: &Arc<Self>, id: &Value, token: CancellationToken) -> InFlightEntry {
        let key = id.to_string();
        let mut state = self.state();
        state.next_generation += 1;
        let generation = state.next_generation;
        state.calls.insert(key.clone(), (generation, token));

        InFlightEntry {
            in_flight: Arc::clone(self),
            key,
            generation,
        }
    }

    fn cancel(&self, id: &Value) -> bool {
        match self.state().calls.get(&id.to_string()) {
            Some((_, token)) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.state().calls.len()
    }
}

/// Removes its registration when dropped, whether the call finished or not.
struct InFlightEntry {
    in_flight: Arc<InFlight>,
    key: String,
    generation: u64,
}

impl Drop for InFlightEntry {
    fn drop(&mut self) {
        let mut state = self.in_flight.state();
        // A reused id may have replaced this registration
        if state.calls.get(&self.key).map(|(generation, _)| *generation) == Some(self.generation) {
            state.calls.remove(&self.key);
        }
    }
}

async fn write_responses<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<JsonRpcResponse>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_vec(&response)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}

impl From<ToolError> for JsonRpcError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Validation(_) | ToolError::UnknownTool(_) => {
                JsonRpcError::invalid_params(err.user_message())
            }
            _ => JsonRpcError::internal_error(err.user_message()),
        }
    }
}
