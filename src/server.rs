//! Line-delimited JSON-RPC 2.0 front over stdio.
//!
//! One reader loop accepts requests in arrival order and hands each to its
//! own task; a single writer task serializes responses. Responses therefore
//! go out in completion order, which can differ from request order.

use crate::tools::{ToolHost, list_tools};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt as _, AsyncRead, AsyncWrite, AsyncWriteExt as _, BufReader};
use tokio::sync::mpsc;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "data-explorer";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

fn success(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn failure(id: Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

/// Handles one raw line. Returns `None` for notifications.
pub async fn handle_line(host: &ToolHost, line: &str) -> Option<Value> {
    let raw: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Unparseable request: {e}");
            return Some(failure(Value::Null, PARSE_ERROR, &format!("Parse error: {e}")));
        }
    };

    let request: Request = match serde_json::from_value(raw) {
        Ok(request) => request,
        Err(e) => {
            return Some(failure(
                Value::Null,
                INVALID_REQUEST,
                &format!("Invalid request: {e}"),
            ));
        }
    };

    let Some(id) = request.id else {
        tracing::debug!("Notification: {}", request.method);
        return None;
    };

    let response = match request.method.as_str() {
        "initialize" => success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") }
            }),
        ),
        "ping" => success(id, json!({})),
        "tools/list" => success(id, json!({ "tools": list_tools() })),
        "tools/call" => match serde_json::from_value::<CallParams>(request.params) {
            Ok(params) => {
                let text = host.call_tool(&params.name, &params.arguments).await;
                let is_error = text.starts_with("Error");
                success(
                    id,
                    json!({
                        "content": [{ "type": "text", "text": text }],
                        "isError": is_error
                    }),
                )
            }
            Err(e) => failure(id, INVALID_PARAMS, &format!("Invalid params: {e}")),
        },
        other => failure(id, METHOD_NOT_FOUND, &format!("Method not found: {other}")),
    };

    Some(response)
}

/// Serves requests from `input` until it closes, writing responses to `output`.
///
/// # Errors
///
/// Returns an error if reading the input stream fails.
pub async fn serve<R, W>(host: ToolHost, input: R, output: W) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Value>();

    let writer = tokio::spawn(async move {
        let mut output = output;
        while let Some(response) = rx.recv().await {
            let mut line = response.to_string();
            line.push('\n');
            if let Err(e) = output.write_all(line.as_bytes()).await {
                tracing::error!("Failed to write response: {e}");
                break;
            }
            if let Err(e) = output.flush().await {
                tracing::error!("Failed to flush response: {e}");
                break;
            }
        }
    });

    let mut lines = BufReader::new(input).lines();
    let mut in_flight = tokio::task::JoinSet::new();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let host = host.clone();
        let tx = tx.clone();
        in_flight.spawn(async move {
            if let Some(response) = handle_line(&host, &line).await
                && tx.send(response).is_err()
            {
                tracing::warn!("Response dropped: writer has stopped");
            }
        });
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Request task failed: {e}");
        }
    }
    drop(tx);
    if let Err(e) = writer.await {
        tracing::error!("Writer task failed: {e}");
    }

    tracing::info!("Input closed, shutting down");
    Ok(())
}

/// Serves over the process's stdin/stdout.
///
/// # Errors
///
/// See [`serve`].
pub async fn serve_stdio(host: ToolHost) -> anyhow::Result<()> {
    serve(host, tokio::io::stdin(), tokio::io::stdout()).await
}
