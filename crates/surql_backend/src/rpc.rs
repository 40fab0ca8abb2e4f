//! SurrealDB WebSocket RPC client.
//!
//! Connects to `ws://{location}/rpc`, signs in with the configured
//! credentials and selects the namespace and database. Calls are
//! serialized over the one socket; replies are matched by request id.

use crate::client::SurrealClient;
use crate::error::{BackendError, Result};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use surql_protocol::DatasourceConfig;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A signed-in RPC session on one WebSocket.
pub struct WsClient {
    socket: Mutex<Socket>,
    next_id: AtomicU64,
}

impl WsClient {
    /// Connect, sign in and `use` the configured namespace and database.
    pub async fn connect(config: &DatasourceConfig) -> Result<Self> {
        let url = config.rpc_url();
        let (socket, _) = connect_async(url.as_str())
            .await
            .map_err(|err| BackendError::Client(format!("connect {}: {}", url, err)))?;

        let client = Self {
            socket: Mutex::new(socket),
            next_id: AtomicU64::new(1),
        };
        client.call("signin", json!([config.signin_params()])).await?;
        client
            .call("use", json!([config.namespace, config.database]))
            .await?;

        info!(
            url = %url,
            namespace = %config.namespace,
            database = %config.database,
            "connected to SurrealDB"
        );
        Ok(client)
    }

    /// One request/reply exchange.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({ "id": id, "method": method, "params": params });

        let mut socket = self.socket.lock().await;
        socket
            .send(Message::text(request.to_string()))
            .await
            .map_err(transport_error)?;
        debug!(id, method, "rpc request sent");

        while let Some(message) = socket.next().await {
            let message = message.map_err(transport_error)?;
            if message.is_close() {
                break;
            }
            if !message.is_text() {
                continue;
            }
            let text = message.to_text().map_err(transport_error)?;
            if let Some(result) = parse_reply(id, serde_json::from_str(text)?)? {
                return Ok(result);
            }
        }
        Err(BackendError::Client("connection closed".to_string()))
    }
}

impl SurrealClient for WsClient {
    fn query(&self, surql: &str) -> impl Future<Output = Result<Value>> + Send {
        let params = json!([surql]);
        async move { self.call("query", params).await }
    }
}

fn transport_error(err: tokio_tungstenite::tungstenite::Error) -> BackendError {
    BackendError::Client(err.to_string())
}

/// `Some(result)` for the reply to `id`, `None` for anything else on the
/// socket (replies to other ids, live-query notifications).
fn parse_reply(id: u64, reply: Value) -> Result<Option<Value>> {
    if reply.get("id").and_then(reply_id) != Some(id) {
        return Ok(None);
    }
    if let Some(error) = reply.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(BackendError::Client(message));
    }
    Ok(Some(reply.get("result").cloned().unwrap_or(Value::Null)))
}

/// Servers echo the id either as sent or as a string.
fn reply_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reply() {
        assert_eq!(
            parse_reply(3, json!({ "id": 3, "result": [1] })).unwrap(),
            Some(json!([1]))
        );
        assert_eq!(
            parse_reply(3, json!({ "id": "3", "result": null })).unwrap(),
            Some(Value::Null)
        );
        assert_eq!(parse_reply(3, json!({ "id": 4, "result": [] })).unwrap(), None);
        assert_eq!(
            parse_reply(3, json!({ "result": { "action": "CREATE" } })).unwrap(),
            None
        );

        let err = parse_reply(
            3,
            json!({ "id": 3, "error": { "code": -32000, "message": "There was a problem with authentication" } }),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "There was a problem with authentication");
    }
}
