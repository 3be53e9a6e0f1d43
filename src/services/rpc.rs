// ABOUTME: JSON-RPC client for chain nodes over HTTP with basic auth.
// ABOUTME: The connector seam lets tests substitute a scripted node.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    /// The request never produced a JSON-RPC answer.
    #[error("JSON-RPC transport error: {0}")]
    Transport(String),

    /// The node answered with an error object.
    #[error("{message} (code {code})")]
    Server { code: i64, message: String },

    #[error("unexpected JSON-RPC result for {method}: {detail}")]
    Decode { method: String, detail: String },

    /// No client could be built, so no call was attempted.
    #[error("chain node client unavailable: {0}")]
    Unavailable(String),
}

/// Where a node's RPC interface is reachable from this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcEndpoint {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl RpcEndpoint {
    pub fn url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

/// Calls a chain node understands. Only `call` is required.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError>;

    async fn get_info(&self) -> Result<Value, RpcError> {
        self.call("getinfo", vec![]).await
    }

    async fn get_block_count(&self) -> Result<u64, RpcError> {
        let value = self.call("getblockcount", vec![]).await?;
        value.as_u64().ok_or_else(|| RpcError::Decode {
            method: "getblockcount".into(),
            detail: value.to_string(),
        })
    }

    async fn generate(&self, blocks: u32) -> Result<Vec<String>, RpcError> {
        let value = self.call("generate", vec![json!(blocks)]).await?;
        serde_json::from_value(value).map_err(|e| RpcError::Decode {
            method: "generate".into(),
            detail: e.to_string(),
        })
    }

    async fn get_peer_info(&self) -> Result<Vec<Value>, RpcError> {
        let value = self.call("getpeerinfo", vec![]).await?;
        serde_json::from_value(value).map_err(|e| RpcError::Decode {
            method: "getpeerinfo".into(),
            detail: e.to_string(),
        })
    }

    /// `command` is one of `add`, `remove`, `onetry`.
    async fn add_node(&self, node: &str, command: &str) -> Result<(), RpcError> {
        self.call("addnode", vec![json!(node), json!(command)])
            .await
            .map(drop)
    }

    async fn disconnect_node(&self, node: &str) -> Result<(), RpcError> {
        self.call("disconnectnode", vec![json!(node)])
            .await
            .map(drop)
    }
}

/// Produces RPC clients for started nodes.
pub trait RpcConnector: Send + Sync {
    fn connect(&self, endpoint: &RpcEndpoint) -> Arc<dyn ChainRpc>;
}

/// Connector that speaks HTTP JSON-RPC.
#[derive(Debug, Clone)]
pub struct HttpRpcConnector {
    client: Client,
}

impl HttpRpcConnector {
    pub fn new(timeout: Duration) -> Result<Self, RpcError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

impl RpcConnector for HttpRpcConnector {
    fn connect(&self, endpoint: &RpcEndpoint) -> Arc<dyn ChainRpc> {
        Arc::new(RpcClient {
            client: self.client.clone(),
            endpoint: endpoint.clone(),
        })
    }
}

/// Stands in when the HTTP client cannot be built; every call fails with
/// [`RpcError::Unavailable`], which readiness treats as fatal.
#[derive(Debug, Clone)]
pub struct UnavailableConnector {
    reason: String,
}

impl UnavailableConnector {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl RpcConnector for UnavailableConnector {
    fn connect(&self, _endpoint: &RpcEndpoint) -> Arc<dyn ChainRpc> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl ChainRpc for UnavailableConnector {
    async fn call(&self, _method: &str, _params: Vec<Value>) -> Result<Value, RpcError> {
        Err(RpcError::Unavailable(self.reason.clone()))
    }
}

/// HTTP JSON-RPC 1.0 client, as the node's `-rpc*` flags expose it.
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: Client,
    endpoint: RpcEndpoint,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl RpcClient {
    pub fn endpoint(&self) -> &RpcEndpoint {
        &self.endpoint
    }
}

#[async_trait]
impl ChainRpc for RpcClient {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let body = json!({
            "jsonrpc": "1.0",
            "id": "dockyard",
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(self.endpoint.url())
            .basic_auth(&self.endpoint.user, Some(&self.endpoint.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        // Nodes report RPC errors with a 500 status and a JSON body, so the
        // status alone says nothing.
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;
        let parsed: RpcResponse = serde_json::from_str(&text).map_err(|_| {
            RpcError::Transport(format!("HTTP {}: {}", status, text.trim()))
        })?;

        match parsed.error {
            Some(err) => Err(RpcError::Server {
                code: err.code,
                message: err.message,
            }),
            None => Ok(parsed.result),
        }
    }
}
