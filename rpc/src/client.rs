//! Minimal Tendermint RPC client: `status` and `abci_query`.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::{RpcDialect, RpcError};

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Node identity reported by `/status`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeStatus {
    pub version: String,
    pub network: String,
}

/// A request parameter, rendered per dialect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Param {
    Str(String),
    Hex(Vec<u8>),
    Int(u64),
    Bool(bool),
}

impl Param {
    /// Value inside a JSON-RPC `params` object.
    pub fn json(&self) -> serde_json::Value {
        match self {
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::Hex(bytes) => serde_json::Value::String(hex::encode(bytes)),
            Self::Int(n) => serde_json::Value::String(n.to_string()),
            Self::Bool(b) => serde_json::Value::Bool(*b),
        }
    }

    /// Value inside a URI query string (before percent-encoding).
    pub fn uri(&self) -> String {
        match self {
            Self::Str(s) => format!("\"{s}\""),
            Self::Hex(bytes) => format!("0x{}", hex::encode(bytes)),
            Self::Int(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default = "Option::default")]
    result: Option<T>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Deserialize)]
struct StatusResult {
    node_info: NodeInfo,
}

#[derive(Deserialize)]
struct NodeInfo {
    version: String,
    #[serde(default)]
    network: String,
}

#[derive(Deserialize)]
struct AbciQueryResult {
    response: AbciResponse,
}

#[derive(Deserialize)]
struct AbciResponse {
    #[serde(default)]
    code: u32,
    #[serde(default)]
    log: String,
    #[serde(default)]
    value: Option<String>,
}

/// HTTP client bound to one endpoint and dialect.
pub struct TendermintRpc {
    http_client: reqwest::Client,
    base_url: String,
    dialect: RpcDialect,
    next_id: AtomicI64,
}

impl TendermintRpc {
    pub fn new(base_url: impl Into<String>, dialect: RpcDialect) -> Result<Self, RpcError> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RpcError::Transport(e.to_string()))?;
        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            dialect,
            next_id: AtomicI64::new(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn dialect(&self) -> RpcDialect {
        self.dialect
    }

    /// `status`: node version and network.
    pub async fn status(&self) -> Result<NodeStatus, RpcError> {
        let result: StatusResult = self.call("status", &[]).await?;
        Ok(NodeStatus {
            version: result.node_info.version,
            network: result.node_info.network,
        })
    }

    /// `abci_query` at the latest height; returns the decoded response value.
    pub async fn abci_query(&self, path: &str, data: &[u8]) -> Result<Vec<u8>, RpcError> {
        let result: AbciQueryResult = self
            .call(
                "abci_query",
                &[
                    ("path", Param::Str(path.to_string())),
                    ("data", Param::Hex(data.to_vec())),
                    ("height", Param::Int(0)),
                    ("prove", Param::Bool(false)),
                ],
            )
            .await?;
        let response = result.response;
        if response.code != 0 {
            return Err(RpcError::Abci {
                code: response.code,
                log: response.log,
            });
        }
        match response.value {
            Some(value) if !value.is_empty() => {
                Ok(base64::engine::general_purpose::STANDARD.decode(value)?)
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, Param)],
    ) -> Result<T, RpcError> {
        debug!(method, dialect = self.dialect.as_str(), url = %self.base_url, "rpc call");
        let request = match self.dialect {
            RpcDialect::Modern => {
                let params: serde_json::Map<String, serde_json::Value> = params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.json()))
                    .collect();
                let body = serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": self.next_id.fetch_add(1, Ordering::Relaxed),
                    "method": method,
                    "params": params,
                });
                self.http_client.post(&self.base_url).json(&body)
            }
            RpcDialect::Legacy => {
                let query: Vec<(&str, String)> =
                    params.iter().map(|(k, v)| (*k, v.uri())).collect();
                self.http_client
                    .get(format!("{}/{}", self.base_url, method))
                    .query(&query)
            }
        };

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(RpcError::Status(response.status().as_u16()));
        }
        let envelope: Envelope<T> = response.json().await?;
        if let Some(err) = envelope.error {
            let message = match err.data {
                Some(data) if !data.is_empty() => format!("{} ({data})", err.message),
                _ => err.message,
            };
            return Err(RpcError::JsonRpc {
                code: err.code,
                message,
            });
        }
        envelope
            .result
            .ok_or_else(|| RpcError::InvalidResponse(format!("{method}: missing result")))
    }
}
