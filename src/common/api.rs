use serde_json::Value;
use std::future::Future;

/// Backend list of the control plane.
pub const BACKENDS_PATH: &str = "/api/backends";
/// Manual resync against the topology sources.
pub const SYNC_PATH: &str = "/api/sync";
/// Reachability check, executed by the control plane.
pub const PING_PATH: &str = "/api/ping";
/// Dynamic backend registration.
pub const REGISTER_PATH: &str = "/api/register";

/// Per-backend weight endpoint.
pub fn weight_path(ip: &str, port: u16) -> String {
    format!("/api/backends/{}/{}/weight", ip, port)
}

/// Audit log endpoint returning the last `tail` lines.
pub fn audit_path(tail: u32) -> String {
    format!("/api/logs/audit?tail={}", tail)
}

/// A failure of the exchange itself, as opposed to a payload saying `ok: false`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request could not be sent or the body could not be read.
    #[error("network error: {0}")]
    Network(String),
    /// The response body is not JSON.
    #[error("response is not JSON: {0}")]
    Decode(String),
}

/// Read/write access to the control API.
///
/// An exchange succeeds as soon as the body parses as JSON, whatever the HTTP
/// status or the `ok` member says; interpreting the payload is up to the caller.
pub trait Transport: Send + Sync + 'static {
    fn read(&self, path: &str) -> impl Future<Output = Result<Value, TransportError>> + Send;

    fn write(
        &self,
        path: &str,
        body: Value,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

/// `true` only when the payload carries `"ok": true`.
pub fn payload_ok(payload: &Value) -> bool {
    payload.get("ok").and_then(Value::as_bool).unwrap_or(false)
}

/// Pretty-printed payload for the status area.
pub fn pretty(payload: &Value) -> String {
    serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(host: &str, port: u16) -> Self {
        ApiClient::with_base_url(format!("http://{host}:{port}"))
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        ApiClient {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        ApiClient::with_base_url(config.api_url())
    }

    async fn decode(response: reqwest::Response) -> Result<Value, TransportError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        serde_json::from_str(&text)
            .map_err(|e| TransportError::Decode(format!("({}) {}", status.as_u16(), e)))
    }
}

impl Transport for ApiClient {
    async fn read(&self, path: &str) -> Result<Value, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::trace!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Self::decode(response).await
    }

    async fn write(&self, path: &str, body: Value) -> Result<Value, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::trace!(%url, %body, "POST");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Self::decode(response).await
    }
}
