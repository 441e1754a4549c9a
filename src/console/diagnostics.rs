use crate::common::{PING_PATH, Transport, TransportError, audit_path, payload_ok, pretty};
use crate::constants::DEFAULT_AUDIT_TAIL;
use serde_json::{Value, json};

/// Input rejected before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("enter an IP address to ping")]
    MissingPingTarget,
    #[error("enter the backend IP address")]
    MissingIp,
    #[error("invalid port '{0}', expected 1-65535")]
    InvalidPort(String),
}

/// Trimmed ping target, rejecting blank input.
pub fn ping_target(raw: &str) -> Result<String, InputError> {
    let ip = raw.trim();
    if ip.is_empty() {
        Err(InputError::MissingPingTarget)
    } else {
        Ok(ip.to_string())
    }
}

/// Audit tail length; anything that does not parse falls back to the default.
pub fn tail_lines(raw: &str) -> u32 {
    raw.trim().parse::<u32>().unwrap_or(DEFAULT_AUDIT_TAIL)
}

/// Text to show for a ping payload: the ping output verbatim, else the payload itself.
pub fn ping_output(payload: &Value) -> String {
    match payload.get("output").and_then(Value::as_str) {
        Some(output) if !output.is_empty() => output.to_string(),
        _ => pretty(payload),
    }
}

/// Audit log text of a successful payload, or the failure message.
pub fn audit_text(payload: &Value) -> Result<String, String> {
    if payload_ok(payload) {
        Ok(payload
            .get("data")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    } else {
        Err(format!("failed to load audit log: {}", pretty(payload)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PingResult {
    pub ip: String,
    pub outcome: Result<Value, TransportError>,
}

pub async fn ping<T: Transport>(transport: &T, ip: String) -> PingResult {
    tracing::info!(%ip, "ping");
    let outcome = transport.write(PING_PATH, json!({ "ip": ip })).await;
    PingResult { ip, outcome }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditTail {
    pub lines: u32,
    pub outcome: Result<Value, TransportError>,
}

pub async fn tail_audit_log<T: Transport>(transport: &T, lines: u32) -> AuditTail {
    let outcome = transport.read(&audit_path(lines)).await;
    AuditTail { lines, outcome }
}

/// Output of the diagnostics requests, independent of the registry mirror.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    /// Shown in the ping dialog.
    pub ping_output: String,
    /// Shared log pane: audit log contents, last ping output.
    pub log: String,
    pub ping_pending: bool,
    pub audit_pending: bool,
}
