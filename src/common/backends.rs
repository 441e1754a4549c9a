use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Identity of a backend, `ip:port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BackendKey {
    pub ip: String,
    pub port: u16,
}

impl BackendKey {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            port,
        }
    }
}

impl fmt::Display for BackendKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// A backend entry as served by `GET /api/backends`.
///
/// The control plane merges discovery (`k8s`) and runtime registrations, so
/// `source` tells which of the two produced the entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Backend {
    pub ip: String,
    pub port: u16,
    /// Desired traffic share.
    #[serde(default)]
    pub weight: f64,
    /// Whether the backend takes part in routing.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub is_warming_up: bool,
    #[serde(default)]
    pub source: Option<String>,
    /// Usage in `[0, 1]`; kept raw since the control plane passes through
    /// whatever the backend reported.
    #[serde(default)]
    pub gpu_usage: Option<Value>,
    #[serde(default)]
    pub vram_usage: Option<Value>,
    /// Unix seconds of the last runtime heartbeat, `0` for discovery entries.
    #[serde(default)]
    pub last_seen: Option<i64>,
}

#[inline(always)]
fn default_enabled() -> bool {
    true
}

impl Backend {
    pub fn key(&self) -> BackendKey {
        BackendKey::new(self.ip.clone(), self.port)
    }

    /// The literal `ip:port` string the view filter matches against.
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    pub fn is_key(&self, key: &BackendKey) -> bool {
        self.port == key.port && self.ip == key.ip
    }
}

/// Why a backend listing could not be turned into a [`Snapshot`].
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("invalid backend list: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("duplicate backend {0}")]
    Duplicate(BackendKey),
}

/// The complete backend registry at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub backends: Vec<Backend>,
    /// Last update of the discovery source.
    #[serde(default)]
    pub k8s_updated_at: i64,
    /// Last liveness/metrics update.
    #[serde(default)]
    pub runtime_updated_at: i64,
    /// Server time of this response.
    #[serde(default)]
    pub updated_at: i64,
}

impl Snapshot {
    /// Parses the payload of a successful backend listing.
    ///
    /// Duplicate identities are rejected, every consumer keys rows by `ip:port`.
    pub fn from_payload(payload: Value) -> Result<Snapshot, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_value(payload)?;

        let mut seen = std::collections::HashSet::with_capacity(snapshot.backends.len());
        for backend in &snapshot.backends {
            if !seen.insert((backend.ip.as_str(), backend.port)) {
                return Err(SnapshotError::Duplicate(backend.key()));
            }
        }

        Ok(snapshot)
    }

    pub fn get(&self, key: &BackendKey) -> Option<&Backend> {
        self.backends.iter().find(|b| b.is_key(key))
    }

    pub fn contains(&self, key: &BackendKey) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn enabled_count(&self) -> usize {
        self.backends.iter().filter(|b| b.enabled).count()
    }

    pub fn warming_count(&self) -> usize {
        self.backends.iter().filter(|b| b.is_warming_up).count()
    }
}
