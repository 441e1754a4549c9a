use crate::common::{
    BACKENDS_PATH, Backend, BackendKey, Snapshot, Transport, TransportError, weight_path,
};
use crate::utils::fmt_weight;
use serde_json::{Value, json};
use std::collections::HashMap;

/// Weight typed by the operator, non-numeric or empty input counts as `0`.
pub fn coerce_weight(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(weight) if weight.is_finite() => weight,
        _ => 0.0,
    }
}

/// Request body for the weight endpoint, integral weights go out as JSON integers.
pub fn weight_body(weight: f64) -> Value {
    if weight.fract() == 0.0 && weight.abs() < i64::MAX as f64 {
        json!({ "weight": weight as i64 })
    } else {
        json!({ "weight": weight })
    }
}

/// Unsaved weight input, keyed by backend identity.
///
/// Entries live outside the snapshot so a refresh never wipes what the
/// operator is typing.
#[derive(Debug, Default, Clone)]
pub struct PendingEdits {
    edits: HashMap<BackendKey, String>,
}

impl PendingEdits {
    pub fn get(&self, key: &BackendKey) -> Option<&str> {
        self.edits.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: BackendKey, text: impl Into<String>) {
        self.edits.insert(key, text.into());
    }

    pub fn discard(&mut self, key: &BackendKey) {
        self.edits.remove(key);
    }

    pub fn is_pending(&self, key: &BackendKey) -> bool {
        self.edits.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Drops the edit once its submit landed, unless it was re-typed meanwhile.
    pub fn settle(&mut self, key: &BackendKey, submitted: &str) -> bool {
        if self.get(key) == Some(submitted) {
            self.edits.remove(key);
            true
        } else {
            false
        }
    }

    /// Forgets edits of backends that are gone from `snapshot`.
    pub fn retain_present(&mut self, snapshot: &Snapshot) {
        self.edits.retain(|key, _| snapshot.contains(key));
    }

    /// Text of the weight cell: the pending edit, or the server's value.
    pub fn display_value(&self, backend: &Backend) -> String {
        self.edits
            .get(&backend.key())
            .cloned()
            .unwrap_or_else(|| fmt_weight(backend.weight))
    }
}

/// A finished weight save: the write and, when the write went through, the
/// backend list read that followed it.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSubmission {
    pub key: BackendKey,
    /// Input text as submitted.
    pub raw: String,
    pub weight: f64,
    pub write: Result<Value, TransportError>,
    pub refresh: Option<Result<Value, TransportError>>,
}

/// Writes the weight, then reads the backend list back so the mirror shows
/// what the server accepted.
pub async fn submit_weight<T: Transport>(
    transport: &T,
    key: BackendKey,
    raw: String,
) -> WeightSubmission {
    let weight = coerce_weight(&raw);
    tracing::info!(backend = %key, weight, "submitting weight");

    let write = transport
        .write(&weight_path(&key.ip, key.port), weight_body(weight))
        .await;
    let refresh = match &write {
        Ok(_) => Some(transport.read(BACKENDS_PATH).await),
        Err(err) => {
            tracing::warn!(backend = %key, %err, "weight write failed");
            None
        }
    };

    WeightSubmission {
        key,
        raw,
        weight,
        write,
        refresh,
    }
}
