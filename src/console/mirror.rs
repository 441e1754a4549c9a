use crate::common::{
    BACKENDS_PATH, Snapshot, SnapshotError, Transport, TransportError, payload_ok,
};
use serde_json::Value;

/// Why a refresh left the mirror untouched.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    /// The control plane answered without `ok: true`; the payload is kept verbatim.
    #[error("refresh rejected: {0}")]
    Rejected(Value),
    #[error("malformed backend list: {0}")]
    Malformed(#[from] SnapshotError),
}

/// Local mirror of the backend registry.
///
/// [`RegistryMirror::apply`] is the only write path: it either replaces the
/// whole snapshot or leaves it exactly as it was.
#[derive(Debug, Default)]
pub struct RegistryMirror {
    snapshot: Snapshot,
    /// Client time of the last successful refresh, `None` before the first one.
    refreshed_at: Option<chrono::DateTime<chrono::Local>>,
    /// Issue sequence of the last applied response.
    applied_seq: u64,
}

impl RegistryMirror {
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn is_loaded(&self) -> bool {
        self.refreshed_at.is_some()
    }

    pub fn refreshed_at(&self) -> Option<chrono::DateTime<chrono::Local>> {
        self.refreshed_at
    }

    /// Read the backend list and apply it.
    pub async fn refresh<T: Transport>(
        &mut self,
        transport: &T,
    ) -> Result<&Snapshot, RefreshError> {
        let outcome = transport.read(BACKENDS_PATH).await;
        let seq = self.applied_seq + 1;
        self.apply(seq, outcome)
    }

    /// Apply the outcome of a backend list read issued as number `seq`.
    ///
    /// Responses are applied in arrival order; a response older than the one
    /// already applied still wins, it is only logged.
    pub fn apply(
        &mut self,
        seq: u64,
        outcome: Result<Value, TransportError>,
    ) -> Result<&Snapshot, RefreshError> {
        let payload = outcome?;
        if !payload_ok(&payload) {
            return Err(RefreshError::Rejected(payload));
        }
        let snapshot = Snapshot::from_payload(payload)?;

        if seq < self.applied_seq {
            tracing::debug!(
                seq,
                applied = self.applied_seq,
                "refresh response arrived out of order"
            );
        }
        tracing::debug!(seq, backends = snapshot.len(), "snapshot replaced");

        self.snapshot = snapshot;
        self.applied_seq = self.applied_seq.max(seq);
        self.refreshed_at = Some(chrono::Local::now());
        Ok(&self.snapshot)
    }
}
