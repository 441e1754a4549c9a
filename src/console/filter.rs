use crate::common::{Backend, Snapshot};

/// Backends whose `ip:port` contains `predicate`, case-insensitively, in snapshot order.
///
/// A blank predicate keeps every backend. The snapshot is only borrowed.
pub fn apply<'a>(snapshot: &'a Snapshot, predicate: &str) -> Vec<&'a Backend> {
    let needle = predicate.trim().to_lowercase();
    if needle.is_empty() {
        return snapshot.backends.iter().collect();
    }

    snapshot
        .backends
        .iter()
        .filter(|b| b.address().to_lowercase().contains(&needle))
        .collect()
}
