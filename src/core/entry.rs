use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::core::Value;
use crate::engine::Record;

/// Expiration metadata attached to a persisted entry.
///
/// Entries managed by this store are immortal, so every [`StoreEntry`]
/// carries `metadata: None`. The type exists to satisfy the store SPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub created_at_ms: i64,
    pub lifespan_ms: i64,
}

/// The (key, value, metadata) unit the host cache persists and retrieves.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreEntry {
    pub key: Value,
    pub value: Option<Record>,
    pub metadata: Option<Metadata>,
}

impl StoreEntry {
    pub fn new(key: Value, value: Record) -> Self {
        Self {
            key,
            value: Some(value),
            metadata: None,
        }
    }

    /// Entry without its value, produced by key-only scans.
    pub fn key_only(key: Value) -> Self {
        Self {
            key,
            value: None,
            metadata: None,
        }
    }
}

/// Shared cooperative-stop flag for a scan.
///
/// One context is created per [`process`](crate::store::RelStore::process)
/// invocation and handed to every callback. Calling [`stop`](Self::stop)
/// from a callback (or any clone holder) is observed by in-flight and
/// not-yet-started batch tasks at their next row boundary; rows already
/// being processed are never aborted mid-row.
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    stopped: Arc<AtomicBool>,
}

impl TaskContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request early termination of the scan.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_context_stop_is_shared() {
        let ctx = TaskContext::new();
        let clone = ctx.clone();
        assert!(!ctx.is_stopped());

        clone.stop();
        assert!(ctx.is_stopped());
        assert!(clone.is_stopped());
    }

    #[test]
    fn test_entry_metadata_is_absent() {
        let entry = StoreEntry::new(Value::from("k"), Record::new("User"));
        assert_eq!(entry.metadata, None);

        let key_only = StoreEntry::key_only(Value::from("k"));
        assert_eq!(key_only.value, None);
    }
}
