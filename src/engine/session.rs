use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::warn;

use crate::core::{Result, StoreError, Value};
use crate::engine::{Metamodel, Record};

pub(crate) type EntityRows = HashMap<String, HashMap<Value, Record>>;

/// Mutations staged in a transaction, applied on commit in staging order.
enum PendingOp {
    Merge(Record),
    Remove { entity: String, id: Value },
    RemoveAll { entity: String },
}

/// A unit-of-work session against one persistence unit.
///
/// Reads (`find`, `fetch_all`, `count`) go straight to committed state and
/// return detached copies. Mutations must be bracketed by
/// [`begin`](Self::begin) / [`commit`](Self::commit); they are buffered in
/// the session and only hit shared storage at commit, under a single write
/// lock. Sessions are single-threaded and never shared across tasks.
pub struct Session {
    metamodel: Arc<Metamodel>,
    rows: Arc<RwLock<EntityRows>>,
    tx: Option<Vec<PendingOp>>,
}

impl Session {
    pub(crate) fn new(metamodel: Arc<Metamodel>, rows: Arc<RwLock<EntityRows>>) -> Self {
        Self {
            metamodel,
            rows,
            tx: None,
        }
    }

    pub fn begin(&mut self) -> Result<()> {
        if self.tx.is_some() {
            return Err(StoreError::ExecutionError(
                "Transaction already active".into(),
            ));
        }
        self.tx = Some(Vec::new());
        Ok(())
    }

    pub fn is_in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    /// Apply every staged mutation to shared storage.
    pub fn commit(&mut self) -> Result<()> {
        let ops = self
            .tx
            .take()
            .ok_or_else(|| StoreError::ExecutionError("No active transaction".into()))?;

        let mut rows = self.rows.write()?;
        for op in ops {
            match op {
                PendingOp::Merge(record) => {
                    let id = self.metamodel.identifier_of(&record)?;
                    rows.entry(record.type_name().to_string())
                        .or_default()
                        .insert(id, record);
                }
                PendingOp::Remove { entity, id } => {
                    if let Some(table) = rows.get_mut(&entity) {
                        table.remove(&id);
                    }
                }
                PendingOp::RemoveAll { entity } => {
                    if let Some(table) = rows.get_mut(&entity) {
                        table.clear();
                    }
                }
            }
        }
        Ok(())
    }

    /// Discard every staged mutation.
    pub fn rollback(&mut self) -> Result<()> {
        self.tx
            .take()
            .map(|_| ())
            .ok_or_else(|| StoreError::ExecutionError("No active transaction".into()))
    }

    /// Find a row by identifier; the returned record is a detached copy.
    pub fn find(&self, entity: &str, id: &Value) -> Result<Option<Record>> {
        let rows = self.rows.read()?;
        Ok(rows.get(entity).and_then(|table| table.get(id)).cloned())
    }

    /// All rows of an entity type, detached from the session.
    pub fn fetch_all(&self, entity: &str) -> Result<Vec<Record>> {
        let rows = self.rows.read()?;
        Ok(rows
            .get(entity)
            .map(|table| table.values().cloned().collect())
            .unwrap_or_default())
    }

    /// Point-in-time row count, read-committed.
    pub fn count(&self, entity: &str) -> Result<usize> {
        let rows = self.rows.read()?;
        Ok(rows.get(entity).map(|table| table.len()).unwrap_or(0))
    }

    /// Stage an upsert of `record`, keyed by its identifier attribute.
    pub fn merge(&mut self, record: Record) -> Result<()> {
        // Resolve the identifier now so a bad record fails before commit.
        self.metamodel.identifier_of(&record)?;
        self.staged()?.push(PendingOp::Merge(record));
        Ok(())
    }

    /// Stage removal of one row by identifier.
    pub fn remove(&mut self, entity: &str, id: &Value) -> Result<()> {
        let op = PendingOp::Remove {
            entity: entity.to_string(),
            id: id.clone(),
        };
        self.staged()?.push(op);
        Ok(())
    }

    /// Stage removal of every row of an entity type.
    pub fn remove_all(&mut self, entity: &str) -> Result<()> {
        let op = PendingOp::RemoveAll {
            entity: entity.to_string(),
        };
        self.staged()?.push(op);
        Ok(())
    }

    fn staged(&mut self) -> Result<&mut Vec<PendingOp>> {
        self.tx.as_mut().ok_or_else(|| {
            StoreError::ExecutionError("Operation requires an active transaction".into())
        })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!("session dropped with an active transaction; staged changes discarded");
        }
    }
}
