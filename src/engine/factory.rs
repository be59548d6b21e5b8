use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::core::{Result, StoreError, Value};
use crate::engine::session::EntityRows;
use crate::engine::{Metamodel, Record, Session};

/// Connection-factory handle for one persistence unit.
///
/// Owned by the [`FactoryRegistry`](crate::registry::FactoryRegistry) and
/// shared, reference-counted, across every store naming the same unit.
/// Stores only borrow it between `start` and `stop`; the registry closes it
/// when the last reference is released, after which any attempt to open a
/// session fails with [`StoreError::FactoryClosed`].
pub struct SessionFactory {
    unit: String,
    metamodel: Arc<Metamodel>,
    rows: Arc<RwLock<EntityRows>>,
    closed: AtomicBool,
}

impl SessionFactory {
    pub(crate) fn new(unit: &str, metamodel: Arc<Metamodel>) -> Self {
        Self {
            unit: unit.to_string(),
            metamodel,
            rows: Arc::new(RwLock::new(EntityRows::new())),
            closed: AtomicBool::new(false),
        }
    }

    pub fn unit_name(&self) -> &str {
        &self.unit
    }

    pub fn metamodel(&self) -> &Metamodel {
        &self.metamodel
    }

    /// Open a new session. One session per operation or per batch task;
    /// sessions are never shared across threads.
    pub fn open_session(&self) -> Result<Session> {
        self.ensure_open()?;
        Ok(Session::new(
            Arc::clone(&self.metamodel),
            Arc::clone(&self.rows),
        ))
    }

    /// Extract the identifier value from an arbitrary record instance.
    pub fn identifier_of(&self, record: &Record) -> Result<Value> {
        self.ensure_open()?;
        self.metamodel.identifier_of(record)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(StoreError::FactoryClosed)
        } else {
            Ok(())
        }
    }
}
