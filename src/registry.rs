use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::debug;

use crate::core::{Result, StoreError};
use crate::engine::{Metamodel, SessionFactory};

struct UnitEntry {
    metamodel: Arc<Metamodel>,
    factory: Option<Arc<SessionFactory>>,
    refcount: usize,
}

/// Registry of session factories, one per named persistence unit.
///
/// Stores naming the same unit share a single factory; the registry counts
/// acquisitions and closes the factory when the count returns to zero.
/// There is no global instance: callers construct a registry and pass the
/// handle into each store explicitly.
#[derive(Default)]
pub struct FactoryRegistry {
    units: Mutex<HashMap<String, UnitEntry>>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a persistence unit by name. Must happen before any store
    /// naming the unit is started.
    pub fn register_unit(&self, name: &str, metamodel: Metamodel) -> Result<()> {
        let mut units = self.units.lock()?;
        if units.contains_key(name) {
            return Err(StoreError::ExecutionError(format!(
                "Persistence unit '{}' is already registered",
                name
            )));
        }
        units.insert(
            name.to_string(),
            UnitEntry {
                metamodel: Arc::new(metamodel),
                factory: None,
                refcount: 0,
            },
        );
        Ok(())
    }

    /// Acquire the shared factory for `name`, creating it on first use.
    pub fn get_factory(&self, name: &str) -> Result<Arc<SessionFactory>> {
        let mut units = self.units.lock()?;
        let entry = units
            .get_mut(name)
            .ok_or_else(|| StoreError::UnitNotFound(name.to_string()))?;

        let factory = entry.factory.get_or_insert_with(|| {
            debug!("creating session factory for unit '{}'", name);
            Arc::new(SessionFactory::new(name, Arc::clone(&entry.metamodel)))
        });
        entry.refcount += 1;
        Ok(Arc::clone(factory))
    }

    /// Release one reference; the factory is closed when the last holder
    /// releases it.
    pub fn release_factory(&self, name: &str) -> Result<()> {
        let mut units = self.units.lock()?;
        let entry = units
            .get_mut(name)
            .ok_or_else(|| StoreError::UnitNotFound(name.to_string()))?;

        if entry.refcount == 0 {
            return Err(StoreError::ExecutionError(format!(
                "Persistence unit '{}' has no outstanding references",
                name
            )));
        }
        entry.refcount -= 1;
        if entry.refcount == 0 {
            if let Some(factory) = entry.factory.take() {
                debug!("closing session factory for unit '{}'", name);
                factory.close();
            }
        }
        Ok(())
    }

    /// Current reference count for a unit.
    pub fn refcount(&self, name: &str) -> Result<usize> {
        let units = self.units.lock()?;
        units
            .get(name)
            .map(|entry| entry.refcount)
            .ok_or_else(|| StoreError::UnitNotFound(name.to_string()))
    }
}
