use serde::{Deserialize, Serialize};

use crate::core::{Result, StoreError};

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Store configuration, consumed once at start and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Name of the persistence unit providing the connection factory.
    pub persistence_unit: String,

    /// Mapped entity type this store persists.
    pub entity_name: String,

    /// Rows per batch task during a scan.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl StoreConfig {
    pub fn new(persistence_unit: &str, entity_name: &str) -> Self {
        Self {
            persistence_unit: persistence_unit.to_string(),
            entity_name: entity_name.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the scan batch size.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.persistence_unit.is_empty() {
            return Err(StoreError::ExecutionError(
                "persistence_unit cannot be empty".into(),
            ));
        }
        if self.entity_name.is_empty() {
            return Err(StoreError::ExecutionError(
                "entity_name cannot be empty".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(StoreError::ExecutionError("batch_size must be >= 1".into()));
        }
        Ok(())
    }
}
