// ============================================================================
// RelStore Library
// ============================================================================

//! Persistent backing store for in-memory caches, mapping cache entries
//! onto rows of a relational mapping engine.
//!
//! A [`RelStore`] persists entries of one configured entity type: single-key
//! transactional operations (`load`/`contains`/`write`/`delete`), bulk
//! operations (`clear`/`size`), and a parallel full-store scan
//! ([`RelStore::process`]) that batches rows, dispatches them to worker
//! tasks, and supports key filtering and cooperative cancellation.
//!
//! Stores naming the same persistence unit share one reference-counted
//! [`SessionFactory`] through an explicit [`FactoryRegistry`].
//!
//! # Examples
//!
//! ```
//! use relstore::{
//!     DataType, EntityDef, FactoryRegistry, Metamodel, Record, RelStore, StoreConfig,
//!     StoreEntry, Value,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> relstore::Result<()> {
//! let metamodel = Metamodel::new().entity_def(
//!     EntityDef::new("User")
//!         .id_attribute("username", DataType::Text)
//!         .attribute("first_name", DataType::Text),
//! );
//! let registry = Arc::new(FactoryRegistry::new());
//! registry.register_unit("org.example.users", metamodel)?;
//!
//! let config = StoreConfig::new("org.example.users", "User");
//! let mut store = RelStore::new(config, Arc::clone(&registry))?;
//! store.start()?;
//!
//! let user = Record::new("User")
//!     .set("username", "asmith")
//!     .set("first_name", "Alice");
//! store.write(&StoreEntry::new(Value::from("asmith"), user))?;
//! assert!(store.contains(&Value::from("asmith"))?);
//!
//! store.stop()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod engine;
pub mod registry;
pub mod store;

// Re-export the store API
pub use config::{DEFAULT_BATCH_SIZE, StoreConfig};
pub use core::{DataType, Metadata, Result, StoreEntry, StoreError, TaskContext, Value};
pub use engine::{AttributeDef, EntityDef, Metamodel, Record, Session, SessionFactory};
pub use registry::FactoryRegistry;
pub use store::{EntityTypeDescriptor, EntryCallback, KeyFilter, RelStore};
