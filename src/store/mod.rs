//! The store adapter: transactional key operations, bulk operations, and
//! the parallel full-store scan.

mod scan;
mod uow;
mod validate;

pub use scan::{EntryCallback, KeyFilter};
pub use validate::EntityTypeDescriptor;

use std::sync::Arc;

use log::{debug, warn};

use crate::config::StoreConfig;
use crate::core::{Result, StoreEntry, StoreError, Value};
use crate::engine::SessionFactory;
use crate::registry::FactoryRegistry;

/// State held between `start` and `stop`.
struct Started {
    factory: Arc<SessionFactory>,
    descriptor: EntityTypeDescriptor,
}

/// Persistent backing store for one cache, mapping entries onto rows of a
/// single configured entity type.
///
/// Every data operation is independently transactional; no multi-key
/// atomicity is provided. The store must be [`start`](Self::start)ed
/// before use and [`stop`](Self::stop)ped to release its shared session
/// factory back to the registry.
pub struct RelStore {
    config: StoreConfig,
    registry: Arc<FactoryRegistry>,
    state: Option<Started>,
}

impl RelStore {
    /// Create a stopped store. Fails if the configuration is invalid.
    pub fn new(config: StoreConfig, registry: Arc<FactoryRegistry>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry,
            state: None,
        })
    }

    /// Acquire the shared session factory and validate the configured
    /// entity mapping. Any failure aborts startup and leaves the store
    /// stopped.
    pub fn start(&mut self) -> Result<()> {
        if self.state.is_some() {
            return Err(StoreError::ExecutionError("Store is already started".into()));
        }

        let factory = self.registry.get_factory(&self.config.persistence_unit)?;
        let descriptor = match validate::validate_entity(&factory, &self.config.entity_name) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                // Give back the reference taken above so a failed start
                // does not pin the factory.
                if let Err(release_err) =
                    self.registry.release_factory(&self.config.persistence_unit)
                {
                    warn!(
                        "failed to release unit '{}' after aborted start: {}",
                        self.config.persistence_unit, release_err
                    );
                }
                return Err(err);
            }
        };

        debug!(
            "store started for entity '{}' on unit '{}'",
            descriptor.entity_name, self.config.persistence_unit
        );
        self.state = Some(Started { factory, descriptor });
        Ok(())
    }

    /// Release the session factory reference. Best-effort, but failures
    /// are surfaced, not swallowed.
    pub fn stop(&mut self) -> Result<()> {
        let state = self.state.take().ok_or(StoreError::NotStarted)?;
        drop(state);

        self.registry
            .release_factory(&self.config.persistence_unit)
            .map_err(|err| StoreError::Persistence {
                operation: "stop".to_string(),
                source: Box::new(err),
            })
    }

    pub fn is_started(&self) -> bool {
        self.state.is_some()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The shared connection-factory handle. Only available while started.
    pub fn session_factory(&self) -> Result<Arc<SessionFactory>> {
        Ok(Arc::clone(&self.started()?.factory))
    }

    /// Identifier mapping resolved at start.
    pub fn descriptor(&self) -> Result<EntityTypeDescriptor> {
        Ok(self.started()?.descriptor.clone())
    }

    /// Load the entry stored under `key`.
    ///
    /// Returns `None` when the key's runtime type is not assignable to the
    /// identifier type (a defensive guard, not an error) or no row
    /// matches. Loaded entries never carry metadata: they are immortal.
    pub fn load(&self, key: &Value) -> Result<Option<StoreEntry>> {
        let started = self.started()?;
        if !started.descriptor.id_type.accepts_key(key) {
            return Ok(None);
        }

        uow::run_read_only(&started.factory, |session| {
            let found = session.find(&started.descriptor.entity_name, key)?;
            Ok(found.map(|record| StoreEntry::new(key.clone(), record)))
        })
    }

    pub fn contains(&self, key: &Value) -> Result<bool> {
        Ok(self.load(key)?.is_some())
    }

    /// Upsert `entry` as a row, keyed by its identifier attribute.
    ///
    /// Fails with [`StoreError::TypeMismatch`] when the value is not of
    /// the configured entity type and [`StoreError::IdentityMismatch`]
    /// when the value's extracted identifier differs from the entry key;
    /// both are raised before any transaction begins.
    pub fn write(&self, entry: &StoreEntry) -> Result<()> {
        let started = self.started()?;

        let record = entry.value.as_ref().ok_or_else(|| {
            StoreError::TypeMismatch("Cannot write an entry without a value".into())
        })?;
        if record.type_name() != started.descriptor.entity_name {
            return Err(StoreError::TypeMismatch(format!(
                "This store only persists values of type '{}', got '{}'",
                started.descriptor.entity_name,
                record.type_name()
            )));
        }

        let id = started.factory.identifier_of(record)?;
        if id != entry.key {
            return Err(StoreError::IdentityMismatch {
                key: entry.key.to_string(),
                id: id.to_string(),
            });
        }

        let record = record.clone();
        uow::run_in_transaction(&started.factory, "write", move |session| {
            session.merge(record)
        })
    }

    /// Delete the row stored under `key`.
    ///
    /// Returns `false` without starting a transaction when the key fails
    /// the type guard. The existence check and the remove run inside one
    /// session so a row deleted by another store in between is reported
    /// as absent, never as deleted twice.
    pub fn delete(&self, key: &Value) -> Result<bool> {
        let started = self.started()?;
        if !started.descriptor.id_type.accepts_key(key) {
            return Ok(false);
        }

        let entity = started.descriptor.entity_name.clone();
        let key = key.clone();
        uow::run_in_transaction(&started.factory, "delete", move |session| {
            if session.find(&entity, &key)?.is_none() {
                return Ok(false);
            }
            session.remove(&entity, &key)?;
            Ok(true)
        })
    }

    /// Delete every row of the configured entity type in one transaction.
    pub fn clear(&self) -> Result<()> {
        let started = self.started()?;
        let entity = started.descriptor.entity_name.clone();
        uow::run_in_transaction(&started.factory, "clear", move |session| {
            session.remove_all(&entity)
        })
    }

    /// Point-in-time row count with no isolation guarantee against
    /// concurrent writers.
    pub fn size(&self) -> Result<usize> {
        let started = self.started()?;
        uow::run_read_only(&started.factory, |session| {
            session.count(&started.descriptor.entity_name)
        })
    }

    /// Parallel full-store scan; see [`EntryCallback`] and [`KeyFilter`].
    ///
    /// Blocks until every submitted batch task completed. Per-batch
    /// failures are aggregated into [`StoreError::ScanFailed`] after all
    /// batches finished; a cooperative stop via
    /// [`TaskContext`](crate::core::TaskContext) returns `Ok`.
    ///
    /// # Examples
    ///
    /// ```
    /// use relstore::{
    ///     DataType, EntityDef, EntryCallback, FactoryRegistry, Metamodel, Record, RelStore,
    ///     StoreConfig, StoreEntry, TaskContext, Value,
    /// };
    /// use std::sync::Arc;
    ///
    /// # tokio_test::block_on(async {
    /// let registry = Arc::new(FactoryRegistry::new());
    /// registry
    ///     .register_unit(
    ///         "org.example.users",
    ///         Metamodel::new()
    ///             .entity_def(EntityDef::new("User").id_attribute("username", DataType::Text)),
    ///     )
    ///     .unwrap();
    ///
    /// let mut store =
    ///     RelStore::new(StoreConfig::new("org.example.users", "User"), registry).unwrap();
    /// store.start().unwrap();
    /// store
    ///     .write(&StoreEntry::new(
    ///         Value::from("asmith"),
    ///         Record::new("User").set("username", "asmith"),
    ///     ))
    ///     .unwrap();
    ///
    /// let callback: Arc<dyn EntryCallback> =
    ///     Arc::new(|entry: StoreEntry, _ctx: &TaskContext| -> relstore::Result<()> {
    ///         println!("visited {}", entry.key);
    ///         Ok(())
    ///     });
    /// store.process(None, callback, 4, true, false).await.unwrap();
    /// # store.stop().unwrap();
    /// # });
    /// ```
    pub async fn process(
        &self,
        filter: Option<Arc<dyn KeyFilter>>,
        callback: Arc<dyn EntryCallback>,
        concurrency: usize,
        fetch_value: bool,
        fetch_metadata: bool,
    ) -> Result<()> {
        let started = self.started()?;
        scan::process(
            Arc::clone(&started.factory),
            &started.descriptor.entity_name,
            self.config.batch_size,
            filter,
            callback,
            concurrency,
            fetch_value,
            fetch_metadata,
        )
        .await
    }

    /// No-op: entries managed by this store carry no expiry metadata, so
    /// there is never anything to purge.
    pub async fn purge(&self) -> Result<()> {
        self.started()?;
        Ok(())
    }

    fn started(&self) -> Result<&Started> {
        self.state.as_ref().ok_or(StoreError::NotStarted)
    }
}
