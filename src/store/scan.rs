use std::sync::Arc;

use log::debug;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::core::{Result, StoreEntry, StoreError, TaskContext, Value};
use crate::engine::{Record, SessionFactory};

/// Decides whether a key is fed to the scan callback.
pub trait KeyFilter: Send + Sync {
    fn should_load(&self, key: &Value) -> bool;
}

impl<F> KeyFilter for F
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn should_load(&self, key: &Value) -> bool {
        self(key)
    }
}

/// Per-entry callback invoked from scan batch tasks, possibly on several
/// tasks at once. Call [`TaskContext::stop`] to request early termination.
pub trait EntryCallback: Send + Sync {
    fn process_entry(&self, entry: StoreEntry, ctx: &TaskContext) -> Result<()>;
}

impl<F> EntryCallback for F
where
    F: Fn(StoreEntry, &TaskContext) -> Result<()> + Send + Sync,
{
    fn process_entry(&self, entry: StoreEntry, ctx: &TaskContext) -> Result<()> {
        self(entry, ctx)
    }
}

/// Parallel full-store scan.
///
/// Fetches every row of `entity` in one short-lived session (rows come
/// back detached, so batch tasks never touch the session), partitions them
/// into `batch_size` batches with every fetched row in exactly one batch,
/// including a non-empty trailing partial batch, and dispatches one worker
/// task per batch, at most `concurrency` running at a time.
///
/// The call returns only after every submitted batch finished. Batch
/// failures are collected, not fail-fast, and reported together as
/// [`StoreError::ScanFailed`]; a cooperative stop is not an error.
#[allow(clippy::too_many_arguments)]
pub(super) async fn process(
    factory: Arc<SessionFactory>,
    entity: &str,
    batch_size: usize,
    filter: Option<Arc<dyn KeyFilter>>,
    callback: Arc<dyn EntryCallback>,
    concurrency: usize,
    fetch_value: bool,
    fetch_metadata: bool,
) -> Result<()> {
    let ctx = TaskContext::new();

    // The fetch session is released here, before any batch runs.
    let rows = {
        let session = factory.open_session()?;
        session.fetch_all(entity)?
    };
    let total = rows.len();

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks: JoinSet<Result<()>> = JoinSet::new();
    let mut submitted = 0usize;

    let mut batch: Vec<Record> = Vec::with_capacity(batch_size);
    for row in rows {
        batch.push(row);
        if batch.len() == batch_size {
            let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
            submit_batch(
                &mut tasks,
                full,
                &factory,
                &filter,
                &callback,
                &ctx,
                &semaphore,
                fetch_value,
            );
            submitted += 1;
        }
    }
    if !batch.is_empty() {
        submit_batch(
            &mut tasks,
            batch,
            &factory,
            &filter,
            &callback,
            &ctx,
            &semaphore,
            fetch_value,
        );
        submitted += 1;
    }

    debug!(
        "scan of '{}' dispatched {} batch task(s) for {} row(s) (batch_size={}, fetch_value={}, fetch_metadata={})",
        entity, submitted, total, batch_size, fetch_value, fetch_metadata
    );

    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => failures.push(err),
            Err(join_err) => failures.push(StoreError::ExecutionError(format!(
                "Scan batch task did not complete: {}",
                join_err
            ))),
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(StoreError::ScanFailed(failures))
    }
}

#[allow(clippy::too_many_arguments)]
fn submit_batch(
    tasks: &mut JoinSet<Result<()>>,
    batch: Vec<Record>,
    factory: &Arc<SessionFactory>,
    filter: &Option<Arc<dyn KeyFilter>>,
    callback: &Arc<dyn EntryCallback>,
    ctx: &TaskContext,
    semaphore: &Arc<Semaphore>,
    fetch_value: bool,
) {
    let factory = Arc::clone(factory);
    let filter = filter.clone();
    let callback = Arc::clone(callback);
    let ctx = ctx.clone();
    let semaphore = Arc::clone(semaphore);

    tasks.spawn(async move {
        let _permit = semaphore
            .acquire_owned()
            .await
            .map_err(|_| StoreError::ExecutionError("Scan worker pool is closed".into()))?;

        for record in batch {
            // Stop is observed at row boundaries; the rest of the batch
            // is abandoned, which is allowed, not an error.
            if ctx.is_stopped() {
                break;
            }
            let key = factory.identifier_of(&record)?;
            let wanted = match &filter {
                None => true,
                Some(filter) => filter.should_load(&key),
            };
            if wanted {
                let entry = if fetch_value {
                    StoreEntry::new(key, record)
                } else {
                    StoreEntry::key_only(key)
                };
                callback.process_entry(entry, &ctx)?;
            }
        }
        Ok(())
    });
}
