use log::warn;

use crate::core::{Result, StoreError};
use crate::engine::{Session, SessionFactory};

/// Run `op` inside a single unit of work: one session, one transaction,
/// commit on success, rollback on any error.
///
/// The session is released on every exit path. A rollback failure is
/// logged and suppressed so it never masks the error that triggered it;
/// the triggering error itself is re-raised wrapped as
/// [`StoreError::Persistence`] carrying the operation name.
pub fn run_in_transaction<T>(
    factory: &SessionFactory,
    operation: &str,
    op: impl FnOnce(&mut Session) -> Result<T>,
) -> Result<T> {
    let mut session = factory.open_session()?;
    session.begin()?;

    let outcome = match op(&mut session) {
        Ok(value) => session.commit().map(|()| value),
        Err(err) => Err(err),
    };

    match outcome {
        Ok(value) => Ok(value),
        Err(err) => {
            if session.is_in_transaction() {
                if let Err(rollback_err) = session.rollback() {
                    warn!("rollback failed in {}: {}", operation, rollback_err);
                }
            }
            Err(StoreError::Persistence {
                operation: operation.to_string(),
                source: Box::new(err),
            })
        }
    }
}

/// Run a read-only `op` on a plain non-transactional session.
pub fn run_read_only<T>(
    factory: &SessionFactory,
    op: impl FnOnce(&Session) -> Result<T>,
) -> Result<T> {
    let session = factory.open_session()?;
    op(&session)
}
