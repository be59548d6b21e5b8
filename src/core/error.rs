use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Persistence unit '{0}' not found")]
    UnitNotFound(String),

    #[error("Entity type '{0}' is not recognized by the session factory")]
    UnknownEntityType(String),

    #[error("Entity type '{0}' must have exactly one identifier attribute")]
    MissingIdentifier(String),

    #[error("Identifier attribute '{1}' of entity type '{0}' must not be engine-generated")]
    GeneratedIdentifierNotAllowed(String, String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Entity identifier must equal the cache key: key = [{key}], id = [{id}]")]
    IdentityMismatch { key: String, id: String },

    #[error("Store is not started")]
    NotStarted,

    #[error("Session factory is closed")]
    FactoryClosed,

    #[error("Persistence failure in {operation}")]
    Persistence {
        operation: String,
        #[source]
        source: Box<StoreError>,
    },

    #[error("Scan failed: {} batch task(s) reported errors", .0.len())]
    ScanFailed(Vec<StoreError>),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
