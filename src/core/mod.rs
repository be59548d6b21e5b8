pub mod entry;
pub mod error;
pub mod value;

pub use entry::{Metadata, StoreEntry, TaskContext};
pub use error::{Result, StoreError};
pub use value::{DataType, Value};
