//! Row-oriented mapping engine backing the store adapter.
//!
//! The store only depends on the boundary exposed here: metadata
//! introspection ([`Metamodel`]), session creation and identifier
//! extraction ([`SessionFactory`]), and transactional row access
//! ([`Session`]).

pub mod factory;
pub mod metamodel;
pub mod record;
pub mod session;

pub use factory::SessionFactory;
pub use metamodel::{AttributeDef, EntityDef, Metamodel};
pub use record::Record;
pub use session::Session;
